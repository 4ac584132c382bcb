// 🌱 Seed data - demo library and CSV catalog import
//
// `sample_library()` reproduces the demo dataset the service starts with:
// three members, five books, two active loans and one returned loan.
// Counters continue after the seeded ids.

use crate::entities::{
    BookPatch, MemberPatch, MembershipTier, NewBook, NewMember, NewTransaction, TransactionPatch,
};
use crate::error::{LibraryError, Result as LibraryResult};
use crate::store::{IdCounters, LibraryStore};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

fn timestamp(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn sample_library() -> LibraryResult<LibraryStore> {
    let mut store = LibraryStore::with_counters(IdCounters {
        next_member_id: 4,
        next_book_id: 106,
        next_transaction_id: 504,
        next_reservation_seq: 1,
    });

    let members = [
        (1, "Alice Johnson", 22, MembershipTier::Standard, timestamp(2025, 9, 1, 10, 0)),
        (2, "Bob Smith", 30, MembershipTier::Gold, timestamp(2025, 9, 2, 14, 30)),
        (3, "Charlie Brown", 25, MembershipTier::Standard, timestamp(2025, 9, 3, 9, 15)),
    ];
    for (id, name, age, tier, created_at) in members {
        store.create_member_at(NewMember::new(name, age).with_id(id).with_tier(tier), created_at)?;
    }

    let catalog_time = timestamp(2025, 9, 1, 10, 0);
    let books = [
        (101, "The Great Gatsby", "F. Scott Fitzgerald", "978-0743273565", "Classic Literature", date(1925, 4, 10), 4.2, 45),
        (102, "To Kill a Mockingbird", "Harper Lee", "978-0061120084", "Fiction", date(1960, 7, 11), 4.5, 38),
        (103, "1984", "George Orwell", "978-0451524935", "Dystopian Fiction", date(1949, 6, 8), 4.3, 52),
        (104, "Pride and Prejudice", "Jane Austen", "978-0141439518", "Romance", date(1813, 1, 28), 4.4, 67),
        (105, "The Catcher in the Rye", "J.D. Salinger", "978-0316769174", "Coming-of-age Fiction", date(1951, 7, 16), 3.8, 29),
    ];
    for (id, title, author, isbn, category, published, rating, borrowing_count) in books {
        let mut book = NewBook::new(title, author)
            .with_id(id)
            .with_isbn(isbn)
            .with_category(category)
            .with_rating(rating);
        book.published_date = published;
        store.create_book_at(book, catalog_time)?;
        store.update_book(
            id,
            BookPatch {
                borrowing_count: Some(borrowing_count),
                ..Default::default()
            },
        );
    }

    let loans = [
        (501, 1, 101, timestamp(2025, 9, 11, 10, 30), None),
        (502, 2, 104, timestamp(2025, 9, 12, 14, 15), None),
        (503, 1, 102, timestamp(2025, 8, 15, 9, 0), Some(timestamp(2025, 8, 28, 16, 30))),
    ];
    for (id, member_id, book_id, borrowed_at, returned_at) in loans {
        store.create_transaction(NewTransaction::new(member_id, book_id, borrowed_at).with_id(id))?;

        match returned_at {
            Some(at) => {
                store.update_transaction(id, TransactionPatch::returned(at));
            }
            None => {
                store.update_member(
                    member_id,
                    MemberPatch {
                        has_borrowed: Some(true),
                        ..Default::default()
                    },
                );
                store.update_book(
                    book_id,
                    BookPatch {
                        is_available: Some(false),
                        ..Default::default()
                    },
                );
            }
        }
    }

    Ok(store)
}

// ============================================================================
// CSV CATALOG IMPORT
// ============================================================================

/// One row of a catalog CSV. Empty cells fall back to catalog defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    #[serde(default)]
    pub book_id: Option<u64>,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl From<CatalogRow> for NewBook {
    fn from(row: CatalogRow) -> Self {
        NewBook {
            id: row.book_id,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            category: row.category,
            published_date: row.published_date,
            rating: row.rating,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn load_catalog_csv(csv_path: &Path) -> Result<Vec<NewBook>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open catalog CSV {}", csv_path.display()))?;

    let mut books = Vec::new();
    for result in rdr.deserialize() {
        let row: CatalogRow = result.context("Failed to deserialize catalog row")?;
        books.push(row.into());
    }

    Ok(books)
}

/// Insert books into the store. Rows whose explicit id is taken are
/// skipped; any other invalid row aborts the import.
pub fn import_catalog(store: &mut LibraryStore, books: Vec<NewBook>) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for book in books {
        let title = book.title.clone();
        match store.create_book(book) {
            Ok(_) => summary.inserted += 1,
            Err(LibraryError::AlreadyExists { id, .. }) => {
                warn!(book_id = %id, title = %title, "catalog row skipped, id already taken");
                summary.skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("Invalid catalog row {:?}", title)),
        }
    }

    info!(inserted = summary.inserted, skipped = summary.skipped, "catalog imported");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TransactionStatus;
    use std::io::Write;

    #[test]
    fn test_sample_library_contents() {
        let store = sample_library().unwrap();

        assert_eq!(store.all_members().len(), 3);
        assert_eq!(store.all_books().len(), 5);
        assert_eq!(store.all_transactions().len(), 3);
        assert!(store.all_reservations().is_empty());

        assert_eq!(store.get_member(2).unwrap().membership_tier, MembershipTier::Gold);
        assert_eq!(store.get_book(104).unwrap().borrowing_count, 67);
        assert_eq!(
            store.get_transaction(503).unwrap().status,
            TransactionStatus::Returned
        );
    }

    #[test]
    fn test_sample_library_flags_match_loans() {
        let store = sample_library().unwrap();

        for member in store.all_members() {
            let active = !store.active_transactions_for_member(member.id).is_empty();
            assert_eq!(member.has_borrowed, active);
        }
        for book in store.all_books() {
            let active = !store.active_transactions_for_book(book.id).is_empty();
            assert_eq!(book.is_available, !active);
        }
    }

    #[test]
    fn test_sample_library_counters_continue() {
        let mut store = sample_library().unwrap();

        let member = store.create_member(NewMember::new("Dana", 19)).unwrap();
        let book = store.create_book(NewBook::new("Emma", "Jane Austen")).unwrap();

        assert_eq!(member.id, 4);
        assert_eq!(book.id, 106);
    }

    #[test]
    fn test_load_and_import_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "book_id,title,author,isbn,category,published_date,rating").unwrap();
        writeln!(file, "200,Dune,Frank Herbert,978-0441013593,Science Fiction,1965-08-01,4.6").unwrap();
        writeln!(file, ",Emma,Jane Austen,,,,").unwrap();
        writeln!(file, "101,Duplicate,Someone,,,,").unwrap();
        file.flush().unwrap();

        let books = load_catalog_csv(file.path()).unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(books[1].category, None);

        let mut store = sample_library().unwrap();
        let summary = import_catalog(&mut store, books).unwrap();

        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 1 });
        let dune = store.get_book(200).unwrap();
        assert_eq!(dune.category, "Science Fiction");
        assert_eq!(dune.rating, 4.6);
        assert_eq!(store.get_book(106).unwrap().category, "General");
        assert_eq!(store.get_book(101).unwrap().title, "The Great Gatsby");
    }

    #[test]
    fn test_invalid_catalog_row_aborts() {
        let mut store = LibraryStore::new();
        let books = vec![NewBook::new("", "Nobody")];

        assert!(import_catalog(&mut store, books).is_err());
    }

    #[test]
    fn test_missing_csv_file() {
        assert!(load_catalog_csv(Path::new("/definitely/not/here.csv")).is_err());
    }
}
