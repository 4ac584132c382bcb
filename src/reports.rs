// 📊 Reports - read-only views joining transactions with names and titles

use crate::entities::{Transaction, TransactionStatus};
use crate::error::{EntityKind, LibraryError, Result};
use crate::store::LibraryStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "Unknown";
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowedBook {
    pub transaction_id: u64,
    pub member_id: u64,
    pub member_name: String,
    pub book_id: u64,
    pub book_title: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueBook {
    #[serde(flatten)]
    pub loan: BorrowedBook,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: u64,
    pub book_id: u64,
    pub book_title: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowingHistory {
    pub member_id: u64,
    pub member_name: String,
    pub borrowing_history: Vec<HistoryEntry>,
}

fn member_name(store: &LibraryStore, member_id: u64) -> String {
    store
        .get_member(member_id)
        .map(|m| m.name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn book_title(store: &LibraryStore, book_id: u64) -> String {
    store
        .get_book(book_id)
        .map(|b| b.title.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn borrowed_entry(store: &LibraryStore, tx: &Transaction) -> BorrowedBook {
    BorrowedBook {
        transaction_id: tx.id,
        member_id: tx.member_id,
        member_name: member_name(store, tx.member_id),
        book_id: tx.book_id,
        book_title: book_title(store, tx.book_id),
        borrowed_at: tx.borrowed_at,
        due_date: tx.due_date,
    }
}

/// Every book currently lent out
pub fn borrowed_books(store: &LibraryStore) -> Vec<BorrowedBook> {
    store
        .active_transactions()
        .into_iter()
        .map(|tx| borrowed_entry(store, tx))
        .collect()
}

/// Active loans past their due date, with whole days overdue rounded up
pub fn overdue_books(store: &LibraryStore, now: DateTime<Utc>) -> Vec<OverdueBook> {
    store
        .active_transactions()
        .into_iter()
        .filter(|tx| tx.is_overdue_at(now))
        .map(|tx| OverdueBook {
            loan: borrowed_entry(store, tx),
            days_overdue: days_overdue(tx.due_date, now),
        })
        .collect()
}

fn days_overdue(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - due_date).num_milliseconds();
    let day_millis = SECONDS_PER_DAY * 1000;
    (millis + day_millis - 1) / day_millis
}

pub fn borrowing_history(store: &LibraryStore, member_id: u64) -> Result<BorrowingHistory> {
    let member = store
        .get_member(member_id)
        .ok_or_else(|| LibraryError::not_found(EntityKind::Member, member_id))?;

    let borrowing_history = store
        .transactions_for_member(member_id)
        .into_iter()
        .map(|tx| HistoryEntry {
            transaction_id: tx.id,
            book_id: tx.book_id,
            book_title: book_title(store, tx.book_id),
            borrowed_at: tx.borrowed_at,
            returned_at: tx.returned_at,
            status: tx.status,
        })
        .collect();

    Ok(BorrowingHistory {
        member_id,
        member_name: member.name.clone(),
        borrowing_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::borrowing::{borrow_book_at, return_book_at};
    use crate::entities::{NewBook, NewMember};
    use chrono::Duration;

    fn library() -> LibraryStore {
        let mut store = LibraryStore::new();
        store.create_member(NewMember::new("Alice", 22).with_id(1)).unwrap();
        store.create_member(NewMember::new("Bob", 30).with_id(2)).unwrap();
        store
            .create_book(NewBook::new("The Great Gatsby", "F. Scott Fitzgerald").with_id(101))
            .unwrap();
        store
            .create_book(NewBook::new("Pride and Prejudice", "Jane Austen").with_id(104))
            .unwrap();
        store
    }

    #[test]
    fn test_borrowed_books_joins_names() {
        let mut store = library();
        let now = Utc::now();
        borrow_book_at(&mut store, 1, 101, now).unwrap();

        let borrowed = borrowed_books(&store);
        assert_eq!(borrowed.len(), 1);
        assert_eq!(borrowed[0].member_name, "Alice");
        assert_eq!(borrowed[0].book_title, "The Great Gatsby");
        assert_eq!(borrowed[0].due_date, now + Duration::days(14));
    }

    #[test]
    fn test_unknown_names_for_dangling_references() {
        let mut store = library();
        store
            .create_transaction(crate::entities::NewTransaction::new(50, 500, Utc::now()))
            .unwrap();

        let borrowed = borrowed_books(&store);
        assert_eq!(borrowed[0].member_name, "Unknown");
        assert_eq!(borrowed[0].book_title, "Unknown");
    }

    #[test]
    fn test_overdue_days_round_up() {
        let mut store = library();
        let now = Utc::now();
        borrow_book_at(&mut store, 1, 101, now - Duration::days(20)).unwrap();
        borrow_book_at(&mut store, 2, 104, now - Duration::days(15) - Duration::hours(1)).unwrap();

        let overdue = overdue_books(&store, now);
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].days_overdue, 6);
        assert_eq!(overdue[1].days_overdue, 2);

        // Returned loans are no longer overdue
        return_book_at(&mut store, 1, 101, now).unwrap();
        assert_eq!(overdue_books(&store, now).len(), 1);
    }

    #[test]
    fn test_nothing_overdue_before_due_date() {
        let mut store = library();
        let now = Utc::now();
        borrow_book_at(&mut store, 1, 101, now - Duration::days(3)).unwrap();

        assert!(overdue_books(&store, now).is_empty());
    }

    #[test]
    fn test_borrowing_history() {
        let mut store = library();
        let now = Utc::now();
        borrow_book_at(&mut store, 1, 101, now - Duration::days(10)).unwrap();
        return_book_at(&mut store, 1, 101, now - Duration::days(2)).unwrap();
        borrow_book_at(&mut store, 1, 104, now).unwrap();

        let history = borrowing_history(&store, 1).unwrap();
        assert_eq!(history.member_name, "Alice");
        assert_eq!(history.borrowing_history.len(), 2);
        assert_eq!(history.borrowing_history[0].status, TransactionStatus::Returned);
        assert_eq!(history.borrowing_history[1].book_title, "Pride and Prejudice");
        assert!(history.borrowing_history[1].returned_at.is_none());

        assert!(borrowing_history(&store, 99).unwrap_err().is_not_found());
    }
}
