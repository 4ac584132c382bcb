// 📚 Book Entity - one physical copy per catalog entry
//
// `is_available` is false exactly while one active Transaction references
// the book.

use crate::error::{LibraryError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub is_available: bool,
    pub category: String,
    pub published_date: NaiveDate,
    /// Average reader rating in [0, 5]
    pub rating: f64,
    /// Number of times the book has been borrowed (popularity)
    pub borrowing_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry data. Optional fields fall back to catalog defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBook {
    #[serde(default)]
    pub id: Option<u64>,
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

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        NewBook {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_published_date(mut self, date: NaiveDate) -> Self {
        self.published_date = Some(date);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_text("title", &self.title)?;
        validate_text("author", &self.author)?;
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub is_available: Option<bool>,
    pub category: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub borrowing_count: Option<u64>,
}

impl BookPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_text("title", title)?;
        }
        if let Some(author) = &self.author {
            validate_text("author", author)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

impl Book {
    pub fn from_new(id: u64, data: NewBook, now: DateTime<Utc>) -> Self {
        Book {
            id,
            title: data.title,
            author: data.author,
            isbn: data.isbn,
            is_available: true,
            category: data
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            published_date: data.published_date.unwrap_or_else(|| now.date_naive()),
            rating: data.rating.unwrap_or(0.0),
            borrowing_count: 0,
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(isbn) = patch.isbn {
            self.isbn = Some(isbn);
        }
        if let Some(is_available) = patch.is_available {
            self.is_available = is_available;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(date) = patch.published_date {
            self.published_date = date;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(count) = patch.borrowing_count {
            self.borrowing_count = count;
        }
    }

    /// Case-insensitive match on title, author or category
    pub fn matches(&self, term: &str) -> bool {
        let lower = term.to_lowercase();
        self.title.to_lowercase().contains(&lower)
            || self.author.to_lowercase().contains(&lower)
            || self.category.to_lowercase().contains(&lower)
    }
}

fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::validation(field, "must be a non-empty string"));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<()> {
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err(LibraryError::validation(
            "rating",
            format!("must be between 0 and {}, got {}", MAX_RATING, rating),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let now = Utc::now();
        let book = Book::from_new(9, NewBook::new("Dune", "Frank Herbert"), now);

        assert_eq!(book.id, 9);
        assert!(book.is_available);
        assert_eq!(book.category, DEFAULT_CATEGORY);
        assert_eq!(book.published_date, now.date_naive());
        assert_eq!(book.rating, 0.0);
        assert_eq!(book.borrowing_count, 0);
        assert!(book.isbn.is_none());
    }

    #[test]
    fn test_validation() {
        assert!(NewBook::new("Dune", "Frank Herbert").validate().is_ok());
        assert!(NewBook::new("", "Frank Herbert").validate().is_err());
        assert!(NewBook::new("Dune", " ").validate().is_err());
        assert!(NewBook::new("Dune", "Frank Herbert")
            .with_rating(5.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_matches() {
        let book = Book::from_new(
            1,
            NewBook::new("1984", "George Orwell").with_category("Dystopian Fiction"),
            Utc::now(),
        );

        assert!(book.matches("orwell"));
        assert!(book.matches("DYSTOPIAN"));
        assert!(book.matches("198"));
        assert!(!book.matches("Austen"));
    }
}
