// ❗ Library errors - every failure the core can report
//
// All variants are recoverable. Callers (the HTTP layer) map each one to a
// transport status using `code()`; the core never formats responses itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by every core operation
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Which collection an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Member,
    Book,
    Transaction,
    Reservation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Member => "member",
            EntityKind::Book => "book",
            EntityKind::Transaction => "transaction",
            EntityKind::Reservation => "reservation",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibraryError {
    #[error("{kind} with id: {id} was not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} with id: {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("member with id: {member_id} has already borrowed a book")]
    MemberAlreadyBorrowing { member_id: u64 },

    #[error("book with id: {book_id} is not available")]
    BookUnavailable { book_id: u64 },

    #[error("member with id: {member_id} has not borrowed book with id: {book_id}")]
    NoActiveBorrowing { member_id: u64, book_id: u64 },

    #[error("cannot delete {kind} with id: {id}, it has an active book borrowing")]
    HasActiveBorrowing { kind: EntityKind, id: u64 },

    #[error("member already has {current} active reservations (limit: {limit})")]
    ReservationLimitExceeded { current: usize, limit: usize },

    #[error("book with id: {book_id} is currently available for immediate borrowing")]
    BookAvailable { book_id: u64 },

    #[error("preferred pickup date cannot be in the past")]
    InvalidPickupDate,

    #[error("library is closed on weekends")]
    LibraryClosed { suggested_dates: Vec<DateTime<Utc>> },

    #[error("reservation {reservation_id} has already been cancelled")]
    AlreadyCancelled { reservation_id: String },

    #[error("invalid {field}: {reason}")]
    ValidationError { field: String, reason: String },
}

impl LibraryError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        LibraryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn already_exists(kind: EntityKind, id: impl ToString) -> Self {
        LibraryError::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        LibraryError::ValidationError {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::NotFound { kind, .. } => match kind {
                EntityKind::Member => "member_not_found",
                EntityKind::Book => "book_not_found",
                EntityKind::Transaction => "transaction_not_found",
                EntityKind::Reservation => "reservation_not_found",
            },
            LibraryError::AlreadyExists { .. } => "already_exists",
            LibraryError::MemberAlreadyBorrowing { .. } => "member_already_borrowing",
            LibraryError::BookUnavailable { .. } => "book_unavailable",
            LibraryError::NoActiveBorrowing { .. } => "no_active_borrowing",
            LibraryError::HasActiveBorrowing { .. } => "has_active_borrowing",
            LibraryError::ReservationLimitExceeded { .. } => "reservation_limit_exceeded",
            LibraryError::BookAvailable { .. } => "book_available",
            LibraryError::InvalidPickupDate => "invalid_pickup_date",
            LibraryError::LibraryClosed { .. } => "library_closed",
            LibraryError::AlreadyCancelled { .. } => "already_cancelled",
            LibraryError::ValidationError { .. } => "validation_error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::NotFound { .. })
    }
}
