// Library Management System - Core Library
// Exposes all modules for use in the API server and tests

pub mod error;
pub mod entities;
pub mod store;
pub mod priority;       // Reservation priority scoring
pub mod borrowing;      // Borrow / return workflow
pub mod reservations;   // Reservation queue workflow
pub mod reports;        // Borrowed, overdue, member history
pub mod catalog;        // Book search
pub mod seed;           // Demo data + CSV catalog import
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{EntityKind, LibraryError, Result};
pub use entities::{
    Book, BookPatch, NewBook,
    Member, MemberPatch, MembershipTier, NewMember,
    NewTransaction, Transaction, TransactionPatch, TransactionStatus,
    NewReservation, Reservation, ReservationPatch, ReservationStatus, ReservationType,
};
pub use store::{IdCounters, LibraryStore};
pub use priority::{PriorityEngine, PriorityFactors};
pub use borrowing::{borrow_book, delete_book, delete_member, return_book};
pub use reservations::{
    cancel_reservation, create_reservation, get_reservation,
    ReservationReceipt, ReservationRequest, MAX_PENDING_RESERVATIONS,
};
pub use reports::{borrowed_books, borrowing_history, overdue_books};
pub use catalog::{search_books, SearchPage, SearchQuery};
pub use seed::{import_catalog, load_catalog_csv, sample_library};
pub use config::ServerConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
