// 🗄️ Entity Store - owns every Member, Book, Transaction and Reservation
//
// Records live in insertion-ordered vectors, like the registries elsewhere
// in this crate; lookups are linear scans. The store is a plain value: the
// server wraps it in a single `Mutex`, so every read-then-write operation
// in `borrowing` and `reservations` runs as one critical section.

use crate::entities::{
    Book, BookPatch, Member, MemberPatch, NewBook, NewMember, NewReservation, NewTransaction,
    Reservation, ReservationPatch, Transaction, TransactionPatch,
};
use crate::error::{EntityKind, LibraryError, Result};
use chrono::{DateTime, Utc};

// ============================================================================
// ID COUNTERS
// ============================================================================

/// Next values handed out for records created without an explicit id.
///
/// A create without an id takes the counter value and advances it once,
/// except when that value was already claimed by an explicit id: the
/// counter then steps past every taken value first, so it can advance
/// several times for one create. Failed creates leave it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCounters {
    pub next_member_id: u64,
    pub next_book_id: u64,
    pub next_transaction_id: u64,
    pub next_reservation_seq: u64,
}

impl Default for IdCounters {
    fn default() -> Self {
        IdCounters {
            next_member_id: 1,
            next_book_id: 1,
            next_transaction_id: 1,
            next_reservation_seq: 1,
        }
    }
}

/// Take the next free id from `counter`, stepping over ids that were
/// claimed explicitly.
fn allocate_id(counter: &mut u64, is_taken: impl Fn(u64) -> bool) -> u64 {
    while is_taken(*counter) {
        *counter += 1;
    }
    let id = *counter;
    *counter += 1;
    id
}

/// `RES-<unix millis>-<sequence>` with the sequence padded to three digits
pub fn format_reservation_id(created_at: DateTime<Utc>, seq: u64) -> String {
    format!("RES-{}-{:03}", created_at.timestamp_millis(), seq)
}

// ============================================================================
// LIBRARY STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LibraryStore {
    members: Vec<Member>,
    books: Vec<Book>,
    transactions: Vec<Transaction>,
    reservations: Vec<Reservation>,
    counters: IdCounters,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store whose counters continue from the given values
    pub fn with_counters(counters: IdCounters) -> Self {
        LibraryStore {
            counters,
            ..Self::default()
        }
    }

    pub fn counters(&self) -> IdCounters {
        self.counters
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    pub fn create_member(&mut self, data: NewMember) -> Result<Member> {
        self.create_member_at(data, Utc::now())
    }

    pub fn create_member_at(&mut self, data: NewMember, now: DateTime<Utc>) -> Result<Member> {
        data.validate()?;

        let id = match data.id {
            Some(id) if self.get_member(id).is_some() => {
                return Err(LibraryError::already_exists(EntityKind::Member, id));
            }
            Some(id) => id,
            None => {
                let members = &self.members;
                allocate_id(&mut self.counters.next_member_id, |id| {
                    members.iter().any(|m| m.id == id)
                })
            }
        };

        let member = Member::from_new(id, data, now);
        self.members.push(member.clone());
        Ok(member)
    }

    pub fn get_member(&self, id: u64) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn all_members(&self) -> &[Member] {
        &self.members
    }

    pub fn update_member(&mut self, id: u64, patch: MemberPatch) -> Option<&Member> {
        let member = self.members.iter_mut().find(|m| m.id == id)?;
        member.apply(patch);
        Some(member)
    }

    /// Profile update from the outside world: validates the patch and only
    /// touches name, age and tier, never the borrowing flag.
    pub fn update_member_profile(&mut self, id: u64, patch: MemberPatch) -> Result<Member> {
        patch.validate()?;

        let profile = MemberPatch {
            has_borrowed: None,
            ..patch
        };
        self.update_member(id, profile)
            .cloned()
            .ok_or_else(|| LibraryError::not_found(EntityKind::Member, id))
    }

    pub fn delete_member(&mut self, id: u64) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    // ------------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------------

    pub fn create_book(&mut self, data: NewBook) -> Result<Book> {
        self.create_book_at(data, Utc::now())
    }

    pub fn create_book_at(&mut self, data: NewBook, now: DateTime<Utc>) -> Result<Book> {
        data.validate()?;

        let id = match data.id {
            Some(id) if self.get_book(id).is_some() => {
                return Err(LibraryError::already_exists(EntityKind::Book, id));
            }
            Some(id) => id,
            None => {
                let books = &self.books;
                allocate_id(&mut self.counters.next_book_id, |id| {
                    books.iter().any(|b| b.id == id)
                })
            }
        };

        let book = Book::from_new(id, data, now);
        self.books.push(book.clone());
        Ok(book)
    }

    pub fn get_book(&self, id: u64) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn all_books(&self) -> &[Book] {
        &self.books
    }

    pub fn update_book(&mut self, id: u64, patch: BookPatch) -> Option<&Book> {
        let book = self.books.iter_mut().find(|b| b.id == id)?;
        book.apply(patch);
        Some(book)
    }

    pub fn delete_book(&mut self, id: u64) -> bool {
        let before = self.books.len();
        self.books.retain(|b| b.id != id);
        self.books.len() != before
    }

    // ------------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------------

    pub fn create_transaction(&mut self, data: NewTransaction) -> Result<Transaction> {
        let id = match data.id {
            Some(id) if self.get_transaction(id).is_some() => {
                return Err(LibraryError::already_exists(EntityKind::Transaction, id));
            }
            Some(id) => id,
            None => {
                let transactions = &self.transactions;
                allocate_id(&mut self.counters.next_transaction_id, |id| {
                    transactions.iter().any(|t| t.id == id)
                })
            }
        };

        let transaction = Transaction::from_new(id, data);
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    pub fn get_transaction(&self, id: u64) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn all_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn update_transaction(&mut self, id: u64, patch: TransactionPatch) -> Option<&Transaction> {
        let transaction = self.transactions.iter_mut().find(|t| t.id == id)?;
        transaction.apply(patch);
        Some(transaction)
    }

    pub fn delete_transaction(&mut self, id: u64) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        self.transactions.len() != before
    }

    pub fn active_transactions(&self) -> Vec<&Transaction> {
        self.transactions.iter().filter(|t| t.is_active()).collect()
    }

    pub fn active_transactions_for_member(&self, member_id: u64) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.is_active() && t.member_id == member_id)
            .collect()
    }

    pub fn active_transactions_for_book(&self, book_id: u64) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.is_active() && t.book_id == book_id)
            .collect()
    }

    /// Every transaction the member ever made, oldest first
    pub fn transactions_for_member(&self, member_id: u64) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.member_id == member_id)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------------

    pub fn create_reservation(&mut self, data: NewReservation) -> Result<Reservation> {
        let id = match data.id.clone() {
            Some(id) if self.get_reservation(&id).is_some() => {
                return Err(LibraryError::already_exists(EntityKind::Reservation, id));
            }
            Some(id) => id,
            None => {
                let reservations = &self.reservations;
                let created_at = data.created_at;
                let seq = allocate_id(&mut self.counters.next_reservation_seq, |seq| {
                    let candidate = format_reservation_id(created_at, seq);
                    reservations.iter().any(|r| r.id == candidate)
                });
                format_reservation_id(created_at, seq)
            }
        };

        let reservation = Reservation::from_new(id, data);
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }

    pub fn get_reservation(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn all_reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn update_reservation(&mut self, id: &str, patch: ReservationPatch) -> Option<&Reservation> {
        let reservation = self.reservations.iter_mut().find(|r| r.id == id)?;
        reservation.apply(patch);
        Some(reservation)
    }

    pub fn delete_reservation(&mut self, id: &str) -> bool {
        let before = self.reservations.len();
        self.reservations.retain(|r| r.id != id);
        self.reservations.len() != before
    }

    /// Pending reservations for a book, highest priority first. Equal
    /// scores keep creation order.
    pub fn pending_reservations_for_book(&self, book_id: u64) -> Vec<&Reservation> {
        let mut pending: Vec<&Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.is_pending() && r.book_id == book_id)
            .collect();
        pending.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        pending
    }

    pub fn pending_reservations_for_member(&self, member_id: u64) -> Vec<&Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.is_pending() && r.member_id == member_id)
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MembershipTier, ReservationStatus, TransactionStatus};

    #[test]
    fn test_sequential_ids() {
        let mut store = LibraryStore::new();

        let a = store.create_member(NewMember::new("Alice", 22)).unwrap();
        let b = store.create_member(NewMember::new("Bob", 30)).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.counters().next_member_id, 3);
        assert!(!a.has_borrowed);
        assert_eq!(a.membership_tier, MembershipTier::Standard);
    }

    #[test]
    fn test_explicit_id_used_and_counter_untouched() {
        let mut store = LibraryStore::new();

        let member = store
            .create_member(NewMember::new("Test User", 25).with_id(999))
            .unwrap();

        assert_eq!(member.id, 999);
        assert_eq!(store.counters().next_member_id, 1);
        assert!(store.get_member(999).is_some());
    }

    #[test]
    fn test_explicit_id_collision() {
        let mut store = LibraryStore::new();
        store
            .create_book(NewBook::new("Dune", "Frank Herbert").with_id(10))
            .unwrap();

        let err = store
            .create_book(NewBook::new("Emma", "Jane Austen").with_id(10))
            .unwrap_err();

        assert_eq!(err, LibraryError::already_exists(EntityKind::Book, 10));
        assert_eq!(store.all_books().len(), 1);
        assert_eq!(store.get_book(10).unwrap().title, "Dune");
    }

    #[test]
    fn test_auto_id_skips_explicitly_claimed() {
        let mut store = LibraryStore::new();
        store
            .create_member(NewMember::new("Explicit", 40).with_id(1))
            .unwrap();

        let auto = store.create_member(NewMember::new("Auto", 40)).unwrap();
        assert_eq!(auto.id, 2);
        // One create, two steps
        assert_eq!(store.counters().next_member_id, 3);

        let next = store.create_member(NewMember::new("Next", 40)).unwrap();
        assert_eq!(next.id, 3);
        assert_eq!(store.counters().next_member_id, 4);
    }

    #[test]
    fn test_failed_validation_does_not_consume_id() {
        let mut store = LibraryStore::new();

        assert!(store.create_member(NewMember::new("Kid", 8)).is_err());
        assert_eq!(store.counters().next_member_id, 1);
        assert!(store.all_members().is_empty());
    }

    #[test]
    fn test_absent_lookups_return_none() {
        let mut store = LibraryStore::new();

        assert!(store.get_member(1).is_none());
        assert!(store.get_book(1).is_none());
        assert!(store.get_transaction(1).is_none());
        assert!(store.get_reservation("RES-0-001").is_none());
        assert!(store.update_member(1, MemberPatch::default()).is_none());
        assert!(!store.delete_book(1));
    }

    #[test]
    fn test_all_members_in_insertion_order() {
        let mut store = LibraryStore::new();
        store.create_member(NewMember::new("C", 20).with_id(30)).unwrap();
        store.create_member(NewMember::new("A", 20).with_id(10)).unwrap();
        store.create_member(NewMember::new("B", 20).with_id(20)).unwrap();

        let ids: Vec<u64> = store.all_members().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = LibraryStore::new();
        let book = store.create_book(NewBook::new("Dune", "Frank Herbert")).unwrap();

        let updated = store
            .update_book(
                book.id,
                BookPatch {
                    rating: Some(4.6),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, book.id);
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.rating, 4.6);
    }

    #[test]
    fn test_profile_update_validates_and_ignores_flags() {
        let mut store = LibraryStore::new();
        let member = store.create_member(NewMember::new("Alice", 22)).unwrap();

        let err = store
            .update_member_profile(
                member.id,
                MemberPatch {
                    age: Some(10),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");

        let updated = store
            .update_member_profile(
                member.id,
                MemberPatch {
                    name: Some("Alice J.".to_string()),
                    has_borrowed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Alice J.");
        assert!(!updated.has_borrowed);

        let missing = store
            .update_member_profile(77, MemberPatch::default())
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_transaction_queries() {
        let mut store = LibraryStore::new();
        let now = Utc::now();

        let t1 = store.create_transaction(NewTransaction::new(1, 101, now)).unwrap();
        store.create_transaction(NewTransaction::new(2, 102, now)).unwrap();
        store.update_transaction(t1.id, TransactionPatch::returned(now));
        store.create_transaction(NewTransaction::new(1, 103, now)).unwrap();

        assert_eq!(store.active_transactions().len(), 2);
        assert_eq!(store.active_transactions_for_member(1).len(), 1);
        assert_eq!(store.active_transactions_for_book(101).len(), 0);
        assert_eq!(store.active_transactions_for_book(102).len(), 1);
        assert_eq!(store.transactions_for_member(1).len(), 2);
        assert_eq!(
            store.get_transaction(t1.id).unwrap().status,
            TransactionStatus::Returned
        );
    }

    #[test]
    fn test_reservation_id_format() {
        let mut store = LibraryStore::new();
        let now = Utc::now();

        let first = store.create_reservation(NewReservation::new(1, 101, now)).unwrap();
        let second = store.create_reservation(NewReservation::new(2, 101, now)).unwrap();

        assert_eq!(first.id, format!("RES-{}-001", now.timestamp_millis()));
        assert_eq!(second.id, format!("RES-{}-002", now.timestamp_millis()));
        assert_eq!(store.counters().next_reservation_seq, 3);
    }

    #[test]
    fn test_pending_reservations_sorted_by_priority_then_creation() {
        let mut store = LibraryStore::new();
        let now = Utc::now();

        let mut scores = Vec::new();
        for (member_id, score) in [(1, 5.0), (2, 9.0), (3, 5.0), (4, 7.0)] {
            let mut data = NewReservation::new(member_id, 101, now);
            data.priority_score = score;
            scores.push(store.create_reservation(data).unwrap());
        }
        let mut other_book = NewReservation::new(5, 202, now);
        other_book.priority_score = 100.0;
        store.create_reservation(other_book).unwrap();

        store.update_reservation(
            &scores[3].id,
            ReservationPatch {
                status: Some(ReservationStatus::Cancelled),
                ..Default::default()
            },
        );

        let order: Vec<u64> = store
            .pending_reservations_for_book(101)
            .iter()
            .map(|r| r.member_id)
            .collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(store.pending_reservations_for_member(4).len(), 0);
        assert_eq!(store.pending_reservations_for_member(1).len(), 1);
    }
}
