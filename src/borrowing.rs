// 📖 Borrowing State Machine - borrow, return, guarded deletes
//
// Per (member, book): no-transaction -> active -> returned.
//
// Every check happens before the first write, so a failed call leaves the
// store exactly as it found it.

use crate::entities::{BookPatch, MemberPatch, NewTransaction, Transaction, TransactionPatch};
use crate::error::{EntityKind, LibraryError, Result};
use crate::store::LibraryStore;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub fn borrow_book(store: &mut LibraryStore, member_id: u64, book_id: u64) -> Result<Transaction> {
    borrow_book_at(store, member_id, book_id, Utc::now())
}

pub fn borrow_book_at(
    store: &mut LibraryStore,
    member_id: u64,
    book_id: u64,
    now: DateTime<Utc>,
) -> Result<Transaction> {
    let member = store
        .get_member(member_id)
        .ok_or_else(|| LibraryError::not_found(EntityKind::Member, member_id))?;
    let book = store
        .get_book(book_id)
        .ok_or_else(|| LibraryError::not_found(EntityKind::Book, book_id))?;

    if member.has_borrowed {
        return Err(LibraryError::MemberAlreadyBorrowing { member_id });
    }
    if !book.is_available {
        return Err(LibraryError::BookUnavailable { book_id });
    }
    let borrowing_count = book.borrowing_count + 1;

    let transaction = store.create_transaction(NewTransaction::new(member_id, book_id, now))?;
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
            borrowing_count: Some(borrowing_count),
            ..Default::default()
        },
    );

    info!(
        transaction_id = transaction.id,
        member_id,
        book_id,
        due_date = %transaction.due_date,
        "book borrowed"
    );
    Ok(transaction)
}

pub fn return_book(store: &mut LibraryStore, member_id: u64, book_id: u64) -> Result<Transaction> {
    return_book_at(store, member_id, book_id, Utc::now())
}

pub fn return_book_at(
    store: &mut LibraryStore,
    member_id: u64,
    book_id: u64,
    now: DateTime<Utc>,
) -> Result<Transaction> {
    if store.get_member(member_id).is_none() {
        return Err(LibraryError::not_found(EntityKind::Member, member_id));
    }
    if store.get_book(book_id).is_none() {
        return Err(LibraryError::not_found(EntityKind::Book, book_id));
    }

    let transaction_id = store
        .active_transactions_for_member(member_id)
        .into_iter()
        .find(|t| t.book_id == book_id)
        .map(|t| t.id)
        .ok_or(LibraryError::NoActiveBorrowing { member_id, book_id })?;

    let transaction = store
        .update_transaction(transaction_id, TransactionPatch::returned(now))
        .cloned()
        .ok_or_else(|| LibraryError::not_found(EntityKind::Transaction, transaction_id))?;
    store.update_member(
        member_id,
        MemberPatch {
            has_borrowed: Some(false),
            ..Default::default()
        },
    );
    store.update_book(
        book_id,
        BookPatch {
            is_available: Some(true),
            ..Default::default()
        },
    );

    info!(transaction_id, member_id, book_id, "book returned");
    Ok(transaction)
}

/// Remove a member who holds no active borrowing
pub fn delete_member(store: &mut LibraryStore, member_id: u64) -> Result<()> {
    if store.get_member(member_id).is_none() {
        return Err(LibraryError::not_found(EntityKind::Member, member_id));
    }
    if !store.active_transactions_for_member(member_id).is_empty() {
        return Err(LibraryError::HasActiveBorrowing {
            kind: EntityKind::Member,
            id: member_id,
        });
    }

    store.delete_member(member_id);
    debug!(member_id, "member deleted");
    Ok(())
}

/// Remove a book that is not currently lent out
pub fn delete_book(store: &mut LibraryStore, book_id: u64) -> Result<()> {
    if store.get_book(book_id).is_none() {
        return Err(LibraryError::not_found(EntityKind::Book, book_id));
    }
    if !store.active_transactions_for_book(book_id).is_empty() {
        return Err(LibraryError::HasActiveBorrowing {
            kind: EntityKind::Book,
            id: book_id,
        });
    }

    store.delete_book(book_id);
    debug!(book_id, "book deleted");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
