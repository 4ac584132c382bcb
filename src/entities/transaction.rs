// 🔁 Transaction Entity - one borrow of one book by one member
//
// Immutable once created except for the return event, which sets
// `returned_at` and flips the status to `Returned`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Loan period in days
pub const LOAN_PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    Returned,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "active",
            TransactionStatus::Returned => "returned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub member_id: u64,
    pub book_id: u64,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub id: Option<u64>,
    pub member_id: u64,
    pub book_id: u64,
    pub borrowed_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(member_id: u64, book_id: u64, borrowed_at: DateTime<Utc>) -> Self {
        NewTransaction {
            id: None,
            member_id,
            book_id,
            borrowed_at,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// The only mutation a transaction supports: the return event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub returned_at: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
}

impl TransactionPatch {
    pub fn returned(at: DateTime<Utc>) -> Self {
        TransactionPatch {
            returned_at: Some(at),
            status: Some(TransactionStatus::Returned),
        }
    }
}

impl Transaction {
    pub fn from_new(id: u64, data: NewTransaction) -> Self {
        Transaction {
            id,
            member_id: data.member_id,
            book_id: data.book_id,
            borrowed_at: data.borrowed_at,
            due_date: data.borrowed_at + Duration::days(LOAN_PERIOD_DAYS),
            returned_at: None,
            status: TransactionStatus::Active,
        }
    }

    pub fn apply(&mut self, patch: TransactionPatch) {
        if let Some(returned_at) = patch.returned_at {
            self.returned_at = Some(returned_at);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Returned on or before the due date
    pub fn returned_on_time(&self) -> Option<bool> {
        match (self.status, self.returned_at) {
            (TransactionStatus::Returned, Some(at)) => Some(at <= self.due_date),
            _ => None,
        }
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }
}
