// ⚖️ Priority Engine - who gets a reserved book first
//
// score = (0.3 * frequency + 0.4 * punctuality + 0.3 * tier_weight) * 10
//
// - frequency: every transaction the member ever made (not normalized)
// - punctuality: share of returned transactions returned by the due date,
//   0.5 when nothing has been returned yet
// - tier_weight: 1.5 for gold, 1.0 otherwise

use crate::entities::{MembershipTier, Transaction};
use crate::store::LibraryStore;
use serde::{Deserialize, Serialize};

pub const FREQUENCY_WEIGHT: f64 = 0.3;
pub const PUNCTUALITY_WEIGHT: f64 = 0.4;
pub const TIER_WEIGHT: f64 = 0.3;
pub const SCORE_SCALE: f64 = 10.0;

/// Punctuality assumed for members with no returns yet
pub const NEUTRAL_PUNCTUALITY: f64 = 0.5;

/// Borrow count at which normalized frequency saturates
const FREQUENCY_SATURATION: f64 = 10.0;

/// Breakdown of the inputs behind a member's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityFactors {
    pub member_id: u64,
    /// Raw transaction count
    pub total_borrowings: usize,
    /// `min(1, total_borrowings / 10)`
    pub borrowing_frequency: f64,
    pub return_punctuality: f64,
    pub membership_tier: MembershipTier,
    pub tier_weight: f64,
    pub priority_score: f64,
}

pub struct PriorityEngine<'a> {
    store: &'a LibraryStore,
}

impl<'a> PriorityEngine<'a> {
    pub fn new(store: &'a LibraryStore) -> Self {
        PriorityEngine { store }
    }

    /// Priority score for a member; 0 when the member does not exist
    pub fn priority_score(&self, member_id: u64) -> f64 {
        self.factors(member_id)
            .map(|f| f.priority_score)
            .unwrap_or(0.0)
    }

    pub fn factors(&self, member_id: u64) -> Option<PriorityFactors> {
        let member = self.store.get_member(member_id)?;
        let history = self.store.transactions_for_member(member_id);

        let total_borrowings = history.len();
        let return_punctuality = return_punctuality(&history);
        let tier_weight = member.membership_tier.weight();

        Some(PriorityFactors {
            member_id,
            total_borrowings,
            borrowing_frequency: (total_borrowings as f64 / FREQUENCY_SATURATION).min(1.0),
            return_punctuality,
            membership_tier: member.membership_tier,
            tier_weight,
            priority_score: compose_score(total_borrowings as f64, return_punctuality, tier_weight),
        })
    }

    /// Position a new reservation for `book_id` would take right now:
    /// one past the current pending entries, whatever its own score.
    pub fn queue_position(&self, book_id: u64) -> u32 {
        self.store.pending_reservations_for_book(book_id).len() as u32 + 1
    }
}

pub fn compose_score(frequency: f64, punctuality: f64, tier_weight: f64) -> f64 {
    (frequency * FREQUENCY_WEIGHT + punctuality * PUNCTUALITY_WEIGHT + tier_weight * TIER_WEIGHT)
        * SCORE_SCALE
}

pub fn return_punctuality(transactions: &[&Transaction]) -> f64 {
    let returned: Vec<bool> = transactions
        .iter()
        .filter_map(|t| t.returned_on_time())
        .collect();

    if returned.is_empty() {
        return NEUTRAL_PUNCTUALITY;
    }

    let on_time = returned.iter().filter(|on_time| **on_time).count();
    on_time as f64 / returned.len() as f64
}
