// 🎟️ Reservation Workflow - queueing members for borrowed books
//
// Reservations are only for books that are currently lent out; available
// books are borrowed directly. A member may hold at most two pending
// reservations. Score and queue position are fixed at creation.
//
// The creation receipt adds analytics (queue stats, priority factors,
// notification stubs, availability estimate, competing members). They are
// computed per request and never stored.

use crate::entities::{
    NewReservation, Reservation, ReservationPatch, ReservationStatus, ReservationType,
    DEFAULT_MAX_WAIT_DAYS, RESERVATION_TTL_DAYS,
};
use crate::error::{EntityKind, LibraryError, Result};
use crate::priority::{PriorityEngine, PriorityFactors};
use crate::store::LibraryStore;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

/// Pending reservations a single member may hold
pub const MAX_PENDING_RESERVATIONS: usize = 2;

/// Assumed loan length when estimating when a book comes back
const AVERAGE_BORROW_DAYS: i64 = 14;

/// Pickup window starts this many days out when no date was requested
const DEFAULT_PICKUP_LEAD_DAYS: i64 = 7;
const PICKUP_WINDOW_DAYS: i64 = 2;

/// Queues longer than this are reported as fast-moving
const BUSY_QUEUE_THRESHOLD: usize = 5;
const CANCELLATION_RATE: f64 = 0.15;
const MAX_COMPETING_MEMBERS: usize = 2;

// ============================================================================
// REQUEST
// ============================================================================

/// Already-parsed reservation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub member_id: u64,
    pub book_id: u64,
    #[serde(default)]
    pub reservation_type: ReservationType,
    #[serde(default)]
    pub preferred_pickup_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_wait_days: Option<u32>,
    #[serde(default)]
    pub notification_preferences: Option<Value>,
    #[serde(default)]
    pub group_reservation: Option<Value>,
    #[serde(default)]
    pub special_requests: Option<Value>,
    #[serde(default)]
    pub payment_info: Option<Value>,
}

impl ReservationRequest {
    pub fn new(member_id: u64, book_id: u64) -> Self {
        ReservationRequest {
            member_id,
            book_id,
            ..Default::default()
        }
    }

    fn attributes(&self) -> HashMap<String, Value> {
        [
            ("notification_preferences", &self.notification_preferences),
            ("group_reservation", &self.group_reservation),
            ("special_requests", &self.special_requests),
            ("payment_info", &self.payment_info),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
    }
}

// ============================================================================
// RECEIPT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationDetails {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub pickup_window_start: DateTime<Utc>,
    pub pickup_window_end: DateTime<Utc>,
    pub reservation_type: ReservationType,
    pub fee_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueAnalytics {
    pub total_in_queue: usize,
    /// Cosmetic estimate, not derived from data
    pub avg_wait_time_days: u32,
    pub queue_movement_rate: String,
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledNotification {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictResolution {
    /// Cosmetic estimate, not derived from data
    pub simultaneous_requests: u32,
    pub resolution_method: String,
    pub competing_members: Vec<u64>,
}

/// What a successful reservation returns to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationReceipt {
    pub reservation: Reservation,
    pub book_title: String,
    pub estimated_availability_date: DateTime<Utc>,
    pub reservation_details: ReservationDetails,
    pub queue_analytics: QueueAnalytics,
    pub member_priority_factors: PriorityFactors,
    pub notifications_scheduled: Vec<ScheduledNotification>,
    pub conflict_resolution: ConflictResolution,
}

// ============================================================================
// OPERATIONS
// ============================================================================

pub fn create_reservation(
    store: &mut LibraryStore,
    request: ReservationRequest,
) -> Result<ReservationReceipt> {
    create_reservation_at(store, request, Utc::now())
}

pub fn create_reservation_at(
    store: &mut LibraryStore,
    request: ReservationRequest,
    now: DateTime<Utc>,
) -> Result<ReservationReceipt> {
    let member_id = request.member_id;
    let book_id = request.book_id;

    if store.get_member(member_id).is_none() {
        return Err(LibraryError::not_found(EntityKind::Member, member_id));
    }
    let book = store
        .get_book(book_id)
        .ok_or_else(|| LibraryError::not_found(EntityKind::Book, book_id))?;

    let current = store.pending_reservations_for_member(member_id).len();
    if current >= MAX_PENDING_RESERVATIONS {
        return Err(LibraryError::ReservationLimitExceeded {
            current,
            limit: MAX_PENDING_RESERVATIONS,
        });
    }

    if book.is_available {
        return Err(LibraryError::BookAvailable { book_id });
    }
    let book_title = book.title.clone();

    let (pickup_window_start, pickup_window_end) =
        pickup_window(request.preferred_pickup_date, now)?;

    let max_wait_days = request.max_wait_days.unwrap_or(DEFAULT_MAX_WAIT_DAYS);
    if max_wait_days < 1 {
        return Err(LibraryError::validation(
            "max_wait_days",
            "must be a positive number",
        ));
    }

    // All derived dates are built before the insert; the expiry is added
    // to `now` by `Reservation::from_new`.
    if days_after(now, RESERVATION_TTL_DAYS).is_none() {
        return Err(clock_out_of_range());
    }
    let estimated_availability_date =
        estimated_availability(store, book_id, now).ok_or_else(clock_out_of_range)?;
    let notifications_scheduled = schedule_notifications(now).ok_or_else(clock_out_of_range)?;

    // Snapshot score and position before the new entry joins the queue
    let engine = PriorityEngine::new(store);
    let factors = engine
        .factors(member_id)
        .ok_or_else(|| LibraryError::not_found(EntityKind::Member, member_id))?;
    let queue_position = engine.queue_position(book_id);

    let reservation = store.create_reservation(NewReservation {
        id: None,
        member_id,
        book_id,
        reservation_type: request.reservation_type,
        created_at: now,
        priority_score: factors.priority_score,
        queue_position,
        preferred_pickup_date: request.preferred_pickup_date,
        max_wait_days,
        attributes: request.attributes(),
    })?;

    info!(
        reservation_id = %reservation.id,
        member_id,
        book_id,
        queue_position,
        priority_score = reservation.priority_score,
        "reservation created"
    );

    let fee_paid = request
        .payment_info
        .as_ref()
        .and_then(|info| info.get("premium_fee"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Ok(ReservationReceipt {
        book_title,
        estimated_availability_date,
        reservation_details: ReservationDetails {
            created_at: reservation.created_at,
            expires_at: reservation.expires_at,
            pickup_window_start,
            pickup_window_end,
            reservation_type: reservation.reservation_type,
            fee_paid,
        },
        queue_analytics: queue_analytics(store, book_id),
        member_priority_factors: factors,
        notifications_scheduled,
        conflict_resolution: conflict_resolution(store, book_id, member_id),
        reservation,
    })
}

pub fn get_reservation(store: &LibraryStore, reservation_id: &str) -> Result<Reservation> {
    store
        .get_reservation(reservation_id)
        .cloned()
        .ok_or_else(|| LibraryError::not_found(EntityKind::Reservation, reservation_id))
}

/// One-way transition to `Cancelled`. Other members' stored queue
/// positions are left untouched.
pub fn cancel_reservation(store: &mut LibraryStore, reservation_id: &str) -> Result<Reservation> {
    let reservation = get_reservation(store, reservation_id)?;
    if reservation.status == ReservationStatus::Cancelled {
        return Err(LibraryError::AlreadyCancelled {
            reservation_id: reservation_id.to_string(),
        });
    }

    let cancelled = store
        .update_reservation(
            reservation_id,
            ReservationPatch {
                status: Some(ReservationStatus::Cancelled),
                ..Default::default()
            },
        )
        .cloned()
        .ok_or_else(|| LibraryError::not_found(EntityKind::Reservation, reservation_id))?;

    info!(reservation_id, member_id = cancelled.member_id, "reservation cancelled");
    Ok(cancelled)
}

// ============================================================================
// HELPERS
// ============================================================================

fn days_after(at: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    at.checked_add_signed(Duration::days(days))
}

fn clock_out_of_range() -> LibraryError {
    LibraryError::validation("created_at", "is out of the supported date range")
}

/// Start and end of the pickup window. A requested date must be in the
/// future, on a weekday, and leave room for the whole window.
fn pickup_window(
    preferred: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let too_far = || LibraryError::validation("preferred_pickup_date", "is too far in the future");

    let Some(pickup) = preferred else {
        let start = days_after(now, DEFAULT_PICKUP_LEAD_DAYS).ok_or_else(clock_out_of_range)?;
        let end = days_after(start, PICKUP_WINDOW_DAYS).ok_or_else(clock_out_of_range)?;
        return Ok((start, end));
    };

    if pickup < now {
        return Err(LibraryError::InvalidPickupDate);
    }
    let end = days_after(pickup, PICKUP_WINDOW_DAYS).ok_or_else(too_far)?;

    if matches!(pickup.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(LibraryError::LibraryClosed {
            suggested_dates: [1, 2]
                .into_iter()
                .filter_map(|days| days_after(pickup, days))
                .collect(),
        });
    }

    Ok((pickup, end))
}

/// Tomorrow when nobody holds the book, otherwise one average loan away.
/// `None` when `now` is too close to the end of the calendar.
pub fn estimated_availability(
    store: &LibraryStore,
    book_id: u64,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if store.active_transactions_for_book(book_id).is_empty() {
        days_after(now, 1)
    } else {
        days_after(now, AVERAGE_BORROW_DAYS)
    }
}

fn queue_analytics(store: &LibraryStore, book_id: u64) -> QueueAnalytics {
    let total_in_queue = store.pending_reservations_for_book(book_id).len();

    QueueAnalytics {
        total_in_queue,
        avg_wait_time_days: rand::thread_rng().gen_range(3..=12),
        queue_movement_rate: if total_in_queue > BUSY_QUEUE_THRESHOLD {
            "high".to_string()
        } else {
            "moderate".to_string()
        },
        cancellation_rate: CANCELLATION_RATE,
    }
}

fn schedule_notifications(now: DateTime<Utc>) -> Option<Vec<ScheduledNotification>> {
    Some(vec![
        ScheduledNotification {
            notification_type: "queue_position_update".to_string(),
            scheduled_for: days_after(now, 1)?,
        },
        ScheduledNotification {
            notification_type: "availability_alert".to_string(),
            scheduled_for: days_after(now, DEFAULT_PICKUP_LEAD_DAYS)?,
        },
    ])
}

fn conflict_resolution(store: &LibraryStore, book_id: u64, member_id: u64) -> ConflictResolution {
    let competing_members = store
        .pending_reservations_for_book(book_id)
        .into_iter()
        .filter(|r| r.member_id != member_id)
        .take(MAX_COMPETING_MEMBERS)
        .map(|r| r.member_id)
        .collect();

    ConflictResolution {
        simultaneous_requests: rand::thread_rng().gen_range(1..=3),
        resolution_method: "priority_score".to_string(),
        competing_members,
    }
}

// ============================================================================
// TESTS
// ============================================================================
