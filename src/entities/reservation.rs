// 🎫 Reservation Entity - a member waiting for a borrowed book
//
// Priority score and queue position are snapshots taken when the
// reservation is created; neither is recomputed afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Days until a pending reservation expires
pub const RESERVATION_TTL_DAYS: i64 = 14;

/// Default `max_wait_days` when the request omits it
pub const DEFAULT_MAX_WAIT_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    #[default]
    Standard,
    Premium,
    Group,
}

impl ReservationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationType::Standard => "standard",
            ReservationType::Premium => "premium",
            ReservationType::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Cancelled,
    Fulfilled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Fulfilled => "fulfilled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub member_id: u64,
    pub book_id: u64,
    pub reservation_type: ReservationType,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub priority_score: f64,
    pub queue_position: u32,
    pub preferred_pickup_date: Option<DateTime<Utc>>,
    pub max_wait_days: u32,

    /// Caller-supplied extras (notification_preferences, special_requests,
    /// payment_info, group_reservation). Stored and echoed, never interpreted.
    #[serde(default)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub id: Option<String>,
    pub member_id: u64,
    pub book_id: u64,
    pub reservation_type: ReservationType,
    pub created_at: DateTime<Utc>,
    pub priority_score: f64,
    pub queue_position: u32,
    pub preferred_pickup_date: Option<DateTime<Utc>>,
    pub max_wait_days: u32,
    pub attributes: HashMap<String, serde_json::Value>,
}

impl NewReservation {
    pub fn new(member_id: u64, book_id: u64, created_at: DateTime<Utc>) -> Self {
        NewReservation {
            id: None,
            member_id,
            book_id,
            reservation_type: ReservationType::Standard,
            created_at,
            priority_score: 0.0,
            queue_position: 1,
            preferred_pickup_date: None,
            max_wait_days: DEFAULT_MAX_WAIT_DAYS,
            attributes: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationPatch {
    pub status: Option<ReservationStatus>,
    pub preferred_pickup_date: Option<DateTime<Utc>>,
    pub max_wait_days: Option<u32>,
}

impl Reservation {
    pub fn from_new(id: String, data: NewReservation) -> Self {
        Reservation {
            id,
            member_id: data.member_id,
            book_id: data.book_id,
            reservation_type: data.reservation_type,
            status: ReservationStatus::Pending,
            created_at: data.created_at,
            expires_at: data.created_at + Duration::days(RESERVATION_TTL_DAYS),
            priority_score: data.priority_score,
            queue_position: data.queue_position,
            preferred_pickup_date: data.preferred_pickup_date,
            max_wait_days: data.max_wait_days,
            attributes: data.attributes,
        }
    }

    pub fn apply(&mut self, patch: ReservationPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = patch.preferred_pickup_date {
            self.preferred_pickup_date = Some(date);
        }
        if let Some(days) = patch.max_wait_days {
            self.max_wait_days = days;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReservationStatus::Pending
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}
