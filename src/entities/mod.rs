// Entity Models
//
// Each entity has:
// - A stable identifier that no update can change
// - A "New*" creation input (optional explicit id)
// - A "*Patch" update input listing only the mutable fields

pub mod member;
pub mod book;
pub mod transaction;
pub mod reservation;

pub use member::{Member, MemberPatch, MembershipTier, NewMember, MINIMUM_MEMBER_AGE};
pub use book::{Book, BookPatch, NewBook, DEFAULT_CATEGORY, MAX_RATING};
pub use transaction::{
    NewTransaction, Transaction, TransactionPatch, TransactionStatus, LOAN_PERIOD_DAYS,
};
pub use reservation::{
    NewReservation, Reservation, ReservationPatch, ReservationStatus, ReservationType,
    DEFAULT_MAX_WAIT_DAYS, RESERVATION_TTL_DAYS,
};
