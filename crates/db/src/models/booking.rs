//! Booking entity model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use pawhub_core::booking::BookingStatus;
use pawhub_core::types::{DbId, Timestamp};

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub owner_id: DbId,
    pub caregiver_id: Option<DbId>,
    pub service: String,
    pub service_date: NaiveDate,
    pub time_window: String,
    pub start_time: Option<NaiveTime>,
    pub slot_starts_at: Timestamp,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub pet_name: String,
    pub pet_type: String,
    pub contact_preference: String,
    pub message: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub is_recurring: bool,
    pub created_at: Timestamp,
}

impl Booking {
    /// Typed view of the stored status.
    ///
    /// The CHECK constraint makes an unparseable value unreachable in
    /// practice; a corrupted row surfaces as `None` rather than a panic.
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::parse(&self.status)
    }
}

/// Insert payload for a new booking row.
///
/// `status`/`caregiver_id` default to pending/unassigned on the owner
/// submission path; the admin direct-creation path supplies both.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub owner_id: DbId,
    pub caregiver_id: Option<DbId>,
    pub service: String,
    pub service_date: NaiveDate,
    pub time_window: String,
    pub start_time: Option<NaiveTime>,
    pub slot_starts_at: Timestamp,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub pet_name: String,
    pub pet_type: String,
    pub contact_preference: String,
    pub message: Option<String>,
    pub status: BookingStatus,
    pub is_recurring: bool,
}

/// The read-time list partition: the stored status is never rewritten by
/// the passage of time, only the query's classification changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingView {
    Active,
    History,
}
