//! Notification entity model.

use serde::Serialize;
use sqlx::FromRow;

use pawhub_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub booking_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Notification kind written when a caregiver is committed to a booking.
pub const KIND_ASSIGNMENT: &str = "assignment";

/// Notification kind written when a booking is confirmed by the owner.
pub const KIND_CONFIRMATION: &str = "confirmation";

/// Notification kind written when a booking is deleted.
pub const KIND_CANCELLED: &str = "cancelled";
