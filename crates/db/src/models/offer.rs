//! Booking offer entity model.

use serde::Serialize;
use sqlx::FromRow;

use pawhub_core::types::{DbId, Timestamp};

/// A row from the `booking_offers` table: a candidate (caregiver, price)
/// proposal awaiting owner selection.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingOffer {
    pub id: DbId,
    pub booking_id: DbId,
    pub caregiver_id: DbId,
    /// The admin who proposed this candidate; acceptance notices go back to
    /// them rather than to every admin.
    pub created_by: DbId,
    pub unit: String,
    pub price_cents: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
