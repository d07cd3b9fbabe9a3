//! Conversation entity model.

use serde::Serialize;
use sqlx::FromRow;

use pawhub_core::types::{DbId, Timestamp};

/// A row from the `conversations` table. One per booking; activated by the
/// dispatch engine when a caregiver becomes committed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub booking_id: DbId,
    pub owner_id: DbId,
    pub caregiver_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
