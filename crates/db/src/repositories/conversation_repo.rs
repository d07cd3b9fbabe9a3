//! Repository for the `conversations` table.

use sqlx::{PgConnection, PgPool};

use pawhub_core::types::DbId;

use crate::models::conversation::Conversation;

/// Column list for `conversations` queries.
const COLUMNS: &str = "id, booking_id, owner_id, caregiver_id, status, created_at, updated_at";

/// Provides data access for booking conversation channels.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Activate the conversation for a booking.
    ///
    /// Idempotent upsert keyed on `booking_id`: re-activating an existing
    /// channel (e.g. after a re-assignment) swaps the caregiver and unlocks
    /// it rather than creating a second row.
    pub async fn activate(
        conn: &mut PgConnection,
        booking_id: DbId,
        owner_id: DbId,
        caregiver_id: DbId,
    ) -> Result<Conversation, sqlx::Error> {
        let query = format!(
            "INSERT INTO conversations (booking_id, owner_id, caregiver_id, status) \
             VALUES ($1, $2, $3, 'active') \
             ON CONFLICT (booking_id) \
             DO UPDATE SET caregiver_id = EXCLUDED.caregiver_id, status = 'active', \
                           updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(booking_id)
            .bind(owner_id)
            .bind(caregiver_id)
            .fetch_one(conn)
            .await
    }

    /// Fetch the conversation for a booking, if one has been activated.
    pub async fn get_for_booking(
        pool: &PgPool,
        booking_id: DbId,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversations WHERE booking_id = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(booking_id)
            .fetch_optional(pool)
            .await
    }
}
