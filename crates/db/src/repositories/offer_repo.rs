//! Repository for the `booking_offers` table.

use sqlx::{PgConnection, PgPool};

use pawhub_core::types::DbId;

use crate::models::offer::BookingOffer;

/// Column list for `booking_offers` queries.
const COLUMNS: &str =
    "id, booking_id, caregiver_id, created_by, unit, price_cents, created_at, updated_at";

/// Provides data access for candidate caregiver offers.
pub struct OfferRepo;

impl OfferRepo {
    /// Create or replace the offer for (booking, caregiver).
    ///
    /// Upsert semantics close the duplicate-offer race: two concurrent
    /// creations for the same pair collapse into one row. Takes a connection
    /// so the engine can hold the booking row lock while it checks the
    /// booking is still pending.
    pub async fn upsert(
        conn: &mut PgConnection,
        booking_id: DbId,
        caregiver_id: DbId,
        created_by: DbId,
        unit: &str,
        price_cents: i64,
    ) -> Result<BookingOffer, sqlx::Error> {
        let query = format!(
            "INSERT INTO booking_offers (booking_id, caregiver_id, created_by, unit, price_cents) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (booking_id, caregiver_id) \
             DO UPDATE SET created_by = EXCLUDED.created_by, unit = EXCLUDED.unit, \
                           price_cents = EXCLUDED.price_cents, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookingOffer>(&query)
            .bind(booking_id)
            .bind(caregiver_id)
            .bind(created_by)
            .bind(unit)
            .bind(price_cents)
            .fetch_one(conn)
            .await
    }

    /// Fetch the offer for an exact (booking, caregiver) pair.
    pub async fn get_for_pair(
        conn: &mut PgConnection,
        booking_id: DbId,
        caregiver_id: DbId,
    ) -> Result<Option<BookingOffer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM booking_offers \
             WHERE booking_id = $1 AND caregiver_id = $2"
        );
        sqlx::query_as::<_, BookingOffer>(&query)
            .bind(booking_id)
            .bind(caregiver_id)
            .fetch_optional(conn)
            .await
    }

    /// List all offers attached to a booking.
    pub async fn list_for_booking(
        pool: &PgPool,
        booking_id: DbId,
    ) -> Result<Vec<BookingOffer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM booking_offers \
             WHERE booking_id = $1 \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, BookingOffer>(&query)
            .bind(booking_id)
            .fetch_all(pool)
            .await
    }

    /// Count offers attached to a booking.
    pub async fn count_for_booking(pool: &PgPool, booking_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM booking_offers WHERE booking_id = $1")
                .bind(booking_id)
                .fetch_one(pool)
                .await?;
        Ok(count.unwrap_or(0))
    }

    /// Delete every offer for a booking.
    ///
    /// Invoked the instant one offer is accepted, inside the accepting
    /// transaction, so the negotiation closes atomically.
    pub async fn delete_all_for_booking(
        conn: &mut PgConnection,
        booking_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM booking_offers WHERE booking_id = $1")
            .bind(booking_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
