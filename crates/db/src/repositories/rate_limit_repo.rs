//! Repository for the `booking_request_log` rate-limit ledger.

use sqlx::PgPool;

use pawhub_core::types::{DbId, Timestamp};

/// Provides the persistent (primary) booking-creation rate limiter state.
pub struct RateLimitRepo;

impl RateLimitRepo {
    /// Record one creation attempt and return the attempt count within the
    /// window, including this one.
    ///
    /// Insert and count run in one transaction so two concurrent attempts
    /// each observe the other once committed.
    pub async fn record_and_count(
        pool: &PgPool,
        owner_id: DbId,
        window_start: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT INTO booking_request_log (owner_id) VALUES ($1)")
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM booking_request_log \
             WHERE owner_id = $1 AND requested_at >= $2",
        )
        .bind(owner_id)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(count.unwrap_or(0))
    }

    /// Drop ledger rows older than the cutoff. Called opportunistically by
    /// the dispatcher loop; the table stays small.
    pub async fn prune_before(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM booking_request_log WHERE requested_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
