//! Repository for the `outbound_tasks` queue.

use sqlx::{PgConnection, PgPool};

use pawhub_core::types::DbId;

use crate::models::outbox::OutboundTask;

/// Column list for `outbound_tasks` queries.
const COLUMNS: &str =
    "id, kind, payload, status, attempts, last_error, created_at, delivered_at";

/// Provides access to the append-only outbound side-effect queue.
pub struct OutboxRepo;

impl OutboxRepo {
    /// Append a task, normally inside the transaction that commits the
    /// booking transition the task belongs to.
    pub async fn enqueue(
        conn: &mut PgConnection,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO outbound_tasks (kind, payload) VALUES ($1, $2) RETURNING id",
        )
        .bind(kind)
        .bind(payload)
        .fetch_one(conn)
        .await
    }

    /// Fetch a batch of pending tasks for delivery.
    ///
    /// The dispatcher is a single background consumer per process; delivery
    /// is at-least-once, so a task re-fetched after a crash is redelivered
    /// rather than lost.
    pub async fn claim_pending(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<OutboundTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM outbound_tasks \
             WHERE status = 'pending' \
             ORDER BY id \
             LIMIT $1"
        );
        sqlx::query_as::<_, OutboundTask>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark a task delivered.
    pub async fn mark_delivered(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE outbound_tasks \
             SET status = 'delivered', delivered_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a delivery failure.
    ///
    /// Increments the attempt counter and keeps the task pending for another
    /// try; once `max_attempts` is reached the task is parked as 'dead' with
    /// the final error retained (dead-letter).
    pub async fn record_failure(
        pool: &PgPool,
        id: DbId,
        error: &str,
        max_attempts: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE outbound_tasks \
             SET attempts = attempts + 1, \
                 last_error = $2, \
                 status = CASE WHEN attempts + 1 >= $3 THEN 'dead' ELSE 'pending' END \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(max_attempts)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count tasks by queue status (used by tests and ops tooling).
    pub async fn count_by_status(pool: &PgPool, status: &str) -> Result<i64, sqlx::Error> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM outbound_tasks WHERE status = $1")
                .bind(status)
                .fetch_one(pool)
                .await?;
        Ok(count.unwrap_or(0))
    }
}
