//! Background consumer of the durable `outbound_tasks` queue.
//!
//! The dispatch engine enqueues tasks in the same transaction that commits a
//! booking transition; [`OutboxDispatcher`] delivers them afterwards,
//! at-least-once. A failing channel never rolls back or blocks a committed
//! transition -- the task is retried and eventually parked as 'dead' with its
//! last error kept for inspection.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use pawhub_core::types::DbId;
use pawhub_db::models::outbox::{OutboundTask, TASK_EMAIL, TASK_NOTIFICATION};
use pawhub_db::repositories::{OutboxRepo, RateLimitRepo};
use pawhub_db::DbPool;

use crate::delivery::{email::EmailDelivery, notification};

/// How often the queue is polled.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Tasks fetched per poll.
const BATCH_SIZE: i64 = 50;

/// Delivery attempts before a task is dead-lettered.
const MAX_ATTEMPTS: i32 = 5;

/// Rate-limit ledger rows older than this are pruned alongside the polls.
const LEDGER_RETENTION_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Task payloads
// ---------------------------------------------------------------------------

/// Payload for a `notification` task: one in-app notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub booking_id: Option<DbId>,
}

/// Payload for an `email` task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

// ---------------------------------------------------------------------------
// OutboxDispatcher
// ---------------------------------------------------------------------------

/// Background service draining the outbound task queue.
pub struct OutboxDispatcher {
    pool: DbPool,
    /// `None` when SMTP is not configured; email tasks are then logged and
    /// marked delivered as no-ops instead of retrying forever.
    email: Option<EmailDelivery>,
}

impl OutboxDispatcher {
    pub fn new(pool: DbPool, email: Option<EmailDelivery>) -> Self {
        Self { pool, email }
    }

    /// Run the dispatch loop until the token is cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox dispatcher shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.drain_once().await;
                    self.prune_ledger().await;
                }
            }
        }
    }

    /// Deliver one batch of pending tasks.
    ///
    /// Each task succeeds or fails independently; a poisoned payload counts
    /// as a failed attempt like any other error so it dead-letters instead
    /// of wedging the queue.
    pub async fn drain_once(&self) {
        let tasks = match OutboxRepo::claim_pending(&self.pool, BATCH_SIZE).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch pending outbound tasks");
                return;
            }
        };

        for task in tasks {
            let task_id = task.id;
            match self.deliver(&task).await {
                Ok(()) => {
                    if let Err(e) = OutboxRepo::mark_delivered(&self.pool, task_id).await {
                        tracing::error!(task_id, error = %e, "Failed to mark task delivered");
                    }
                }
                Err(reason) => {
                    tracing::warn!(task_id, kind = %task.kind, error = %reason, "Outbound delivery failed");
                    if let Err(e) =
                        OutboxRepo::record_failure(&self.pool, task_id, &reason, MAX_ATTEMPTS)
                            .await
                    {
                        tracing::error!(task_id, error = %e, "Failed to record delivery failure");
                    }
                }
            }
        }
    }

    /// Deliver a single task over its channel.
    async fn deliver(&self, task: &OutboundTask) -> Result<(), String> {
        match task.kind.as_str() {
            TASK_NOTIFICATION => {
                let payload: NotificationPayload =
                    serde_json::from_value(task.payload.clone())
                        .map_err(|e| format!("bad notification payload: {e}"))?;
                notification::deliver(&self.pool, &payload)
                    .await
                    .map_err(|e| e.to_string())
            }
            TASK_EMAIL => {
                let payload: EmailPayload = serde_json::from_value(task.payload.clone())
                    .map_err(|e| format!("bad email payload: {e}"))?;
                match &self.email {
                    Some(email) => email
                        .send(
                            &payload.to,
                            &payload.subject,
                            &payload.body,
                            payload.reply_to.as_deref(),
                        )
                        .await
                        .map_err(|e| e.to_string()),
                    None => {
                        tracing::warn!(to = %payload.to, subject = %payload.subject,
                            "SMTP not configured, dropping email task");
                        Ok(())
                    }
                }
            }
            other => Err(format!("unknown task kind: {other}")),
        }
    }

    async fn prune_ledger(&self) {
        let cutoff = Utc::now() - chrono::Duration::hours(LEDGER_RETENTION_HOURS);
        if let Err(e) = RateLimitRepo::prune_before(&self.pool, cutoff).await {
            tracing::error!(error = %e, "Failed to prune rate-limit ledger");
        }
    }
}
