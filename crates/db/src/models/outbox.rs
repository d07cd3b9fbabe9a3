//! Outbound task entity model.

use serde::Serialize;
use sqlx::FromRow;

use pawhub_core::types::{DbId, Timestamp};

/// A row from the `outbound_tasks` queue.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboundTask {
    pub id: DbId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
}

/// Task kind: insert an in-app notification row.
pub const TASK_NOTIFICATION: &str = "notification";

/// Task kind: send a transactional email.
pub const TASK_EMAIL: &str = "email";

/// Queue states.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_DEAD: &str = "dead";
