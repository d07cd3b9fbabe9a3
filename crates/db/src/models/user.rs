//! User entity model.

use serde::Serialize;
use sqlx::FromRow;

use pawhub_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: Timestamp,
}
