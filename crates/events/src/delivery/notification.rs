//! In-app notification delivery.
//!
//! The in-app channel is a database write: a row in `notifications` that
//! the `/notifications` endpoints serve back to the user.

use pawhub_db::repositories::NotificationRepo;
use pawhub_db::DbPool;

use crate::outbox::NotificationPayload;

/// Write one in-app notification row from a queued payload.
pub async fn deliver(pool: &DbPool, payload: &NotificationPayload) -> Result<(), sqlx::Error> {
    NotificationRepo::create(
        pool,
        payload.user_id,
        &payload.kind,
        &payload.title,
        &payload.message,
        payload.booking_id,
    )
    .await?;
    Ok(())
}
