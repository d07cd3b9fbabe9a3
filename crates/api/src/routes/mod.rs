pub mod admin;
pub mod booking;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bookings                         create (owner), list (owner)
/// /bookings/{id}                    get, patch (owner accept/confirm)
///
/// /admin/bookings                   list, direct/bulk create (admin only)
/// /admin/bookings/{id}              patch, delete
/// /admin/bookings/{id}/offers       list, create
///
/// /notifications                    list (any authenticated user)
/// /notifications/read-all           mark all read
/// /notifications/unread-count       unread count
/// /notifications/{id}/read          mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking::router())
        .nest("/admin/bookings", admin::router())
        .nest("/notifications", notification::router())
}
