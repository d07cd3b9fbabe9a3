//! Route definitions for the owner-facing `/bookings` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::booking;
use crate::state::AppState;

/// Routes mounted at `/bookings`.
///
/// ```text
/// POST   /        -> create_booking
/// GET    /        -> list_bookings
/// GET    /{id}    -> get_booking
/// PATCH  /{id}    -> patch_booking (accept offer / confirm assignment)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(booking::list_bookings).post(booking::create_booking),
        )
        .route(
            "/{id}",
            get(booking::get_booking).patch(booking::patch_booking),
        )
}
