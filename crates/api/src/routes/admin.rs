//! Route definitions for the `/admin/bookings` resource. Admin only.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::admin_booking;
use crate::state::AppState;

/// Routes mounted at `/admin/bookings`.
///
/// ```text
/// GET    /               -> list_bookings
/// POST   /               -> create_bookings (direct/bulk)
/// PATCH  /{id}           -> patch_booking (assign / complete / archive / notes)
/// DELETE /{id}           -> delete_booking (cancellation)
/// GET    /{id}/offers    -> list_offers
/// POST   /{id}/offers    -> create_offer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(admin_booking::list_bookings).post(admin_booking::create_bookings),
        )
        .route(
            "/{id}",
            patch(admin_booking::patch_booking).delete(admin_booking::delete_booking),
        )
        .route(
            "/{id}/offers",
            get(admin_booking::list_offers).post(admin_booking::create_offer),
        )
}
