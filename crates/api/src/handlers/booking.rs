//! Handlers for the owner-facing `/bookings` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use pawhub_core::error::CoreError;
use pawhub_core::roles::{ROLE_ADMIN, ROLE_OWNER};
use pawhub_core::slot;
use pawhub_core::submission::BookingSubmission;
use pawhub_core::types::DbId;
use pawhub_db::models::booking::{Booking, BookingView};
use pawhub_db::repositories::BookingRepo;

use crate::engine::DispatchEngine;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::RateDecision;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for booking listing.
#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    /// `active` (default) or `history`.
    pub view: Option<BookingView>,
}

fn require_owner(auth: &AuthUser) -> AppResult<()> {
    if auth.role != ROLE_OWNER {
        return Err(AppError::Core(CoreError::Forbidden(
            "Owner role required".into(),
        )));
    }
    Ok(())
}

/// POST /api/v1/bookings
///
/// Owner submission path: honeypot short-circuit, rate limit, field
/// validation, then a pending unassigned booking.
///
/// A tripped honeypot returns the same success envelope as a real
/// submission, without a row, so form bots cannot tell they were dropped.
pub async fn create_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(submission): Json<BookingSubmission>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    require_owner(&auth)?;

    if submission.is_spam() {
        tracing::info!(owner_id = auth.user_id, "Honeypot tripped, dropping submission");
        return Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": { "status": "received" } })),
        ));
    }

    match state.rate_limiter.check(&state.pool, auth.user_id).await {
        RateDecision::Allowed => {}
        RateDecision::Limited { retry_after_secs } => {
            return Err(AppError::RateLimited { retry_after_secs });
        }
    }

    let normalized = submission
        .normalize()
        .map_err(|fields| AppError::Core(CoreError::Validation(fields)))?;

    let booking = DispatchEngine::create_booking(&state, auth.user_id, normalized).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": booking })),
    ))
}

/// GET /api/v1/bookings?view=active|history
///
/// List the authenticated owner's bookings in one view partition.
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookingListQuery>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    require_owner(&auth)?;
    let view = params.view.unwrap_or(BookingView::Active);
    let cutoff = slot::history_cutoff(slot::today());
    let bookings = BookingRepo::list_for_owner(&state.pool, auth.user_id, view, cutoff).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/bookings/{id}
///
/// Fetch one booking. Owners see their own; admins see any.
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = BookingRepo::get(&state.pool, booking_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        }))?;

    if auth.role != ROLE_ADMIN && booking.owner_id != auth.user_id {
        // Hide other owners' bookings entirely.
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        }));
    }

    Ok(Json(DataResponse { data: booking }))
}

/// PATCH body for the owner path. Exactly two combinations are legal.
#[derive(Debug, Deserialize)]
pub struct OwnerPatch {
    pub caregiver_id: Option<DbId>,
    pub status: Option<String>,
}

/// PATCH /api/v1/bookings/{id}
///
/// - `{ "caregiver_id": N }` accepts caregiver N's offer (pending booking).
/// - `{ "status": "confirmed" }` confirms an admin-made assignment.
///
/// Any other combination is rejected; status changes never ride along on
/// field updates.
pub async fn patch_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
    Json(patch): Json<OwnerPatch>,
) -> AppResult<Json<DataResponse<Booking>>> {
    require_owner(&auth)?;

    let booking = match (patch.caregiver_id, patch.status.as_deref()) {
        (Some(caregiver_id), None) => {
            DispatchEngine::owner_accept_offer(&state, auth.user_id, booking_id, caregiver_id)
                .await?
        }
        (None, Some("confirmed")) => {
            DispatchEngine::owner_confirm_assignment(&state, auth.user_id, booking_id).await?
        }
        _ => {
            return Err(AppError::BadRequest(
                "Provide either caregiver_id (accept offer) or status=confirmed".into(),
            ))
        }
    };

    Ok(Json(DataResponse { data: booking }))
}
