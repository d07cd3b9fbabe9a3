//! Handlers for the `/admin/bookings` resource. Admin only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use pawhub_core::booking::BookingStatus;
use pawhub_core::error::{CoreError, FieldErrors};
use pawhub_core::slot;
use pawhub_core::submission::BookingSubmission;
use pawhub_core::types::DbId;
use pawhub_db::models::booking::{Booking, BookingView};
use pawhub_db::models::offer::BookingOffer;
use pawhub_db::repositories::{BookingRepo, OfferRepo};

use crate::engine::dispatch::DirectBooking;
use crate::engine::DispatchEngine;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default page size for the admin booking list.
const DEFAULT_LIMIT: i64 = 100;

/// Maximum page size for the admin booking list.
const MAX_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Query parameters for `GET /admin/bookings`.
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub view: Option<BookingView>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/admin/bookings?view&limit&offset
pub async fn list_bookings(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AdminListQuery>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    let view = params.view.unwrap_or(BookingView::Active);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let cutoff = slot::history_cutoff(slot::today());
    let bookings = BookingRepo::list(&state.pool, view, cutoff, limit, offset).await?;
    Ok(Json(DataResponse { data: bookings }))
}

// ---------------------------------------------------------------------------
// Direct creation
// ---------------------------------------------------------------------------

/// One item on the direct/bulk creation path: a regular submission plus the
/// owner to book for and an optional committed caregiver/status.
#[derive(Debug, Deserialize)]
pub struct AdminBookingItem {
    pub owner_id: DbId,
    pub caregiver_id: Option<DbId>,
    /// Defaults to `pending`.
    pub status: Option<String>,
    #[serde(flatten)]
    pub submission: BookingSubmission,
}

/// Request body for `POST /admin/bookings`.
#[derive(Debug, Deserialize)]
pub struct AdminCreateRequest {
    pub items: Vec<AdminBookingItem>,
}

/// POST /api/v1/admin/bookings
///
/// Direct/bulk creation: admins entering phone or walk-in bookings, with a
/// caregiver already committed when known. All-or-nothing; validation errors
/// come back keyed `items[i].field`.
pub async fn create_bookings(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<AdminCreateRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Booking>>>)> {
    if request.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }

    let mut errors = FieldErrors::new();
    let mut items = Vec::with_capacity(request.items.len());
    for (i, item) in request.items.iter().enumerate() {
        let status = match item.status.as_deref() {
            None => Some(BookingStatus::Pending),
            Some(raw) => {
                let parsed = BookingStatus::parse(raw);
                if parsed.is_none() {
                    errors.push(format!("items[{i}].status"), "unknown booking status");
                }
                parsed
            }
        };
        let normalized = match item.submission.normalize() {
            Ok(normalized) => Some(normalized),
            Err(item_errors) => {
                for (field, message) in item_errors.0 {
                    errors.push(format!("items[{i}].{field}"), message);
                }
                None
            }
        };
        if let (Some(status), Some(normalized)) = (status, normalized) {
            items.push(DirectBooking {
                owner_id: item.owner_id,
                caregiver_id: item.caregiver_id,
                status,
                normalized,
            });
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Core(CoreError::Validation(errors)));
    }

    let created = DispatchEngine::create_direct(&state, admin.user_id, items).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// Patch / delete
// ---------------------------------------------------------------------------

/// PATCH body for the admin path.
#[derive(Debug, Deserialize)]
pub struct AdminPatch {
    pub caregiver_id: Option<DbId>,
    pub status: Option<String>,
    /// Present: replace the annotation. An empty string clears it.
    pub admin_notes: Option<String>,
}

/// PATCH /api/v1/admin/bookings/{id}
///
/// - `caregiver_id` (with optional `status` override) assigns a caregiver.
/// - `status` alone drives the terminal transitions (`completed`,
///   `archived`).
/// - `admin_notes` updates the annotation and can combine with either.
pub async fn patch_booking(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
    Json(patch): Json<AdminPatch>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let status = match patch.status.as_deref() {
        None => None,
        Some(raw) => Some(BookingStatus::parse(raw).ok_or_else(|| {
            AppError::Core(CoreError::field("status", "unknown booking status"))
        })?),
    };

    let mut updated = match (patch.caregiver_id, status) {
        (Some(caregiver_id), status_override) => Some(
            DispatchEngine::admin_assign(
                &state,
                admin.user_id,
                booking_id,
                caregiver_id,
                status_override,
            )
            .await?,
        ),
        (None, Some(BookingStatus::Completed)) => {
            Some(DispatchEngine::complete(&state, admin.user_id, booking_id).await?)
        }
        (None, Some(BookingStatus::Archived)) => {
            Some(DispatchEngine::archive(&state, admin.user_id, booking_id).await?)
        }
        (None, Some(other)) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Admins cannot move a booking to '{other}' without a caregiver"
            ))))
        }
        (None, None) => None,
    };

    if let Some(notes) = &patch.admin_notes {
        let notes = notes.trim();
        let value = if notes.is_empty() { None } else { Some(notes) };
        updated = Some(BookingRepo::set_admin_notes(&state.pool, booking_id, value).await?);
    }

    let booking = match updated {
        Some(booking) => booking,
        None => return Err(AppError::BadRequest("Empty patch".into())),
    };
    Ok(Json(DataResponse { data: booking }))
}

/// DELETE /api/v1/admin/bookings/{id}
///
/// Cancellation: removes the row and fans out cancellation notices.
pub async fn delete_booking(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
) -> AppResult<StatusCode> {
    DispatchEngine::admin_delete(&state, admin.user_id, booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/bookings/{id}/offers`.
#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub caregiver_id: DbId,
    /// Pricing unit, e.g. `per_walk`, `per_night`.
    pub unit: String,
    pub price_cents: i64,
}

/// POST /api/v1/admin/bookings/{id}/offers
pub async fn create_offer(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
    Json(request): Json<CreateOfferRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BookingOffer>>)> {
    if request.price_cents < 0 {
        return Err(AppError::Core(CoreError::field(
            "price_cents",
            "must not be negative",
        )));
    }
    let offer = DispatchEngine::create_offer(
        &state,
        admin.user_id,
        booking_id,
        request.caregiver_id,
        &request.unit,
        request.price_cents,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: offer })))
}

/// GET /api/v1/admin/bookings/{id}/offers
pub async fn list_offers(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<BookingOffer>>>> {
    // 404 for a missing booking rather than an empty list.
    BookingRepo::get(&state.pool, booking_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        }))?;
    let offers = OfferRepo::list_for_booking(&state.pool, booking_id).await?;
    Ok(Json(DataResponse { data: offers }))
}
