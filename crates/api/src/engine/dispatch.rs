//! Transition orchestrator for the booking lifecycle.
//!
//! Every operation follows the same shape: load the booking under a row
//! lock, authorize the actor, re-check the slot (time elapses between
//! creation and assignment), resolve the closed transition table, and commit
//! the state change together with its outbound tasks in one transaction.
//! The in-transaction availability check closes the double-commit race in
//! the common case; the `uq_bookings_caregiver_slot` index is the storage
//! backstop, surfacing as 409 through the sqlx error classifier.
//!
//! Event bus publishes happen after commit and are fire-and-forget.

use chrono::Utc;
use sqlx::PgConnection;

use pawhub_core::booking::{BookingAction, BookingStatus, Transition, TransitionError};
use pawhub_core::error::{CoreError, FieldErrors};
use pawhub_core::roles::{ROLE_ADMIN, ROLE_CAREGIVER, ROLE_OWNER};
use pawhub_core::slot;
use pawhub_core::submission::NormalizedBooking;
use pawhub_core::types::DbId;
use pawhub_db::models::booking::{Booking, NewBooking};
use pawhub_db::models::offer::BookingOffer;
use pawhub_db::models::user::User;
use pawhub_db::repositories::{
    BookingRepo, ConversationRepo, OfferRepo, OutboxRepo, UserRepo,
};
use pawhub_events::bus::{
    BookingEvent, EVENT_BOOKING_ARCHIVED, EVENT_BOOKING_ASSIGNED, EVENT_BOOKING_CANCELLED,
    EVENT_BOOKING_COMPLETED, EVENT_BOOKING_CONFIRMED, EVENT_BOOKING_CREATED, EVENT_OFFER_CREATED,
};

use super::effects::{self, TaskSpec};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// One item on the admin direct-creation path.
///
/// This path is the documented exception to the pending/unassigned rule: the
/// caller may supply a caregiver and a committed status at insert. All slot
/// checks are re-applied per item.
#[derive(Debug, Clone)]
pub struct DirectBooking {
    pub owner_id: DbId,
    pub caregiver_id: Option<DbId>,
    pub status: BookingStatus,
    pub normalized: NormalizedBooking,
}

/// Stateless orchestrator; all functions take the shared [`AppState`].
pub struct DispatchEngine;

impl DispatchEngine {
    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Owner submission path: insert a pending, unassigned booking and tell
    /// the admins there is dispatch work waiting.
    pub async fn create_booking(
        state: &AppState,
        owner_id: DbId,
        normalized: NormalizedBooking,
    ) -> AppResult<Booking> {
        check_slot_window(&normalized, "date")?;

        let admins = UserRepo::list_admins(&state.pool).await?;

        let mut tx = state.pool.begin().await?;
        let booking = BookingRepo::create(
            &mut *tx,
            &new_booking(owner_id, None, BookingStatus::Pending, &normalized),
        )
        .await?;
        enqueue_all(&mut *tx, &effects::booking_received(&booking, &admins)).await?;
        tx.commit().await?;

        tracing::info!(booking_id = booking.id, owner_id, "Booking created");
        state.event_bus.publish(
            BookingEvent::new(EVENT_BOOKING_CREATED, booking.id).with_actor(owner_id),
        );
        Ok(booking)
    }

    /// Admin direct/bulk creation path. All-or-nothing: every item is
    /// validated up front (errors keyed `items[i].field`), then all rows are
    /// inserted in one transaction.
    pub async fn create_direct(
        state: &AppState,
        actor_id: DbId,
        items: Vec<DirectBooking>,
    ) -> AppResult<Vec<Booking>> {
        let mut errors = FieldErrors::new();
        for (i, item) in items.iter().enumerate() {
            if let Err(AppError::Core(CoreError::Validation(item_errors))) =
                check_slot_window(&item.normalized, "date")
            {
                for (field, message) in item_errors.0 {
                    errors.push(format!("items[{i}].{field}"), message);
                }
            }
            match (item.status, item.caregiver_id) {
                (BookingStatus::Pending, Some(_)) => {
                    errors.push(
                        format!("items[{i}].caregiver_id"),
                        "a pending booking cannot carry a caregiver",
                    );
                }
                (BookingStatus::Assigned | BookingStatus::Confirmed, None) => {
                    errors.push(
                        format!("items[{i}].caregiver_id"),
                        "is required for an assigned or confirmed booking",
                    );
                }
                (BookingStatus::Completed | BookingStatus::Archived, _) => {
                    errors.push(
                        format!("items[{i}].status"),
                        "direct creation accepts pending, assigned, or confirmed",
                    );
                }
                _ => {}
            }
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors).into());
        }

        // Referenced users must exist before any row is written.
        for item in &items {
            get_user(&state.pool, item.owner_id).await?;
            if let Some(caregiver_id) = item.caregiver_id {
                let caregiver = get_user(&state.pool, caregiver_id).await?;
                ensure_caregiver_role(&caregiver)?;
            }
        }

        let mut tx = state.pool.begin().await?;
        let mut created = Vec::with_capacity(items.len());
        for item in &items {
            if let Some(caregiver_id) = item.caregiver_id {
                ensure_available(&mut *tx, caregiver_id, &item.normalized).await?;
            }
            let booking = BookingRepo::create(
                &mut *tx,
                &new_booking(item.owner_id, item.caregiver_id, item.status, &item.normalized),
            )
            .await?;
            if let Some(caregiver_id) = item.caregiver_id {
                ConversationRepo::activate(&mut *tx, booking.id, booking.owner_id, caregiver_id)
                    .await?;
            }
            created.push(booking);
        }
        tx.commit().await?;

        for booking in &created {
            tracing::info!(booking_id = booking.id, actor_id, status = %booking.status,
                "Booking created directly");
            state.event_bus.publish(
                BookingEvent::new(EVENT_BOOKING_CREATED, booking.id).with_actor(actor_id),
            );
        }
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Assignment and confirmation
    // -----------------------------------------------------------------------

    /// Admin commits a caregiver to a pending booking. The status defaults
    /// to Assigned; an explicit override to Confirmed skips the owner
    /// confirmation step.
    pub async fn admin_assign(
        state: &AppState,
        actor_id: DbId,
        booking_id: DbId,
        caregiver_id: DbId,
        status_override: Option<BookingStatus>,
    ) -> AppResult<Booking> {
        let target = match status_override {
            None | Some(BookingStatus::Assigned) => BookingStatus::Assigned,
            Some(BookingStatus::Confirmed) => BookingStatus::Confirmed,
            Some(other) => {
                return Err(AppError::Core(CoreError::Conflict(format!(
                    "Cannot assign a caregiver with target status '{other}'"
                ))))
            }
        };

        let caregiver = get_user(&state.pool, caregiver_id).await?;
        ensure_caregiver_role(&caregiver)?;

        let mut tx = state.pool.begin().await?;
        let booking = lock_booking(&mut *tx, booking_id).await?;
        let current = stored_status(&booking)?;
        apply_transition(BookingAction::AdminAssign, current, ROLE_ADMIN)?;

        ensure_slot_current(&booking)?;
        ensure_available_for(&mut *tx, caregiver_id, &booking).await?;

        let owner = get_user(&state.pool, booking.owner_id).await?;
        let updated = BookingRepo::set_assignment(&mut *tx, booking_id, caregiver_id, target).await?;
        ConversationRepo::activate(&mut *tx, booking_id, updated.owner_id, caregiver_id).await?;
        enqueue_all(&mut *tx, &effects::assignment(&updated, &owner, &caregiver)).await?;
        tx.commit().await?;

        tracing::info!(booking_id, caregiver_id, status = %target, "Caregiver assigned");
        let event_type = if target == BookingStatus::Confirmed {
            EVENT_BOOKING_CONFIRMED
        } else {
            EVENT_BOOKING_ASSIGNED
        };
        state.event_bus.publish(
            BookingEvent::new(event_type, booking_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({ "caregiver_id": caregiver_id })),
        );
        Ok(updated)
    }

    /// Owner accepts a candidate offer, confirming the booking directly.
    /// The entire offer set is deleted in the same transaction, closing the
    /// negotiation atomically.
    pub async fn owner_accept_offer(
        state: &AppState,
        owner_id: DbId,
        booking_id: DbId,
        caregiver_id: DbId,
    ) -> AppResult<Booking> {
        let caregiver = get_user(&state.pool, caregiver_id).await?;

        let mut tx = state.pool.begin().await?;
        let booking = lock_booking(&mut *tx, booking_id).await?;
        ensure_owner(&booking, owner_id)?;
        let current = stored_status(&booking)?;
        apply_transition(BookingAction::OwnerAcceptOffer, current, ROLE_OWNER)?;

        // The pair must have an open offer; accepting a caregiver who never
        // offered is a conflict, not an assignment.
        let offer = OfferRepo::get_for_pair(&mut *tx, booking_id, caregiver_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict("offer not found".to_string()))
            })?;

        ensure_slot_current(&booking)?;
        ensure_available_for(&mut *tx, caregiver_id, &booking).await?;

        let owner = get_user(&state.pool, booking.owner_id).await?;
        let admins = UserRepo::list_admins(&state.pool).await?;
        // The admin who proposed the accepted candidate also gets an email
        // telling them the loop closed without them.
        let offering_admin = UserRepo::get(&state.pool, offer.created_by).await?;

        let updated =
            BookingRepo::set_assignment(&mut *tx, booking_id, caregiver_id, BookingStatus::Confirmed)
                .await?;
        OfferRepo::delete_all_for_booking(&mut *tx, booking_id).await?;
        ConversationRepo::activate(&mut *tx, booking_id, updated.owner_id, caregiver_id).await?;
        enqueue_all(
            &mut *tx,
            &effects::acceptance(&updated, &owner, &caregiver, &admins, offering_admin.as_ref()),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(booking_id, caregiver_id, "Offer accepted, booking confirmed");
        state.event_bus.publish(
            BookingEvent::new(EVENT_BOOKING_CONFIRMED, booking_id)
                .with_actor(owner_id)
                .with_payload(serde_json::json!({ "caregiver_id": caregiver_id })),
        );
        Ok(updated)
    }

    /// Owner confirms an admin-made assignment.
    pub async fn owner_confirm_assignment(
        state: &AppState,
        owner_id: DbId,
        booking_id: DbId,
    ) -> AppResult<Booking> {
        let mut tx = state.pool.begin().await?;
        let booking = lock_booking(&mut *tx, booking_id).await?;
        ensure_owner(&booking, owner_id)?;
        let current = stored_status(&booking)?;
        apply_transition(BookingAction::OwnerConfirm, current, ROLE_OWNER)?;

        // The transition table admits Assigned only, and the CHECK
        // constraint guarantees an assigned booking has a caregiver.
        let caregiver_id = booking.caregiver_id.ok_or_else(|| {
            AppError::InternalError(format!("assigned booking {booking_id} has no caregiver"))
        })?;

        ensure_slot_current(&booking)?;

        let owner = get_user(&state.pool, booking.owner_id).await?;
        let caregiver = get_user(&state.pool, caregiver_id).await?;

        let updated =
            BookingRepo::set_status(&mut *tx, booking_id, BookingStatus::Confirmed).await?;
        enqueue_all(&mut *tx, &effects::confirmation(&updated, &owner, &caregiver)).await?;
        tx.commit().await?;

        tracing::info!(booking_id, "Assignment confirmed by owner");
        state.event_bus.publish(
            BookingEvent::new(EVENT_BOOKING_CONFIRMED, booking_id).with_actor(owner_id),
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Terminal transitions
    // -----------------------------------------------------------------------

    /// External fulfillment: a confirmed booking was carried out.
    pub async fn complete(
        state: &AppState,
        actor_id: DbId,
        booking_id: DbId,
    ) -> AppResult<Booking> {
        let updated = Self::set_terminal(
            state,
            booking_id,
            BookingAction::Complete,
            BookingStatus::Completed,
        )
        .await?;
        state.event_bus.publish(
            BookingEvent::new(EVENT_BOOKING_COMPLETED, booking_id).with_actor(actor_id),
        );
        Ok(updated)
    }

    /// Explicit archive of a finished booking.
    pub async fn archive(
        state: &AppState,
        actor_id: DbId,
        booking_id: DbId,
    ) -> AppResult<Booking> {
        let updated = Self::set_terminal(
            state,
            booking_id,
            BookingAction::Archive,
            BookingStatus::Archived,
        )
        .await?;
        state.event_bus.publish(
            BookingEvent::new(EVENT_BOOKING_ARCHIVED, booking_id).with_actor(actor_id),
        );
        Ok(updated)
    }

    async fn set_terminal(
        state: &AppState,
        booking_id: DbId,
        action: BookingAction,
        target: BookingStatus,
    ) -> AppResult<Booking> {
        let mut tx = state.pool.begin().await?;
        let booking = lock_booking(&mut *tx, booking_id).await?;
        let current = stored_status(&booking)?;
        apply_transition(action, current, ROLE_ADMIN)?;
        let updated = BookingRepo::set_status(&mut *tx, booking_id, target).await?;
        tx.commit().await?;
        tracing::info!(booking_id, status = %target, "Booking transitioned");
        Ok(updated)
    }

    /// Cancellation: the row is removed and notices fan out to the owner
    /// and, when a caregiver was committed, the caregiver.
    pub async fn admin_delete(
        state: &AppState,
        actor_id: DbId,
        booking_id: DbId,
    ) -> AppResult<()> {
        let mut tx = state.pool.begin().await?;
        let booking = lock_booking(&mut *tx, booking_id).await?;
        let current = stored_status(&booking)?;
        apply_transition(BookingAction::Delete, current, ROLE_ADMIN)?;

        let owner = get_user(&state.pool, booking.owner_id).await?;
        let caregiver = match booking.caregiver_id {
            Some(id) if current.is_committed() => Some(get_user(&state.pool, id).await?),
            _ => None,
        };

        BookingRepo::delete(&mut *tx, booking_id).await?;
        enqueue_all(
            &mut *tx,
            &effects::cancellation(&booking, &owner, caregiver.as_ref()),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(booking_id, "Booking deleted");
        state.event_bus.publish(
            BookingEvent::new(EVENT_BOOKING_CANCELLED, booking_id).with_actor(actor_id),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Offers
    // -----------------------------------------------------------------------

    /// Admin attaches a candidate offer to a pending booking. Idempotent per
    /// (booking, caregiver) pair; re-offering replaces unit and price.
    pub async fn create_offer(
        state: &AppState,
        actor_id: DbId,
        booking_id: DbId,
        caregiver_id: DbId,
        unit: &str,
        price_cents: i64,
    ) -> AppResult<BookingOffer> {
        let caregiver = get_user(&state.pool, caregiver_id).await?;
        ensure_caregiver_role(&caregiver)?;

        let mut tx = state.pool.begin().await?;
        let booking = lock_booking(&mut *tx, booking_id).await?;
        let current = stored_status(&booking)?;
        if current != BookingStatus::Pending {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Offers are only accepted while a booking is pending, not '{current}'"
            ))));
        }

        let offer =
            OfferRepo::upsert(&mut *tx, booking_id, caregiver_id, actor_id, unit, price_cents)
                .await?;
        tx.commit().await?;

        tracing::info!(booking_id, caregiver_id, "Offer created");
        state.event_bus.publish(
            BookingEvent::new(EVENT_OFFER_CREATED, booking_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({ "caregiver_id": caregiver_id })),
        );
        Ok(offer)
    }
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

fn new_booking(
    owner_id: DbId,
    caregiver_id: Option<DbId>,
    status: BookingStatus,
    n: &NormalizedBooking,
) -> NewBooking {
    NewBooking {
        owner_id,
        caregiver_id,
        service: n.service.as_str().to_string(),
        service_date: n.date,
        time_window: n.time_window.as_str().to_string(),
        start_time: n.start_time,
        slot_starts_at: n.slot_starts_at,
        contact_first_name: n.first_name.clone(),
        contact_last_name: n.last_name.clone(),
        contact_email: n.email.clone(),
        contact_phone: n.phone.clone(),
        address: n.address.clone(),
        city: n.city.clone(),
        postal_code: n.postal_code.clone(),
        pet_name: n.pet_name.clone(),
        pet_type: n.pet_type.clone(),
        contact_preference: n.contact_preference.as_str().to_string(),
        message: n.message.clone(),
        status,
        is_recurring: n.is_recurring,
    }
}

/// Horizon and not-in-past checks for a submitted slot, reported as field
/// errors so the client can render them on the form.
fn check_slot_window(normalized: &NormalizedBooking, field: &str) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if !slot::within_horizon(normalized.date, slot::today()) {
        errors.push(
            field,
            format!(
                "must be within {} days from today",
                slot::BOOKING_HORIZON_DAYS
            ),
        );
    } else if slot::is_past(normalized.slot_starts_at, Utc::now()) {
        errors.push(field, "must be in the future");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(errors).into())
    }
}

async fn lock_booking(conn: &mut PgConnection, booking_id: DbId) -> AppResult<Booking> {
    BookingRepo::get_for_update(conn, booking_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Booking",
                id: booking_id,
            })
        })
}

async fn get_user(pool: &pawhub_db::DbPool, user_id: DbId) -> AppResult<User> {
    UserRepo::get(pool, user_id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })
    })
}

fn stored_status(booking: &Booking) -> AppResult<BookingStatus> {
    booking.status().ok_or_else(|| {
        AppError::InternalError(format!(
            "booking {} has unknown status '{}'",
            booking.id, booking.status
        ))
    })
}

fn apply_transition(
    action: BookingAction,
    current: BookingStatus,
    role: &str,
) -> AppResult<Transition> {
    action.apply(current, role).map_err(|e| match e {
        TransitionError::Forbidden { .. } => AppError::Core(CoreError::Forbidden(e.to_string())),
        TransitionError::Illegal { .. } => AppError::Core(CoreError::Conflict(e.to_string())),
    })
}

fn ensure_owner(booking: &Booking, owner_id: DbId) -> AppResult<()> {
    if booking.owner_id != owner_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "This booking belongs to another owner".into(),
        )));
    }
    Ok(())
}

fn ensure_caregiver_role(user: &User) -> AppResult<()> {
    if user.role != ROLE_CAREGIVER {
        return Err(AppError::BadRequest(format!(
            "User {} is not a caregiver",
            user.id
        )));
    }
    Ok(())
}

fn ensure_slot_current(booking: &Booking) -> AppResult<()> {
    if slot::is_past(booking.slot_starts_at, Utc::now()) {
        return Err(AppError::Core(CoreError::Conflict(
            "The booking slot is already in the past".into(),
        )));
    }
    Ok(())
}

async fn ensure_available_for(
    conn: &mut PgConnection,
    caregiver_id: DbId,
    booking: &Booking,
) -> AppResult<()> {
    let conflict = BookingRepo::has_slot_conflict(
        conn,
        caregiver_id,
        booking.service_date,
        &booking.time_window,
        Some(booking.id),
    )
    .await?;
    if conflict {
        return Err(AppError::Core(CoreError::Conflict(
            "Caregiver is not available for this slot".into(),
        )));
    }
    Ok(())
}

async fn ensure_available(
    conn: &mut PgConnection,
    caregiver_id: DbId,
    normalized: &NormalizedBooking,
) -> AppResult<()> {
    let conflict = BookingRepo::has_slot_conflict(
        conn,
        caregiver_id,
        normalized.date,
        normalized.time_window.as_str(),
        None,
    )
    .await?;
    if conflict {
        return Err(AppError::Core(CoreError::Conflict(
            "Caregiver is not available for this slot".into(),
        )));
    }
    Ok(())
}

async fn enqueue_all(conn: &mut PgConnection, tasks: &[TaskSpec]) -> Result<(), sqlx::Error> {
    for task in tasks {
        OutboxRepo::enqueue(conn, task.kind, &task.payload).await?;
    }
    Ok(())
}
