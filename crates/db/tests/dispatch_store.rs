//! Integration tests for the dispatch storage layer.
//!
//! Exercises the repositories against a real database:
//! - Booking creation and the pending/unassigned invariant
//! - The active/history read-time partition
//! - The committed-slot uniqueness backstop
//! - Offer upsert idempotence and cascade cleanup
//! - Conversation activation idempotence
//! - Outbound queue dead-lettering

use chrono::{Duration, Utc};
use sqlx::PgPool;

use pawhub_core::booking::{BookingStatus, TimeWindow};
use pawhub_core::roles::{ROLE_ADMIN, ROLE_CAREGIVER, ROLE_OWNER};
use pawhub_core::slot;
use pawhub_db::models::booking::{BookingView, NewBooking};
use pawhub_db::models::user::User;
use pawhub_db::repositories::{
    BookingRepo, ConversationRepo, OfferRepo, OutboxRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_owner(pool: &PgPool) -> User {
    UserRepo::create(pool, "owner@example.com", "Kari Nordmann", ROLE_OWNER)
        .await
        .expect("create owner")
}

async fn seed_caregiver(pool: &PgPool, email: &str) -> User {
    UserRepo::create(pool, email, "Care Giver", ROLE_CAREGIVER)
        .await
        .expect("create caregiver")
}

async fn seed_admin(pool: &PgPool) -> User {
    UserRepo::create(pool, "admin@example.com", "Dis Patcher", ROLE_ADMIN)
        .await
        .expect("create admin")
}

fn new_booking(owner_id: i64, days_ahead: i64) -> NewBooking {
    let date = slot::today() + Duration::days(days_ahead);
    NewBooking {
        owner_id,
        caregiver_id: None,
        service: "dog_walking".to_string(),
        service_date: date,
        time_window: TimeWindow::Morning.as_str().to_string(),
        start_time: None,
        slot_starts_at: slot::slot_start(date, TimeWindow::Morning, None),
        contact_first_name: "Kari".to_string(),
        contact_last_name: "Nordmann".to_string(),
        contact_email: "owner@example.com".to_string(),
        contact_phone: "+47 900 00 000".to_string(),
        address: None,
        city: "Oslo".to_string(),
        postal_code: "0155".to_string(),
        pet_name: "Bella".to_string(),
        pet_type: "dog".to_string(),
        contact_preference: "email".to_string(),
        message: None,
        status: BookingStatus::Pending,
        is_recurring: false,
    }
}

// ---------------------------------------------------------------------------
// Booking creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_pending_booking_is_unassigned(pool: PgPool) {
    let owner = seed_owner(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let booking = BookingRepo::create(&mut conn, &new_booking(owner.id, 1))
        .await
        .expect("create booking");

    assert_eq!(booking.status, "pending");
    assert_eq!(booking.caregiver_id, None);
    assert_eq!(booking.owner_id, owner.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn pending_booking_with_caregiver_violates_check(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;

    let mut new = new_booking(owner.id, 1);
    new.caregiver_id = Some(caregiver.id);

    let mut conn = pool.acquire().await.unwrap();
    let err = BookingRepo::create(&mut conn, &new).await.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(
                db_err.constraint(),
                Some("chk_bookings_pending_unassigned")
            );
        }
        other => panic!("expected check violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn direct_creation_with_committed_status_is_allowed(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;

    let mut new = new_booking(owner.id, 2);
    new.caregiver_id = Some(caregiver.id);
    new.status = BookingStatus::Confirmed;

    let mut conn = pool.acquire().await.unwrap();
    let booking = BookingRepo::create(&mut conn, &new).await.expect("direct path");
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.caregiver_id, Some(caregiver.id));
}

// ---------------------------------------------------------------------------
// Read-time partition
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn aged_booking_moves_to_history_without_status_change(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;

    let mut conn = pool.acquire().await.unwrap();
    let mut new = new_booking(owner.id, 1);
    new.caregiver_id = Some(caregiver.id);
    new.status = BookingStatus::Confirmed;
    let booking = BookingRepo::create(&mut conn, &new).await.unwrap();

    let today = slot::today();
    let cutoff = slot::history_cutoff(today);

    let active = BookingRepo::list_for_owner(&pool, owner.id, BookingView::Active, cutoff)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    // Age the slot past the window; the stored status stays 'confirmed'.
    sqlx::query("UPDATE bookings SET service_date = $2 WHERE id = $1")
        .bind(booking.id)
        .bind(today - Duration::days(91))
        .execute(&pool)
        .await
        .unwrap();

    let active = BookingRepo::list_for_owner(&pool, owner.id, BookingView::Active, cutoff)
        .await
        .unwrap();
    assert!(active.is_empty());

    let history = BookingRepo::list_for_owner(&pool, owner.id, BookingView::History, cutoff)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, "confirmed");
}

// ---------------------------------------------------------------------------
// Committed-slot uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn double_commit_same_slot_hits_unique_index(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;

    let mut conn = pool.acquire().await.unwrap();
    let first = BookingRepo::create(&mut conn, &new_booking(owner.id, 3)).await.unwrap();
    let second = BookingRepo::create(&mut conn, &new_booking(owner.id, 3)).await.unwrap();

    BookingRepo::set_assignment(&mut conn, first.id, caregiver.id, BookingStatus::Assigned)
        .await
        .expect("first assignment");

    let err =
        BookingRepo::set_assignment(&mut conn, second.id, caregiver.id, BookingStatus::Assigned)
            .await
            .unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
            assert_eq!(db_err.constraint(), Some("uq_bookings_caregiver_slot"));
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn slot_conflict_check_sees_committed_bookings_only(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;

    let mut conn = pool.acquire().await.unwrap();
    let booking = BookingRepo::create(&mut conn, &new_booking(owner.id, 4)).await.unwrap();

    // Pending bookings never occupy capacity.
    let conflict = BookingRepo::has_slot_conflict(
        &mut conn,
        caregiver.id,
        booking.service_date,
        "morning",
        None,
    )
    .await
    .unwrap();
    assert!(!conflict);

    BookingRepo::set_assignment(&mut conn, booking.id, caregiver.id, BookingStatus::Assigned)
        .await
        .unwrap();

    let conflict = BookingRepo::has_slot_conflict(
        &mut conn,
        caregiver.id,
        booking.service_date,
        "morning",
        None,
    )
    .await
    .unwrap();
    assert!(conflict);

    // The booking does not conflict with itself when excluded.
    let conflict = BookingRepo::has_slot_conflict(
        &mut conn,
        caregiver.id,
        booking.service_date,
        "morning",
        Some(booking.id),
    )
    .await
    .unwrap();
    assert!(!conflict);
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn offer_upsert_is_idempotent_per_pair(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;
    let admin = seed_admin(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let booking = BookingRepo::create(&mut conn, &new_booking(owner.id, 5)).await.unwrap();

    let first = OfferRepo::upsert(&mut conn, booking.id, caregiver.id, admin.id, "per_walk", 35_000)
        .await
        .unwrap();
    let second =
        OfferRepo::upsert(&mut conn, booking.id, caregiver.id, admin.id, "per_walk", 30_000)
            .await
            .unwrap();
    drop(conn);

    assert_eq!(first.id, second.id);
    assert_eq!(second.price_cents, 30_000);
    assert_eq!(second.created_by, admin.id);
    assert_eq!(OfferRepo::count_for_booking(&pool, booking.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_booking_cascades_offers_and_conversation(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let caregiver = seed_caregiver(&pool, "c1@example.com").await;
    let admin = seed_admin(&pool).await;

    let mut conn = pool.acquire().await.unwrap();
    let booking = BookingRepo::create(&mut conn, &new_booking(owner.id, 6)).await.unwrap();

    OfferRepo::upsert(&mut conn, booking.id, caregiver.id, admin.id, "per_walk", 35_000)
        .await
        .unwrap();

    ConversationRepo::activate(&mut conn, booking.id, owner.id, caregiver.id)
        .await
        .unwrap();

    assert!(BookingRepo::delete(&mut conn, booking.id).await.unwrap());
    drop(conn);

    assert_eq!(OfferRepo::count_for_booking(&pool, booking.id).await.unwrap(), 0);
    assert!(ConversationRepo::get_for_booking(&pool, booking.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn conversation_activation_is_idempotent(pool: PgPool) {
    let owner = seed_owner(&pool).await;
    let c1 = seed_caregiver(&pool, "c1@example.com").await;
    let c2 = seed_caregiver(&pool, "c2@example.com").await;

    let mut conn = pool.acquire().await.unwrap();
    let booking = BookingRepo::create(&mut conn, &new_booking(owner.id, 7)).await.unwrap();

    let first = ConversationRepo::activate(&mut conn, booking.id, owner.id, c1.id)
        .await
        .unwrap();
    // Re-assignment swaps the caregiver on the same channel.
    let second = ConversationRepo::activate(&mut conn, booking.id, owner.id, c2.id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.caregiver_id, c2.id);
    assert_eq!(second.status, "active");
}

// ---------------------------------------------------------------------------
// Outbound queue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn outbox_failure_dead_letters_after_max_attempts(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let id = OutboxRepo::enqueue(
        &mut conn,
        "email",
        &serde_json::json!({"to": "x@example.com"}),
    )
    .await
    .unwrap();
    drop(conn);

    OutboxRepo::record_failure(&pool, id, "smtp timeout", 3).await.unwrap();
    OutboxRepo::record_failure(&pool, id, "smtp timeout", 3).await.unwrap();
    assert_eq!(OutboxRepo::count_by_status(&pool, "pending").await.unwrap(), 1);

    OutboxRepo::record_failure(&pool, id, "smtp refused", 3).await.unwrap();
    assert_eq!(OutboxRepo::count_by_status(&pool, "dead").await.unwrap(), 1);

    let pending = OutboxRepo::claim_pending(&pool, 10).await.unwrap();
    assert!(pending.is_empty());
}
