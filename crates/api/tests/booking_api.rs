//! HTTP-level integration tests for the owner-facing `/bookings` endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with, days_ahead, get, patch_json, post_json,
    seed_user, submission_json, test_config, token_for,
};
use sqlx::PgPool;

use pawhub_core::roles::{ROLE_ADMIN, ROLE_OWNER};

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_booking_starts_pending_and_unassigned(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);
    let app = build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/bookings",
        &token,
        submission_json(&days_ahead(5)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert!(json["data"]["caregiver_id"].is_null());
    assert_eq!(json["data"]["owner_id"].as_i64(), Some(owner.id));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_booking_requires_authentication(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/bookings", "not-a-token", submission_json(&days_ahead(5))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_booking_is_owner_only(pool: PgPool) {
    let admin = seed_user(&pool, "admin@example.com", ROLE_ADMIN).await;
    let token = token_for(&admin);
    let app = build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/bookings",
        &token,
        submission_json(&days_ahead(5)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_beyond_horizon_is_a_date_field_error(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);
    let app = build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/bookings",
        &token,
        submission_json(&days_ahead(61)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(
        json["fields"]["date"]
            .as_str()
            .unwrap()
            .contains("within 60 days"),
        "got: {}",
        json["fields"]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn shape_errors_are_reported_together(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);
    let app = build_test_app(pool);

    let mut submission = submission_json(&days_ahead(5));
    submission["service"] = "llama_grooming".into();
    submission["postal_code"] = "015".into();

    let response = post_json(app, "/api/v1/bookings", &token, submission).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["fields"]["service"].is_string());
    assert!(json["fields"]["postal_code"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn honeypot_gets_generic_success_and_no_row(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);
    let app = build_test_app(pool.clone());

    let mut submission = submission_json(&days_ahead(5));
    submission["website"] = "https://spam.example".into();

    let response = post_json(app, "/api/v1/bookings", &token, submission).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "received");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "a honeypot submission must not persist");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn creation_is_rate_limited_per_owner(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let other = seed_user(&pool, "other@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);

    let mut config = test_config();
    config.rate_limit.max_requests = 2;
    let app = build_test_app_with(pool, config);

    for i in 0..2 {
        let response = post_json(
            app.clone(),
            "/api/v1/bookings",
            &token,
            submission_json(&days_ahead(5 + i)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED, "attempt {i}");
    }

    let response = post_json(
        app.clone(),
        "/api/v1/bookings",
        &token,
        submission_json(&days_ahead(10)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    // Another owner is unaffected.
    let response = post_json(
        app,
        "/api/v1/bookings",
        &token_for(&other),
        submission_json(&days_ahead(5)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Listing and fetching
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn owner_list_defaults_to_the_active_view(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/bookings",
        &token,
        submission_json(&days_ahead(5)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(app.clone(), "/api/v1/bookings", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = get(app, "/api/v1/bookings?view=history", &token).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bookings_are_hidden_from_other_owners(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let other = seed_user(&pool, "other@example.com", ROLE_OWNER).await;
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/bookings",
        &token_for(&owner),
        submission_json(&days_ahead(5)),
    )
    .await;
    let booking_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = get(
        app,
        &format!("/api/v1/bookings/{booking_id}"),
        &token_for(&other),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Owner patch shape
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn owner_patch_rejects_unsupported_combinations(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com", ROLE_OWNER).await;
    let token = token_for(&owner);
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/bookings",
        &token,
        submission_json(&days_ahead(5)),
    )
    .await;
    let booking_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Neither accept-offer nor confirm: rejected outright.
    let response = patch_json(
        app,
        &format!("/api/v1/bookings/{booking_id}"),
        &token,
        serde_json::json!({ "status": "completed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
