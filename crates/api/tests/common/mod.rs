//! Shared test harness: router construction, seeding, and HTTP helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use pawhub_api::auth::jwt::{generate_access_token, JwtConfig};
use pawhub_api::config::ServerConfig;
use pawhub_api::middleware::rate_limit::{BookingRateLimiter, RateLimitConfig};
use pawhub_api::router::build_app_router;
use pawhub_api::state::AppState;
use pawhub_db::models::user::User;
use pawhub_db::repositories::UserRepo;
use pawhub_events::EventBus;

/// Build a test `ServerConfig` with safe defaults and a known JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "pawhub-test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        rate_limit: RateLimitConfig {
            max_requests: 5,
            window: Duration::from_secs(600),
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Same as [`build_test_app`] but with a caller-supplied config (used by the
/// rate-limit tests to lower the ceiling).
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        rate_limiter: Arc::new(BookingRateLimiter::new(config.rate_limit.clone())),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, email: &str, role: &str) -> User {
    UserRepo::create(pool, email, &format!("Test {role}"), role)
        .await
        .expect("seed user")
}

/// Mint a valid access token for a seeded user.
pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_config().jwt).expect("mint token")
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn get_anon(app: Router, uri: &str) -> Response<Body> {
    send(app, "GET", uri, None, None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "POST", uri, Some(token), Some(body)).await
}

pub async fn patch_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "PATCH", uri, Some(token), Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "POST", uri, Some(token), None).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "DELETE", uri, Some(token), None).await
}

/// Collect a response body into parsed JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A complete, valid owner submission for the given date.
pub fn submission_json(date: &str) -> serde_json::Value {
    serde_json::json!({
        "service": "dog_walking",
        "time_window": "morning",
        "date": date,
        "first_name": "Kari",
        "last_name": "Nordmann",
        "email": "kari@example.com",
        "phone": "+47 900 00 000",
        "address": "Storgata 1",
        "city": "Oslo",
        "postal_code": "0155",
        "pet_name": "Bella",
        "pet_type": "dog",
        "contact_preference": "email",
        "message": "Please ring the doorbell."
    })
}

/// A date `days` ahead of today, formatted `YYYY-MM-DD`.
pub fn days_ahead(days: i64) -> String {
    (pawhub_core::slot::today() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
