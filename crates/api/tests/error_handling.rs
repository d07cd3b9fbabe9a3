//! Tests for the error-to-HTTP mapping in `AppError::into_response`.
//!
//! These exercise the `IntoResponse` implementation directly, without a
//! database, to pin down the status codes and JSON body shape clients see.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;

use pawhub_api::error::AppError;
use pawhub_core::error::{CoreError, FieldErrors};

async fn error_to_response(error: AppError) -> (StatusCode, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_maps_to_404() {
    let error = AppError::Core(CoreError::NotFound {
        entity: "Booking",
        id: 42,
    });
    let (status, json) = error_to_response(error).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Booking with id 42 not found");
}

#[tokio::test]
async fn validation_gets_a_per_field_map() {
    let mut fields = FieldErrors::new();
    fields.push("date", "date must be in the future");
    fields.push("service", "unknown service type");
    let (status, json) = error_to_response(AppError::Core(CoreError::Validation(fields))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Validation failed");
    assert_eq!(json["fields"]["date"], "date must be in the future");
    assert_eq!(json["fields"]["service"], "unknown service type");
}

#[tokio::test]
async fn conflict_maps_to_409_with_the_message() {
    let error = AppError::Core(CoreError::Conflict(
        "Caregiver is not available for this slot".to_string(),
    ));
    let (status, json) = error_to_response(error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Caregiver is not available for this slot");
}

#[tokio::test]
async fn unauthorized_maps_to_401() {
    let error = AppError::Core(CoreError::Unauthorized("Invalid token".to_string()));
    let (status, json) = error_to_response(error).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn forbidden_maps_to_403() {
    let error = AppError::Core(CoreError::Forbidden("Admin access required".to_string()));
    let (status, json) = error_to_response(error).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let error = AppError::InternalError("connection refused at 10.0.0.7:5432".to_string());
    let (status, json) = error_to_response(error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    // The raw message never leaks to the client.
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn database_row_not_found_maps_to_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn rate_limited_maps_to_429_with_retry_after() {
    let response = AppError::RateLimited {
        retry_after_secs: 600,
    }
    .into_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get("retry-after").unwrap().to_str().unwrap(),
        "600"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn bad_request_maps_to_400() {
    let error = AppError::BadRequest("items must not be empty".to_string());
    let (status, json) = error_to_response(error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "items must not be empty");
}
