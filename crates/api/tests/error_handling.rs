//! Tests for `AppError` to HTTP response mapping.
//!
//! These call `IntoResponse` directly; no server or database is needed.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use blip_api::error::AppError;
use blip_core::error::{CoreError, ErrorKind};
use http_body_util::BodyExt;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_returns_404_and_is_retryable() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "ProximityRequest",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["kind"], "not_found");
    assert_eq!(json["retryable"], true);
    assert_eq!(json["error"], "ProximityRequest with id 42 not found");
}

#[tokio::test]
async fn invalid_coordinate_returns_400() {
    let err = AppError::Core(CoreError::InvalidCoordinate {
        latitude: 91.0,
        longitude: 0.0,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_COORDINATE");
    assert_eq!(json["kind"], "invalid_argument");
}

#[tokio::test]
async fn insufficient_balance_returns_409_and_is_terminal() {
    let err = AppError::Core(CoreError::InsufficientBalance {
        available: 0,
        requested: 500,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INSUFFICIENT_BALANCE");
    assert_eq!(json["kind"], "failed_precondition");
    assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn already_resolved_names_the_status() {
    let err = AppError::Core(CoreError::AlreadyResolved {
        request_id: 7,
        status: "expired".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_RESOLVED");
    assert!(json["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn forbidden_returns_403() {
    let err = AppError::Core(CoreError::Forbidden("Not a party to this request".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("no token provided".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "no token provided");
}

#[tokio::test]
async fn daily_cap_returns_429() {
    let err = AppError::Core(CoreError::DailyCapReached { limit: 3 });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "DAILY_CAP_REACHED");
    assert_eq!(json["kind"], "resource_exhausted");
}

#[tokio::test]
async fn bad_request_returns_400() {
    let err = AppError::BadRequest("latitude and longitude must be sent together".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("secret"));
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn core_internal_is_sanitized_too() {
    let err = AppError::Core(CoreError::Internal("Unknown request status 'zzz'".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json.to_string().contains("zzz"));
}

#[tokio::test]
async fn row_not_found_maps_to_not_found_kind() {
    let err = AppError::Database(sqlx::Error::RowNotFound);

    assert_matches!(err.kind(), ErrorKind::NotFound);

    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
