use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blip_core::error::{CoreError, ErrorKind};
use serde_json::json;

/// Application-level error type for HTTP handlers and the engine.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every response body is `{"error", "code", "kind", "retryable"}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Taxonomy bucket, used for status mapping and by pollers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Core(core) => core.kind(),
            AppError::Database(err) => classify_sqlx_error(err).1,
            AppError::BadRequest(_) => ErrorKind::InvalidArgument,
            AppError::InternalError(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (kind, code, message) = match &self {
            AppError::Core(core) => (core.kind(), core.code(), core_message(core)),
            AppError::Database(err) => {
                let (code, kind, message) = classify_sqlx_error(err);
                if kind == ErrorKind::Internal {
                    tracing::error!(error = %err, "Database error");
                }
                (kind, code, message)
            }
            AppError::BadRequest(msg) => (ErrorKind::InvalidArgument, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    ErrorKind::Internal,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
            "kind": kind.as_str(),
            "retryable": kind.is_retryable(),
        });

        (status_for(kind), axum::Json(body)).into_response()
    }
}

/// HTTP status for each taxonomy bucket.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::FailedPrecondition => StatusCode::CONFLICT,
        ErrorKind::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Caller-facing message for a domain error. Internal details are logged
/// and replaced.
fn core_message(core: &CoreError) -> String {
    match core {
        CoreError::NotFound { entity, id } => format!("{entity} with id {id} not found"),
        CoreError::Validation(msg)
        | CoreError::Unauthorized(msg)
        | CoreError::Forbidden(msg)
        | CoreError::InvalidRecipient(msg)
        | CoreError::TargetUnavailable(msg) => msg.clone(),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            "An internal error occurred".to_string()
        }
        other => other.to_string(),
    }
}

/// Classify a sqlx error into an error code, taxonomy bucket, and message.
///
/// - `RowNotFound` maps to `NotFound`.
/// - Unique violations on `uq_*` constraints map to `FailedPrecondition`.
/// - Everything else is `Internal` with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (&'static str, ErrorKind, String) {
    match err {
        sqlx::Error::RowNotFound => (
            "NOT_FOUND",
            ErrorKind::NotFound,
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        "CONFLICT",
                        ErrorKind::FailedPrecondition,
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            (
                "INTERNAL_ERROR",
                ErrorKind::Internal,
                "An internal error occurred".to_string(),
            )
        }
        _ => (
            "INTERNAL_ERROR",
            ErrorKind::Internal,
            "An internal error occurred".to_string(),
        ),
    }
}

/// Whether `err` is a unique violation on `constraint`.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
