use serde::Serialize;

use crate::types::DbId;

/// Coarse error taxonomy shared by every caller-facing operation.
///
/// Each [`CoreError`] variant belongs to exactly one kind. The kind decides
/// the HTTP status and whether a polling client should retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    FailedPrecondition,
    ResourceExhausted,
    Internal,
}

impl ErrorKind {
    /// Wire name of the kind, e.g. `"failed_precondition"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::FailedPrecondition => "failed_precondition",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::Internal => "internal",
        }
    }

    /// Pollers may retry `NotFound` and `Internal`; everything else is
    /// terminal for that call.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::NotFound | ErrorKind::Internal)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Target unavailable: {0}")]
    TargetUnavailable(String),

    #[error("Activity {activity_id} is full")]
    ActivityFull { activity_id: DbId },

    #[error("An open request already exists for this target")]
    DuplicateOpenRequest,

    #[error("Request {request_id} is already {status}")]
    AlreadyResolved { request_id: DbId, status: String },

    #[error("A connection with this user already exists or is pending")]
    AlreadyRequested,

    #[error("Daily request cap of {limit} reached")]
    DailyCapReached { limit: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_)
            | CoreError::InvalidCoordinate { .. }
            | CoreError::InvalidRecipient(_) => ErrorKind::InvalidArgument,
            CoreError::Unauthorized(_) => ErrorKind::Unauthenticated,
            CoreError::Forbidden(_) => ErrorKind::PermissionDenied,
            CoreError::InsufficientBalance { .. }
            | CoreError::TargetUnavailable(_)
            | CoreError::ActivityFull { .. }
            | CoreError::DuplicateOpenRequest
            | CoreError::AlreadyResolved { .. }
            | CoreError::AlreadyRequested => ErrorKind::FailedPrecondition,
            CoreError::DailyCapReached { .. } => ErrorKind::ResourceExhausted,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code returned in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            CoreError::InvalidRecipient(_) => "INVALID_RECIPIENT",
            CoreError::TargetUnavailable(_) => "TARGET_UNAVAILABLE",
            CoreError::ActivityFull { .. } => "ACTIVITY_FULL",
            CoreError::DuplicateOpenRequest => "DUPLICATE_OPEN_REQUEST",
            CoreError::AlreadyResolved { .. } => "ALREADY_RESOLVED",
            CoreError::AlreadyRequested => "ALREADY_REQUESTED",
            CoreError::DailyCapReached { .. } => "DAILY_CAP_REACHED",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_failures_share_a_kind() {
        let errors = [
            CoreError::InsufficientBalance {
                available: 0,
                requested: 5,
            },
            CoreError::TargetUnavailable("inactive".into()),
            CoreError::ActivityFull { activity_id: 1 },
            CoreError::DuplicateOpenRequest,
            CoreError::AlreadyResolved {
                request_id: 1,
                status: "approved".into(),
            },
            CoreError::AlreadyRequested,
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::FailedPrecondition, "{err}");
        }
    }

    #[test]
    fn test_daily_cap_is_resource_exhausted() {
        let err = CoreError::DailyCapReached { limit: 3 };
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
        assert_eq!(err.code(), "DAILY_CAP_REACHED");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::NotFound.is_retryable());
        assert!(ErrorKind::Internal.is_retryable());
        assert!(!ErrorKind::FailedPrecondition.is_retryable());
        assert!(!ErrorKind::PermissionDenied.is_retryable());
    }

    #[test]
    fn test_invalid_coordinate_is_invalid_argument() {
        let err = CoreError::InvalidCoordinate {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.code(), "INVALID_COORDINATE");
    }
}
