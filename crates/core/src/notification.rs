//! Notification kinds delivered to users.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RequestCreated,
    RequestApproved,
    RequestRejected,
    RequestExpired,
    PointsReceived,
    ConnectionRequested,
    ConnectionAccepted,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::RequestCreated => "request_created",
            NotificationKind::RequestApproved => "request_approved",
            NotificationKind::RequestRejected => "request_rejected",
            NotificationKind::RequestExpired => "request_expired",
            NotificationKind::PointsReceived => "points_received",
            NotificationKind::ConnectionRequested => "connection_requested",
            NotificationKind::ConnectionAccepted => "connection_accepted",
        }
    }
}

/// Default page size for notification listings.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;

/// Largest notification page a caller may request.
pub const MAX_NOTIFICATION_LIMIT: i64 = 200;
