//! Online presence.

use chrono::Duration;

use crate::types::Timestamp;

/// A user with no heartbeat for this long is treated as offline.
pub const PRESENCE_STALE_SECS: i64 = 300;

/// Online means the flag is set and the last heartbeat is recent.
pub fn is_online(flag: bool, last_seen_at: Option<Timestamp>, now: Timestamp) -> bool {
    match last_seen_at {
        Some(seen) if flag => now - seen <= Duration::seconds(PRESENCE_STALE_SECS),
        _ => false,
    }
}
