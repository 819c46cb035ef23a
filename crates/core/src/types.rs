//! Primitive aliases shared by every crate.

/// Row ids are `BIGSERIAL`.
pub type DbId = i64;

/// UTC instant used for every stored and compared time.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
