//! Activity catalogue, lifetime, and capacity rules.
//!
//! An activity lives for a fixed hour after creation and accepts joiners
//! until its participant set reaches `max_participants`.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Activities expire this many minutes after creation.
pub const ACTIVITY_TTL_MINS: i64 = 60;

/// Capacity used when the creator does not pick one.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 4;

/// Smallest allowed capacity. The owner is not part of the participant set.
pub const MIN_MAX_PARTICIPANTS: i32 = 1;

/// Largest allowed capacity.
pub const MAX_MAX_PARTICIPANTS: i32 = 20;

/// Maximum length of the free-text description.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Supported activity types and their display icons.
pub const ACTIVITY_TYPES: &[(&str, &str)] = &[
    ("Running", "🏃"),
    ("Watching Film", "🎬"),
    ("Studying", "📚"),
    ("Drinking", "🍻"),
    ("Partying", "🎉"),
    ("Dining", "🍽️"),
    ("Gaming", "🎮"),
    ("Working Out", "🏋️"),
    ("Reading", "📖"),
    ("Shopping", "🛍️"),
    ("Exploring", "🧭"),
    ("Networking", "🤝"),
    ("Dancing", "💃"),
    ("Cooking", "👩‍🍳"),
    ("Chilling", "🧘"),
];

/// Icon for a known activity type.
pub fn icon_for(activity_type: &str) -> Option<&'static str> {
    ACTIVITY_TYPES
        .iter()
        .find(|(name, _)| *name == activity_type)
        .map(|(_, icon)| *icon)
}

/// Validate that an activity type is in the catalogue.
pub fn validate_activity_type(activity_type: &str) -> Result<(), String> {
    if icon_for(activity_type).is_some() {
        Ok(())
    } else {
        let names: Vec<&str> = ACTIVITY_TYPES.iter().map(|(n, _)| *n).collect();
        Err(format!(
            "Invalid activity type '{activity_type}'. Must be one of: {}",
            names.join(", ")
        ))
    }
}

/// Validate a requested participant capacity.
pub fn validate_max_participants(max: i32) -> Result<(), String> {
    if !(MIN_MAX_PARTICIPANTS..=MAX_MAX_PARTICIPANTS).contains(&max) {
        return Err(format!(
            "max_participants must be between {MIN_MAX_PARTICIPANTS} and \
             {MAX_MAX_PARTICIPANTS}, got {max}"
        ));
    }
    Ok(())
}

/// Validate the optional description length.
pub fn validate_description(description: Option<&str>) -> Result<(), String> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )),
        _ => Ok(()),
    }
}

/// Fixed expiry for an activity created at `created_at`.
pub fn expires_at(created_at: Timestamp) -> Timestamp {
    created_at + Duration::minutes(ACTIVITY_TTL_MINS)
}

/// An activity is active strictly before its expiry instant.
pub fn is_active(expires_at: Timestamp, now: Timestamp) -> bool {
    now < expires_at
}

/// Facts about an activity gathered under its row lock.
#[derive(Debug, Clone, Copy)]
pub struct JoinCheck {
    pub is_active: bool,
    pub participant_count: i64,
    pub max_participants: i32,
    pub already_participant: bool,
}

/// Whether a new requester may ask to join.
///
/// Every failure is `TargetUnavailable`: the caller cannot fix it by
/// changing their input.
pub fn check_joinable(check: &JoinCheck) -> Result<(), CoreError> {
    if !check.is_active {
        return Err(CoreError::TargetUnavailable(
            "Activity is no longer active".into(),
        ));
    }
    if check.already_participant {
        return Err(CoreError::TargetUnavailable(
            "Already a participant of this activity".into(),
        ));
    }
    if check.participant_count >= i64::from(check.max_participants) {
        return Err(CoreError::TargetUnavailable("Activity is full".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn open_check() -> JoinCheck {
        JoinCheck {
            is_active: true,
            participant_count: 1,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            already_participant: false,
        }
    }

    #[test]
    fn test_catalogue_has_fifteen_types() {
        assert_eq!(ACTIVITY_TYPES.len(), 15);
        assert!(validate_activity_type("Running").is_ok());
        assert!(validate_activity_type("Chilling").is_ok());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = validate_activity_type("Skydiving").unwrap_err();
        assert!(err.contains("Invalid activity type"));
        assert!(validate_activity_type("running").is_err());
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(icon_for("Gaming"), Some("🎮"));
        assert_eq!(icon_for("Nope"), None);
    }

    #[test]
    fn test_max_participants_bounds() {
        assert!(validate_max_participants(MIN_MAX_PARTICIPANTS).is_ok());
        assert!(validate_max_participants(MAX_MAX_PARTICIPANTS).is_ok());
        assert!(validate_max_participants(0).is_err());
        assert!(validate_max_participants(21).is_err());
    }

    #[test]
    fn test_description_length() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("a quick run")).is_ok());
        let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(validate_description(Some(&long)).is_err());
    }

    #[test]
    fn test_expires_one_hour_after_creation() {
        let created = Utc::now();
        let expiry = expires_at(created);
        assert_eq!(expiry - created, Duration::hours(1));
        assert!(is_active(expiry, created));
        assert!(!is_active(expiry, expiry));
        assert!(!is_active(expiry, expiry + Duration::seconds(1)));
    }

    #[test]
    fn test_open_activity_is_joinable() {
        assert!(check_joinable(&open_check()).is_ok());
    }

    #[test]
    fn test_full_activity_unavailable() {
        let check = JoinCheck {
            participant_count: 4,
            max_participants: 4,
            ..open_check()
        };
        assert_matches!(check_joinable(&check), Err(CoreError::TargetUnavailable(_)));
    }

    #[test]
    fn test_inactive_activity_unavailable() {
        let check = JoinCheck {
            is_active: false,
            ..open_check()
        };
        assert_matches!(check_joinable(&check), Err(CoreError::TargetUnavailable(_)));
    }

    #[test]
    fn test_existing_participant_unavailable() {
        let check = JoinCheck {
            already_participant: true,
            ..open_check()
        };
        assert_matches!(check_joinable(&check), Err(CoreError::TargetUnavailable(_)));
    }
}
