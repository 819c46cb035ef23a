//! Point transfer rules.
//!
//! Balances are never negative and a transfer moves points between two
//! distinct accounts in a single step.

use crate::error::CoreError;
use crate::types::DbId;

/// Opening balance granted at registration.
pub const WELCOME_BONUS_POINTS: i64 = 500;

/// Transaction history page size when the caller does not pass one.
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Largest history page a caller may request.
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Check the shape of a transfer before any balance is read.
pub fn validate_transfer(sender_id: DbId, recipient_id: DbId, amount: i64) -> Result<(), CoreError> {
    if amount < 1 {
        return Err(CoreError::Validation(format!(
            "amount must be a positive integer, got {amount}"
        )));
    }
    if sender_id == recipient_id {
        return Err(CoreError::InvalidRecipient(
            "Cannot send points to yourself".into(),
        ));
    }
    Ok(())
}

/// Check the sender's locked balance covers the amount.
pub fn check_balance(available: i64, requested: i64) -> Result<(), CoreError> {
    if available < requested {
        return Err(CoreError::InsufficientBalance {
            available,
            requested,
        });
    }
    Ok(())
}

/// Clamp a caller-supplied history limit into `1..=MAX_HISTORY_LIMIT`.
pub fn clamp_history_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}
