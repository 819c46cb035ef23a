//! Ledger rows and DTOs.

use blip_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the append-only `point_transactions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PointTransaction {
    pub id: DbId,
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub amount: i64,
    pub created_at: Timestamp,
}

/// DTO for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferPoints {
    pub recipient_id: DbId,
    pub amount: i64,
}
