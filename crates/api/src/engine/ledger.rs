//! Point ledger.
//!
//! A transfer locks both user rows in id order, checks the sender's
//! balance under that lock, then debits, credits, and appends the
//! transaction row in the same commit.

use std::sync::Arc;

use blip_core::error::CoreError;
use blip_core::ledger::{self, check_balance, validate_transfer};
use blip_core::notification::NotificationKind;
use blip_core::types::DbId;
use blip_db::models::point_transaction::PointTransaction;
use blip_db::repositories::{PointTransactionRepo, UserRepo};
use blip_events::{NotificationSink, PlatformEvent};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use crate::error::AppResult;

/// Private balance plus the public received total.
#[derive(Debug, Serialize)]
pub struct Balance {
    pub user_id: DbId,
    pub balance: i64,
    pub points_received: i64,
}

/// Which side of a transaction the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// A history entry from the viewer's perspective.
#[derive(Debug, Serialize)]
pub struct TransactionEntry {
    #[serde(flatten)]
    pub transaction: PointTransaction,
    pub direction: Direction,
}

#[derive(Clone)]
pub struct Ledger {
    pool: PgPool,
    sink: Arc<dyn NotificationSink>,
}

impl Ledger {
    pub fn new(pool: PgPool, sink: Arc<dyn NotificationSink>) -> Self {
        Self { pool, sink }
    }

    /// Move `amount` points from `sender_id` to `recipient_id`.
    ///
    /// Either every write lands or none does; a failed transfer leaves both
    /// balances untouched.
    pub async fn transfer(
        &self,
        sender_id: DbId,
        recipient_id: DbId,
        amount: i64,
    ) -> AppResult<PointTransaction> {
        validate_transfer(sender_id, recipient_id, amount)?;

        let mut tx = self.pool.begin().await?;
        let locked = UserRepo::lock_many(&mut *tx, &[sender_id, recipient_id]).await?;

        let sender = locked
            .iter()
            .find(|u| u.id == sender_id)
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: sender_id,
            })?;
        if !locked.iter().any(|u| u.id == recipient_id) {
            return Err(CoreError::InvalidRecipient("Recipient does not exist".into()).into());
        }
        check_balance(sender.points_balance, amount)?;

        let balance = UserRepo::debit_balance(&mut *tx, sender_id, amount).await?;
        UserRepo::credit_received(&mut *tx, recipient_id, amount).await?;
        let entry = PointTransactionRepo::append(&mut *tx, sender_id, recipient_id, amount).await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = entry.id,
            sender_id,
            recipient_id,
            amount,
            balance,
            "Points transferred",
        );

        self.sink.emit(
            PlatformEvent::new(NotificationKind::PointsReceived, recipient_id)
                .with_source("point_transaction", entry.id)
                .with_actor(sender_id)
                .with_payload(json!({
                    "transaction_id": entry.id,
                    "amount": amount,
                })),
        );

        Ok(entry)
    }

    pub async fn balance(&self, user_id: DbId) -> AppResult<Balance> {
        let user = UserRepo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;
        Ok(Balance {
            user_id,
            balance: user.points_balance,
            points_received: user.points_received,
        })
    }

    /// Most recent transactions the user sent or received.
    pub async fn history(&self, user_id: DbId, limit: Option<i64>) -> AppResult<Vec<TransactionEntry>> {
        let limit = ledger::clamp_history_limit(limit);
        let rows = PointTransactionRepo::list_for_user(&self.pool, user_id, limit).await?;
        Ok(rows
            .into_iter()
            .map(|transaction| TransactionEntry {
                direction: if transaction.sender_id == user_id {
                    Direction::Sent
                } else {
                    Direction::Received
                },
                transaction,
            })
            .collect())
    }
}
