//! Repository for the append-only `point_transactions` table.

use blip_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::point_transaction::PointTransaction;

/// Column list for `point_transactions` queries.
const COLUMNS: &str = "id, sender_id, recipient_id, amount, created_at";

/// Appends and reads ledger entries. There is no update or delete.
pub struct PointTransactionRepo;

impl PointTransactionRepo {
    pub async fn append(
        executor: impl PgExecutor<'_>,
        sender_id: DbId,
        recipient_id: DbId,
        amount: i64,
    ) -> Result<PointTransaction, sqlx::Error> {
        let query = format!(
            "INSERT INTO point_transactions (sender_id, recipient_id, amount) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PointTransaction>(&query)
            .bind(sender_id)
            .bind(recipient_id)
            .bind(amount)
            .fetch_one(executor)
            .await
    }

    /// Entries where `user_id` is sender or recipient, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<PointTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM point_transactions \
             WHERE sender_id = $1 OR recipient_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, PointTransaction>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
