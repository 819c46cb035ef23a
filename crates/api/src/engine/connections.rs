//! Symmetric connection graph.
//!
//! Each pair has at most one row, keyed by `(user_low, user_high)`. Every
//! mutation locks that row so concurrent requests from both sides collapse
//! into one edge.

use std::sync::Arc;

use blip_core::connection::{
    can_accept, ordered_pair, validate_pair, ConnectionState, ConnectionStatus,
};
use blip_core::error::CoreError;
use blip_core::notification::NotificationKind;
use blip_core::types::{DbId, Timestamp};
use blip_db::models::connection::Connection;
use blip_db::repositories::{ConnectionRepo, UserRepo};
use blip_events::{NotificationSink, PlatformEvent};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use crate::error::{is_unique_violation, AppResult};

const SOURCE_ENTITY: &str = "connection";

/// An edge as seen from one side.
#[derive(Debug, Serialize)]
pub struct ConnectionView {
    pub connection_id: DbId,
    pub user_id: DbId,
    pub status: ConnectionStatus,
    pub created_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
}

impl ConnectionView {
    fn for_viewer(connection: &Connection, viewer: DbId) -> AppResult<Self> {
        Ok(ConnectionView {
            connection_id: connection.id,
            user_id: connection.peer_of(viewer),
            status: connection.status_for(viewer)?,
            created_at: connection.created_at,
            accepted_at: connection.accepted_at,
        })
    }
}

/// Derived counts, never stored.
#[derive(Debug, Serialize)]
pub struct ConnectionCounts {
    pub connection_count: i64,
    pub pending_count: i64,
}

#[derive(Clone)]
pub struct ConnectionGraph {
    pool: PgPool,
    sink: Arc<dyn NotificationSink>,
}

impl ConnectionGraph {
    pub fn new(pool: PgPool, sink: Arc<dyn NotificationSink>) -> Self {
        Self { pool, sink }
    }

    /// Open a pending edge from `actor` to `other`.
    pub async fn request(&self, actor: DbId, other: DbId) -> AppResult<ConnectionView> {
        validate_pair(actor, other)?;
        UserRepo::find_by_id(&self.pool, other)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: other,
            })?;

        let (low, high) = ordered_pair(actor, other);
        let mut tx = self.pool.begin().await?;
        if ConnectionRepo::lock_pair(&mut *tx, low, high).await?.is_some() {
            return Err(CoreError::AlreadyRequested.into());
        }
        let connection = match ConnectionRepo::create_pending(&mut *tx, low, high, actor).await {
            Ok(connection) => connection,
            Err(e) if is_unique_violation(&e, "uq_connections_pair") => {
                return Err(CoreError::AlreadyRequested.into());
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        tracing::info!(connection_id = connection.id, actor, other, "Connection requested");
        self.sink.emit(
            PlatformEvent::new(NotificationKind::ConnectionRequested, other)
                .with_source(SOURCE_ENTITY, connection.id)
                .with_actor(actor)
                .with_payload(json!({ "connection_id": connection.id })),
        );

        ConnectionView::for_viewer(&connection, actor)
    }

    /// Accept a pending edge. Only the side that did not initiate may.
    pub async fn accept(&self, actor: DbId, other: DbId) -> AppResult<ConnectionView> {
        validate_pair(actor, other)?;
        let mut tx = self.pool.begin().await?;
        let existing = lock_existing(&mut *tx, actor, other).await?;
        if existing.state()? == ConnectionState::Connected {
            return Err(CoreError::AlreadyRequested.into());
        }
        can_accept(actor, existing.requester_id)?;

        let connection = ConnectionRepo::accept(&mut *tx, existing.id)
            .await?
            .ok_or(CoreError::AlreadyRequested)?;
        tx.commit().await?;

        tracing::info!(connection_id = connection.id, actor, other, "Connection accepted");
        self.sink.emit(
            PlatformEvent::new(NotificationKind::ConnectionAccepted, connection.requester_id)
                .with_source(SOURCE_ENTITY, connection.id)
                .with_actor(actor)
                .with_payload(json!({ "connection_id": connection.id })),
        );

        ConnectionView::for_viewer(&connection, actor)
    }

    /// Decline a pending edge addressed to `actor`. The row is removed so
    /// either side may ask again later.
    pub async fn reject(&self, actor: DbId, other: DbId) -> AppResult<()> {
        validate_pair(actor, other)?;
        let mut tx = self.pool.begin().await?;
        let existing = lock_existing(&mut *tx, actor, other).await?;
        if existing.state()? == ConnectionState::Connected {
            return Err(CoreError::Validation(
                "Connection is already accepted; remove it instead".into(),
            )
            .into());
        }
        can_accept(actor, existing.requester_id)?;
        ConnectionRepo::delete(&mut *tx, existing.id).await?;
        tx.commit().await?;

        tracing::info!(connection_id = existing.id, actor, other, "Connection rejected");
        Ok(())
    }

    /// Drop the edge in either state, from either side.
    pub async fn remove(&self, actor: DbId, other: DbId) -> AppResult<()> {
        validate_pair(actor, other)?;
        let mut tx = self.pool.begin().await?;
        let existing = lock_existing(&mut *tx, actor, other).await?;
        ConnectionRepo::delete(&mut *tx, existing.id).await?;
        tx.commit().await?;

        tracing::info!(connection_id = existing.id, actor, other, "Connection removed");
        Ok(())
    }

    /// Status of the pair from `actor`'s side.
    pub async fn status(&self, actor: DbId, other: DbId) -> AppResult<ConnectionStatus> {
        validate_pair(actor, other)?;
        let (low, high) = ordered_pair(actor, other);
        match ConnectionRepo::find_pair(&self.pool, low, high).await? {
            Some(connection) => Ok(connection.status_for(actor)?),
            None => Ok(ConnectionStatus::None),
        }
    }

    pub async fn list(&self, user_id: DbId) -> AppResult<Vec<ConnectionView>> {
        let rows = ConnectionRepo::list_connected(&self.pool, user_id).await?;
        rows.iter()
            .map(|c| ConnectionView::for_viewer(c, user_id))
            .collect()
    }

    /// Pending edges in both directions.
    pub async fn pending(&self, user_id: DbId) -> AppResult<Vec<ConnectionView>> {
        let rows = ConnectionRepo::list_pending(&self.pool, user_id).await?;
        rows.iter()
            .map(|c| ConnectionView::for_viewer(c, user_id))
            .collect()
    }

    pub async fn counts(&self, user_id: DbId) -> AppResult<ConnectionCounts> {
        let (connection_count, pending_count) = ConnectionRepo::counts(&self.pool, user_id).await?;
        Ok(ConnectionCounts {
            connection_count,
            pending_count,
        })
    }
}

/// Lock the pair's row. A missing edge reports the peer's user id.
async fn lock_existing(
    conn: &mut sqlx::PgConnection,
    actor: DbId,
    other: DbId,
) -> AppResult<Connection> {
    let (low, high) = ordered_pair(actor, other);
    Ok(ConnectionRepo::lock_pair(conn, low, high)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Connection",
            id: other,
        })?)
}
