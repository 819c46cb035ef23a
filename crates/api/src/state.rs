use std::sync::Arc;

use blip_events::{EventBus, NotificationSink};

use crate::config::ServerConfig;
use crate::engine::{ConnectionGraph, Ledger, RequestEngine};
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: blip_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (push channel).
    pub ws_manager: Arc<WsManager>,
    /// Bus every engine event is published on.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    fn sink(&self) -> Arc<dyn NotificationSink> {
        self.event_bus.clone()
    }

    pub fn request_engine(&self) -> RequestEngine {
        RequestEngine::new(self.pool.clone(), self.sink(), self.config.daily_cap())
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.pool.clone(), self.sink())
    }

    pub fn connection_graph(&self) -> ConnectionGraph {
        ConnectionGraph::new(self.pool.clone(), self.sink())
    }
}
