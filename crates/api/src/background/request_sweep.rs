//! Periodic expiry of overdue proximity requests.
//!
//! Polls and actions already expire lazily; the sweep covers requests
//! nobody looks at so both parties still hear `request_expired`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::RequestEngine;

/// Run the sweep every `every` until `cancel` fires.
pub async fn run(engine: RequestEngine, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Request expiry sweep started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Request expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.expire_overdue().await {
                    Ok(0) => tracing::debug!("Request sweep: nothing overdue"),
                    Ok(expired) => tracing::info!(expired, "Request sweep: expired overdue requests"),
                    Err(e) => tracing::error!(error = %e, "Request sweep failed"),
                }
            }
        }
    }
}
