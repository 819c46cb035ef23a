//! Periodic deactivation of expired activities.

use std::time::Duration;

use blip_db::repositories::ActivityRepo;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Clear `is_active` on past-expiry activities every `every` until
/// `cancel` fires.
pub async fn run(pool: PgPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Activity expiry sweep started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Activity expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match ActivityRepo::deactivate_expired(&pool, Utc::now()).await {
                    Ok(0) => tracing::debug!("Activity sweep: nothing expired"),
                    Ok(deactivated) => {
                        tracing::info!(deactivated, "Activity sweep: deactivated expired activities");
                    }
                    Err(e) => tracing::error!(error = %e, "Activity sweep failed"),
                }
            }
        }
    }
}
