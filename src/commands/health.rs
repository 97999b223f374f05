use tracing::{info, warn};

use crate::analyzer::{RefreshOutcome, ServiceHealth};

use super::AppState;

pub async fn check_health(state: &AppState) -> Result<ServiceHealth, String> {
    info!("Running health check");
    let health = state.client().health().await.map_err(|e| {
        warn!("Health check failed: {}", e);
        e.to_string()
    })?;
    info!(
        "Service status: {} ({})",
        health.status,
        health.service.as_deref().unwrap_or("unknown service")
    );
    Ok(health)
}

/// Ask the service to rebuild its character database.
pub async fn refresh_database(state: &AppState) -> Result<RefreshOutcome, String> {
    let outcome = state.client().refresh_database().await?;
    if !outcome.success {
        warn!(
            "Database refresh failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(outcome)
}
