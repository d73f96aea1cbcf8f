//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gateway: None,
        latency_ms: None,
    })
}

/// Readiness check against the data gateway
///
/// Also sweeps idle dashboard sessions and expired token revocations.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let evicted = state.sessions.evict_idle().await;
    let pruned = state.revocations.prune_expired().await;
    if evicted > 0 || pruned > 0 {
        tracing::debug!(evicted, pruned, "Swept idle sessions and expired revocations");
    }

    let health = state.gateway.health_check().await;
    let (status, label) = if health.is_healthy() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            gateway: Some(health.adapter_id),
            latency_ms: Some(health.latency_ms),
        }),
    )
}
