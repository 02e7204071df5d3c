// vantage-api/src/routes/health.rs
// ============================================================================
// Module: Health Routes
// Description: Liveness and readiness probes.
// Purpose: Let a load balancer/orchestrator gate traffic on DB reachability.
// Dependencies: axum, vantage-store
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

/// Always returns `200`; confirms the process is up, not that it can serve traffic.
pub async fn liveness() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Confirms the store is reachable.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Result<Json<HealthBody>, ApiError> {
    state.store.readiness().await.map_err(|error| ApiError::new(vantage_core::error::ErrorCategory::Database, error.to_string()))?;
    Ok(Json(HealthBody { status: "ok" }))
}
