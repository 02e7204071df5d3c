// vantage-api/src/routes/deployment.rs
// ============================================================================
// Module: Deployment Routes
// Description: HTTP surface over C12's deployment lifecycle transitions.
// Purpose: Expose start-canary/traffic/promote/rollback/metrics/health.
// Dependencies: axum, vantage-deployment, vantage-canary
// ============================================================================

//! ## Overview
//! Every transition loads the deployment through [`vantage_deployment::DeploymentStore`],
//! mutates it via the matching `vantage_deployment::controller` function (the
//! only place the transition rules live), and returns the saved row. Metrics
//! and health read-paths aggregate the deployment's own execution logs
//! through C10/C11 rather than returning raw rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use vantage_core::CanaryConfig;
use vantage_core::CompensationStrategy;
use vantage_core::DeploymentId;
use vantage_core::DeploymentStatus;
use vantage_core::RulesetId;
use vantage_core::TriggeredBy;
use vantage_core::VersionType;
use vantage_deployment::DeploymentStore as _;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

async fn load(state: &AppState, deployment_id: &DeploymentId) -> Result<vantage_core::Deployment, ApiError> {
    Ok(state.store.deployment(deployment_id).await?)
}

/// Body for `POST /deployments`.
#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    pub ruleset_id: RulesetId,
    pub target_version: u32,
    #[serde(default)]
    pub previous_version: Option<u32>,
    #[serde(default)]
    pub canary_config: CanaryConfig,
    #[serde(default = "default_compensation_strategy")]
    pub compensation_strategy: CompensationStrategy,
}

fn default_compensation_strategy() -> CompensationStrategy {
    CompensationStrategy::MarkAndReprocess
}

/// `POST /deployments`: creates a deployment at `Draft`, routing no traffic
/// until `start-canary` moves it forward.
pub async fn create(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateDeploymentRequest>,
) -> Result<Json<vantage_core::Deployment>, ApiError> {
    let deployment = vantage_core::Deployment {
        id: DeploymentId::new(uuid::Uuid::new_v4().to_string()),
        tenant_id: principal.tenant_id.clone(),
        ruleset_id: body.ruleset_id,
        status: DeploymentStatus::Draft,
        target_version: body.target_version,
        previous_version: body.previous_version,
        canary_config: body.canary_config,
        compensation_strategy: body.compensation_strategy,
        canary_traffic_percentage: 0,
        started_at: None,
        promoted_at: None,
        rolled_back_at: None,
        rollback_reason: None,
        rollback_to_version: None,
        metadata: BTreeMap::new(),
    };
    state.store.save_deployment(&deployment).await?;
    crate::audit::record(&state, &principal, "deployment.create", "deployment", deployment.id.as_str(), "POST", "/deployments").await;
    Ok(Json(deployment))
}

#[derive(Debug, Deserialize)]
pub struct StartCanaryRequest {
    #[serde(default)]
    pub initial_traffic_percentage: Option<u8>,
}

pub async fn start_canary(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(deployment_id): Path<DeploymentId>,
    Json(body): Json<StartCanaryRequest>,
) -> Result<Json<vantage_core::Deployment>, ApiError> {
    let mut deployment = load(&state, &deployment_id).await?;
    vantage_deployment::start_canary(&state.store, &mut deployment, body.initial_traffic_percentage.unwrap_or(5)).await?;
    crate::audit::record(&state, &principal, "deployment.start_canary", "deployment", deployment_id.as_str(), "POST", "/deployments/{id}/start-canary").await;
    Ok(Json(deployment))
}

#[derive(Debug, Deserialize)]
pub struct SetTrafficRequest {
    pub percentage: u8,
}

pub async fn set_traffic(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(deployment_id): Path<DeploymentId>,
    Json(body): Json<SetTrafficRequest>,
) -> Result<Json<vantage_core::Deployment>, ApiError> {
    let mut deployment = load(&state, &deployment_id).await?;
    vantage_deployment::set_traffic(&state.store, &mut deployment, body.percentage).await?;
    crate::audit::record(&state, &principal, "deployment.set_traffic", "deployment", deployment_id.as_str(), "PUT", "/deployments/{id}/traffic").await;
    Ok(Json(deployment))
}

pub async fn promote(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(deployment_id): Path<DeploymentId>,
) -> Result<Json<vantage_core::Deployment>, ApiError> {
    let mut deployment = load(&state, &deployment_id).await?;
    vantage_deployment::promote(&state.store, state.cache.as_ref(), &mut deployment).await?;
    crate::audit::record(&state, &principal, "deployment.promote", "deployment", deployment_id.as_str(), "POST", "/deployments/{id}/promote").await;
    Ok(Json(deployment))
}

#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    pub reason: String,
    #[serde(default = "default_triggered_by")]
    pub triggered_by: TriggeredBy,
}

fn default_triggered_by() -> TriggeredBy {
    TriggeredBy::Manual
}

#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    pub rolled_back: vantage_core::Deployment,
    pub restored: Option<vantage_core::Deployment>,
    pub compensated_rows: usize,
}

pub async fn rollback(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(deployment_id): Path<DeploymentId>,
    Json(body): Json<RollbackRequest>,
) -> Result<Json<RollbackResponse>, ApiError> {
    let mut deployment = load(&state, &deployment_id).await?;
    let outcome =
        vantage_deployment::rollback(&state.store, state.cache.as_ref(), &mut deployment, body.reason, body.triggered_by, None)
            .await?;
    crate::audit::record(&state, &principal, "deployment.rollback", "deployment", deployment_id.as_str(), "POST", "/deployments/{id}/rollback").await;
    Ok(Json(RollbackResponse {
        rolled_back: outcome.rolled_back,
        restored: outcome.restored,
        compensated_rows: outcome.compensated_rows,
    }))
}

const METRICS_WINDOW_MINUTES: i64 = 15;

pub async fn metrics(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(deployment_id): Path<DeploymentId>,
) -> Result<Json<vantage_core::DeploymentMetricsWindow>, ApiError> {
    let window_end = OffsetDateTime::now_utc();
    let window_start = window_end - time::Duration::minutes(METRICS_WINDOW_MINUTES);
    let logs = vantage_scheduler::SchedulerStore::recent_execution_logs(&state.store, &deployment_id, VersionType::Canary)
        .await
        .map_err(|error| ApiError::new(vantage_core::error::ErrorCategory::Database, error.to_string()))?;
    let window = vantage_canary::metrics::aggregate(&deployment_id, VersionType::Canary, &logs, window_start, window_end);
    Ok(Json(window))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub state: &'static str,
    pub should_halt: bool,
    pub halt_reason: Option<String>,
    pub warnings: Vec<String>,
}

pub async fn health(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(deployment_id): Path<DeploymentId>,
) -> Result<Json<HealthResponse>, ApiError> {
    let deployment = load(&state, &deployment_id).await?;
    let window_end = OffsetDateTime::now_utc();
    let window_start = window_end - time::Duration::minutes(METRICS_WINDOW_MINUTES);

    let canary_logs =
        vantage_scheduler::SchedulerStore::recent_execution_logs(&state.store, &deployment_id, VersionType::Canary)
            .await
            .map_err(|error| ApiError::new(vantage_core::error::ErrorCategory::Database, error.to_string()))?;
    let canary_window = vantage_canary::metrics::aggregate(&deployment_id, VersionType::Canary, &canary_logs, window_start, window_end);
    let stable_window = vantage_scheduler::SchedulerStore::stable_metrics_window(&state.store, &deployment_id)
        .await
        .map_err(|error| ApiError::new(vantage_core::error::ErrorCategory::Database, error.to_string()))?;

    let status = vantage_canary::breaker::evaluate(&canary_window, stable_window.as_ref(), &deployment.canary_config);
    Ok(Json(HealthResponse {
        state: match status.state {
            vantage_canary::breaker::CircuitState::Healthy => "healthy",
            vantage_canary::breaker::CircuitState::Warning => "warning",
            vantage_canary::breaker::CircuitState::Critical => "critical",
        },
        should_halt: status.should_halt,
        halt_reason: status.halt_reason,
        warnings: status.warnings,
    }))
}
