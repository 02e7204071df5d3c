// vantage-api/src/routes/flags.rs
// ============================================================================
// Module: Feature Flag Routes
// Description: HTTP surface over C14's FeatureFlagClient.
// Purpose: Let operators read/flip global, per-tenant, and rollout state.
// Dependencies: axum, vantage-flags
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use serde::Deserialize;
use serde::Serialize;
use vantage_flags::FeatureFlagClient;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FlagStatusResponse {
    pub feature: String,
    pub enabled_for_caller: bool,
    pub rollout_percentage: u8,
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(feature): Path<String>,
) -> Json<FlagStatusResponse> {
    let client = FeatureFlagClient::new(state.cache.as_ref());
    let enabled_for_caller = client.is_enabled(&feature, &principal.tenant_id).await;
    let rollout_percentage = client.rollout_percentage(&feature).await;
    Json(FlagStatusResponse { feature, enabled_for_caller, rollout_percentage })
}

#[derive(Debug, Deserialize)]
pub struct SetGlobalRequest {
    pub enabled: bool,
}

pub async fn set_global(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(feature): Path<String>,
    Json(body): Json<SetGlobalRequest>,
) -> Result<(), ApiError> {
    let client = FeatureFlagClient::new(state.cache.as_ref());
    client.set_global(&feature, body.enabled).await.map_err(cache_error)?;
    crate::audit::record(&state, &principal, "flags.set_global", "feature_flag", &feature, "PATCH", "/flags/{feature}/global").await;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SetTenantRequest {
    pub enabled: bool,
}

pub async fn set_tenant(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(feature): Path<String>,
    Json(body): Json<SetTenantRequest>,
) -> Result<(), ApiError> {
    let client = FeatureFlagClient::new(state.cache.as_ref());
    client.set_tenant(&feature, &principal.tenant_id, body.enabled).await.map_err(cache_error)?;
    crate::audit::record(&state, &principal, "flags.set_tenant", "feature_flag", &feature, "PATCH", "/flags/{feature}/tenant").await;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SetRolloutRequest {
    pub percentage: u8,
}

pub async fn set_rollout(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(feature): Path<String>,
    Json(body): Json<SetRolloutRequest>,
) -> Result<(), ApiError> {
    let client = FeatureFlagClient::new(state.cache.as_ref());
    client.set_rollout_percentage(&feature, body.percentage).await.map_err(cache_error)?;
    crate::audit::record(&state, &principal, "flags.set_rollout", "feature_flag", &feature, "PATCH", "/flags/{feature}/rollout").await;
    Ok(())
}

fn cache_error(error: vantage_cache::CacheError) -> ApiError {
    ApiError::new(vantage_core::error::ErrorCategory::Service, error.to_string())
}
