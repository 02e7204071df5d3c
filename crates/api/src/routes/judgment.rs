// vantage-api/src/routes/judgment.rs
// ============================================================================
// Module: Judgment Routes
// Description: HTTP surface over C8's evaluate()/replay()/what_if() calls.
// Purpose: Expose judgment execution and explainability to HTTP callers.
// Dependencies: axum, vantage-judgment, vantage-store
// ============================================================================

//! ## Overview
//! `POST /judgment/execute` wires directly to [`vantage_judgment::evaluate`].
//! The replay/what-if handlers first resolve `{execution_id}` against
//! [`vantage_store::PgStore::judgment_execution`] — the engine's own
//! `replay_execution`/`what_if` take an already-loaded `JudgmentExecution`,
//! not an id, so the HTTP layer owns that one lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use serde::Deserialize;
use serde::Serialize;
use vantage_core::ExecutionId;
use vantage_core::Identifier;
use vantage_core::IdentifierType;
use vantage_core::JudgmentPolicy;
use vantage_core::RulesetId;
use vantage_judgment::replay::ReplayTarget;
use vantage_judgment::types::JudgmentRequest;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

/// Body for `POST /judgment/execute`.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub ruleset_id: RulesetId,
    pub input_data: serde_json::Value,
    #[serde(default)]
    pub policy: Option<JudgmentPolicy>,
    #[serde(default)]
    pub need_explanation: bool,
    #[serde(default)]
    pub identifier: Option<(IdentifierType, Identifier)>,
}

/// Response for `POST /judgment/execute`.
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub output: serde_json::Value,
    pub confidence: f64,
    pub method_used: vantage_core::MethodUsed,
    pub risk_level: vantage_core::RiskLevel,
    pub decision: vantage_core::Decision,
    pub cache_hit: bool,
    pub auto_executed: bool,
}

impl From<vantage_judgment::types::JudgmentOutcome> for ExecuteResponse {
    fn from(outcome: vantage_judgment::types::JudgmentOutcome) -> Self {
        Self {
            output: outcome.output,
            confidence: outcome.confidence,
            method_used: outcome.method_used,
            risk_level: outcome.risk_level,
            decision: outcome.decision,
            cache_hit: outcome.cache_hit,
            auto_executed: outcome.auto_executed,
        }
    }
}

pub async fn execute(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let request = JudgmentRequest {
        tenant_id: principal.tenant_id,
        ruleset_id: body.ruleset_id,
        input_data: body.input_data,
        policy: body.policy,
        need_explanation: body.need_explanation,
        identifier: body.identifier,
    };
    Ok(Json(run_judgment(&state, request).await?))
}

/// Shared by `POST /judgment/execute` and `POST /rulesets/{id}/execute`,
/// which differ only in where `ruleset_id` comes from.
pub(crate) async fn run_judgment(state: &AppState, request: JudgmentRequest) -> Result<ExecuteResponse, ApiError> {
    let outcome = vantage_judgment::evaluate(
        &state.store,
        state.cache.as_ref(),
        state.script_evaluator.as_ref(),
        Some(state.model_gateway.as_ref()),
        &request,
    )
    .await?;
    Ok(outcome.into())
}

/// Query parameters shared by the replay endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ReplayQuery {
    /// `current_active` (default), `original`, or a bare version number.
    #[serde(default)]
    pub target: Option<String>,
}

fn resolve_target(query: &ReplayQuery) -> ReplayTarget {
    match query.target.as_deref() {
        Some("original") => ReplayTarget::Original,
        Some(other) => other.parse::<u32>().map_or(ReplayTarget::CurrentActive, ReplayTarget::Version),
        None => ReplayTarget::CurrentActive,
    }
}

/// Response shared by the replay and what-if endpoints.
#[derive(Debug, Serialize)]
pub struct ReplayResponse {
    pub original_output: serde_json::Value,
    pub replay: ExecuteResponse,
    pub replay_version: u32,
    pub result_changed: bool,
    pub confidence_diff: f64,
    pub confidence_changed: bool,
    pub method_changed: bool,
    pub ruleset_changed: bool,
    pub change_reasons: Vec<&'static str>,
}

impl From<vantage_judgment::replay::ReplayResult> for ReplayResponse {
    fn from(result: vantage_judgment::replay::ReplayResult) -> Self {
        Self {
            original_output: result.original.output,
            replay: result.replay.into(),
            replay_version: result.replay_version,
            result_changed: result.comparison.result_changed,
            confidence_diff: result.comparison.confidence_diff,
            confidence_changed: result.comparison.confidence_changed,
            method_changed: result.comparison.method_changed,
            ruleset_changed: result.comparison.ruleset_changed,
            change_reasons: result.comparison.change_reasons,
        }
    }
}

pub async fn replay(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(execution_id): Path<ExecutionId>,
    Query(query): Query<ReplayQuery>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let original = state.store.judgment_execution(&execution_id).await?;
    let target = resolve_target(&query);
    let result = vantage_judgment::replay::replay_execution(
        &state.store,
        state.cache.as_ref(),
        state.script_evaluator.as_ref(),
        Some(state.model_gateway.as_ref()),
        &original,
        target,
    )
    .await?;
    Ok(Json(result.into()))
}

/// Body for `POST /judgment/replay/batch`.
#[derive(Debug, Deserialize)]
pub struct ReplayBatchRequest {
    pub execution_ids: Vec<ExecutionId>,
    #[serde(default)]
    pub query: ReplayQuery,
}

/// One entry in a batch replay response: either a result or an error
/// message, so one bad id doesn't fail the whole batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ReplayBatchEntry {
    Ok { execution_id: ExecutionId, result: ReplayResponse },
    Error { execution_id: ExecutionId, message: String },
}

pub async fn replay_batch(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Json(body): Json<ReplayBatchRequest>,
) -> Result<Json<Vec<ReplayBatchEntry>>, ApiError> {
    let target = resolve_target(&body.query);
    let mut entries = Vec::with_capacity(body.execution_ids.len());
    for execution_id in body.execution_ids {
        let entry = match replay_one(&state, &execution_id, target).await {
            Ok(result) => ReplayBatchEntry::Ok { execution_id, result },
            Err(error) => ReplayBatchEntry::Error { execution_id, message: error.error.message },
        };
        entries.push(entry);
    }
    Ok(Json(entries))
}

async fn replay_one(state: &AppState, execution_id: &ExecutionId, target: ReplayTarget) -> Result<ReplayResponse, ApiError> {
    let original = state.store.judgment_execution(execution_id).await?;
    let result = vantage_judgment::replay::replay_execution(
        &state.store,
        state.cache.as_ref(),
        state.script_evaluator.as_ref(),
        Some(state.model_gateway.as_ref()),
        &original,
        target,
    )
    .await?;
    Ok(result.into())
}

/// Body for `POST /judgment/what-if/{execution_id}`.
#[derive(Debug, Deserialize)]
pub struct WhatIfRequest {
    pub modifications: BTreeMap<String, serde_json::Value>,
}

pub async fn what_if(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(execution_id): Path<ExecutionId>,
    Json(body): Json<WhatIfRequest>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let original = state.store.judgment_execution(&execution_id).await?;
    let result = vantage_judgment::replay::what_if(
        &state.store,
        state.cache.as_ref(),
        state.script_evaluator.as_ref(),
        Some(state.model_gateway.as_ref()),
        &original,
        &body.modifications,
    )
    .await?;
    Ok(Json(result.into()))
}
