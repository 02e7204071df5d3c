// vantage-api/src/routes/rulesets.rs
// ============================================================================
// Module: Ruleset Routes
// Description: CRUD over rulesets and their immutable versions, plus a
//              side-effect-free script validation endpoint.
// Purpose: Give operators the ruleset lifecycle surface spec.md §6 names.
// Dependencies: axum, vantage-store, vantage-judgment, vantage-providers
// ============================================================================

//! ## Overview
//! No engine port exposes list/create/delete for rulesets — only a single
//! judgment call ever reads one by id (`JudgmentStore::ruleset`). The admin
//! surface here calls the narrow inherent methods on
//! [`vantage_store::PgStore`] added for exactly this (see
//! `vantage-store::admin`), the same precedent as
//! `PgStore::judgment_execution`.

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use vantage_core::JudgmentPolicy;
use vantage_core::Ruleset;
use vantage_core::RulesetId;
use vantage_core::RulesetVersion;
use vantage_core::RulesetVersionId;
use vantage_core::TrustLevel;
use vantage_judgment::JudgmentStore as _;
use vantage_judgment::types::JudgmentRequest;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::routes::judgment::ExecuteResponse;
use crate::routes::judgment::run_judgment;
use crate::state::AppState;

/// One ruleset's externally visible fields.
#[derive(Debug, Serialize)]
pub struct RulesetView {
    pub id: RulesetId,
    pub name: String,
    pub active_version: Option<u32>,
    pub trust_level: TrustLevel,
    pub trust_score: f64,
    pub execution_count: u64,
    pub accuracy_rate: Option<f64>,
}

impl From<Ruleset> for RulesetView {
    fn from(ruleset: Ruleset) -> Self {
        Self {
            id: ruleset.id,
            name: ruleset.name,
            active_version: ruleset.active_version,
            trust_level: ruleset.trust_level,
            trust_score: ruleset.trust_score,
            execution_count: ruleset.execution_count,
            accuracy_rate: ruleset.accuracy_rate,
        }
    }
}

/// `GET /rulesets`: every ruleset owned by the caller's tenant.
pub async fn list(State(state): State<Arc<AppState>>, principal: Principal) -> Result<Json<Vec<RulesetView>>, ApiError> {
    let rulesets = state.store.list_rulesets(&principal.tenant_id).await?;
    Ok(Json(rulesets.into_iter().map(RulesetView::from).collect()))
}

/// Body for `POST /rulesets`.
#[derive(Debug, Deserialize)]
pub struct CreateRulesetRequest {
    pub name: String,
}

/// `POST /rulesets`: creates a ruleset at trust level `Proposed` with no
/// version yet. Versions are added separately via `POST /rulesets/{id}/versions`.
pub async fn create(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateRulesetRequest>,
) -> Result<Json<RulesetView>, ApiError> {
    let ruleset = vantage_store::new_ruleset(
        RulesetId::new(uuid::Uuid::new_v4().to_string()),
        principal.tenant_id.clone(),
        body.name,
        OffsetDateTime::now_utc(),
    );
    state.store.create_ruleset(&ruleset).await?;
    crate::audit::record(&state, &principal, "ruleset.create", "ruleset", ruleset.id.as_str(), "POST", "/rulesets").await;
    Ok(Json(ruleset.into()))
}

async fn load(state: &AppState, ruleset_id: &RulesetId) -> Result<Ruleset, ApiError> {
    Ok(state.store.ruleset(ruleset_id).await?)
}

/// `GET /rulesets/{id}`.
pub async fn get(State(state): State<Arc<AppState>>, _principal: Principal, Path(ruleset_id): Path<RulesetId>) -> Result<Json<RulesetView>, ApiError> {
    Ok(Json(load(&state, &ruleset_id).await?.into()))
}

/// Body for `PATCH /rulesets/{id}`. Only `name` is operator-mutable; every
/// other field is owned by C7 (trust) or C12 (deployment) transitions.
#[derive(Debug, Deserialize)]
pub struct PatchRulesetRequest {
    pub name: String,
}

/// `PATCH /rulesets/{id}`.
pub async fn patch(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
    Json(body): Json<PatchRulesetRequest>,
) -> Result<Json<RulesetView>, ApiError> {
    let mut ruleset = load(&state, &ruleset_id).await?;
    ruleset.name = body.name;
    state.store.save_ruleset(&ruleset).await?;
    crate::audit::record(&state, &principal, "ruleset.patch", "ruleset", ruleset_id.as_str(), "PATCH", "/rulesets/{id}").await;
    Ok(Json(ruleset.into()))
}

/// `DELETE /rulesets/{id}`.
pub async fn delete(State(state): State<Arc<AppState>>, principal: Principal, Path(ruleset_id): Path<RulesetId>) -> Result<(), ApiError> {
    state.store.delete_ruleset(&ruleset_id).await?;
    crate::audit::record(&state, &principal, "ruleset.delete", "ruleset", ruleset_id.as_str(), "DELETE", "/rulesets/{id}").await;
    Ok(())
}

/// Body for `POST /rulesets/{id}/versions`.
#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub script: String,
    #[serde(default)]
    pub changelog: Option<String>,
}

/// Response for `POST /rulesets/{id}/versions`.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: u32,
    pub activated: bool,
}

/// `POST /rulesets/{id}/versions`: appends the next immutable version. A
/// ruleset's very first version is activated immediately — there is
/// otherwise no way for a brand new ruleset to ever be judged, since
/// `active_version` only moves through a deployment promotion.
pub async fn create_version(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
    Json(body): Json<CreateVersionRequest>,
) -> Result<Json<VersionResponse>, ApiError> {
    let mut ruleset = load(&state, &ruleset_id).await?;
    let version_number = state.store.next_ruleset_version(&ruleset_id).await?;
    let version = RulesetVersion {
        id: RulesetVersionId::new(uuid::Uuid::new_v4().to_string()),
        ruleset_id: ruleset_id.clone(),
        version: version_number,
        script: body.script,
        changelog: body.changelog,
        initial_trust_level: TrustLevel::Proposed,
        created_at: OffsetDateTime::now_utc(),
    };
    state.store.create_ruleset_version(&version).await?;

    let activated = ruleset.active_version.is_none();
    if activated {
        ruleset.active_version = Some(version_number);
        state.store.save_ruleset(&ruleset).await?;
    }
    crate::audit::record(&state, &principal, "ruleset.create_version", "ruleset_version", version.id.as_str(), "POST", "/rulesets/{id}/versions").await;
    Ok(Json(VersionResponse { version: version_number, activated }))
}

/// Body for `POST /rulesets/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub script: String,
    pub sample_input: serde_json::Value,
}

/// Response for `POST /rulesets/validate`. Evaluation failure is reported
/// as `valid: false`, not a 5xx — a failing script is the expected outcome
/// of this endpoint, not a server error.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub result: Option<serde_json::Value>,
    pub confidence: Option<f64>,
    pub error: Option<String>,
}

/// `POST /rulesets/validate`: runs `script` against `sample_input` through
/// C2 without persisting anything.
pub async fn validate(State(state): State<Arc<AppState>>, _principal: Principal, Json(body): Json<ValidateRequest>) -> Json<ValidateResponse> {
    match state.script_evaluator.evaluate(&body.script, &body.sample_input).await {
        Ok(outcome) => Json(ValidateResponse { valid: true, result: Some(outcome.result), confidence: Some(outcome.confidence), error: None }),
        Err(error) => Json(ValidateResponse { valid: false, result: None, confidence: None, error: Some(error.to_string()) }),
    }
}

/// Body for `POST /rulesets/{id}/execute`: identical to `ExecuteRequest`
/// minus `ruleset_id`, which comes from the path instead.
#[derive(Debug, Deserialize)]
pub struct ExecuteByPathRequest {
    pub input_data: serde_json::Value,
    #[serde(default)]
    pub policy: Option<JudgmentPolicy>,
    #[serde(default)]
    pub need_explanation: bool,
    #[serde(default)]
    pub identifier: Option<(vantage_core::IdentifierType, vantage_core::Identifier)>,
}

/// `POST /rulesets/{id}/execute`: an alias for `POST /judgment/execute`
/// scoped by path rather than body, matching spec.md §6's endpoint list.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
    Json(body): Json<ExecuteByPathRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let request = JudgmentRequest {
        tenant_id: principal.tenant_id,
        ruleset_id,
        input_data: body.input_data,
        policy: body.policy,
        need_explanation: body.need_explanation,
        identifier: body.identifier,
    };
    Ok(Json(run_judgment(&state, request).await?))
}
