// vantage-api/src/routes/trust.rs
// ============================================================================
// Module: Trust Routes
// Description: HTTP surface over C7's score/transition logic and its history.
// Purpose: Expose trust inspection, recomputation, and manual overrides.
// Dependencies: axum, vantage-trust, vantage-scheduler, vantage-store
// ============================================================================

//! ## Overview
//! spec.md §6 names `/trust/rules/{id}` without a separate "TrustRule"
//! entity in the data model — trust state lives directly on [`Ruleset`].
//! `GET` returns that ruleset's trust view; `POST` is an admin reset to a
//! supplied snapshot (e.g. seeding trust state for a migrated ruleset),
//! the one trust mutation with no natural score/transition derivation.
//! Every other handler here is a thin HTTP wrapper around
//! [`vantage_trust`]'s pure functions plus
//! [`vantage_scheduler::SchedulerStore::save_trust_evaluation`], the same
//! persistence hook `run_trust_reevaluator_once` uses.

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use vantage_core::RulesetId;
use vantage_core::TrustComponents;
use vantage_core::TrustHistory;
use vantage_core::TrustHistoryId;
use vantage_core::TrustLevel;
use vantage_core::TrustWeights;
use vantage_judgment::JudgmentStore as _;
use vantage_scheduler::SchedulerStore as _;
use vantage_trust::TransitionInputs;
use vantage_trust::TrustThresholds;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

/// A ruleset's trust state, as exposed to operators.
#[derive(Debug, Serialize)]
pub struct TrustView {
    pub ruleset_id: RulesetId,
    pub trust_level: TrustLevel,
    pub trust_score: f64,
    pub trust_components: TrustComponents,
    pub execution_count: u64,
    pub accuracy_rate: Option<f64>,
}

/// `GET /trust/rules/{id}`.
pub async fn get(State(state): State<Arc<AppState>>, _principal: Principal, Path(ruleset_id): Path<RulesetId>) -> Result<Json<TrustView>, ApiError> {
    let ruleset = state.store.ruleset(&ruleset_id).await?;
    Ok(Json(TrustView {
        ruleset_id: ruleset.id,
        trust_level: ruleset.trust_level,
        trust_score: ruleset.trust_score,
        trust_components: ruleset.trust_components,
        execution_count: ruleset.execution_count,
        accuracy_rate: ruleset.accuracy_rate,
    }))
}

/// Body for `POST /trust/rules/{id}`: an admin-supplied trust snapshot.
#[derive(Debug, Deserialize)]
pub struct SetTrustRequest {
    pub components: TrustComponents,
    pub score: f64,
    #[serde(default)]
    pub new_level: Option<TrustLevel>,
    pub reason: String,
}

/// `POST /trust/rules/{id}`: overwrites a ruleset's trust snapshot outright,
/// bypassing score composition and transition thresholds. For admin
/// corrections only — e.g. seeding trust state for a migrated ruleset.
pub async fn set(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
    Json(body): Json<SetTrustRequest>,
) -> Result<Json<TrustView>, ApiError> {
    let ruleset = state.store.ruleset(&ruleset_id).await?;
    let history = body.new_level.map(|new_level| TrustHistory {
        id: TrustHistoryId::new(format!("{ruleset_id}-{}", OffsetDateTime::now_utc().unix_timestamp())),
        ruleset_id: ruleset_id.clone(),
        previous_level: ruleset.trust_level,
        new_level,
        reason: body.reason.clone(),
        triggered_by: vantage_core::TriggeredBy::Manual,
        metrics_snapshot: body.components,
        created_at: OffsetDateTime::now_utc(),
    });
    state.store.save_trust_evaluation(&ruleset_id, body.components, body.score, history).await?;
    crate::audit::record(&state, &principal, "trust.set", "ruleset", ruleset_id.as_str(), "POST", "/trust/rules/{id}").await;
    let ruleset = state.store.ruleset(&ruleset_id).await?;
    Ok(Json(TrustView {
        ruleset_id: ruleset.id,
        trust_level: ruleset.trust_level,
        trust_score: ruleset.trust_score,
        trust_components: ruleset.trust_components,
        execution_count: ruleset.execution_count,
        accuracy_rate: ruleset.accuracy_rate,
    }))
}

/// Response for `POST /trust/rules/{id}/calculate` and `POST /trust/evaluate/batch` entries.
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub trust_score: f64,
    pub trust_components: TrustComponents,
    pub transitioned_to: Option<TrustLevel>,
}

/// `POST /trust/rules/{id}/calculate`: recomputes one ruleset's score and
/// evaluates a transition immediately, outside its regular reevaluation
/// cadence. Mirrors `vantage_scheduler::run_trust_reevaluator_once`'s
/// per-ruleset body for a single id instead of the whole due-for-reevaluation set.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let ruleset = state.store.ruleset(&ruleset_id).await?;
    let inputs = state.store.score_inputs(&ruleset_id).await?;
    let components = vantage_trust::components(inputs);
    let score = vantage_trust::compose(&components, &TrustWeights::default());

    let transition_inputs = TransitionInputs {
        current_level: ruleset.trust_level,
        score,
        execution_count: ruleset.execution_count,
        accuracy_rate: ruleset.accuracy_rate,
        recent_negative_feedback: ruleset.negative_feedback_count,
        last_demoted_at: ruleset.last_demoted_at,
        now: OffsetDateTime::now_utc(),
    };
    let decision = vantage_trust::evaluate(transition_inputs, &TrustThresholds::default());

    let history = decision.as_ref().map(|decision| TrustHistory {
        id: TrustHistoryId::new(format!("{ruleset_id}-{}", OffsetDateTime::now_utc().unix_timestamp())),
        ruleset_id: ruleset_id.clone(),
        previous_level: ruleset.trust_level,
        new_level: decision.new_level,
        reason: decision.reason.clone(),
        triggered_by: decision.triggered_by,
        metrics_snapshot: components,
        created_at: OffsetDateTime::now_utc(),
    });
    let transitioned_to = history.as_ref().map(|history| history.new_level);
    state.store.save_trust_evaluation(&ruleset_id, components, score, history).await?;
    crate::audit::record(&state, &principal, "trust.calculate", "ruleset", ruleset_id.as_str(), "POST", "/trust/rules/{id}/calculate").await;

    Ok(Json(CalculateResponse { trust_score: score, trust_components: components, transitioned_to }))
}

/// Body for `PATCH /trust/rules/{id}/level`.
#[derive(Debug, Deserialize)]
pub struct SetLevelRequest {
    pub new_level: TrustLevel,
    pub reason: String,
}

/// `PATCH /trust/rules/{id}/level`: a manual transition, bypassing every
/// threshold. Current score/components are preserved as-is; only the level
/// and history change.
pub async fn set_level(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
    Json(body): Json<SetLevelRequest>,
) -> Result<Json<TrustView>, ApiError> {
    let ruleset = state.store.ruleset(&ruleset_id).await?;
    let decision = vantage_trust::manual(body.new_level, body.reason);
    let history = TrustHistory {
        id: TrustHistoryId::new(format!("{ruleset_id}-{}", OffsetDateTime::now_utc().unix_timestamp())),
        ruleset_id: ruleset_id.clone(),
        previous_level: ruleset.trust_level,
        new_level: decision.new_level,
        reason: decision.reason,
        triggered_by: decision.triggered_by,
        metrics_snapshot: ruleset.trust_components,
        created_at: OffsetDateTime::now_utc(),
    };
    state.store.save_trust_evaluation(&ruleset_id, ruleset.trust_components, ruleset.trust_score, Some(history)).await?;
    crate::audit::record(&state, &principal, "trust.set_level", "ruleset", ruleset_id.as_str(), "PATCH", "/trust/rules/{id}/level").await;
    let ruleset = state.store.ruleset(&ruleset_id).await?;
    Ok(Json(TrustView {
        ruleset_id: ruleset.id,
        trust_level: ruleset.trust_level,
        trust_score: ruleset.trust_score,
        trust_components: ruleset.trust_components,
        execution_count: ruleset.execution_count,
        accuracy_rate: ruleset.accuracy_rate,
    }))
}

/// `GET /trust/rules/{id}/history`.
pub async fn history(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(ruleset_id): Path<RulesetId>,
) -> Result<Json<Vec<TrustHistory>>, ApiError> {
    Ok(Json(state.store.trust_history(&ruleset_id).await?))
}

/// One ruleset's outcome in a `POST /trust/evaluate/batch` response.
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub ruleset_id: RulesetId,
    pub transitioned_to: Option<TrustLevel>,
}

/// `POST /trust/evaluate/batch`: runs one `trust_reevaluator` tick
/// on-demand, identical to the scheduler's own periodic cadence.
pub async fn evaluate_batch(State(state): State<Arc<AppState>>, principal: Principal) -> Result<Json<Vec<BatchEntry>>, ApiError> {
    let results = vantage_scheduler::run_trust_reevaluator_once(&state.store, &TrustThresholds::default()).await?;
    crate::audit::record(&state, &principal, "trust.evaluate_batch", "ruleset", "*", "POST", "/trust/evaluate/batch").await;
    Ok(Json(
        results
            .into_iter()
            .map(|(ruleset_id, outcome)| BatchEntry {
                ruleset_id,
                transitioned_to: match outcome {
                    vantage_scheduler::ReevaluationOutcome::Transitioned(level) => Some(level),
                    vantage_scheduler::ReevaluationOutcome::Unchanged => None,
                },
            })
            .collect(),
    ))
}
