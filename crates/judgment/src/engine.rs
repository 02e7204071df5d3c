// vantage-judgment/src/engine.rs
// ============================================================================
// Module: Judgment Engine (C8)
// Description: The nine-step resolve/cache/evaluate/merge/decide/persist procedure.
// Purpose: Turn an input payload into a decision, with caching and trust effects.
// Dependencies: vantage-cache, vantage-canary, vantage-providers, crate::ports
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.5 exactly: resolve version (consulting C9 when the
//! ruleset is in canary), look up the cache (C1), evaluate the script (C2),
//! optionally merge with the model (C3) under `hybrid_weighted`, resolve risk
//! and apply the decision matrix, persist effects, write the cache, and bump
//! execution counters. Steps 1-6 run strictly sequentially per the ordering
//! guarantees in `spec.md` §5; nothing here ever returns before a started
//! evaluation either appears in `JudgmentExecution` or fails entirely.

use std::collections::BTreeMap;
use std::time::Duration;

use time::OffsetDateTime;
use vantage_cache::Cache;
use vantage_cache::judgment::CachedJudgment;
use vantage_cache::judgment::DEFAULT_JUDGMENT_TTL;
use vantage_canary::assign_version;
use vantage_core::CanaryExecutionLog;
use vantage_core::CanaryLogId;
use vantage_core::CanaryVersion;
use vantage_core::Decision;
use vantage_core::DeploymentStatus;
use vantage_core::ExecutionId;
use vantage_core::JudgmentExecution;
use vantage_core::JudgmentPolicy;
use vantage_core::MethodUsed;
use vantage_core::RiskLevel;
use vantage_providers::evaluator::ScriptEvaluator;
use vantage_providers::gateway::ModelGateway;
use vantage_providers::gateway::ModelRequest;

use crate::ports::JudgmentStore;
use crate::types::JudgmentError;
use crate::types::JudgmentOutcome;
use crate::types::JudgmentRequest;

/// Default weighting applied when merging rule and model confidence under
/// `hybrid_weighted` (`0.6 * rule + 0.4 * model`), per `spec.md` §4.5 step 4.
pub const DEFAULT_RULE_WEIGHT: f64 = 0.6;
/// Complements [`DEFAULT_RULE_WEIGHT`].
pub const DEFAULT_MODEL_WEIGHT: f64 = 0.4;
/// The model overrides the rule's result only when it exceeds the rule's
/// confidence by this margin.
pub const MODEL_OVERRIDE_MARGIN: f64 = 0.15;

const CACHE_TIMEOUT: Duration = Duration::from_millis(100);
const EVALUATOR_TIMEOUT: Duration = Duration::from_secs(2);
const MODEL_TIMEOUT: Duration = Duration::from_secs(30);
const MODEL_MAX_RETRIES: u32 = 1;

/// Runs the full nine-step judgment procedure.
///
/// # Errors
///
/// Returns [`JudgmentError`] on validation failure, evaluator/model failure,
/// or a persistence error. A cancelled or errored call never leaves a
/// partially-written `JudgmentExecution` row.
#[allow(clippy::too_many_arguments, reason = "each argument is a genuinely distinct collaborator, per spec.md §4.5")]
pub async fn evaluate(
    store: &dyn JudgmentStore,
    cache: &dyn Cache,
    evaluator: &dyn ScriptEvaluator,
    gateway: Option<&dyn ModelGateway>,
    request: &JudgmentRequest,
) -> Result<JudgmentOutcome, JudgmentError> {
    if request.input_data.is_null() || matches!(&request.input_data, serde_json::Value::Object(map) if map.is_empty())
    {
        return Err(JudgmentError::Validation("input_data must not be empty".to_string()));
    }

    // Step 1: resolve version, consulting C9 when the ruleset is in canary.
    let ruleset = store.ruleset(&request.ruleset_id).await?;
    let deployment = store.active_canary_deployment(&request.ruleset_id).await?;
    let (version, canary_version) = match &deployment {
        Some(deployment) if deployment.status == DeploymentStatus::Canary => {
            let assigned = resolve_canary_version(store, deployment, request).await?;
            let version = match assigned {
                CanaryVersion::V2 => deployment.target_version,
                CanaryVersion::V1 => deployment.previous_version.unwrap_or(deployment.target_version),
            };
            (version, Some(assigned))
        }
        _ => (ruleset.active_version.unwrap_or(1), None),
    };
    let ruleset_version = store.ruleset_version(&request.ruleset_id, version).await?;

    // Step 2: cache lookup (C1).
    let cache_result = vantage_cache::judgment::get::<serde_json::Value, _>(
        cache,
        &request.tenant_id,
        &request.ruleset_id,
        &request.input_data,
    )
    .await;
    if let Ok(Some(cached)) = cache_result {
        return Ok(JudgmentOutcome {
            output: cached.result,
            confidence: cached.confidence,
            method_used: MethodUsed::RuleOnly,
            risk_level: RiskLevel::Low,
            decision: Decision::AutoExecute,
            cache_hit: true,
            auto_executed: false,
        });
    }

    // Step 3: evaluate the rule script (C2).
    let policy = request.policy.unwrap_or(JudgmentPolicy::HybridWeighted);
    let execution_clock = std::time::Instant::now();
    let rule_outcome = if policy == JudgmentPolicy::LlmOnly {
        None
    } else {
        match tokio::time::timeout(EVALUATOR_TIMEOUT, evaluator.evaluate(&ruleset_version.script, &request.input_data))
            .await
        {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(err)) => {
                return record_failed_execution(
                    store,
                    request,
                    &ruleset,
                    &deployment,
                    canary_version,
                    execution_clock.elapsed(),
                    JudgmentError::Evaluation(err.to_string()),
                )
                .await;
            }
            Err(_) => {
                return record_failed_execution(
                    store,
                    request,
                    &ruleset,
                    &deployment,
                    canary_version,
                    execution_clock.elapsed(),
                    JudgmentError::Evaluation("script evaluator timed out".to_string()),
                )
                .await;
            }
        }
    };

    // Step 4: merge with the model (C3) under hybrid_weighted, when requested.
    let (output, confidence, method_used, action_type) = merge_with_model(
        gateway,
        policy,
        request.need_explanation,
        &request.input_data,
        rule_outcome,
    )
    .await?;
    let evaluation_latency_ms = duration_to_millis(execution_clock.elapsed());

    // Step 5: determine risk.
    let risk = store.action_risk(&request.tenant_id, action_type.as_deref()).await?;
    let risk_level = risk.map_or(RiskLevel::High, |risk| risk.risk_level);

    // Step 6: apply the decision matrix.
    let matrix_entry = store.decision_matrix_entry(&request.tenant_id, ruleset.trust_level, risk_level).await?;
    let guard_state = store.guard_state(&request.ruleset_id).await?;
    let decision = resolve_decision(matrix_entry.as_ref(), ruleset.trust_score, guard_state);

    // Step 7: effects + persistence.
    let auto_executed = decision == Decision::AutoExecute && ruleset.trust_level.as_u8() >= 2;
    let execution_id = ExecutionId::new(format!("{}-{}", request.ruleset_id, OffsetDateTime::now_utc().unix_timestamp()));
    let mut metadata = BTreeMap::new();
    if let Some(canary_version) = canary_version {
        metadata.insert("canary_version".to_string(), serde_json::json!(canary_version));
    }
    let execution = JudgmentExecution {
        id: execution_id.clone(),
        tenant_id: request.tenant_id.clone(),
        ruleset_id: request.ruleset_id.clone(),
        input_data: request.input_data.clone(),
        output: output.clone(),
        confidence,
        method_used,
        trust_level_at_time: ruleset.trust_level,
        risk_level,
        auto_executed,
        cache_hit: false,
        success: true,
        metadata,
        created_at: OffsetDateTime::now_utc(),
    };
    store.append_execution(&execution).await?;

    if let (Some(deployment), Some(canary_version)) = (&deployment, canary_version) {
        store
            .append_canary_log(&CanaryExecutionLog {
                id: CanaryLogId::new(format!("{execution_id}-canary")),
                deployment_id: deployment.id.clone(),
                execution_id,
                canary_version,
                success: true,
                latency_ms: evaluation_latency_ms,
                error_message: None,
                rollback_safe: true,
                needs_reprocess: false,
                reprocessed_at: None,
                created_at: OffsetDateTime::now_utc(),
            })
            .await?;
    }

    // Step 8: cache store.
    let cached = CachedJudgment {
        result: output.clone(),
        confidence,
        cached_at_epoch_secs: OffsetDateTime::now_utc().unix_timestamp(),
        input_hash: vantage_core::hashing::judgment_input_hash(&request.input_data)?.value,
        ruleset_id: request.ruleset_id.clone(),
    };
    let _ = tokio::time::timeout(
        CACHE_TIMEOUT,
        vantage_cache::judgment::set(cache, &request.tenant_id, &request.ruleset_id, &request.input_data, &cached, DEFAULT_JUDGMENT_TTL),
    )
    .await;

    // Step 9: trust bookkeeping (counters only; level transitions are C13's job).
    store.record_execution_counters(&request.ruleset_id).await?;

    Ok(JudgmentOutcome { output, confidence, method_used, risk_level, decision, cache_hit: false, auto_executed })
}

fn duration_to_millis(elapsed: std::time::Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

/// Step 3 failure path: persists a `success=false` `JudgmentExecution` (and a
/// matching failed `CanaryExecutionLog` when the request is in canary) before
/// propagating `error`, per `spec.md` §4.5 step 3 — a failed evaluator call
/// must still be observable to C10/C11, not silently swallowed.
#[allow(clippy::too_many_arguments, reason = "each argument is a distinct piece of context the failed row needs")]
async fn record_failed_execution(
    store: &dyn JudgmentStore,
    request: &JudgmentRequest,
    ruleset: &vantage_core::Ruleset,
    deployment: &Option<vantage_core::Deployment>,
    canary_version: Option<CanaryVersion>,
    elapsed: std::time::Duration,
    error: JudgmentError,
) -> Result<JudgmentOutcome, JudgmentError> {
    let execution_id = ExecutionId::new(format!("{}-{}", request.ruleset_id, OffsetDateTime::now_utc().unix_timestamp()));
    let mut metadata = BTreeMap::new();
    if let Some(canary_version) = canary_version {
        metadata.insert("canary_version".to_string(), serde_json::json!(canary_version));
    }
    let execution = JudgmentExecution {
        id: execution_id.clone(),
        tenant_id: request.tenant_id.clone(),
        ruleset_id: request.ruleset_id.clone(),
        input_data: request.input_data.clone(),
        output: serde_json::Value::Null,
        confidence: 0.0,
        method_used: MethodUsed::RuleOnly,
        trust_level_at_time: ruleset.trust_level,
        risk_level: RiskLevel::High,
        auto_executed: false,
        cache_hit: false,
        success: false,
        metadata,
        created_at: OffsetDateTime::now_utc(),
    };
    store.append_execution(&execution).await?;

    if let (Some(deployment), Some(canary_version)) = (deployment, canary_version) {
        store
            .append_canary_log(&CanaryExecutionLog {
                id: CanaryLogId::new(format!("{execution_id}-canary")),
                deployment_id: deployment.id.clone(),
                execution_id,
                canary_version,
                success: false,
                latency_ms: duration_to_millis(elapsed),
                error_message: Some(error.to_string()),
                rollback_safe: true,
                needs_reprocess: false,
                reprocessed_at: None,
                created_at: OffsetDateTime::now_utc(),
            })
            .await?;
    }

    Err(error)
}

async fn resolve_canary_version(
    store: &dyn JudgmentStore,
    deployment: &vantage_core::Deployment,
    request: &JudgmentRequest,
) -> Result<CanaryVersion, JudgmentError> {
    let Some((_, identifier)) = &request.identifier else {
        return Ok(CanaryVersion::V1);
    };
    if let Some(existing) = store.canary_assignment(&deployment.id, identifier).await? {
        return Ok(existing.version);
    }
    let version = assign_version(&deployment.id, identifier, deployment.canary_traffic_percentage);
    let identifier_type = request.identifier.as_ref().map_or(vantage_core::IdentifierType::User, |(kind, _)| *kind);
    store
        .save_canary_assignment(&vantage_core::CanaryAssignment {
            id: vantage_core::AssignmentId::new(format!("{}-{}", deployment.id, identifier)),
            deployment_id: deployment.id.clone(),
            identifier: identifier.clone(),
            identifier_type,
            version,
            created_at: OffsetDateTime::now_utc(),
            expires_at: None,
        })
        .await?;
    Ok(version)
}

async fn merge_with_model(
    gateway: Option<&dyn ModelGateway>,
    policy: JudgmentPolicy,
    need_explanation: bool,
    input_data: &serde_json::Value,
    rule_outcome: Option<vantage_providers::evaluator::EvaluationOutcome>,
) -> Result<(serde_json::Value, f64, MethodUsed, Option<String>), JudgmentError> {
    let should_merge = policy == JudgmentPolicy::LlmOnly
        || (policy == JudgmentPolicy::HybridWeighted && need_explanation && gateway.is_some());

    if !should_merge {
        let Some(rule_outcome) = rule_outcome else {
            return Err(JudgmentError::Evaluation("no rule outcome and model merge not requested".to_string()));
        };
        return Ok((rule_outcome.result, rule_outcome.confidence, MethodUsed::RuleOnly, rule_outcome.action_type));
    }

    let Some(gateway) = gateway else {
        return Err(JudgmentError::ModelMerge("hybrid policy requested but no model gateway configured".to_string()));
    };

    let prompt = serde_json::json!({
        "input": input_data,
        "rule_result": rule_outcome.as_ref().map(|outcome| &outcome.result),
        "rule_confidence": rule_outcome.as_ref().map(|outcome| outcome.confidence),
    });
    let response = match gateway.complete(&ModelRequest { prompt, max_tokens: 512 }, MODEL_TIMEOUT, MODEL_MAX_RETRIES).await {
        Ok(response) => response,
        Err(err) => {
            // spec.md §7: a model-gateway failure degrades to rule_only rather
            // than aborting the judgment, as long as a rule outcome exists.
            return match rule_outcome {
                Some(rule_outcome) => {
                    Ok((rule_outcome.result, rule_outcome.confidence, MethodUsed::RuleOnly, rule_outcome.action_type))
                }
                None => Err(JudgmentError::ModelMerge(err.to_string())),
            };
        }
    };

    match rule_outcome {
        None => Ok((response.output, response.confidence, MethodUsed::LlmOnly, None)),
        Some(rule_outcome) => {
            let blended = DEFAULT_RULE_WEIGHT * rule_outcome.confidence + DEFAULT_MODEL_WEIGHT * response.confidence;
            if response.confidence > rule_outcome.confidence + MODEL_OVERRIDE_MARGIN {
                Ok((response.output, response.confidence, MethodUsed::HybridWeighted, rule_outcome.action_type))
            } else {
                Ok((rule_outcome.result, blended, MethodUsed::HybridWeighted, rule_outcome.action_type))
            }
        }
    }
}

fn resolve_decision(
    entry: Option<&vantage_core::DecisionMatrixEntry>,
    trust_score: f64,
    guard_state: crate::ports::GuardState,
) -> Decision {
    let Some(entry) = entry else {
        return Decision::RequireApproval;
    };
    let min_score_ok = entry.min_trust_score.is_none_or(|min| trust_score >= min);
    let max_failures_ok = entry
        .max_consecutive_failures
        .is_none_or(|max| guard_state.consecutive_failures <= max);
    let cooldown_ok = entry.cooldown_seconds.is_none_or(|cooldown| {
        guard_state.seconds_since_last_auto_execute.is_none_or(|elapsed| elapsed >= cooldown)
    });
    if min_score_ok && max_failures_ok && cooldown_ok {
        entry.decision
    } else {
        Decision::RequireApproval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_decision_matrix_entry_defaults_to_require_approval() {
        let decision = resolve_decision(None, 0.9, crate::ports::GuardState::default());
        assert_eq!(decision, Decision::RequireApproval);
    }

    #[test]
    fn guard_failure_downgrades_auto_execute_to_require_approval() {
        let entry = vantage_core::DecisionMatrixEntry {
            tenant_id: vantage_core::TenantId::new("t1"),
            trust_level: vantage_core::TrustLevel::FullAuto,
            risk_level: RiskLevel::Low,
            decision: Decision::AutoExecute,
            min_trust_score: Some(0.8),
            max_consecutive_failures: None,
            cooldown_seconds: None,
        };
        let decision = resolve_decision(Some(&entry), 0.5, crate::ports::GuardState::default());
        assert_eq!(decision, Decision::RequireApproval);
    }

    #[test]
    fn guards_passing_honor_the_matrix_decision() {
        let entry = vantage_core::DecisionMatrixEntry {
            tenant_id: vantage_core::TenantId::new("t1"),
            trust_level: vantage_core::TrustLevel::FullAuto,
            risk_level: RiskLevel::Low,
            decision: Decision::AutoExecute,
            min_trust_score: Some(0.8),
            max_consecutive_failures: Some(3),
            cooldown_seconds: None,
        };
        let guard_state = crate::ports::GuardState { consecutive_failures: 1, seconds_since_last_auto_execute: None };
        let decision = resolve_decision(Some(&entry), 0.9, guard_state);
        assert_eq!(decision, Decision::AutoExecute);
    }
}
