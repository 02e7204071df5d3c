// vantage-judgment/src/replay.rs
// ============================================================================
// Module: Judgment Replay & What-If
// Description: Re-runs a past execution's input for comparison/debugging.
// Purpose: Let operators see how a ruleset change or input tweak would have played out.
// Dependencies: crate::engine, vantage-core
// ============================================================================

//! ## Overview
//! Grounded on `original_source/backend/app/services/judgment_replay_service.py`:
//! a replay re-runs a stored execution's `input_data` against either the
//! ruleset's currently active version, a pinned version, or the version the
//! execution originally ran against, then diffs the two outcomes. A what-if
//! analysis applies caller-supplied field overrides to the original input
//! and re-runs. Neither path writes to the cache or the execution log —
//! replay and what-if runs are read-only by design, unlike a real judgment
//! call.

use std::collections::BTreeMap;

use vantage_cache::Cache;
use vantage_core::JudgmentExecution;
use vantage_core::MethodUsed;
use vantage_providers::evaluator::ScriptEvaluator;
use vantage_providers::gateway::ModelGateway;

use crate::engine;
use crate::ports::JudgmentStore;
use crate::types::JudgmentError;
use crate::types::JudgmentOutcome;
use crate::types::JudgmentRequest;

/// Which ruleset version a replay runs against.
#[derive(Debug, Clone, Copy)]
pub enum ReplayTarget {
    /// The ruleset's currently active version.
    CurrentActive,
    /// A pinned version number.
    Version(u32),
    /// The version the original execution ran against, read from its metadata.
    Original,
}

/// The diff between an original execution and its replay.
#[derive(Debug, Clone)]
pub struct ReplayComparison {
    /// Whether the output payload differs.
    pub result_changed: bool,
    /// `replay.confidence - original.confidence`.
    pub confidence_diff: f64,
    /// Whether `confidence_diff`'s magnitude exceeds 0.01.
    pub confidence_changed: bool,
    /// Whether the contributing method (`rule_only`/`llm_only`/`hybrid_weighted`) differs.
    pub method_changed: bool,
    /// Whether the replay ran against a different ruleset version than the original.
    pub ruleset_changed: bool,
    /// Human-readable reasons a result differs, for operator display.
    pub change_reasons: Vec<&'static str>,
}

/// The result of replaying one execution.
#[derive(Debug, Clone)]
pub struct ReplayResult {
    /// The original outcome, as recorded.
    pub original: JudgmentExecution,
    /// The freshly-computed outcome.
    pub replay: JudgmentOutcome,
    /// The ruleset version the replay ran against.
    pub replay_version: u32,
    /// The diff between the two.
    pub comparison: ReplayComparison,
}

const CONFIDENCE_SIGNIFICANT_DELTA: f64 = 0.1;

/// Replays a single stored execution's input against `target`.
///
/// # Errors
///
/// Returns [`JudgmentError`] if the execution or its ruleset cannot be
/// found, or the replay evaluation itself fails.
pub async fn replay_execution(
    store: &dyn JudgmentStore,
    cache: &dyn Cache,
    evaluator: &dyn ScriptEvaluator,
    gateway: Option<&dyn ModelGateway>,
    original: &JudgmentExecution,
    target: ReplayTarget,
) -> Result<ReplayResult, JudgmentError> {
    let ruleset = store.ruleset(&original.ruleset_id).await?;
    let original_version = original
        .metadata
        .get("ruleset_version")
        .and_then(serde_json::Value::as_u64)
        .and_then(|value| u32::try_from(value).ok());

    let replay_version = match target {
        ReplayTarget::Version(version) => version,
        ReplayTarget::CurrentActive => ruleset.active_version.unwrap_or(1),
        ReplayTarget::Original => original_version.unwrap_or_else(|| ruleset.active_version.unwrap_or(1)),
    };

    // Replay is read-only: bypass C9 entirely (no identifier means the
    // engine never routes into canary) so the replay always evaluates the
    // pinned version rather than whatever a live request would be bucketed
    // into.
    let request = JudgmentRequest {
        tenant_id: original.tenant_id.clone(),
        ruleset_id: original.ruleset_id.clone(),
        input_data: original.input_data.clone(),
        policy: None,
        need_explanation: true,
        identifier: None,
    };
    let replay = replay_pinned_version(store, cache, evaluator, gateway, &request, replay_version).await?;

    let ruleset_changed = original_version.is_some_and(|version| version != replay_version);
    let comparison = compare(original, &replay, ruleset_changed);

    Ok(ReplayResult { original: original.clone(), replay, replay_version, comparison })
}

/// Re-runs `original`'s input with `modifications` merged over it ("what
/// would the decision have been if these fields were different").
///
/// # Errors
///
/// Returns [`JudgmentError`] on evaluation failure.
pub async fn what_if(
    store: &dyn JudgmentStore,
    cache: &dyn Cache,
    evaluator: &dyn ScriptEvaluator,
    gateway: Option<&dyn ModelGateway>,
    original: &JudgmentExecution,
    modifications: &BTreeMap<String, serde_json::Value>,
) -> Result<ReplayResult, JudgmentError> {
    let mut modified_input = original.input_data.clone();
    if let serde_json::Value::Object(map) = &mut modified_input {
        for (key, value) in modifications {
            map.insert(key.clone(), value.clone());
        }
    }

    let ruleset = store.ruleset(&original.ruleset_id).await?;
    let replay_version = ruleset.active_version.unwrap_or(1);
    let request = JudgmentRequest {
        tenant_id: original.tenant_id.clone(),
        ruleset_id: original.ruleset_id.clone(),
        input_data: modified_input,
        policy: None,
        need_explanation: true,
        identifier: None,
    };
    let replay = replay_pinned_version(store, cache, evaluator, gateway, &request, replay_version).await?;
    let comparison = compare(original, &replay, false);

    Ok(ReplayResult { original: original.clone(), replay, replay_version, comparison })
}

async fn replay_pinned_version(
    store: &dyn JudgmentStore,
    cache: &dyn Cache,
    evaluator: &dyn ScriptEvaluator,
    gateway: Option<&dyn ModelGateway>,
    request: &JudgmentRequest,
    version: u32,
) -> Result<JudgmentOutcome, JudgmentError> {
    let ruleset_version = store.ruleset_version(&request.ruleset_id, version).await?;
    let rule_outcome = evaluator
        .evaluate(&ruleset_version.script, &request.input_data)
        .await
        .map_err(|err| JudgmentError::Evaluation(err.to_string()))?;

    let (output, confidence, method_used) = if request.need_explanation && gateway.is_some() {
        let gateway = gateway.expect("checked by the guard above");
        let prompt = serde_json::json!({
            "input": request.input_data,
            "rule_result": rule_outcome.result,
            "rule_confidence": rule_outcome.confidence,
        });
        let response = gateway
            .complete(
                &vantage_providers::gateway::ModelRequest { prompt, max_tokens: 512 },
                std::time::Duration::from_secs(30),
                1,
            )
            .await
            .map_err(|err| JudgmentError::ModelMerge(err.to_string()))?;
        let blended = engine::DEFAULT_RULE_WEIGHT * rule_outcome.confidence + engine::DEFAULT_MODEL_WEIGHT * response.confidence;
        (rule_outcome.result, blended, MethodUsed::HybridWeighted)
    } else {
        (rule_outcome.result, rule_outcome.confidence, MethodUsed::RuleOnly)
    };

    let risk = store.action_risk(&request.tenant_id, None).await?;
    let risk_level = risk.map_or(vantage_core::RiskLevel::High, |risk| risk.risk_level);

    // Mark the cache entry as read-only by never writing through it: a
    // replay observing a cached production result would defeat the point
    // of re-running the rule.
    let _ = cache;

    Ok(JudgmentOutcome {
        output,
        confidence,
        method_used,
        risk_level,
        decision: vantage_core::Decision::RequireApproval,
        cache_hit: false,
        auto_executed: false,
    })
}

fn compare(original: &JudgmentExecution, replay: &JudgmentOutcome, ruleset_changed: bool) -> ReplayComparison {
    let result_changed = original.output != replay.output;
    let confidence_diff = replay.confidence - original.confidence;
    let confidence_changed = confidence_diff.abs() > 0.01;
    let method_changed = original.method_used != replay.method_used;

    let mut change_reasons = Vec::new();
    if ruleset_changed {
        change_reasons.push("ruleset_version_changed");
    }
    if result_changed {
        change_reasons.push("result_different");
    }
    if confidence_diff.abs() > CONFIDENCE_SIGNIFICANT_DELTA {
        change_reasons.push("confidence_significantly_different");
    }
    if method_changed {
        change_reasons.push("method_changed");
    }

    ReplayComparison { result_changed, confidence_diff, confidence_changed, method_changed, ruleset_changed, change_reasons }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_results_produce_no_change_reasons() {
        let original = JudgmentExecution {
            id: vantage_core::ExecutionId::new("e1"),
            tenant_id: vantage_core::TenantId::new("t1"),
            ruleset_id: vantage_core::RulesetId::new("r1"),
            input_data: serde_json::json!({"line": "L1"}),
            output: serde_json::json!({"decision": "ok"}),
            confidence: 0.9,
            method_used: MethodUsed::RuleOnly,
            trust_level_at_time: vantage_core::TrustLevel::Proposed,
            risk_level: vantage_core::RiskLevel::Low,
            auto_executed: false,
            cache_hit: false,
            success: true,
            metadata: BTreeMap::new(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let replay = JudgmentOutcome {
            output: serde_json::json!({"decision": "ok"}),
            confidence: 0.9,
            method_used: MethodUsed::RuleOnly,
            risk_level: vantage_core::RiskLevel::Low,
            decision: vantage_core::Decision::RequireApproval,
            cache_hit: false,
            auto_executed: false,
        };
        let comparison = compare(&original, &replay, false);
        assert!(!comparison.result_changed);
        assert!(comparison.change_reasons.is_empty());
    }

    #[test]
    fn differing_results_are_flagged_with_reasons() {
        let original = JudgmentExecution {
            id: vantage_core::ExecutionId::new("e1"),
            tenant_id: vantage_core::TenantId::new("t1"),
            ruleset_id: vantage_core::RulesetId::new("r1"),
            input_data: serde_json::json!({"line": "L1"}),
            output: serde_json::json!({"decision": "ok"}),
            confidence: 0.5,
            method_used: MethodUsed::RuleOnly,
            trust_level_at_time: vantage_core::TrustLevel::Proposed,
            risk_level: vantage_core::RiskLevel::Low,
            auto_executed: false,
            cache_hit: false,
            success: true,
            metadata: BTreeMap::new(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let replay = JudgmentOutcome {
            output: serde_json::json!({"decision": "reject"}),
            confidence: 0.9,
            method_used: MethodUsed::HybridWeighted,
            risk_level: vantage_core::RiskLevel::Low,
            decision: vantage_core::Decision::RequireApproval,
            cache_hit: false,
            auto_executed: false,
        };
        let comparison = compare(&original, &replay, true);
        assert!(comparison.result_changed);
        assert!(comparison.method_changed);
        assert!(comparison.ruleset_changed);
        assert!(comparison.change_reasons.contains(&"result_different"));
        assert!(comparison.change_reasons.contains(&"confidence_significantly_different"));
    }
}
