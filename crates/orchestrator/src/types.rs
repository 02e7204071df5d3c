// vantage-orchestrator/src/types.rs
// ============================================================================
// Module: Orchestrator Request/Result Types
// Description: The public input/output shapes for C6's orchestrate() call.
// Purpose: Give HTTP and streaming callers one stable contract.
// Dependencies: vantage-core, vantage-intent, vantage-access, vantage-judgment
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use vantage_access::PermissionDecision;
use vantage_access::Role;
use vantage_core::Identifier;
use vantage_core::IdentifierType;
use vantage_core::RulesetId;
use vantage_core::TenantId;
use vantage_intent::Classification;
use vantage_intent::Intent;
use vantage_intent::RoutingTarget;
use vantage_judgment::JudgmentError;

/// A single request into the orchestrator.
///
/// `ruleset_id` is the judgment target when `C4` routes to
/// [`RoutingTarget::Judgment`]; the orchestrator does not infer it from the
/// utterance — the caller's session already knows which ruleset it is bound
/// to, the same way the original chat surface threads a fixed ruleset
/// through a conversation.
#[derive(Debug, Clone)]
pub struct OrchestratorRequest {
    /// The caller's raw utterance.
    pub utterance: String,
    /// Free-form caller-supplied context, merged with classification slots
    /// before the target executor is invoked.
    pub context: BTreeMap<String, Value>,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The caller's role; `None` is the unauthenticated internal path.
    pub role: Option<Role>,
    /// The ruleset this conversation is bound to, when routing to judgment.
    pub ruleset_id: Option<RulesetId>,
    /// Identifier used for canary routing within the judgment call.
    pub identifier: Option<(IdentifierType, Identifier)>,
    /// Whether the caller wants an explanation from the judgment merge step.
    pub need_explanation: bool,
}

/// One tool invocation recorded during a single orchestrate() call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// The tool's name.
    pub name: String,
    /// The arguments passed to it.
    pub arguments: Value,
    /// Its result, when it completed.
    pub result: Option<Value>,
}

/// Routing metadata surfaced alongside the response, for debugging and UI
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingInfo {
    /// The intent C4 classified the utterance into.
    pub intent: Intent,
    /// The executor family it routed to.
    pub target_agent: RoutingTarget,
    /// C4's confidence in the classification.
    pub confidence: f64,
    /// Which stage produced the classification.
    pub source: vantage_intent::ClassificationSource,
}

impl RoutingInfo {
    fn from_classification(classification: &Classification) -> Self {
        Self {
            intent: classification.intent,
            target_agent: classification.target_agent,
            confidence: classification.confidence,
            source: classification.source,
        }
    }
}

/// The uniform envelope every orchestrate() call returns, per spec.md §4.3
/// step 5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEnvelope {
    /// The final response text or structured payload.
    pub response: Value,
    /// The executor that produced the response.
    pub agent_name: &'static str,
    /// Tools invoked while producing the response.
    pub tool_calls: Vec<ToolCall>,
    /// How many iterations the target executor used.
    pub iterations: u32,
    /// The routing decision that led here.
    pub routing_info: RoutingInfo,
}

impl AgentEnvelope {
    pub(crate) fn new(
        classification: &Classification,
        agent_name: &'static str,
        response: Value,
        tool_calls: Vec<ToolCall>,
        iterations: u32,
    ) -> Self {
        Self {
            response,
            agent_name,
            tool_calls,
            iterations,
            routing_info: RoutingInfo::from_classification(classification),
        }
    }
}

/// Errors the orchestrator can surface to its caller.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// C5 denied the call; the target executor was never invoked.
    #[error("permission denied: caller role {:?} requires at least {:?}", .0.caller_role, .0.required_role)]
    PermissionDenied(PermissionDecision),
    /// Routing selected judgment but no `ruleset_id` was supplied on the
    /// request.
    #[error("routing target is judgment but no ruleset_id was supplied")]
    MissingRulesetId,
    /// The judgment engine (C8) failed.
    #[error("judgment error: {0}")]
    Judgment(#[from] JudgmentError),
    /// The model gateway (C3) failed during a general passthrough call.
    #[error("model gateway error: {0}")]
    Gateway(String),
    /// Routing selected an executor family this deployment does not wire up.
    #[error("no executor is configured for routing target {0:?}")]
    ExecutorUnavailable(RoutingTarget),
}

#[cfg(test)]
mod tests {
    use vantage_intent::ClassificationSource;

    use super::*;

    #[test]
    fn envelope_copies_routing_metadata_from_the_classification() {
        let classification = Classification {
            intent: Intent::Check,
            target_agent: RoutingTarget::Judgment,
            slots: BTreeMap::new(),
            processed_request: "status?".to_owned(),
            source: ClassificationSource::Rule,
            rule_pattern: Some("status".to_owned()),
            confidence: 0.95,
        };
        let envelope = AgentEnvelope::new(&classification, "judgment", Value::Null, Vec::new(), 1);
        assert_eq!(envelope.routing_info.intent, Intent::Check);
        assert_eq!(envelope.routing_info.target_agent, RoutingTarget::Judgment);
        assert!((envelope.routing_info.confidence - 0.95).abs() < f64::EPSILON);
    }
}
