// vantage-orchestrator/src/stream.rs
// ============================================================================
// Module: Streaming Event Sequence
// Description: The ordered start/routing/routed/processing/content/tools/
//              done/error event sequence streaming callers receive.
// Purpose: Give the HTTP SSE layer a stable, ordered event list to replay.
// Dependencies: crate::types
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.3's closing sentence, streaming callers see
//! `start -> routing -> routed -> processing -> content*[ -> tools] -> done`,
//! with a terminal `error` event replacing the rest of the sequence on
//! failure. Ordering is guaranteed because [`events_for`] is a pure
//! function over an already-computed [`crate::AgentEnvelope`] or
//! [`crate::OrchestratorError`] — the request itself runs on a single
//! cooperative task, so no other call can interleave its own events into
//! this one's sequence. The wire encoding (SSE framing) belongs to
//! `vantage-api`; this crate only fixes the event identities and their order.

use serde_json::Value;
use vantage_intent::Intent;
use vantage_intent::RoutingTarget;

use crate::types::AgentEnvelope;
use crate::types::OrchestratorError;
use crate::types::ToolCall;

/// One event in the ordered streaming sequence.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The request was accepted and classification is starting.
    Start,
    /// C4 classified the utterance.
    Routing {
        /// The classified intent.
        intent: Intent,
        /// The executor family it routed to.
        target_agent: RoutingTarget,
    },
    /// C5 cleared the call and the target executor was selected.
    Routed {
        /// The executor's display name.
        agent_name: &'static str,
    },
    /// The target executor is running.
    Processing,
    /// A chunk of the response. Degenerates to exactly one chunk for
    /// executors (judgment, the current model passthrough) that do not
    /// stream their own output incrementally.
    Content {
        /// The response chunk.
        delta: Value,
    },
    /// Tool calls the executor made, when any occurred.
    Tools {
        /// The recorded tool calls.
        tool_calls: Vec<ToolCall>,
    },
    /// The call completed successfully.
    Done,
    /// The call failed; this is always the last event.
    Error {
        /// A human-readable failure description.
        message: String,
    },
}

/// Builds the ordered event sequence for a completed orchestrate() call.
///
/// On `Ok`, emits the full `start -> routing -> routed -> processing ->
/// content[ -> tools] -> done` sequence. On `Err`, emits only as much of the
/// sequence as could be determined before the failure, followed by a
/// terminal `error` event.
#[must_use]
pub fn events_for(intent_hint: Option<(Intent, RoutingTarget)>, result: &Result<AgentEnvelope, OrchestratorError>) -> Vec<StreamEvent> {
    let mut events = vec![StreamEvent::Start];
    match result {
        Ok(envelope) => {
            events.push(StreamEvent::Routing { intent: envelope.routing_info.intent, target_agent: envelope.routing_info.target_agent });
            events.push(StreamEvent::Routed { agent_name: envelope.agent_name });
            events.push(StreamEvent::Processing);
            events.push(StreamEvent::Content { delta: envelope.response.clone() });
            if !envelope.tool_calls.is_empty() {
                events.push(StreamEvent::Tools { tool_calls: envelope.tool_calls.clone() });
            }
            events.push(StreamEvent::Done);
        }
        Err(error) => {
            if let Some((intent, target_agent)) = intent_hint {
                events.push(StreamEvent::Routing { intent, target_agent });
            }
            events.push(StreamEvent::Error { message: error.to_string() });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use vantage_intent::Classification;
    use vantage_intent::ClassificationSource;

    use super::*;

    fn sample_classification() -> Classification {
        Classification {
            intent: Intent::Check,
            target_agent: RoutingTarget::Judgment,
            slots: BTreeMap::new(),
            processed_request: "status?".to_owned(),
            source: ClassificationSource::Rule,
            rule_pattern: Some("status".to_owned()),
            confidence: 0.9,
        }
    }

    fn discriminant(event: &StreamEvent) -> &'static str {
        match event {
            StreamEvent::Start => "start",
            StreamEvent::Routing { .. } => "routing",
            StreamEvent::Routed { .. } => "routed",
            StreamEvent::Processing => "processing",
            StreamEvent::Content { .. } => "content",
            StreamEvent::Tools { .. } => "tools",
            StreamEvent::Done => "done",
            StreamEvent::Error { .. } => "error",
        }
    }

    #[test]
    fn a_successful_call_without_tool_calls_skips_the_tools_event() {
        let classification = sample_classification();
        let envelope = AgentEnvelope::new(&classification, "judgment", json!({"ok": true}), Vec::new(), 1);
        let events = events_for(None, &Ok(envelope));
        let sequence: Vec<&str> = events.iter().map(discriminant).collect();
        assert_eq!(sequence, ["start", "routing", "routed", "processing", "content", "done"]);
    }

    #[test]
    fn a_successful_call_with_tool_calls_includes_the_tools_event_before_done() {
        let classification = sample_classification();
        let tool_calls = vec![ToolCall { name: "lookup".to_owned(), arguments: json!({}), result: Some(json!(1)) }];
        let envelope = AgentEnvelope::new(&classification, "judgment", json!({"ok": true}), tool_calls, 1);
        let events = events_for(None, &Ok(envelope));
        let sequence: Vec<&str> = events.iter().map(discriminant).collect();
        assert_eq!(sequence, ["start", "routing", "routed", "processing", "content", "tools", "done"]);
    }

    #[test]
    fn a_failed_call_ends_in_an_error_event_not_done() {
        let result: Result<AgentEnvelope, OrchestratorError> = Err(OrchestratorError::MissingRulesetId);
        let events = events_for(Some((Intent::Check, RoutingTarget::Judgment)), &result);
        let sequence: Vec<&str> = events.iter().map(discriminant).collect();
        assert_eq!(sequence, ["start", "routing", "error"]);
        assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));
    }

    #[test]
    fn a_failed_call_without_an_intent_hint_still_ends_in_error() {
        let result: Result<AgentEnvelope, OrchestratorError> = Err(OrchestratorError::ExecutorUnavailable(RoutingTarget::Workflow));
        let events = events_for(None, &result);
        let sequence: Vec<&str> = events.iter().map(discriminant).collect();
        assert_eq!(sequence, ["start", "error"]);
    }
}
