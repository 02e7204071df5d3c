// vantage-api/src/routes/chat.rs
// ============================================================================
// Module: Agent Chat Routes
// Description: HTTP surface over C6's orchestrate()/events_for() calls.
// Purpose: Expose the single chat entry point, plain and streaming.
// Dependencies: axum, vantage-orchestrator
// ============================================================================

//! ## Overview
//! `POST /agents/chat` returns the completed [`vantage_orchestrator::AgentEnvelope`].
//! `POST /agents/chat/stream` computes the same envelope up front (C6 has no
//! incremental token stream of its own — the underlying gateway call is not
//! itself streamed) and replays `events_for`'s fixed event sequence as
//! server-sent events, matching spec.md §4.3's closing description of what a
//! streaming caller observes. This repo wires no external workflow/bi/
//! learning executor, matching the orchestrator crate's own documented scope
//! boundary; `external_executor` is always `None`.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::Event;
use serde::Deserialize;
use serde::Serialize;
use tokio_stream::StreamExt as _;
use vantage_core::Identifier;
use vantage_core::IdentifierType;
use vantage_core::RulesetId;
use vantage_intent::Intent;
use vantage_intent::RoutingTarget;
use vantage_orchestrator::AgentEnvelope;
use vantage_orchestrator::OrchestratorRequest;
use vantage_orchestrator::StreamEvent;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub utterance: String,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub ruleset_id: Option<RulesetId>,
    #[serde(default)]
    pub identifier: Option<(IdentifierType, Identifier)>,
    #[serde(default)]
    pub need_explanation: bool,
}

impl ChatRequest {
    fn into_orchestrator_request(self, principal: &Principal) -> OrchestratorRequest {
        OrchestratorRequest {
            utterance: self.utterance,
            context: self.context,
            tenant_id: principal.tenant_id.clone(),
            role: Some(principal.role),
            ruleset_id: self.ruleset_id,
            identifier: self.identifier,
            need_explanation: self.need_explanation,
        }
    }
}

async fn run(state: &AppState, request: &OrchestratorRequest) -> Result<AgentEnvelope, vantage_orchestrator::OrchestratorError> {
    vantage_orchestrator::orchestrate(
        &state.intent_patterns,
        state.model_gateway.as_ref(),
        &state.store,
        state.cache.as_ref(),
        state.script_evaluator.as_ref(),
        Some(state.model_gateway.as_ref()),
        None,
        request,
    )
    .await
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<ChatRequest>,
) -> Result<Json<AgentEnvelope>, ApiError> {
    let request = body.into_orchestrator_request(&principal);
    let envelope = run(&state, &request).await?;
    Ok(Json(envelope))
}

/// The wire form of [`StreamEvent`]; the orchestrator crate fixes ordering
/// and identity, this crate owns the SSE encoding.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent {
    Start,
    Routing { intent: Intent, target_agent: RoutingTarget },
    Routed { agent_name: &'static str },
    Processing,
    Content { delta: serde_json::Value },
    Tools { tool_calls: Vec<vantage_orchestrator::ToolCall> },
    Done,
    Error { message: String },
}

impl From<StreamEvent> for WireEvent {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Start => Self::Start,
            StreamEvent::Routing { intent, target_agent } => Self::Routing { intent, target_agent },
            StreamEvent::Routed { agent_name } => Self::Routed { agent_name },
            StreamEvent::Processing => Self::Processing,
            StreamEvent::Content { delta } => Self::Content { delta },
            StreamEvent::Tools { tool_calls } => Self::Tools { tool_calls },
            StreamEvent::Done => Self::Done,
            StreamEvent::Error { message } => Self::Error { message },
        }
    }
}

pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<ChatRequest>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let request = body.into_orchestrator_request(&principal);
    let result = run(&state, &request).await;
    let intent_hint = if result.is_err() {
        let classification = vantage_intent::classify(&state.intent_patterns, state.model_gateway.as_ref(), &request.utterance).await;
        Some((classification.intent, classification.target_agent))
    } else {
        None
    };
    let events = vantage_orchestrator::stream::events_for(intent_hint, &result);

    let wire_events: Vec<WireEvent> = events.into_iter().map(WireEvent::from).collect();
    let stream = tokio_stream::iter(wire_events).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_owned());
        Ok(Event::default().data(data))
    });
    Sse::new(stream)
}
