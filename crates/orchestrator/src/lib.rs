// vantage-orchestrator/src/lib.rs
// ============================================================================
// Module: Vantage Orchestrator Library
// Description: The agent orchestrator (C6) — classify, authorize, route, wrap.
// Purpose: The single entry point every chat-surface call runs through.
// Dependencies: vantage-intent, vantage-access, vantage-judgment, vantage-providers
// ============================================================================

//! ## Overview
//! `vantage-orchestrator` implements C6 end to end: [`orchestrate`] runs the
//! five-step procedure from `spec.md` §4.3 (classify via C4, authorize via
//! C5, route to the target executor, invoke it with a merged call context
//! and iteration budget, wrap the result in a uniform envelope), and
//! [`stream`] turns a completed call into the ordered event sequence a
//! streaming caller expects. [`executor`] is the seam external (workflow/
//! bi/learning) planners would implement against; this repo does not ship
//! one, matching the spec's explicit scope boundary.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod executor;
pub mod orchestrate;
pub mod stream;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use executor::ExternalExecutor;
pub use executor::ExternalExecutorError;
pub use executor::ExternalOutcome;
pub use orchestrate::MAX_ITERATIONS;
pub use orchestrate::orchestrate;
pub use orchestrate::would_be_denied;
pub use stream::StreamEvent;
pub use stream::events_for;
pub use types::AgentEnvelope;
pub use types::OrchestratorError;
pub use types::OrchestratorRequest;
pub use types::RoutingInfo;
pub use types::ToolCall;
