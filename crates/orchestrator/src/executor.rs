// vantage-orchestrator/src/executor.rs
// ============================================================================
// Module: External Executor Port
// Description: The seam for workflow/bi/learning planners C6 delegates to.
// Purpose: Let routing targets outside judgment be wired up without this
//          crate depending on their (out-of-scope) implementations.
// Dependencies: vantage-intent::RoutingTarget
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.3 step 3, `workflow`, `bi`, and `learning` all route to
//! external planners explicitly out of scope for this system. This trait is
//! the seam a future deployment would implement against; absent a wired
//! implementation, [`crate::orchestrate`] reports
//! [`crate::OrchestratorError::ExecutorUnavailable`] rather than silently
//! falling back to a different executor family.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use vantage_intent::RoutingTarget;

use crate::types::ToolCall;

/// The result of one external-executor invocation.
#[derive(Debug, Clone)]
pub struct ExternalOutcome {
    /// The executor's response payload.
    pub response: Value,
    /// Tools it invoked while producing the response.
    pub tool_calls: Vec<ToolCall>,
    /// How many iterations it used.
    pub iterations: u32,
}

/// Errors an [`ExternalExecutor`] can surface.
#[derive(Debug, Error)]
pub enum ExternalExecutorError {
    /// The executor failed for an implementation-specific reason.
    #[error("external executor failed: {0}")]
    Failed(String),
}

/// A `workflow` / `bi` / `learning` planner C6 can delegate to.
#[async_trait]
pub trait ExternalExecutor: Send + Sync {
    /// Invokes the executor for `target` with the merged call context and a
    /// max-iteration budget.
    async fn invoke(
        &self,
        target: RoutingTarget,
        processed_request: &str,
        call_context: &Value,
        max_iterations: u32,
    ) -> Result<ExternalOutcome, ExternalExecutorError>;
}
