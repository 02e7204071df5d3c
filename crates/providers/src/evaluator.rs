// vantage-providers/src/evaluator.rs
// ============================================================================
// Module: Script Evaluator
// Description: Adapter trait for the external, sandboxed rule-script evaluator.
// Purpose: Let the judgment engine treat script evaluation as (script, input) -> (result, confidence).
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! The script evaluator is out of scope per `spec.md` §1 ("the Rhai-family
//! script evaluator, viewed as a pure function `(script, input) -> result +
//! confidence`"); this module defines the trait the judgment engine consumes
//! and an in-memory fake used by tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while evaluating a rule script.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The script failed to compile or run.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),
    /// The evaluator did not respond within its timeout budget.
    #[error("script evaluation timed out")]
    Timeout,
}

// ============================================================================
// SECTION: Result
// ============================================================================

/// The outcome of evaluating a rule script against an input.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// The rule's result payload.
    pub result: Value,
    /// The rule's self-reported confidence, in `[0, 1]`.
    pub confidence: f64,
    /// An `action_type`, when the rule output names one, used for risk lookup.
    pub action_type: Option<String>,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Evaluates a rule script against an input payload.
///
/// Implementations must treat the script as untrusted, pure, and sandboxed:
/// no implementation may perform I/O as part of evaluation.
#[async_trait]
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluates `script` against `input`, honoring the caller's timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError`] on compilation/runtime failure or timeout.
    async fn evaluate(&self, script: &str, input: &Value) -> Result<EvaluationOutcome, EvaluatorError>;
}

// ============================================================================
// SECTION: Fake (Test) Implementation
// ============================================================================

/// A deterministic fake evaluator for tests: echoes the input back as the
/// result with a fixed confidence, or returns a configured error.
#[derive(Debug, Clone, Default)]
pub struct EchoEvaluator {
    /// Confidence to report for every successful evaluation.
    pub confidence: f64,
}

impl EchoEvaluator {
    /// Builds an echo evaluator with the given fixed confidence.
    #[must_use]
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

#[async_trait]
impl ScriptEvaluator for EchoEvaluator {
    async fn evaluate(&self, _script: &str, input: &Value) -> Result<EvaluationOutcome, EvaluatorError> {
        let action_type = input
            .get("action_type")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(EvaluationOutcome {
            result: input.clone(),
            confidence: self.confidence,
            action_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_evaluator_returns_input_as_result() {
        let evaluator = EchoEvaluator::new(0.8);
        let input = serde_json::json!({"action_type": "restart_line", "line": "L1"});
        let outcome = evaluator
            .evaluate("whatever script", &input)
            .await
            .expect("evaluation succeeds");
        assert_eq!(outcome.result, input);
        assert_eq!(outcome.action_type.as_deref(), Some("restart_line"));
        assert!((outcome.confidence - 0.8).abs() < f64::EPSILON);
    }
}
