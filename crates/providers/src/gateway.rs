// vantage-providers/src/gateway.rs
// ============================================================================
// Module: Model Gateway
// Description: Adapter trait for the external large-language-model provider.
// Purpose: Retry/timeout/token-accounting boundary around the model call.
// Dependencies: async-trait, reqwest, serde_json
// ============================================================================

//! ## Overview
//! The model provider is out of scope per `spec.md` §1; this module defines
//! the request/response shapes and trait the intent classifier (C4) and
//! judgment engine (C8) consume, plus an in-memory fake used by tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while calling the model gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider returned a non-success response.
    #[error("model provider error: {0}")]
    Provider(String),
    /// The call did not complete within the configured timeout.
    #[error("model provider timed out")]
    Timeout,
}

// ============================================================================
// SECTION: Request / Response
// ============================================================================

/// A request to the model gateway.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// The prompt or structured input sent to the model.
    pub prompt: Value,
    /// Maximum tokens the caller will accept in the response.
    pub max_tokens: u32,
}

/// A response from the model gateway, with token accounting.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The model's structured output.
    pub output: Value,
    /// The model's self-reported confidence, in `[0, 1]`.
    pub confidence: f64,
    /// Prompt tokens consumed.
    pub prompt_tokens: u32,
    /// Completion tokens consumed.
    pub completion_tokens: u32,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Requests a completion from the external model provider.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Issues `request`, retrying transient failures up to `max_retries`
    /// times with exponential backoff, bounded by `timeout_budget` overall.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when every retry is exhausted or the overall
    /// timeout budget elapses.
    async fn complete(
        &self,
        request: &ModelRequest,
        timeout_budget: Duration,
        max_retries: u32,
    ) -> Result<ModelResponse, GatewayError>;
}

/// Runs `attempt` up to `max_retries + 1` times with exponential backoff,
/// bounded overall by `timeout_budget`.
///
/// # Errors
///
/// Propagates the last attempt's error, or [`GatewayError::Timeout`] if the
/// overall budget elapses first.
pub async fn with_retry<F, Fut>(
    timeout_budget: Duration,
    max_retries: u32,
    mut attempt: F,
) -> Result<ModelResponse, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<ModelResponse, GatewayError>>,
{
    let call = async {
        let mut last_err = GatewayError::Provider("no attempts made".to_string());
        for retry in 0..=max_retries {
            match attempt().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    tracing::warn!(retry, "model gateway attempt failed: {err}");
                    last_err = err;
                    if retry < max_retries {
                        tokio::time::sleep(Duration::from_millis(50 * 2u64.pow(retry))).await;
                    }
                }
            }
        }
        Err(last_err)
    };
    timeout(timeout_budget, call).await.unwrap_or(Err(GatewayError::Timeout))
}

// ============================================================================
// SECTION: Fake (Test) Implementation
// ============================================================================

/// A deterministic fake gateway for tests: always succeeds with a fixed
/// output and confidence.
#[derive(Debug, Clone)]
pub struct FakeModelGateway {
    /// The output to return for every call.
    pub output: Value,
    /// The confidence to report for every call.
    pub confidence: f64,
}

#[async_trait]
impl ModelGateway for FakeModelGateway {
    async fn complete(
        &self,
        _request: &ModelRequest,
        _timeout_budget: Duration,
        _max_retries: u32,
    ) -> Result<ModelResponse, GatewayError> {
        Ok(ModelResponse {
            output: self.output.clone(),
            confidence: self.confidence,
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn with_retry_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let response = with_retry(Duration::from_secs(1), 3, || async {
            let count = attempts.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                Err(GatewayError::Provider("transient".to_string()))
            } else {
                Ok(ModelResponse {
                    output: serde_json::json!({"ok": true}),
                    confidence: 0.9,
                    prompt_tokens: 10,
                    completion_tokens: 5,
                })
            }
        })
        .await
        .expect("retry should eventually succeed");
        assert_eq!(response.prompt_tokens, 10);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_exhausts_and_returns_last_error() {
        let result = with_retry(Duration::from_secs(1), 1, || async {
            Err::<ModelResponse, _>(GatewayError::Provider("always fails".to_string()))
        })
        .await;
        assert!(matches!(result, Err(GatewayError::Provider(_))));
    }

    #[tokio::test]
    async fn fake_gateway_returns_configured_response() {
        let gateway = FakeModelGateway {
            output: serde_json::json!({"intent": "CHECK"}),
            confidence: 0.95,
        };
        let request = ModelRequest {
            prompt: serde_json::json!({}),
            max_tokens: 256,
        };
        let response = gateway
            .complete(&request, Duration::from_secs(1), 0)
            .await
            .expect("fake gateway always succeeds");
        assert!((response.confidence - 0.95).abs() < f64::EPSILON);
    }
}
