// vantage-canary/src/metrics.rs
// ============================================================================
// Module: Metrics Aggregator (C10)
// Description: Rolls canary execution logs into windowed sample/error/latency counters.
// Purpose: Give C11 the per-window evidence it decides circuit status from.
// Dependencies: vantage-core::domain, time
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.7, one [`vantage_core::DeploymentMetricsWindow`] is
//! produced per `(deployment, version_type)` per window from the
//! [`vantage_core::CanaryExecutionLog`] rows observed within it. Latency
//! percentiles are computed over the window's samples directly (no
//! approximation), since a single 60-second window is small enough to sort
//! in memory.

use time::OffsetDateTime;
use vantage_core::CanaryExecutionLog;
use vantage_core::DeploymentId;
use vantage_core::DeploymentMetricsWindow;
use vantage_core::MetricsWindowId;
use vantage_core::VersionType;

/// Aggregates `logs` (already filtered to one deployment, one version type,
/// and the `[window_start, window_end)` range) into one metrics window.
#[must_use]
pub fn aggregate(
    deployment_id: &DeploymentId,
    version_type: VersionType,
    logs: &[CanaryExecutionLog],
    window_start: OffsetDateTime,
    window_end: OffsetDateTime,
) -> DeploymentMetricsWindow {
    let sample_count = logs.len() as u64;
    let success_count = logs.iter().filter(|log| log.success).count() as u64;
    let error_count = sample_count - success_count;
    let error_rate = if sample_count == 0 {
        0.0
    } else {
        error_count as f64 / sample_count as f64
    };

    let mut latencies: Vec<f64> = logs.iter().map(|log| log.latency_ms).collect();
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    DeploymentMetricsWindow {
        id: MetricsWindowId::new(format!("{deployment_id}:{version_type:?}:{window_end}")),
        deployment_id: deployment_id.clone(),
        version_type,
        sample_count,
        success_count,
        error_count,
        error_rate,
        latency_p50_ms: percentile(&latencies, 0.50),
        latency_p95_ms: percentile(&latencies, 0.95),
        latency_p99_ms: percentile(&latencies, 0.99),
        latency_avg_ms: average(&latencies),
        consecutive_failures: trailing_failure_streak(logs),
        window_start,
        window_end,
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "sample counts in one window never approach f64's precision limit"
)]
fn percentile(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((sorted.len() - 1) as f64 * fraction).round() as usize;
    sorted.get(rank).copied()
}

fn average(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        None
    } else {
        Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
    }
}

/// The longest trailing run of failures, counting backward from the end of
/// `logs` (assumed ordered by occurrence).
#[allow(
    clippy::cast_possible_truncation,
    reason = "streak length is clamped to u32::MAX before the cast"
)]
fn trailing_failure_streak(logs: &[CanaryExecutionLog]) -> u32 {
    logs.iter()
        .rev()
        .take_while(|log| !log.success)
        .count()
        .min(u32::MAX as usize) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use vantage_core::CanaryLogId;
    use vantage_core::CanaryVersion;
    use vantage_core::ExecutionId;

    fn log(success: bool, latency_ms: f64) -> CanaryExecutionLog {
        CanaryExecutionLog {
            id: CanaryLogId::new("log"),
            deployment_id: DeploymentId::new("d1"),
            execution_id: ExecutionId::new("e1"),
            canary_version: CanaryVersion::V2,
            success,
            latency_ms,
            error_message: if success { None } else { Some("boom".to_string()) },
            rollback_safe: true,
            needs_reprocess: false,
            reprocessed_at: None,
            created_at: datetime!(2026 - 07 - 27 00:00:00 UTC),
        }
    }

    #[test]
    fn empty_window_has_zero_rates_and_no_latency() {
        let window = aggregate(
            &DeploymentId::new("d1"),
            VersionType::Canary,
            &[],
            datetime!(2026 - 07 - 27 00:00:00 UTC),
            datetime!(2026 - 07 - 27 00:01:00 UTC),
        );
        assert_eq!(window.sample_count, 0);
        assert!((window.error_rate - 0.0).abs() < f64::EPSILON);
        assert!(window.latency_p95_ms.is_none());
    }

    #[test]
    fn error_rate_and_consecutive_failures_computed_correctly() {
        let logs = vec![log(true, 10.0), log(true, 20.0), log(false, 30.0), log(false, 40.0)];
        let window = aggregate(
            &DeploymentId::new("d1"),
            VersionType::Canary,
            &logs,
            datetime!(2026 - 07 - 27 00:00:00 UTC),
            datetime!(2026 - 07 - 27 00:01:00 UTC),
        );
        assert_eq!(window.error_count, 2);
        assert!((window.error_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(window.consecutive_failures, 2);
    }
}
