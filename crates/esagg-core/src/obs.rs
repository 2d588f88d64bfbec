//! Structured observability hooks for the check run lifecycle.
//!
//! - Run-scoped tracing span via [`check_span`]
//! - Emission functions for start, search failure, extraction failure and finish

use tracing::{info, warn, Span};

use crate::outcome::Severity;

/// Span covering one check run, tagged with its run id and index pattern.
///
/// # Example
///
/// ```ignore
/// let span = check_span("4b6f...", "logstash-*");
/// run.instrument(span).await
/// ```
pub fn check_span(run_id: &str, index: &str) -> Span {
    tracing::info_span!("check.run", run_id = %run_id, index = %index)
}

/// Emit event: search about to be issued.
pub fn emit_check_started(endpoint: &str, aggregation: &str, field: &str) {
    info!(
        event = "check.started",
        endpoint = %endpoint,
        aggregation = %aggregation,
        field = %field,
    );
}

/// Emit event: the search round trip failed (warning level).
pub fn emit_search_failed(error: &dyn std::fmt::Display) {
    warn!(event = "check.search_failed", error = %error);
}

/// Emit event: the response carried no usable value (info level).
pub fn emit_extract_failed(error: &dyn std::fmt::Display, fallback: Severity) {
    info!(event = "check.extract_failed", error = %error, fallback = %fallback);
}

/// Emit event: outcome decided.
pub fn emit_check_finished(severity: Severity, value: f64, duration_ms: u64) {
    info!(
        event = "check.finished",
        severity = %severity,
        value = value,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_span_enter_and_drop() {
        let span = check_span("run-1", "logstash-*");
        let guard = span.enter();
        drop(guard);
    }

    #[test]
    fn test_emitters_without_subscriber() {
        emit_check_started("http://localhost:9200", "max", "dur");
        emit_search_failed(&"connection refused");
        emit_extract_failed(&"0 hits", Severity::Critical);
        emit_check_finished(Severity::Ok, 1.0, 3);
    }
}
