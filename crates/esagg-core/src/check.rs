//! One check run: search, extract, classify.
//!
//! Every failure after configuration becomes a [`CheckOutcome`]; a run
//! always produces exactly one status line.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::backend::{SearchBackend, SearchResponse};
use crate::config::ValidatedCheck;
use crate::error::BackendError;
use crate::extract::extract_value;
use crate::obs::{
    check_span, emit_check_finished, emit_check_started, emit_extract_failed, emit_search_failed,
};
use crate::outcome::{CheckOutcome, PerfDatum, Severity};
use crate::threshold::classify;

fn perf_datum(check: &ValidatedCheck, value: f64) -> PerfDatum {
    let config = check.config();
    PerfDatum {
        label: config.key.clone(),
        unit: config.unit.clone(),
        value,
        warn: check.warning().raw().to_string(),
        crit: check.critical().raw().to_string(),
        min: Some(0.0),
        max: None,
    }
}

/// Outcome for a response that came back from the backend.
pub fn evaluate(check: &ValidatedCheck, response: &SearchResponse) -> CheckOutcome {
    let desc = check.description();
    let unit = &check.config().unit;

    match extract_value(response, check.metric()) {
        Ok(value) => {
            let severity = classify(value, check.warning(), check.critical());
            let message = match severity {
                Severity::Critical => {
                    format!("{desc} {value:.6}{unit} > {}{unit}", check.critical().raw())
                }
                Severity::Warning => {
                    format!("{desc} {value:.6}{unit} > {}{unit}", check.warning().raw())
                }
                _ => format!("{desc} {value:.6}{unit}"),
            };
            CheckOutcome::new(severity, message, Some(perf_datum(check, value)))
        }
        Err(err) => {
            let fallback = check.config().null_code;
            emit_extract_failed(&err, fallback);
            let value = 0.0_f64;
            CheckOutcome::new(
                fallback,
                format!("{desc} {value:.6}{unit} ({err})"),
                Some(perf_datum(check, value)),
            )
        }
    }
}

/// Outcome when the search round trip failed.
pub fn search_failed(check: &ValidatedCheck, endpoint: &str, error: &BackendError) -> CheckOutcome {
    CheckOutcome::new(
        Severity::Critical,
        format!(
            "Failed to execute search at {}, index {}: {}",
            endpoint,
            check.config().index_pattern,
            error
        ),
        None,
    )
}

/// Outcome when no backend could be constructed.
pub fn connect_failed(check: &ValidatedCheck, error: &BackendError) -> CheckOutcome {
    CheckOutcome::new(
        Severity::Critical,
        format!("Failed to connect to {}: {}", check.config().es_url, error),
        None,
    )
}

/// Run the check once against `backend` for the window ending at `now`.
pub async fn run_check(
    check: &ValidatedCheck,
    backend: &dyn SearchBackend,
    now: DateTime<Utc>,
) -> CheckOutcome {
    let run_id = Uuid::new_v4().to_string();
    let span = check_span(&run_id, &check.config().index_pattern);

    async move {
        let started = Instant::now();
        let metric = check.metric();
        emit_check_started(backend.endpoint(), metric.kind.as_str(), &metric.field);

        let request = check.search_request(now);
        debug!(body = %request.body, "search request");

        let outcome = match backend.search(&request).await {
            Ok(response) => {
                debug!(
                    total_hits = response.total_hits,
                    aggregations = ?response.aggregations,
                    "search response"
                );
                evaluate(check, &response)
            }
            Err(err) => {
                emit_search_failed(&err);
                search_failed(check, backend.endpoint(), &err)
            }
        };

        let value = outcome.perf.as_ref().map_or(0.0, |p| p.value);
        emit_check_finished(outcome.severity, value, started.elapsed().as_millis() as u64);
        outcome
    }
    .instrument(span)
    .await
}
