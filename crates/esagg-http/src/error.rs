//! Mapping of reqwest failures onto [`BackendError`]

use std::time::Duration;

use esagg_core::BackendError;

/// Longest error body carried into the status line
const MAX_BODY: usize = 512;

pub(crate) fn classify(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout)
    } else if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Connect(err.to_string())
    }
}

/// Collapse whitespace and cap the length of an error response body.
pub(crate) fn truncate_body(body: &str) -> String {
    let flat: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_BODY {
        flat
    } else {
        let cut: String = flat.chars().take(MAX_BODY).collect();
        format!("{cut}...")
    }
}
