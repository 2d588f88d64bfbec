//! Error taxonomy for the aggregation check.
//!
//! Three classes, matching the three stages of a run:
//! - [`ConfigError`]: rejected before any request leaves the process.
//! - [`BackendError`]: the search round trip failed.
//! - [`ExtractError`]: the search succeeded but carried no usable value.

use std::fmt;
use std::time::Duration;

/// Problems with the check configuration. Always fatal, always reported
/// before the search is issued.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing mandatory argument ({0})")]
    MissingArgument(String),

    #[error("Invalid ES index '{0}' given")]
    InvalidIndex(String),

    #[error("invalid threshold {flag} '{spec}': {source}")]
    InvalidThreshold {
        flag: String,
        spec: String,
        #[source]
        source: RangeParseError,
    },

    #[error("malformed --{flag} filter '{token}' (expected <field>:<value> or <field>=<value>)")]
    MalformedFilter { flag: String, token: String },

    #[error("invalid range expression '{expr}' for field '{field}' (expected >X, >=X, <X, <=X or \"X TO Y\")")]
    InvalidRangeExpr { field: String, expr: String },

    #[error("unknown aggregation '{0}' (expected one of min, max, avg, sum, pct, pctr, stdev, stdevmin, stdevmax, var)")]
    UnknownAggregation(String),

    #[error("invalid percentile {0}: must be between 0 and 100")]
    InvalidPercentile(f64),

    #[error("invalid duration '{0}' (expected e.g. 90s, 5m, 1h30m)")]
    InvalidDuration(String),

    #[error("time window must be longer than zero")]
    EmptyWindow,
}

/// Threshold range specifier parse failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeParseError {
    #[error("empty range")]
    Empty,

    #[error("failed to parse lower limit '{0}'")]
    InvalidLower(String),

    #[error("failed to parse upper limit '{0}'")]
    InvalidUpper(String),

    #[error("min <= max violated ({start} > {end})")]
    Inverted { start: f64, end: f64 },
}

/// Every configuration error found in one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// Transport failures from a [`crate::SearchBackend`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid search response: {0}")]
    Decode(String),
}

/// Absence conditions when reading the aggregated value.
///
/// `EmptyResult` is an expected outcome (no matching documents) mapped to
/// the configured fallback severity; `MissingMetric` points at a field
/// that carries no data the aggregation understands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("No data in search result - {0}")]
    EmptyResult(String),

    #[error("Aggregation result value missing in response - {0} (see --debug)")]
    MissingMetric(String),
}
