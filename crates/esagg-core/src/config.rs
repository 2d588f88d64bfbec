//! Check configuration.
//!
//! [`CheckConfig`] is the raw option set, built once by the binary.
//! [`CheckConfig::validate`] turns it into a [`ValidatedCheck`] or reports
//! every problem at once; nothing downstream of validation can fail on
//! configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::aggregation::{
    AggregationBuilder, AggregationKind, MetricSpec, TimeWindow, DEFAULT_PERCENTILE,
};
use crate::backend::SearchRequest;
use crate::error::{ConfigError, ConfigErrors};
use crate::filter::FilterFlag;
use crate::outcome::Severity;
use crate::query::QueryBuilder;
use crate::threshold::ThresholdRange;

pub const DEFAULT_ES_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX_PATTERN: &str = "logstash-*";
pub const DEFAULT_QUERY: &str = "*";
pub const DEFAULT_TIME_FIELD: &str = "@timestamp";
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_NULL_CODE: i64 = 2;

/// Parse a duration such as `90s`, `5m`, `1h30m` or `250ms`.
///
/// Components are summed; each is a decimal number followed by one of
/// `ms`, `s`, `m`, `h`, `d`.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0.0_f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if num_len == 0 {
            return Err(invalid());
        }
        let number: f64 = rest[..num_len].parse().map_err(|_| invalid())?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos = match &rest[..unit_len] {
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "d" => 86_400e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        nanos += number * unit_nanos;
    }

    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Every option of a check run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub es_url: String,
    pub index_pattern: String,
    /// Document field to aggregate.
    pub key: String,
    /// Status line label; falls back to `key`.
    pub description: Option<String>,
    /// Free-text `query_string`.
    pub query: String,
    /// Filter flag occurrences in application order.
    pub filters: Vec<FilterFlag>,
    pub aggregation: AggregationKind,
    pub percentile: f64,
    pub unit: String,
    pub window: Duration,
    pub time_field: String,
    pub warning: String,
    pub critical: String,
    /// Severity reported when the search matched nothing.
    pub null_code: Severity,
    /// Deadline for the whole search round trip.
    pub timeout: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            es_url: DEFAULT_ES_URL.to_string(),
            index_pattern: DEFAULT_INDEX_PATTERN.to_string(),
            key: String::new(),
            description: None,
            query: DEFAULT_QUERY.to_string(),
            filters: Vec::new(),
            aggregation: AggregationKind::Max,
            percentile: DEFAULT_PERCENTILE,
            unit: String::new(),
            window: DEFAULT_WINDOW,
            time_field: DEFAULT_TIME_FIELD.to_string(),
            warning: String::new(),
            critical: String::new(),
            null_code: Severity::from_code(DEFAULT_NULL_CODE),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CheckConfig {
    /// Config for `key` with both thresholds set, everything else default.
    pub fn new(key: &str, warning: &str, critical: &str) -> Self {
        CheckConfig {
            key: key.to_string(),
            warning: warning.to_string(),
            critical: critical.to_string(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: FilterFlag) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_aggregation(mut self, kind: AggregationKind) -> Self {
        self.aggregation = kind;
        self
    }

    fn threshold(
        spec: &str,
        flag: &str,
        errors: &mut Vec<ConfigError>,
    ) -> Option<ThresholdRange> {
        if spec.trim().is_empty() {
            errors.push(ConfigError::MissingArgument(flag.to_string()));
            return None;
        }
        ThresholdRange::parse(spec)
            .map_err(|source| {
                errors.push(ConfigError::InvalidThreshold {
                    flag: flag.to_string(),
                    spec: spec.to_string(),
                    source,
                })
            })
            .ok()
    }

    /// Validate everything and build the query up front.
    pub fn validate(&self) -> Result<ValidatedCheck, ConfigErrors> {
        let mut errors = Vec::new();

        if self.key.trim().is_empty() {
            errors.push(ConfigError::MissingArgument("-k".to_string()));
        }
        let warning = Self::threshold(&self.warning, "-w", &mut errors);
        let critical = Self::threshold(&self.critical, "-c", &mut errors);

        let index = self.index_pattern.trim();
        if index.is_empty() || index == "*" {
            errors.push(ConfigError::InvalidIndex(self.index_pattern.clone()));
        }
        if self.window.is_zero() {
            errors.push(ConfigError::EmptyWindow);
        }
        match self.aggregation {
            AggregationKind::Percentile if !(0.0..=100.0).contains(&self.percentile) => {
                errors.push(ConfigError::InvalidPercentile(self.percentile));
            }
            AggregationKind::PercentileRank if !self.percentile.is_finite() => {
                errors.push(ConfigError::InvalidPercentile(self.percentile));
            }
            _ => {}
        }

        let mut query = QueryBuilder::new();
        query.add_free_text_query(&self.query);
        for flag in &self.filters {
            let added = flag.parse().and_then(|clause| query.add_clause(&clause).map(|_| ()));
            if let Err(e) = added {
                errors.push(e);
            }
        }

        match (warning, critical) {
            (Some(warning), Some(critical)) if errors.is_empty() => Ok(ValidatedCheck {
                metric: MetricSpec::new(&self.key, self.aggregation, Some(self.percentile)),
                query: query.build(),
                config: self.clone(),
                warning,
                critical,
            }),
            _ => Err(ConfigErrors(errors)),
        }
    }
}

/// A configuration that passed validation, with its thresholds parsed
/// and its query built.
#[derive(Debug, Clone)]
pub struct ValidatedCheck {
    config: CheckConfig,
    warning: ThresholdRange,
    critical: ThresholdRange,
    query: Value,
    metric: MetricSpec,
}

impl ValidatedCheck {
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn warning(&self) -> &ThresholdRange {
        &self.warning
    }

    pub fn critical(&self) -> &ThresholdRange {
        &self.critical
    }

    pub fn metric(&self) -> &MetricSpec {
        &self.metric
    }

    pub fn query(&self) -> &Value {
        &self.query
    }

    pub fn description(&self) -> &str {
        self.config
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.config.key)
    }

    /// The search for the window ending at `now`.
    pub fn search_request(&self, now: DateTime<Utc>) -> SearchRequest {
        let window = TimeWindow::ending_at(now, self.config.window);
        let aggs = AggregationBuilder::new(&self.config.time_field, window)
            .with_metric(self.metric.clone())
            .build();
        SearchRequest::new(&self.config.index_pattern, self.query.clone(), aggs)
    }
}
