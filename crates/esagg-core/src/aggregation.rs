//! Metric aggregation over a rolling time window.
//!
//! The search carries one top-level `date_range` aggregation named
//! [`TIME_RANGE_AGG`] with a single bucket `[now - window, now)`, and one
//! metric sub-aggregation inside it named `<kind>_<field>`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::ConfigError;

/// Name of the top-level time-range aggregation.
pub const TIME_RANGE_AGG: &str = "aggr";

/// Default percentile (or percentile-rank value) for `pct`/`pctr`.
pub const DEFAULT_PERCENTILE: f64 = 99.0;

/// The statistic reduced over the time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationKind {
    Min,
    Max,
    Avg,
    Sum,
    Percentile,
    PercentileRank,
    StdDev,
    StdDevMin,
    StdDevMax,
    Variance,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 10] = [
        AggregationKind::Min,
        AggregationKind::Max,
        AggregationKind::Avg,
        AggregationKind::Sum,
        AggregationKind::Percentile,
        AggregationKind::PercentileRank,
        AggregationKind::StdDev,
        AggregationKind::StdDevMin,
        AggregationKind::StdDevMax,
        AggregationKind::Variance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
            AggregationKind::Avg => "avg",
            AggregationKind::Sum => "sum",
            AggregationKind::Percentile => "pct",
            AggregationKind::PercentileRank => "pctr",
            AggregationKind::StdDev => "stdev",
            AggregationKind::StdDevMin => "stdevmin",
            AggregationKind::StdDevMax => "stdevmax",
            AggregationKind::Variance => "var",
        }
    }

    /// Elasticsearch metric aggregation type requested for this kind.
    /// The four extended-stats derivatives share one request type.
    pub fn metric_type(&self) -> &'static str {
        match self {
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
            AggregationKind::Avg => "avg",
            AggregationKind::Sum => "sum",
            AggregationKind::Percentile => "percentiles",
            AggregationKind::PercentileRank => "percentile_ranks",
            AggregationKind::StdDev
            | AggregationKind::StdDevMin
            | AggregationKind::StdDevMax
            | AggregationKind::Variance => "extended_stats",
        }
    }

    /// Whether the kind takes the percentile argument.
    pub fn takes_percentile(&self) -> bool {
        matches!(
            self,
            AggregationKind::Percentile | AggregationKind::PercentileRank
        )
    }

    /// One-line description, used in the CLI help.
    pub fn describe(&self) -> &'static str {
        match self {
            AggregationKind::Min => "Minimum value",
            AggregationKind::Max => "Maximum value",
            AggregationKind::Avg => "Average value",
            AggregationKind::Sum => "Sum of all values",
            AggregationKind::Percentile => "N-th percentile value (--percentile)",
            AggregationKind::PercentileRank => "Percentile rank of a value (--percentile)",
            AggregationKind::StdDev => "Standard deviation",
            AggregationKind::StdDevMin => "Minimum from extended stats",
            AggregationKind::StdDevMax => "Maximum from extended stats",
            AggregationKind::Variance => "Variance",
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregationKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownAggregation(s.to_string()))
    }
}

/// Format a percentile the way the response keys its values (`95` → `"95.0"`).
pub fn percentile_key(percentile: f64) -> String {
    format!("{percentile:.1}")
}

/// The single metric sub-aggregation of a check.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub field: String,
    pub kind: AggregationKind,
    /// Only set for `pct`/`pctr`.
    pub percentile: Option<f64>,
}

impl MetricSpec {
    pub fn new(field: &str, kind: AggregationKind, percentile: Option<f64>) -> Self {
        let percentile = kind
            .takes_percentile()
            .then(|| percentile.unwrap_or(DEFAULT_PERCENTILE));
        Self {
            field: field.to_string(),
            kind,
            percentile,
        }
    }

    /// Sub-aggregation name, `<kind>_<field>`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.field)
    }

    /// Key of the requested percentile in the response `values` map.
    pub fn percentile_key(&self) -> Option<String> {
        self.percentile.map(percentile_key)
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({ "field": self.field });
        match (self.kind, self.percentile) {
            (AggregationKind::Percentile, Some(p)) => body["percents"] = json!([p]),
            (AggregationKind::PercentileRank, Some(p)) => body["values"] = json!([p]),
            _ => {}
        }
        json!({ self.kind.metric_type(): body })
    }
}

/// Half-open window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// The window of length `length` ending at `now`.
    pub fn ending_at(now: DateTime<Utc>, length: Duration) -> Self {
        let length = chrono::Duration::from_std(length).unwrap_or(chrono::Duration::MAX);
        let from = now.checked_sub_signed(length).unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { from, to: now }
    }
}

/// Builds the `aggs` section of the search body.
#[derive(Debug, Clone)]
pub struct AggregationBuilder {
    time_field: String,
    window: TimeWindow,
    metric: Option<MetricSpec>,
}

impl AggregationBuilder {
    pub fn new(time_field: &str, window: TimeWindow) -> Self {
        Self {
            time_field: time_field.to_string(),
            window,
            metric: None,
        }
    }

    /// Attach the metric. A later call replaces an earlier one.
    pub fn add_metric(
        &mut self,
        field: &str,
        kind: AggregationKind,
        percentile: Option<f64>,
    ) -> &mut Self {
        self.metric = Some(MetricSpec::new(field, kind, percentile));
        self
    }

    pub fn with_metric(mut self, metric: MetricSpec) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn metric(&self) -> Option<&MetricSpec> {
        self.metric.as_ref()
    }

    pub fn build(&self) -> Value {
        let mut time_range = json!({
            "date_range": {
                "field": self.time_field,
                "format": "epoch_millis",
                "ranges": [{
                    "from": self.window.from.timestamp_millis(),
                    "to": self.window.to.timestamp_millis(),
                }],
            }
        });
        if let Some(metric) = &self.metric {
            time_range["aggs"] = json!({ metric.name(): metric.to_json() });
        }
        json!({ TIME_RANGE_AGG: time_range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> TimeWindow {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        TimeWindow::ending_at(now, Duration::from_secs(300))
    }

    #[test]
    fn test_parse_all_kinds() {
        for kind in AggregationKind::ALL {
            assert_eq!(kind.as_str().parse::<AggregationKind>().unwrap(), kind);
        }
        assert!(matches!(
            "median".parse::<AggregationKind>(),
            Err(ConfigError::UnknownAggregation(_))
        ));
    }

    #[test]
    fn test_extended_stats_family_shares_request_type() {
        for kind in [
            AggregationKind::StdDev,
            AggregationKind::StdDevMin,
            AggregationKind::StdDevMax,
            AggregationKind::Variance,
        ] {
            assert_eq!(kind.metric_type(), "extended_stats");
        }
    }

    #[test]
    fn test_percentile_key_one_decimal() {
        assert_eq!(percentile_key(95.0), "95.0");
        assert_eq!(percentile_key(99.9), "99.9");
        let metric = MetricSpec::new("dur", AggregationKind::Percentile, Some(95.0));
        assert_eq!(metric.percentile_key().as_deref(), Some("95.0"));
    }

    #[test]
    fn test_percentile_defaults_and_is_dropped_for_other_kinds() {
        let pct = MetricSpec::new("dur", AggregationKind::Percentile, None);
        assert_eq!(pct.percentile, Some(DEFAULT_PERCENTILE));
        let max = MetricSpec::new("dur", AggregationKind::Max, Some(50.0));
        assert_eq!(max.percentile, None);
    }

    #[test]
    fn test_metric_name_and_json() {
        let metric = MetricSpec::new("dur", AggregationKind::PercentileRank, Some(500.0));
        assert_eq!(metric.name(), "pctr_dur");
        assert_eq!(
            metric.to_json(),
            json!({ "percentile_ranks": { "field": "dur", "values": [500.0] } })
        );
        let metric = MetricSpec::new("dur", AggregationKind::Percentile, Some(95.0));
        assert_eq!(
            metric.to_json(),
            json!({ "percentiles": { "field": "dur", "percents": [95.0] } })
        );
    }

    #[test]
    fn test_window_is_length_before_now() {
        let w = window();
        assert_eq!((w.to - w.from).num_seconds(), 300);
    }

    #[test]
    fn test_builder_nests_metric_in_time_bucket() {
        let mut builder = AggregationBuilder::new("@timestamp", window());
        builder.add_metric("dur", AggregationKind::Max, None);
        let aggs = builder.build();

        let range = &aggs[TIME_RANGE_AGG]["date_range"];
        assert_eq!(range["field"], "@timestamp");
        let ranges = range["ranges"].as_array().unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(
            ranges[0]["to"].as_i64().unwrap() - ranges[0]["from"].as_i64().unwrap(),
            300_000
        );
        assert_eq!(
            aggs[TIME_RANGE_AGG]["aggs"]["max_dur"],
            json!({ "max": { "field": "dur" } })
        );
    }
}
