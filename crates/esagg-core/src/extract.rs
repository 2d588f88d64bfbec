//! Reads the single aggregated scalar out of a search response.
//!
//! Order of checks:
//! 1. zero total hits → `EmptyResult`
//! 2. no time-range aggregation → `EmptyResult`
//! 3. no bucket, or an empty bucket → `EmptyResult`
//! 4. the statistic for the selected kind is absent or null → `MissingMetric`

use serde_json::Value;

use crate::aggregation::{AggregationKind, MetricSpec, TIME_RANGE_AGG};
use crate::backend::SearchResponse;
use crate::error::ExtractError;

fn first_bucket(response: &SearchResponse) -> Result<&Value, ExtractError> {
    if response.total_hits == 0 {
        return Err(ExtractError::EmptyResult("0 hits".to_string()));
    }

    let buckets = response
        .aggregations
        .as_ref()
        .and_then(|aggs| aggs.get(TIME_RANGE_AGG))
        .and_then(|agg| agg.get("buckets"))
        .ok_or_else(|| ExtractError::EmptyResult("no aggregations".to_string()))?;

    // `keyed` date ranges come back as an object of buckets
    let bucket = match buckets {
        Value::Array(list) => list.first(),
        Value::Object(map) => map.values().next(),
        _ => None,
    }
    .ok_or_else(|| ExtractError::EmptyResult("0 aggregation buckets".to_string()))?;

    if bucket.get("doc_count").and_then(Value::as_u64) == Some(0) {
        return Err(ExtractError::EmptyResult(
            "0 hits in time window".to_string(),
        ));
    }
    Ok(bucket)
}

fn statistic<'a>(metric: &'a Value, spec: &MetricSpec) -> Option<&'a Value> {
    match spec.kind {
        AggregationKind::Min
        | AggregationKind::Max
        | AggregationKind::Avg
        | AggregationKind::Sum => metric.get("value"),
        AggregationKind::Percentile | AggregationKind::PercentileRank => {
            let key = spec.percentile_key()?;
            metric.get("values")?.get(key.as_str())
        }
        AggregationKind::StdDev => metric.get("std_deviation"),
        AggregationKind::StdDevMin => metric.get("min"),
        AggregationKind::StdDevMax => metric.get("max"),
        AggregationKind::Variance => metric.get("variance"),
    }
}

/// Extract the value of `spec` from `response`.
pub fn extract_value(response: &SearchResponse, spec: &MetricSpec) -> Result<f64, ExtractError> {
    let bucket = first_bucket(response)?;
    let missing = || ExtractError::MissingMetric(spec.kind.as_str().to_string());

    let metric = bucket.get(spec.name()).ok_or_else(missing)?;
    statistic(metric, spec)
        .and_then(Value::as_f64)
        .ok_or_else(missing)
}
