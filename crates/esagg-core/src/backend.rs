//! Search backend seam.
//!
//! The check issues exactly one search through [`SearchBackend`]. The HTTP
//! implementation lives in `esagg-http`; an in-memory fake lives in
//! [`crate::fakes`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::BackendError;

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// One `_search` call: target index pattern and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub body: Value,
}

impl SearchRequest {
    /// Body with `size: 0`; only the aggregation is of interest.
    pub fn new(index: &str, query: Value, aggs: Value) -> Self {
        Self {
            index: index.to_string(),
            body: json!({
                "size": 0,
                "query": query,
                "aggs": aggs,
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Count(u64),
    Tracked { value: u64 },
}

#[derive(Deserialize)]
struct RawHits {
    total: RawTotal,
}

#[derive(Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
    #[serde(default)]
    aggregations: Option<Value>,
}

impl From<RawSearchResponse> for SearchResponse {
    fn from(raw: RawSearchResponse) -> Self {
        let total_hits = match raw.hits.total {
            RawTotal::Count(n) | RawTotal::Tracked { value: n } => n,
        };
        SearchResponse {
            total_hits,
            aggregations: raw.aggregations,
        }
    }
}

/// The parts of a search response the check reads.
///
/// Accepts `hits.total` both as a bare count and as `{"value": n, ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSearchResponse")]
pub struct SearchResponse {
    pub total_hits: u64,
    pub aggregations: Option<Value>,
}

impl SearchResponse {
    pub fn new(total_hits: u64, aggregations: Option<Value>) -> Self {
        Self {
            total_hits,
            aggregations,
        }
    }
}

/// Executes one bounded-window aggregated search.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> BackendResult<SearchResponse>;

    /// Where the backend sends requests, for diagnostics.
    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let req = SearchRequest::new("logstash-*", json!({"match_all": {}}), json!({}));
        assert_eq!(req.index, "logstash-*");
        assert_eq!(req.body["size"], 0);
        assert_eq!(req.body["query"], json!({"match_all": {}}));
    }

    #[test]
    fn test_decode_legacy_total() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "took": 3,
            "hits": { "total": 12, "hits": [] },
            "aggregations": { "aggr": { "buckets": [] } }
        }))
        .unwrap();
        assert_eq!(resp.total_hits, 12);
        assert!(resp.aggregations.is_some());
    }

    #[test]
    fn test_decode_tracked_total_without_aggregations() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "hits": { "total": { "value": 0, "relation": "eq" }, "hits": [] }
        }))
        .unwrap();
        assert_eq!(resp.total_hits, 0);
        assert!(resp.aggregations.is_none());
    }

    #[test]
    fn test_decode_rejects_missing_hits() {
        let resp = serde_json::from_value::<SearchResponse>(json!({ "error": "boom" }));
        assert!(resp.is_err());
    }
}
