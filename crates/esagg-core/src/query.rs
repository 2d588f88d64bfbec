//! Boolean query builder.
//!
//! Free-text queries go into the scored `must` conjunction. Every filter
//! clause goes into a separate `filter` bool so Elasticsearch can cache it
//! and skip scoring. The final query is
//! `{"bool": {"must": [...], "filter": {"bool": {"must": [...], "must_not": [...]}}}}`.
//!
//! Clauses are emitted in insertion order.

use serde_json::{json, Map, Value};

use crate::error::ConfigError;
use crate::filter::{FilterClause, FilterKind};

/// Bounds of a document-field range filter. Bounds are kept as strings so
/// dates and numbers both pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeBounds {
    pub gt: Option<String>,
    pub gte: Option<String>,
    pub lt: Option<String>,
    pub lte: Option<String>,
}

impl RangeBounds {
    /// Parse `>=X`, `<=X`, `>X`, `<X` (checked in that order) or `X TO Y`.
    ///
    /// Returns `None` for anything else, including an empty bound.
    pub fn parse(expr: &str) -> Option<Self> {
        let expr = expr.trim();
        let bound = |rest: &str| {
            let rest = rest.trim();
            (!rest.is_empty()).then(|| rest.to_string())
        };

        if let Some(rest) = expr.strip_prefix(">=") {
            return Some(Self {
                gte: Some(bound(rest)?),
                ..Self::default()
            });
        }
        if let Some(rest) = expr.strip_prefix("<=") {
            return Some(Self {
                lte: Some(bound(rest)?),
                ..Self::default()
            });
        }
        if let Some(rest) = expr.strip_prefix('>') {
            return Some(Self {
                gt: Some(bound(rest)?),
                ..Self::default()
            });
        }
        if let Some(rest) = expr.strip_prefix('<') {
            return Some(Self {
                lt: Some(bound(rest)?),
                ..Self::default()
            });
        }
        let (lower, upper) = expr.split_once(" TO ")?;
        Some(Self {
            gte: Some(bound(lower)?),
            lte: Some(bound(upper)?),
            ..Self::default()
        })
    }

    fn to_json(&self) -> Value {
        let mut bounds = Map::new();
        for (op, value) in [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
            ("lte", &self.lte),
        ] {
            if let Some(v) = value {
                bounds.insert(op.to_string(), Value::String(v.clone()));
            }
        }
        Value::Object(bounds)
    }
}

/// Accumulates query and filter clauses; consumed by [`QueryBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    must: Vec<Value>,
    filter_must: Vec<Value>,
    filter_must_not: Vec<Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_filter(&mut self, clause: Value, negate: bool) -> &mut Self {
        if negate {
            self.filter_must_not.push(clause);
        } else {
            self.filter_must.push(clause);
        }
        self
    }

    /// Scored `query_string` clause.
    pub fn add_free_text_query(&mut self, query: &str) -> &mut Self {
        self.must.push(json!({ "query_string": { "query": query } }));
        self
    }

    pub fn add_exists_filter(&mut self, field: &str, negate: bool) -> &mut Self {
        self.push_filter(json!({ "exists": { "field": field } }), negate)
    }

    pub fn add_term_filter(&mut self, field: &str, value: &str, negate: bool) -> &mut Self {
        self.push_filter(json!({ "term": { field: value } }), negate)
    }

    pub fn add_match_filter(&mut self, field: &str, value: &str, negate: bool) -> &mut Self {
        self.push_filter(json!({ "match": { field: { "query": value } } }), negate)
    }

    pub fn add_prefix_filter(&mut self, field: &str, prefix: &str, negate: bool) -> &mut Self {
        self.push_filter(json!({ "prefix": { field: prefix } }), negate)
    }

    pub fn add_regex_filter(&mut self, field: &str, pattern: &str, negate: bool) -> &mut Self {
        self.push_filter(json!({ "regexp": { field: pattern } }), negate)
    }

    /// Range clause from a `>X` / `>=X` / `<X` / `<=X` / `X TO Y` expression.
    pub fn add_range_filter(
        &mut self,
        field: &str,
        expr: &str,
        negate: bool,
    ) -> Result<&mut Self, ConfigError> {
        let bounds = RangeBounds::parse(expr).ok_or_else(|| ConfigError::InvalidRangeExpr {
            field: field.to_string(),
            expr: expr.to_string(),
        })?;
        Ok(self.push_filter(json!({ "range": { field: bounds.to_json() } }), negate))
    }

    /// Dispatch a parsed [`FilterClause`] to the matching `add_*` method.
    pub fn add_clause(&mut self, clause: &FilterClause) -> Result<&mut Self, ConfigError> {
        let FilterClause {
            field,
            value,
            negate,
            kind,
        } = clause;
        match kind {
            FilterKind::Exists => Ok(self.add_exists_filter(field, *negate)),
            FilterKind::Term => Ok(self.add_term_filter(field, value, *negate)),
            FilterKind::Match => Ok(self.add_match_filter(field, value, *negate)),
            FilterKind::Prefix => Ok(self.add_prefix_filter(field, value, *negate)),
            FilterKind::Regexp => Ok(self.add_regex_filter(field, value, *negate)),
            FilterKind::Range => self.add_range_filter(field, value, *negate),
        }
    }

    /// Number of filter clauses, positive and negative.
    pub fn filter_count(&self) -> usize {
        self.filter_must.len() + self.filter_must_not.len()
    }

    /// Combined query: scored conjunction with the filter bool attached.
    pub fn build(&self) -> Value {
        let mut filter = Map::new();
        if !self.filter_must.is_empty() {
            filter.insert("must".to_string(), Value::Array(self.filter_must.clone()));
        }
        if !self.filter_must_not.is_empty() {
            filter.insert(
                "must_not".to_string(),
                Value::Array(self.filter_must_not.clone()),
            );
        }

        let mut outer = Map::new();
        if !self.must.is_empty() {
            outer.insert("must".to_string(), Value::Array(self.must.clone()));
        }
        outer.insert("filter".to_string(), json!({ "bool": filter }));
        json!({ "bool": outer })
    }
}
