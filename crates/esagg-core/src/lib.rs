//! esagg core library
//!
//! Evaluation core of the Elasticsearch aggregation check: builds the
//! filtered query and the windowed metric aggregation from a
//! [`CheckConfig`], reads the scalar back out of the response, and
//! classifies it against warning/critical threshold ranges.

pub mod aggregation;
pub mod backend;
pub mod check;
pub mod config;
pub mod error;
pub mod extract;
pub mod fakes;
pub mod filter;
pub mod obs;
pub mod outcome;
pub mod query;
pub mod telemetry;
pub mod threshold;

pub use aggregation::{
    percentile_key, AggregationBuilder, AggregationKind, MetricSpec, TimeWindow,
    DEFAULT_PERCENTILE, TIME_RANGE_AGG,
};
pub use backend::{BackendResult, SearchBackend, SearchRequest, SearchResponse};
pub use check::{connect_failed, evaluate, run_check, search_failed};
pub use config::{parse_duration, CheckConfig, ValidatedCheck};
pub use error::{BackendError, ConfigError, ConfigErrors, ExtractError, RangeParseError};
pub use extract::extract_value;
pub use filter::{parse_field_token, FilterClause, FilterFlag, FilterKind};
pub use outcome::{CheckOutcome, PerfDatum, Severity};
pub use query::{QueryBuilder, RangeBounds};
pub use telemetry::{init_tracing, level_for};
pub use threshold::{classify, ThresholdRange};

/// esagg version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
