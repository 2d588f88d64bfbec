//! Command-line surface of `check-es-aggregation`.

use std::time::Duration;

use clap::Parser;
use esagg_core::config::{
    DEFAULT_ES_URL, DEFAULT_INDEX_PATTERN, DEFAULT_NULL_CODE, DEFAULT_QUERY, DEFAULT_TIME_FIELD,
};
use esagg_core::{parse_duration, AggregationKind, CheckConfig, FilterFlag, FilterKind, Severity};

const AFTER_HELP: &str = "\
Supported aggregations:
  min          Minimum value
  max          Maximum value
  avg          Average value
  sum          Sum of all values
  pct          N-th percentile value (--percentile)
  pctr         Percentile rank of a value (--percentile)
  stdev        Standard deviation
  stdevmin     Minimum from extended stats
  stdevmax     Maximum from extended stats
  var          Variance

Supported filters:
  (not-)exists    Matches against field presence
  (not-)term      Matches string against analyzed terms
  (not-)match     Matches string against analyzed field data
  (not-)prefix    Matches prefix string against field data
  (not-)regex     Matches regex against field data
  (not-)range     Matches field value range (>X, >=X, <X, <=X, \"X TO Y\")

  Syntax:
    <field>:<value>
    <field>=<value>

  Examples:
    --not-exists message
    -t hostname:localhost
    -m domain:*example.net
    -r 'message:^some_nice_long_(test|debug)_value'
    --range code:\"400 TO 599\"
    --not-range exit_code:\"<=1\"
    --not-prefix message:kernel

Thresholds use the monitoring-plugin range format:
  10      alert outside 0..10
  10:     alert below 10
  ~:10    alert above 10
  10:20   alert outside 10..20
  @10:20  alert inside 10..20

Filters are not scored and get cached by Elasticsearch; prefer them
over the free-text query where possible.";

#[derive(Debug, Parser)]
#[command(name = "check-es-aggregation")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Nagios plugin computing Elasticsearch aggregations", long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Elasticsearch URL
    #[arg(long, env = "ES_URL", default_value = DEFAULT_ES_URL)]
    pub es_url: String,

    /// Elasticsearch index pattern, e.g. logstash-*
    #[arg(long, default_value = DEFAULT_INDEX_PATTERN)]
    pub index_pattern: String,

    /// Document key to aggregate (the check is based on its value)
    #[arg(short, long)]
    pub key: String,

    /// Free-text query string
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Exists filter (field name)
    #[arg(short = 'e', long)]
    pub exists: Vec<String>,

    /// Missing filter (field name)
    #[arg(long)]
    pub not_exists: Vec<String>,

    /// Positive term filter
    #[arg(short, long)]
    pub term: Vec<String>,

    /// Negative term filter
    #[arg(long)]
    pub not_term: Vec<String>,

    /// Positive match filter
    #[arg(short, long = "match")]
    pub match_: Vec<String>,

    /// Negative match filter
    #[arg(long)]
    pub not_match: Vec<String>,

    /// Positive prefix filter
    #[arg(short, long)]
    pub prefix: Vec<String>,

    /// Negative prefix filter
    #[arg(long)]
    pub not_prefix: Vec<String>,

    /// Regex filter
    #[arg(short, long)]
    pub regex: Vec<String>,

    /// Negative regex filter
    #[arg(long)]
    pub not_regex: Vec<String>,

    /// Positive value range filter
    #[arg(long)]
    pub range: Option<String>,

    /// Negative value range filter
    #[arg(long)]
    pub not_range: Option<String>,

    /// Aggregation to compute
    #[arg(short, long, default_value = "max")]
    pub aggregation: AggregationKind,

    /// Percentile for pct, value for pctr
    #[arg(long, default_value_t = esagg_core::DEFAULT_PERCENTILE)]
    pub percentile: f64,

    /// Unit displayed in the check description
    #[arg(short, long, default_value = "")]
    pub unit: String,

    /// Check description (defaults to the key)
    #[arg(short, long)]
    pub desc: Option<String>,

    /// Time range to perform the search on
    #[arg(long, default_value = "5m", value_parser = parse_duration)]
    pub duration: Duration,

    /// Timestamp field the time range applies to
    #[arg(long, default_value = DEFAULT_TIME_FIELD)]
    pub time_field: String,

    /// Deadline for the search request
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Warning threshold range
    #[arg(short, long)]
    pub warning: String,

    /// Critical threshold range
    #[arg(short, long)]
    pub critical: String,

    /// Status code when the search returns no data (0-3)
    #[arg(short, long, default_value_t = DEFAULT_NULL_CODE, allow_negative_numbers = true)]
    pub null_code: i64,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Log HTTP request and response bodies to stderr
    #[arg(long)]
    pub debug: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Filter flags in application order: kind by kind, positive before negative.
    fn filter_flags(&self) -> Vec<FilterFlag> {
        let groups: [(FilterKind, bool, &[String]); 10] = [
            (FilterKind::Exists, false, &self.exists),
            (FilterKind::Exists, true, &self.not_exists),
            (FilterKind::Term, false, &self.term),
            (FilterKind::Term, true, &self.not_term),
            (FilterKind::Match, false, &self.match_),
            (FilterKind::Match, true, &self.not_match),
            (FilterKind::Prefix, false, &self.prefix),
            (FilterKind::Prefix, true, &self.not_prefix),
            (FilterKind::Regexp, false, &self.regex),
            (FilterKind::Regexp, true, &self.not_regex),
        ];

        let mut flags: Vec<FilterFlag> = groups
            .iter()
            .flat_map(|(kind, negate, tokens)| {
                tokens
                    .iter()
                    .map(move |token| FilterFlag::new(*kind, *negate, token.as_str()))
            })
            .collect();

        if let Some(range) = &self.range {
            flags.push(FilterFlag::new(FilterKind::Range, false, range.as_str()));
        }
        if let Some(range) = &self.not_range {
            flags.push(FilterFlag::new(FilterKind::Range, true, range.as_str()));
        }
        flags
    }

    pub fn to_config(&self) -> CheckConfig {
        CheckConfig {
            es_url: self.es_url.clone(),
            index_pattern: self.index_pattern.clone(),
            key: self.key.clone(),
            description: self.desc.clone(),
            query: self.query.clone(),
            filters: self.filter_flags(),
            aggregation: self.aggregation,
            percentile: self.percentile,
            unit: self.unit.clone(),
            window: self.duration,
            time_field: self.time_field.clone(),
            warning: self.warning.clone(),
            critical: self.critical.clone(),
            null_code: Severity::from_code(self.null_code),
            timeout: self.timeout,
        }
    }
}
