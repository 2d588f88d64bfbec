//! Filter token grammar.
//!
//! Filter flags take `<field>:<value>` or `<field>=<value>`. The field is
//! restricted to `[A-Za-z0-9_.-]+`; the value is everything after the
//! first separator, so `url:http://host:9200/x` keeps its colons.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9_.\-]+)[:=]\s*(.*)").expect("filter token pattern is valid")
    })
}

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.\-]+$").expect("field name pattern is valid")
    })
}

/// Split a raw filter token into `(field, value)`.
///
/// Returns `None` when the token does not have the `<field><sep><value>`
/// shape. Whitespace directly after the separator is dropped.
pub fn parse_field_token(token: &str) -> Option<(String, String)> {
    let caps = token_pattern().captures(token)?;
    let field = caps.get(1)?.as_str();
    let value = caps.get(2).map_or("", |m| m.as_str());
    Some((field.to_string(), value.to_string()))
}

/// The document-matching primitive a filter clause compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Exists,
    Term,
    Match,
    Prefix,
    Regexp,
    Range,
}

impl FilterKind {
    /// Name of the command-line flag carrying this kind of filter.
    pub fn flag_name(&self, negate: bool) -> String {
        let base = match self {
            FilterKind::Exists => "exists",
            FilterKind::Term => "term",
            FilterKind::Match => "match",
            FilterKind::Prefix => "prefix",
            FilterKind::Regexp => "regex",
            FilterKind::Range => "range",
        };
        if negate {
            format!("not-{base}")
        } else {
            base.to_string()
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flag_name(false))
    }
}

/// One unscored restriction on matching documents.
///
/// `value` is ignored for [`FilterKind::Exists`] and holds a range
/// expression for [`FilterKind::Range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub value: String,
    pub negate: bool,
    pub kind: FilterKind,
}

impl FilterClause {
    /// An exists clause; the token is the bare field name.
    pub fn exists(field: &str, negate: bool) -> Result<Self, ConfigError> {
        let field = field.trim();
        if !field_pattern().is_match(field) {
            return Err(ConfigError::MalformedFilter {
                flag: FilterKind::Exists.flag_name(negate),
                token: field.to_string(),
            });
        }
        Ok(Self {
            field: field.to_string(),
            value: String::new(),
            negate,
            kind: FilterKind::Exists,
        })
    }

    /// Parse one flag occurrence into a clause.
    pub fn parse(kind: FilterKind, token: &str, negate: bool) -> Result<Self, ConfigError> {
        if kind == FilterKind::Exists {
            return Self::exists(token, negate);
        }
        let (field, value) =
            parse_field_token(token).ok_or_else(|| ConfigError::MalformedFilter {
                flag: kind.flag_name(negate),
                token: token.to_string(),
            })?;
        Ok(Self {
            field,
            value,
            negate,
            kind,
        })
    }
}

/// A filter flag occurrence as given on the command line, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterFlag {
    pub kind: FilterKind,
    pub negate: bool,
    pub token: String,
}

impl FilterFlag {
    pub fn new(kind: FilterKind, negate: bool, token: impl Into<String>) -> Self {
        Self {
            kind,
            negate,
            token: token.into(),
        }
    }

    pub fn parse(&self) -> Result<FilterClause, ConfigError> {
        FilterClause::parse(self.kind, &self.token, self.negate)
    }
}
