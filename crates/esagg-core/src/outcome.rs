//! Check outcome and its plugin-output rendering.
//!
//! One line on stdout: `SEVERITY: message | label=value<unit>;warn;crit;min;max`.

use std::fmt;

/// Monitoring-plugin status levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// Map a numeric status code; anything outside 0..=2 is UNKNOWN.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Severity::Ok,
            1 => Severity::Warning,
            2 => Severity::Critical,
            _ => Severity::Unknown,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortest float form; non-finite values render empty.
fn fmt_perf_float(value: f64) -> String {
    if value.is_finite() {
        format!("{value}")
    } else {
        String::new()
    }
}

fn fmt_label(label: &str) -> String {
    if label.contains([' ', '=', '\'']) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

/// One performance data token.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfDatum {
    pub label: String,
    pub unit: String,
    pub value: f64,
    /// Raw warning range specifier.
    pub warn: String,
    /// Raw critical range specifier.
    pub crit: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PerfDatum {
    pub fn render(&self) -> String {
        let bound = |b: Option<f64>| b.map(fmt_perf_float).unwrap_or_default();
        format!(
            "{}={}{};{};{};{};{}",
            fmt_label(&self.label),
            fmt_perf_float(self.value),
            self.unit,
            self.warn,
            self.crit,
            bound(self.min),
            bound(self.max),
        )
    }
}

impl fmt::Display for PerfDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Terminal artifact of a run.
///
/// `perf` is absent only when the search itself never completed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub severity: Severity,
    pub message: String,
    pub perf: Option<PerfDatum>,
}

impl CheckOutcome {
    pub fn new(severity: Severity, message: impl Into<String>, perf: Option<PerfDatum>) -> Self {
        Self {
            severity,
            message: message.into(),
            perf,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.severity.exit_code()
    }

    /// The plugin status line.
    pub fn render(&self) -> String {
        match &self.perf {
            Some(perf) => format!("{}: {} | {}", self.severity, self.message, perf.render()),
            None => format!("{}: {}", self.severity, self.message),
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
