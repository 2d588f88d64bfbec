//! Monitoring-plugin threshold ranges.
//!
//! | specifier | alerts when value is |
//! |-----------|----------------------|
//! | `10`      | outside `0..=10`     |
//! | `10:`     | below 10             |
//! | `~:10`    | above 10             |
//! | `10:20`   | outside `10..=20`    |
//! | `@10:20`  | inside `10..=20`     |
//!
//! Bounds are inclusive on both ends.

use std::fmt;
use std::str::FromStr;

use crate::error::RangeParseError;
use crate::outcome::Severity;

/// A parsed threshold range specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRange {
    raw: String,
    alert_on_inside: bool,
    start: f64,
    end: f64,
}

fn parse_bound(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

impl ThresholdRange {
    pub fn parse(raw: &str) -> Result<Self, RangeParseError> {
        let spec = raw.trim_matches(|c| c == ' ' || c == '\n' || c == '\r');
        let (alert_on_inside, body) = match spec.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        if body.is_empty() {
            return Err(RangeParseError::Empty);
        }

        let (start, upper) = match body.split_once(':') {
            Some(("~", upper)) => (f64::NEG_INFINITY, upper),
            Some((lower, upper)) => (
                parse_bound(lower).ok_or_else(|| RangeParseError::InvalidLower(lower.to_string()))?,
                upper,
            ),
            None => (0.0, body),
        };
        let end = if upper.is_empty() {
            f64::INFINITY
        } else {
            parse_bound(upper).ok_or_else(|| RangeParseError::InvalidUpper(upper.to_string()))?
        };

        if end < start {
            return Err(RangeParseError::Inverted { start, end });
        }

        Ok(Self {
            raw: spec.to_string(),
            alert_on_inside,
            start,
            end,
        })
    }

    /// The specifier as given (trimmed).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `@` form: alert when the value falls inside the range.
    pub fn is_inverted(&self) -> bool {
        self.alert_on_inside
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Closed-interval membership, ignoring inversion.
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }

    /// Whether `value` should raise an alert for this range.
    pub fn alerts(&self, value: f64) -> bool {
        self.contains(value) == self.alert_on_inside
    }
}

impl FromStr for ThresholdRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Classify `value`; critical wins over warning.
pub fn classify(value: f64, warning: &ThresholdRange, critical: &ThresholdRange) -> Severity {
    if critical.alerts(value) {
        Severity::Critical
    } else if warning.alerts(value) {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> ThresholdRange {
        ThresholdRange::parse(s).unwrap()
    }

    #[test]
    fn test_bare_number_is_zero_to_n() {
        let r = range("15");
        assert_eq!(r.start(), 0.0);
        assert_eq!(r.end(), 15.0);
        assert!(!r.alerts(0.0));
        assert!(!r.alerts(15.0));
        assert!(r.alerts(15.1));
        assert!(r.alerts(-1.0));
    }

    #[test]
    fn test_open_upper_bound() {
        let r = range("10:");
        assert_eq!(r.end(), f64::INFINITY);
        assert!(r.alerts(9.9));
        assert!(!r.alerts(1e12));
    }

    #[test]
    fn test_negative_infinity_lower_bound() {
        let r = range("~:10");
        assert_eq!(r.start(), f64::NEG_INFINITY);
        assert!(!r.alerts(-1e12));
        assert!(r.alerts(10.5));
    }

    #[test]
    fn test_closed_range_and_inversion() {
        let r = range("10:20");
        assert!(r.contains(10.0) && r.contains(20.0));
        assert!(!r.alerts(15.0));
        assert!(r.alerts(21.0));

        let inv = range("@10:20");
        assert!(inv.is_inverted());
        assert!(inv.alerts(15.0));
        assert!(!inv.alerts(21.0));
        assert_eq!(inv.raw(), "@10:20");
    }

    #[test]
    fn test_closed_range_membership_grid() {
        let pairs = [(-5.0, 5.0), (0.0, 0.0), (1.5, 2.5), (100.0, 1000.0)];
        for (n, m) in pairs {
            let plain = range(&format!("{n}:{m}"));
            let inverted = range(&format!("@{n}:{m}"));
            for v in [n - 1.0, n, (n + m) / 2.0, m, m + 1.0] {
                let inside = n <= v && v <= m;
                assert_eq!(plain.contains(v), inside);
                assert_eq!(plain.alerts(v), !inside);
                assert_eq!(inverted.alerts(v), inside);
            }
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ThresholdRange::parse(""), Err(RangeParseError::Empty));
        assert_eq!(ThresholdRange::parse("@"), Err(RangeParseError::Empty));
        assert!(matches!(
            ThresholdRange::parse("abc"),
            Err(RangeParseError::InvalidUpper(_))
        ));
        assert!(matches!(
            ThresholdRange::parse("x:10"),
            Err(RangeParseError::InvalidLower(_))
        ));
        assert!(matches!(
            ThresholdRange::parse("20:10"),
            Err(RangeParseError::Inverted { .. })
        ));
        assert!(ThresholdRange::parse("NaN").is_err());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(range(" 30\n").end(), 30.0);
    }

    #[test]
    fn test_critical_takes_precedence() {
        let warning = range("10");
        let critical = range("5");
        // 20 is outside both 0..10 and 0..5
        assert_eq!(classify(20.0, &warning, &critical), Severity::Critical);
    }

    #[test]
    fn test_classify_levels() {
        let warning = range("15");
        let critical = range("30");
        assert_eq!(classify(10.0, &warning, &critical), Severity::Ok);
        assert_eq!(classify(20.0, &warning, &critical), Severity::Warning);
        assert_eq!(classify(35.0, &warning, &critical), Severity::Critical);
    }
}
