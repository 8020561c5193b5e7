//! Accumulated validation utilities.
//!
//! Provides [`ValidationCollector`] for gathering every problem found in a
//! station header into a single [`IoError::Validation`], plus the header
//! field checks that feed it.

use crate::error::IoError;

// ---------------------------------------------------------------------------
// ValidationCollector
// ---------------------------------------------------------------------------

/// Accumulates validation errors and converts them into a single
/// [`IoError::Validation`].
pub(crate) struct ValidationCollector {
    errors: Vec<String>,
}

impl ValidationCollector {
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record one validation error.
    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    /// Consume the collector and return `Ok(())` if no errors were recorded,
    /// or `Err(IoError::Validation { count, details })` otherwise.
    ///
    /// The `details` string joins all messages with `"; "`.
    pub(crate) fn finish(self) -> Result<(), IoError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: self.errors.len(),
                details: self.errors.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Parse a decimal that may use a comma as the decimal separator.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    t.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a numeric header field. A missing field is 0; a malformed one is
/// recorded in `c` and also yields 0.
pub(crate) fn header_number(c: &mut ValidationCollector, key: &str, raw: Option<&str>) -> f64 {
    match raw {
        None => 0.0,
        Some(s) if s.trim().is_empty() => 0.0,
        Some(s) => parse_decimal(s).unwrap_or_else(|| {
            c.push(format!("{key}: not a number ({s:?})"));
            0.0
        }),
    }
}

/// Check that coordinates lie on the globe.
pub(crate) fn validate_coordinates(c: &mut ValidationCollector, latitude: f64, longitude: f64) {
    if !(-90.0..=90.0).contains(&latitude) {
        c.push(format!("latitude {latitude} outside [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        c.push(format!("longitude {longitude} outside [-180, 180]"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_empty_is_ok() {
        let c = ValidationCollector::new();
        assert_eq!(c.len(), 0);
        assert!(c.finish().is_ok());
    }

    #[test]
    fn collector_non_empty_is_err_with_correct_count() {
        let mut c = ValidationCollector::new();
        c.push("error one");
        c.push("error two");
        match c.finish().unwrap_err() {
            IoError::Validation { count, details } => {
                assert_eq!(count, 2);
                assert_eq!(details, "error one; error two");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn decimal_comma_and_point() {
        assert_eq!(parse_decimal("-15,78"), Some(-15.78));
        assert_eq!(parse_decimal(" 1000.5 "), Some(1000.5));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn header_number_defaults_and_errors() {
        let mut c = ValidationCollector::new();
        assert_eq!(header_number(&mut c, "altitude", None), 0.0);
        assert_eq!(header_number(&mut c, "altitude", Some("  ")), 0.0);
        assert_eq!(header_number(&mut c, "altitude", Some("1159,54")), 1159.54);
        assert_eq!(c.len(), 0);
        assert_eq!(header_number(&mut c, "latitude", Some("north")), 0.0);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn coordinates_out_of_range() {
        let mut c = ValidationCollector::new();
        validate_coordinates(&mut c, -15.78, -47.93);
        assert_eq!(c.len(), 0);
        validate_coordinates(&mut c, 95.0, 200.0);
        assert_eq!(c.len(), 2);
    }
}
