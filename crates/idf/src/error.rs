//! Error types for the pluvio-idf crate.

/// Error type for all fallible operations in the pluvio-idf crate.
///
/// Only malformed inputs are errors. A curve fit that does not converge is
/// reported through [`crate::FitStatus`] with sentinel parameters instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdfError {
    /// Returned when the cleaned daily series has no observations.
    #[error("daily series is empty")]
    EmptySeries,

    /// Returned when a quantile vector does not have one entry per return period.
    #[error("expected {expected} return-period quantiles, got {got}")]
    QuantileCountMismatch {
        /// Number of configured return periods.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Returned when parallel table columns differ in length.
    #[error(
        "length mismatch: return periods has {return_periods_len} elements, durations has {durations_len}, intensities has {intensities_len}"
    )]
    LengthMismatch {
        /// Length of the return-period column.
        return_periods_len: usize,
        /// Length of the duration column.
        durations_len: usize,
        /// Length of the intensity column.
        intensities_len: usize,
    },

    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_series() {
        assert_eq!(IdfError::EmptySeries.to_string(), "daily series is empty");
    }

    #[test]
    fn error_quantile_count_mismatch() {
        let e = IdfError::QuantileCountMismatch {
            expected: 11,
            got: 10,
        };
        assert_eq!(e.to_string(), "expected 11 return-period quantiles, got 10");
    }

    #[test]
    fn error_length_mismatch() {
        let e = IdfError::LengthMismatch {
            return_periods_len: 3,
            durations_len: 2,
            intensities_len: 3,
        };
        assert_eq!(
            e.to_string(),
            "length mismatch: return periods has 3 elements, durations has 2, intensities has 3"
        );
    }

    #[test]
    fn error_invalid_config() {
        let e = IdfError::InvalidConfig {
            reason: "max_evaluations must be >= 1".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid configuration: max_evaluations must be >= 1"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<IdfError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<IdfError>();
    }
}
