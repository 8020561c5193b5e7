//! Error types for the pluvio-spi crate.

/// Error type for all fallible operations in the pluvio-spi crate.
///
/// Only [`SpiError::EmptySeries`], [`SpiError::NoPositivePrecipitation`] and
/// [`SpiError::InvalidConfig`] ever reach the caller of
/// [`compute_spi`](crate::compute_spi). The distribution variants are raised
/// inside a single calendar month's fit and degrade that month to sentinel
/// values.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpiError {
    /// Returned when the cleaned daily series holds no records.
    #[error("daily series is empty")]
    EmptySeries,

    /// Returned when no day in the series has strictly positive precipitation.
    #[error("series contains no positive precipitation")]
    NoPositivePrecipitation,

    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the gamma CDF cannot be evaluated at a monthly total.
    #[error("gamma CDF undefined at x={x} (shape={shape}, scale={scale}): {message}")]
    GammaCdf {
        /// Monthly total being evaluated.
        x: f64,
        /// Fitted shape parameter.
        shape: f64,
        /// Fitted scale parameter.
        scale: f64,
        /// Description of the failure.
        message: String,
    },

    /// Returned when maximum-likelihood estimation produces no usable shape.
    #[error("gamma fit failed for month {month}: {reason}")]
    GammaFit {
        /// Calendar month (1..=12) being fitted.
        month: u8,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when the standard normal distribution cannot be constructed.
    #[error("normal construction failed: {message}")]
    NormalConstruction {
        /// Description of the failure.
        message: String,
    },
}
