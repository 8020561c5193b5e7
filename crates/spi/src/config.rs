//! Configuration for SPI computation.

use crate::error::SpiError;

/// Thresholds that decide whether a calendar month can be fitted.
///
/// # Example
///
/// ```
/// use pluvio_spi::SpiConfig;
///
/// let config = SpiConfig::new().with_min_occurrences(5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct SpiConfig {
    min_occurrences: usize,
    min_positive: usize,
    cdf_clip: f64,
}

impl SpiConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `min_occurrences = 3`, `min_positive = 2`,
    /// `cdf_clip = 1e-10`.
    pub fn new() -> Self {
        Self {
            min_occurrences: 3,
            min_positive: 2,
            cdf_clip: 1e-10,
        }
    }

    /// Sets the minimum number of years a calendar month must appear in.
    pub fn with_min_occurrences(mut self, n: usize) -> Self {
        self.min_occurrences = n;
        self
    }

    /// Sets the minimum number of strictly positive monthly totals.
    pub fn with_min_positive(mut self, n: usize) -> Self {
        self.min_positive = n;
        self
    }

    /// Sets the CDF clip; values are kept inside `(clip, 1 - clip)`.
    pub fn with_cdf_clip(mut self, clip: f64) -> Self {
        self.cdf_clip = clip;
        self
    }

    /// Returns the minimum number of occurrences a calendar month needs.
    pub fn min_occurrences(&self) -> usize {
        self.min_occurrences
    }

    /// Returns the minimum number of strictly positive totals.
    pub fn min_positive(&self) -> usize {
        self.min_positive
    }

    /// Returns the CDF clip.
    pub fn cdf_clip(&self) -> f64 {
        self.cdf_clip
    }

    /// Validates this configuration.
    ///
    /// A two-parameter gamma fit needs at least two positive values, and the
    /// clip must be a finite value in `(0, 0.5)`.
    pub fn validate(&self) -> Result<(), SpiError> {
        if self.min_occurrences < 1 {
            return Err(SpiError::InvalidConfig {
                reason: format!(
                    "min_occurrences must be >= 1, got {}",
                    self.min_occurrences
                ),
            });
        }

        if self.min_positive < 2 {
            return Err(SpiError::InvalidConfig {
                reason: format!("min_positive must be >= 2, got {}", self.min_positive),
            });
        }

        if !self.cdf_clip.is_finite() || self.cdf_clip <= 0.0 || self.cdf_clip >= 0.5 {
            return Err(SpiError::InvalidConfig {
                reason: format!("cdf_clip must be in (0, 0.5), got {}", self.cdf_clip),
            });
        }

        Ok(())
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::new()
    }
}
