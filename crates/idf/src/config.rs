//! Configuration for IDF curve fitting.

use crate::error::IdfError;

/// Configuration for the Levenberg-Marquardt IDF fit.
///
/// # Example
///
/// ```
/// use pluvio_idf::IdfFitConfig;
///
/// let config = IdfFitConfig::new()
///     .with_initial_guess([800.0, 0.15, 10.0, 0.7])
///     .with_max_evaluations(500);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct IdfFitConfig {
    initial_guess: [f64; 4],
    max_evaluations: usize,
    min_rows: usize,
    return_period_floor: f64,
    duration_floor: f64,
    penalty: f64,
    initial_damping: f64,
    ftol: f64,
    xtol: f64,
}

impl IdfFitConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `initial_guess = [500, 0.1, 5, 0.3]`,
    /// `max_evaluations = 1000`, `min_rows = 5`,
    /// `return_period_floor = 1e-6`, `duration_floor = 1e-6`,
    /// `penalty = 1e6`, `initial_damping = 1e-3`, `ftol = 1e-12`,
    /// `xtol = 1e-12`.
    pub fn new() -> Self {
        Self {
            initial_guess: [500.0, 0.1, 5.0, 0.3],
            max_evaluations: 1000,
            min_rows: 5,
            return_period_floor: 1e-6,
            duration_floor: 1e-6,
            penalty: 1e6,
            initial_damping: 1e-3,
            ftol: 1e-12,
            xtol: 1e-12,
        }
    }

    // --- Builder methods ---

    /// Sets the starting point `[a, b, c, d]`.
    pub fn with_initial_guess(mut self, guess: [f64; 4]) -> Self {
        self.initial_guess = guess;
        self
    }

    /// Sets the cap on residual evaluations.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }

    /// Sets the minimum number of valid rows required to attempt a fit.
    pub fn with_min_rows(mut self, n: usize) -> Self {
        self.min_rows = n;
        self
    }

    /// Sets the positive floor applied to return periods before exponentiation.
    pub fn with_return_period_floor(mut self, v: f64) -> Self {
        self.return_period_floor = v;
        self
    }

    /// Sets the positive floor applied to `td + c` before exponentiation.
    pub fn with_duration_floor(mut self, v: f64) -> Self {
        self.duration_floor = v;
        self
    }

    /// Sets the residual substituted for non-finite model values.
    pub fn with_penalty(mut self, v: f64) -> Self {
        self.penalty = v;
        self
    }

    /// Sets the starting Levenberg-Marquardt damping factor.
    pub fn with_initial_damping(mut self, v: f64) -> Self {
        self.initial_damping = v;
        self
    }

    /// Sets the relative cost-reduction tolerance.
    pub fn with_ftol(mut self, v: f64) -> Self {
        self.ftol = v;
        self
    }

    /// Sets the relative step-size tolerance.
    pub fn with_xtol(mut self, v: f64) -> Self {
        self.xtol = v;
        self
    }

    // --- Accessors ---

    /// Returns the starting point `[a, b, c, d]`.
    pub fn initial_guess(&self) -> [f64; 4] {
        self.initial_guess
    }

    /// Returns the cap on residual evaluations.
    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    /// Returns the minimum number of valid rows.
    pub fn min_rows(&self) -> usize {
        self.min_rows
    }

    /// Returns the return-period floor.
    pub fn return_period_floor(&self) -> f64 {
        self.return_period_floor
    }

    /// Returns the `td + c` floor.
    pub fn duration_floor(&self) -> f64 {
        self.duration_floor
    }

    /// Returns the non-finite residual penalty.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Returns the starting damping factor.
    pub fn initial_damping(&self) -> f64 {
        self.initial_damping
    }

    /// Returns the relative cost-reduction tolerance.
    pub fn ftol(&self) -> f64 {
        self.ftol
    }

    /// Returns the relative step-size tolerance.
    pub fn xtol(&self) -> f64 {
        self.xtol
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), IdfError> {
        if self.initial_guess.iter().any(|v| !v.is_finite()) {
            return Err(IdfError::InvalidConfig {
                reason: format!(
                    "initial_guess must be finite, got {:?}",
                    self.initial_guess
                ),
            });
        }

        if self.max_evaluations < 1 {
            return Err(IdfError::InvalidConfig {
                reason: format!(
                    "max_evaluations must be >= 1, got {}",
                    self.max_evaluations
                ),
            });
        }

        // Four free parameters need at least four observations.
        if self.min_rows < 4 {
            return Err(IdfError::InvalidConfig {
                reason: format!("min_rows must be >= 4, got {}", self.min_rows),
            });
        }

        for (name, v) in [
            ("return_period_floor", self.return_period_floor),
            ("duration_floor", self.duration_floor),
            ("penalty", self.penalty),
            ("initial_damping", self.initial_damping),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(IdfError::InvalidConfig {
                    reason: format!("{name} must be finite and > 0, got {v}"),
                });
            }
        }

        for (name, v) in [("ftol", self.ftol), ("xtol", self.xtol)] {
            if !v.is_finite() || v < 0.0 {
                return Err(IdfError::InvalidConfig {
                    reason: format!("{name} must be finite and >= 0, got {v}"),
                });
            }
        }

        Ok(())
    }
}

impl Default for IdfFitConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = IdfFitConfig::new();
        assert_eq!(cfg.initial_guess(), [500.0, 0.1, 5.0, 0.3]);
        assert_eq!(cfg.max_evaluations(), 1000);
        assert_eq!(cfg.min_rows(), 5);
        assert!((cfg.penalty() - 1e6).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_chaining() {
        let cfg = IdfFitConfig::new()
            .with_initial_guess([1.0, 2.0, 3.0, 4.0])
            .with_max_evaluations(10)
            .with_min_rows(8)
            .with_penalty(1e3);
        assert_eq!(cfg.initial_guess(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(cfg.max_evaluations(), 10);
        assert_eq!(cfg.min_rows(), 8);
        assert!((cfg.penalty() - 1e3).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_non_finite_guess() {
        let cfg = IdfFitConfig::new().with_initial_guess([f64::NAN, 0.1, 5.0, 0.3]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_zero_evaluations() {
        assert!(IdfFitConfig::new().with_max_evaluations(0).validate().is_err());
    }

    #[test]
    fn validate_min_rows_below_parameter_count() {
        assert!(IdfFitConfig::new().with_min_rows(3).validate().is_err());
    }

    #[test]
    fn validate_floors_positive() {
        assert!(IdfFitConfig::new().with_duration_floor(0.0).validate().is_err());
        assert!(
            IdfFitConfig::new()
                .with_return_period_floor(-1.0)
                .validate()
                .is_err()
        );
        assert!(IdfFitConfig::new().with_penalty(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn validate_negative_tolerance() {
        assert!(IdfFitConfig::new().with_ftol(-1.0).validate().is_err());
    }
}
