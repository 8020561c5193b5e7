//! Two-parameter gamma distribution (location fixed at 0) and its
//! maximum-likelihood fit.

use statrs::function::gamma::{checked_gamma_lr, digamma};

use crate::error::SpiError;

/// Newton iteration cap for the shape equation.
const MAX_NEWTON_ITER: usize = 100;

/// Relative step below which the shape estimate is considered settled.
const SHAPE_TOL: f64 = 1e-12;

/// Smallest usable value of `ln(mean) - mean(ln x)`; below it the sample is
/// numerically constant and the shape diverges.
const MIN_LOG_SPREAD: f64 = 1e-12;

/// Validated parameters for a Gamma distribution (shape/scale convention).
///
/// Both `shape` (k) and `scale` (theta) must be finite and positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    shape: f64,
    scale: f64,
}

impl GammaParams {
    /// Returns `None` unless both parameters are finite and strictly positive.
    pub fn new(shape: f64, scale: f64) -> Option<Self> {
        if shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0 {
            Some(Self { shape, scale })
        } else {
            None
        }
    }

    /// Shape parameter (k).
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Scale parameter (theta).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Distribution mean (shape * scale).
    pub fn mean(&self) -> f64 {
        self.shape * self.scale
    }
}

/// Gamma CDF at `x`, zero for `x <= 0`.
///
/// Evaluated through the checked regularised lower incomplete gamma
/// function: a positive `x` whose scaled value `x / scale` underflows to
/// zero or overflows is an error rather than a silently wrong probability.
pub(crate) fn gamma_cdf(params: &GammaParams, x: f64) -> Result<f64, SpiError> {
    if x <= 0.0 {
        return Ok(0.0);
    }
    checked_gamma_lr(params.shape(), x / params.scale()).map_err(|e| SpiError::GammaCdf {
        x,
        shape: params.shape(),
        scale: params.scale(),
        message: e.to_string(),
    })
}

/// Maximum-likelihood gamma fit with location fixed at zero.
///
/// With `s = ln(mean) - mean(ln x)` the shape solves `ln k - ψ(k) = s`.
/// The iteration starts from Thom's approximation and refines it with
/// Newton's method; the scale follows as `mean / k`.
///
/// Returns `None` for fewer than two values, any non-positive or
/// non-finite value, or a sample with no spread.
pub fn fit_gamma_mle(values: &[f64]) -> Option<GammaParams> {
    let n = values.len();
    if n < 2 || values.iter().any(|&v| !v.is_finite() || v <= 0.0) {
        return None;
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let mean_log = values.iter().map(|v| v.ln()).sum::<f64>() / nf;
    let s = mean.ln() - mean_log;
    if !s.is_finite() || s <= MIN_LOG_SPREAD {
        return None;
    }

    let mut k = (1.0 + (1.0 + 4.0 * s / 3.0).sqrt()) / (4.0 * s);
    for _ in 0..MAX_NEWTON_ITER {
        let f = k.ln() - digamma(k) - s;
        let fp = 1.0 / k - trigamma(k);
        if !f.is_finite() || !fp.is_finite() || fp == 0.0 {
            break;
        }
        let mut next = k - f / fp;
        if next <= 0.0 {
            next = k / 2.0;
        }
        let settled = (next - k).abs() <= SHAPE_TOL * k;
        k = next;
        if settled {
            break;
        }
    }

    GammaParams::new(k, mean / k)
}

/// Trigamma function ψ'(x) for `x > 0`.
///
/// Shifts the argument upwards with `ψ'(x) = ψ'(x + 1) + 1/x²` and then
/// applies the asymptotic expansion.
pub(crate) fn trigamma(x: f64) -> f64 {
    let mut x = x;
    let mut acc = 0.0;
    while x < 10.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let x2 = 1.0 / (x * x);
    let tail = (1.0 / (x * x * x)) * (1.0 / 6.0 - x2 * (1.0 / 30.0 - x2 * (1.0 / 42.0 - x2 / 30.0)));
    acc + 1.0 / x + x2 / 2.0 + tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Gamma as GammaDist};
    use std::f64::consts::PI;

    #[test]
    fn new_rejects_invalid() {
        assert!(GammaParams::new(0.0, 1.0).is_none());
        assert!(GammaParams::new(1.0, -1.0).is_none());
        assert!(GammaParams::new(f64::NAN, 1.0).is_none());
        assert!(GammaParams::new(f64::INFINITY, 1.0).is_none());
    }

    #[test]
    fn trigamma_known_values() {
        assert_relative_eq!(trigamma(1.0), PI * PI / 6.0, epsilon = 1e-10);
        assert_relative_eq!(trigamma(0.5), PI * PI / 2.0, epsilon = 1e-10);
        assert_relative_eq!(trigamma(10.0), 0.105_166_335_681_685_75, epsilon = 1e-10);
    }

    #[test]
    fn mle_satisfies_score_equation() {
        let values = [12.0, 30.5, 44.0, 8.2, 61.0, 25.0];
        let p = fit_gamma_mle(&values).unwrap();

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let mean_log = values.iter().map(|v| v.ln()).sum::<f64>() / n;
        let s = mean.ln() - mean_log;

        assert_relative_eq!(p.shape().ln() - digamma(p.shape()), s, epsilon = 1e-9);
        assert_relative_eq!(p.mean(), mean, max_relative = 1e-12);
        assert_relative_eq!(p.shape(), 2.444_234_557_77, max_relative = 1e-6);
    }

    #[test]
    fn mle_recovers_known_distribution() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let dist = GammaDist::new(2.0, 3.0).unwrap();
        let values: Vec<f64> = (0..5000).map(|_| dist.sample(&mut rng)).collect();
        let p = fit_gamma_mle(&values).unwrap();
        assert!((p.shape() - 2.0).abs() < 0.15, "shape = {}", p.shape());
        assert!((p.scale() - 3.0).abs() < 0.3, "scale = {}", p.scale());
    }

    #[test]
    fn mle_handles_wide_spread() {
        let p = fit_gamma_mle(&[0.01, 100.0]).unwrap();
        assert!(p.shape() < 1.0);
        assert_relative_eq!(p.mean(), 50.005, max_relative = 1e-12);
    }

    #[test]
    fn mle_rejects_degenerate_samples() {
        assert!(fit_gamma_mle(&[]).is_none());
        assert!(fit_gamma_mle(&[4.0]).is_none());
        assert!(fit_gamma_mle(&[5.0, 5.0, 5.0]).is_none());
        assert!(fit_gamma_mle(&[0.0, 3.0, 4.0]).is_none());
        assert!(fit_gamma_mle(&[1.0, f64::NAN]).is_none());
    }

    #[test]
    fn cdf_matches_closed_form_for_unit_shape() {
        // shape 1 is the exponential distribution: F(x) = 1 - exp(-x / scale).
        let p = GammaParams::new(1.0, 4.0).unwrap();
        assert_relative_eq!(gamma_cdf(&p, 0.0).unwrap(), 0.0);
        assert_relative_eq!(gamma_cdf(&p, -3.0).unwrap(), 0.0);
        assert_relative_eq!(gamma_cdf(&p, 4.0).unwrap(), 1.0 - (-1.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn cdf_underflowing_argument_is_error() {
        let p = GammaParams::new(0.0015, 2.3e302).unwrap();
        let err = gamma_cdf(&p, 1e-300).unwrap_err();
        assert!(matches!(err, SpiError::GammaCdf { .. }));
        assert!(gamma_cdf(&p, 5.0).unwrap().is_finite());
    }

    #[test]
    fn gamma_params_is_copy_send_sync() {
        fn assert_impl<T: Copy + Send + Sync>() {}
        assert_impl::<GammaParams>();
    }
}
