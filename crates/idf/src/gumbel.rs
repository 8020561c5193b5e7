//! Annual maxima and Gumbel return-period quantiles.

use std::collections::BTreeMap;

use pluvio_series::DailySeries;
use tracing::warn;

use crate::constants::{N_RETURN_PERIODS, RETURN_PERIODS, return_period_index};
use crate::error::IdfError;

/// Largest daily precipitation per calendar year.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualMaxima {
    maxima: BTreeMap<i32, f64>,
}

impl AnnualMaxima {
    /// Extracts the annual maxima of a cleaned daily series.
    pub fn from_series(series: &DailySeries) -> Self {
        Self {
            maxima: series.annual_maxima(),
        }
    }

    /// Number of years.
    pub fn len(&self) -> usize {
        self.maxima.len()
    }

    /// Returns `true` if no year is present.
    pub fn is_empty(&self) -> bool {
        self.maxima.is_empty()
    }

    /// Iterates `(year, maximum)` in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.maxima.iter().map(|(&y, &m)| (y, m))
    }

    /// Maxima values in year order.
    pub fn values(&self) -> Vec<f64> {
        self.maxima.values().copied().collect()
    }

    /// Mean of the annual maxima. NaN if empty.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        pluvio_stats::mean(&self.values())
    }

    /// Sample standard deviation (n - 1). NaN with fewer than two years.
    pub fn sd(&self) -> f64 {
        if self.len() < 2 {
            return f64::NAN;
        }
        pluvio_stats::sd(&self.values())
    }
}

/// Gumbel (EV1) quantile by the Chow frequency-factor approximation:
///
/// `x(Tr) = μ - σ·(0.45 + 0.7797·ln(ln(Tr / (Tr - 1))))`
///
/// Strictly increasing in `tr` for `tr > 1` and `sigma > 0`.
pub fn gumbel_quantile(mu: f64, sigma: f64, tr: f64) -> f64 {
    mu - sigma * (0.45 + 0.7797 * (tr / (tr - 1.0)).ln().ln())
}

/// Maximum 1-day precipitation for each configured return period.
///
/// Depths are stored in [`RETURN_PERIODS`] order. A depth is NaN when the
/// record is too short to define it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPeriodQuantiles {
    mean: f64,
    sd: f64,
    depths: [f64; N_RETURN_PERIODS],
}

impl ReturnPeriodQuantiles {
    /// Computes the quantiles from the mean and standard deviation of the
    /// annual maxima.
    pub fn from_moments(mean: f64, sd: f64) -> Self {
        let depths = RETURN_PERIODS.map(|tr| gumbel_quantile(mean, sd, f64::from(tr)));
        Self { mean, sd, depths }
    }

    /// Wraps externally supplied depths, one per return period.
    ///
    /// Mean and standard deviation are unknown and reported as NaN.
    ///
    /// # Errors
    ///
    /// Returns [`IdfError::QuantileCountMismatch`] unless exactly
    /// [`N_RETURN_PERIODS`] values are supplied.
    pub fn from_depths(depths: &[f64]) -> Result<Self, IdfError> {
        let depths: [f64; N_RETURN_PERIODS] =
            depths
                .try_into()
                .map_err(|_| IdfError::QuantileCountMismatch {
                    expected: N_RETURN_PERIODS,
                    got: depths.len(),
                })?;
        Ok(Self {
            mean: f64::NAN,
            sd: f64::NAN,
            depths,
        })
    }

    /// Mean of the annual maxima the quantiles were derived from.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation of the annual maxima.
    pub fn sd(&self) -> f64 {
        self.sd
    }

    /// Depths (mm) in [`RETURN_PERIODS`] order.
    pub fn depths(&self) -> &[f64; N_RETURN_PERIODS] {
        &self.depths
    }

    /// Depth for a configured return period, `None` for any other value.
    pub fn depth_for(&self, tr: u32) -> Option<f64> {
        return_period_index(tr).map(|i| self.depths[i])
    }

    /// Iterates `(return_period, depth)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        RETURN_PERIODS.iter().copied().zip(self.depths.iter().copied())
    }

    /// Returns `true` if every depth is finite.
    pub fn is_complete(&self) -> bool {
        self.depths.iter().all(|d| d.is_finite())
    }
}

/// Estimates return-period depths from a cleaned daily series.
///
/// With a single year the standard deviation is undefined and every depth
/// is NaN.
///
/// # Errors
///
/// Returns [`IdfError::EmptySeries`] if the series has no observations.
#[tracing::instrument(skip_all, fields(n_days = series.len()))]
pub fn estimate_quantiles(series: &DailySeries) -> Result<ReturnPeriodQuantiles, IdfError> {
    if series.is_empty() {
        return Err(IdfError::EmptySeries);
    }

    let maxima = AnnualMaxima::from_series(series);
    if maxima.len() < 2 {
        warn!(
            n_years = maxima.len(),
            "annual maxima need at least two years; quantiles unavailable"
        );
    }

    Ok(ReturnPeriodQuantiles::from_moments(maxima.mean(), maxima.sd()))
}
