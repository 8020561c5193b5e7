//! Per-calendar-month gamma fit and standardisation.

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

use crate::config::SpiConfig;
use crate::error::SpiError;
use crate::gamma::{GammaParams, fit_gamma_mle, gamma_cdf};
use crate::result::{MonthStatus, MonthlyDistributionStats};

/// Stats for one calendar month plus the SPI of each of its occurrences,
/// in the order the totals were supplied.
#[derive(Debug, Clone)]
pub(crate) struct MonthFit {
    pub(crate) stats: MonthlyDistributionStats,
    pub(crate) spi: Vec<f64>,
}

/// Fit one calendar month pooled across years.
///
/// Never fails: every degenerate case yields NaN SPI values for the month
/// and a status naming the reason.
pub(crate) fn fit_calendar_month(month: u8, totals: &[f64], config: &SpiConfig) -> MonthFit {
    let n = totals.len();
    if n == 0 {
        debug!(month, "calendar month absent from input");
        return MonthFit {
            stats: MonthlyDistributionStats::absent(month),
            spi: Vec::new(),
        };
    }

    let sum: f64 = totals.iter().sum();
    let mean = sum / n as f64;
    let n_zero = totals.iter().filter(|&&v| v == 0.0).count();
    let zero_probability = n_zero as f64 / n as f64;
    let positives: Vec<f64> = totals.iter().copied().filter(|&v| v > 0.0).collect();

    let mut stats = MonthlyDistributionStats {
        month,
        n_occurrences: n,
        mean_mm: mean,
        zero_probability,
        shape: f64::NAN,
        scale: f64::NAN,
        status: MonthStatus::Fitted,
    };

    let status = if n < config.min_occurrences() {
        Some(MonthStatus::InsufficientHistory)
    } else if sum == 0.0 {
        Some(MonthStatus::AllZero)
    } else if positives.len() < config.min_positive() {
        Some(MonthStatus::TooFewPositive)
    } else {
        None
    };
    if let Some(status) = status {
        warn!(month, n, status = status.as_str(), "SPI undefined for calendar month");
        stats.status = status;
        return MonthFit {
            stats,
            spi: vec![f64::NAN; n],
        };
    }

    match standardize(month, totals, &positives, zero_probability, config) {
        Ok((params, spi)) => {
            debug!(
                month,
                shape = params.shape(),
                scale = params.scale(),
                zero_probability,
                "fitted calendar month"
            );
            stats.shape = params.shape();
            stats.scale = params.scale();
            MonthFit { stats, spi }
        }
        Err(e) => {
            warn!(month, error = %e, "gamma fit failed; SPI undefined for calendar month");
            stats.status = MonthStatus::FitFailed;
            MonthFit {
                stats,
                spi: vec![f64::NAN; n],
            }
        }
    }
}

/// Fit the gamma distribution to the positive totals and map every total
/// through the zero-inflated CDF and the inverse standard normal.
fn standardize(
    month: u8,
    totals: &[f64],
    positives: &[f64],
    zero_probability: f64,
    config: &SpiConfig,
) -> Result<(GammaParams, Vec<f64>), SpiError> {
    let params = fit_gamma_mle(positives).ok_or_else(|| SpiError::GammaFit {
        month,
        reason: "no finite maximum-likelihood shape for the positive totals".to_string(),
    })?;
    let normal = Normal::new(0.0, 1.0).map_err(|e| SpiError::NormalConstruction {
        message: e.to_string(),
    })?;

    let clip = config.cdf_clip();
    let q = zero_probability;
    let spi = totals
        .iter()
        .map(|&x| {
            let cdf = gamma_cdf(&params, x)?.clamp(clip, 1.0 - clip);
            Ok(normal.inverse_cdf(q + (1.0 - q) * cdf))
        })
        .collect::<Result<Vec<f64>, SpiError>>()?;

    if spi.iter().any(|v| !v.is_finite()) {
        return Err(SpiError::GammaFit {
            month,
            reason: "standardised value is not finite".to_string(),
        });
    }
    Ok((params, spi))
}
