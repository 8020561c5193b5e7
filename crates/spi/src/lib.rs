//! Standardized Precipitation Index from a daily precipitation series.
//!
//! Daily values are summed into monthly totals. Each calendar month is
//! pooled across years and fitted with a two-parameter gamma distribution
//! (location fixed at zero) on its positive totals. Every total is then
//! mapped through the zero-inflated CDF `q + (1 - q) * G(x)` and the
//! inverse standard normal.
//!
//! A calendar month that cannot be fitted gets NaN SPI values and a
//! [`MonthStatus`] explaining why; it never stops the other months.

mod class;
mod config;
mod error;
mod fit;
mod gamma;
mod monthly;
mod result;

use std::collections::BTreeMap;

use pluvio_series::DailySeries;

pub use class::SpiClass;
pub use config::SpiConfig;
pub use error::SpiError;
pub use gamma::{GammaParams, fit_gamma_mle};
pub use monthly::{MonthlyPrecipitation, aggregate_monthly};
pub use result::{MonthStatus, MonthlyDistributionStats, SpiPoint, SpiResult};

/// Computes the monthly SPI series and per-calendar-month statistics.
///
/// # Errors
///
/// - [`SpiError::InvalidConfig`] if `config` fails validation.
/// - [`SpiError::EmptySeries`] if the series holds no valid days.
/// - [`SpiError::NoPositivePrecipitation`] if no day has rain.
#[tracing::instrument(skip_all, fields(n_days = series.len()))]
pub fn compute_spi(series: &DailySeries, config: &SpiConfig) -> Result<SpiResult, SpiError> {
    config.validate()?;
    if series.is_empty() {
        return Err(SpiError::EmptySeries);
    }
    if !series.has_positive() {
        return Err(SpiError::NoPositivePrecipitation);
    }

    let monthly = aggregate_monthly(series);
    let mut spi_values = BTreeMap::new();
    let mut stats = Vec::with_capacity(12);

    for month in 1u8..=12 {
        let occurrences = monthly.occurrences(month);
        let totals: Vec<f64> = occurrences.iter().map(|&(_, v)| v).collect();
        let month_fit = fit::fit_calendar_month(month, &totals, config);
        for (&(ym, _), spi) in occurrences.iter().zip(month_fit.spi) {
            spi_values.insert(ym, spi);
        }
        stats.push(month_fit.stats);
    }

    let points: Vec<SpiPoint> = monthly
        .iter()
        .map(|(year_month, total_mm)| SpiPoint {
            year_month,
            total_mm,
            spi: spi_values.get(&year_month).copied().unwrap_or(f64::NAN),
        })
        .collect();

    let result = SpiResult::new(points, stats);
    tracing::debug!(
        n_months = result.series().len(),
        n_defined = result.n_defined(),
        "SPI computed"
    );
    Ok(result)
}
