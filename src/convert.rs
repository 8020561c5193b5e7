//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result};

use pluvio_idf::IdfFitConfig;
use pluvio_spi::SpiConfig;

use crate::config::{IdfToml, SpiToml};

/// Builds and validates an [`IdfFitConfig`] from the `[idf]` table.
pub fn build_idf_config(idf: &IdfToml) -> Result<IdfFitConfig> {
    let cfg = IdfFitConfig::new()
        .with_initial_guess(idf.initial_guess)
        .with_max_evaluations(idf.max_evaluations)
        .with_min_rows(idf.min_rows)
        .with_return_period_floor(idf.return_period_floor)
        .with_duration_floor(idf.duration_floor)
        .with_penalty(idf.penalty);
    cfg.validate().context("invalid [idf] configuration")?;
    Ok(cfg)
}

/// Builds and validates an [`SpiConfig`] from the `[spi]` table.
pub fn build_spi_config(spi: &SpiToml) -> Result<SpiConfig> {
    let cfg = SpiConfig::new()
        .with_min_occurrences(spi.min_occurrences)
        .with_min_positive(spi.min_positive)
        .with_cdf_clip(spi.cdf_clip);
    cfg.validate().context("invalid [spi] configuration")?;
    Ok(cfg)
}
