//! SPI command: monthly index and calendar-month statistics for one station.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use pluvio_io::read_station;

use crate::cli::StationArgs;
use crate::config::PluvioConfig;
use crate::convert;
use crate::report::{self, SpiReport, StationInfo};

#[derive(Serialize)]
struct SpiOutput {
    station: StationInfo,
    spi: SpiReport,
}

/// Run the single-station SPI analysis.
pub fn run(args: StationArgs, config: &PluvioConfig) -> Result<()> {
    let _cmd = info_span!("spi").entered();
    let spi_cfg = convert::build_spi_config(&config.spi)?;

    info!(path = %args.input.display(), "reading station");
    let station = read_station(&args.input)
        .with_context(|| format!("failed to read station file: {}", args.input.display()))?;

    let spi = report::build_spi_report(&station.series, &spi_cfg)
        .with_context(|| format!("SPI analysis failed for station {}", station.code()))?;
    info!(
        code = %station.code(),
        n_months = spi.series.len(),
        "SPI computed"
    );

    let output = SpiOutput {
        station: StationInfo::from(&station),
        spi,
    };
    report::emit(&output, args.output.as_deref())
}
