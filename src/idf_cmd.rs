//! IDF command: quantiles, intensity table and fitted curve for one station.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use pluvio_io::read_station;

use crate::cli::StationArgs;
use crate::config::PluvioConfig;
use crate::convert;
use crate::report::{self, IdfReport, StationInfo};

#[derive(Serialize)]
struct IdfOutput {
    station: StationInfo,
    idf: IdfReport,
}

/// Run the single-station IDF analysis.
pub fn run(args: StationArgs, config: &PluvioConfig) -> Result<()> {
    let _cmd = info_span!("idf").entered();
    let idf_cfg = convert::build_idf_config(&config.idf)?;

    info!(path = %args.input.display(), "reading station");
    let station = read_station(&args.input)
        .with_context(|| format!("failed to read station file: {}", args.input.display()))?;
    info!(code = %station.code(), n_days = station.series.len(), "station loaded");

    let idf = report::build_idf_report(&station.series, &idf_cfg, true)
        .with_context(|| format!("IDF analysis failed for station {}", station.code()))?;
    info!(status = %idf.fit_status, evaluations = idf.evaluations, "IDF fit finished");

    let output = IdfOutput {
        station: StationInfo::from(&station),
        idf,
    };
    report::emit(&output, args.output.as_deref())
}
