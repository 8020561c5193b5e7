//! JSON report structures and their assembly from analysis results.
//!
//! Unavailable numbers (NaN sentinels) serialize as `null`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use pluvio_idf::{
    AnnualMaxima, DurationIntensityTable, IdfError, IdfFitConfig, IdfParameters, constants,
    disaggregate, estimate_quantiles, fit_idf_with,
};
use pluvio_io::{SkippedFile, Station};
use pluvio_series::DailySeries;
use pluvio_spi::{SpiConfig, SpiError, compute_spi};

/// `None` for NaN or infinite values.
pub fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StationInfo {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub n_rows: usize,
    pub n_days: usize,
    pub n_missing: usize,
    pub n_duplicate: usize,
    pub n_bad_dates: usize,
}

impl From<&Station> for StationInfo {
    fn from(st: &Station) -> Self {
        let m = &st.metadata;
        let report = st.series.report();
        Self {
            code: m.code.clone(),
            name: m.name.clone(),
            latitude: m.latitude,
            longitude: m.longitude,
            altitude: m.altitude,
            status: m.status.clone(),
            start_date: m.start_date.map(|d| d.to_string()),
            end_date: m.end_date.map(|d| d.to_string()),
            n_rows: st.n_rows,
            n_days: st.series.len(),
            n_missing: report.n_missing,
            n_duplicate: report.n_duplicate,
            n_bad_dates: st.n_bad_dates,
        }
    }
}

// ---------------------------------------------------------------------------
// IDF
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualMaxEntry {
    pub year: i32,
    pub max_mm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantileEntry {
    pub return_period: u32,
    pub depth_mm: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParametersOut {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub d: Option<f64>,
}

impl From<IdfParameters> for ParametersOut {
    fn from(p: IdfParameters) -> Self {
        Self {
            a: finite(p.a()),
            b: finite(p.b()),
            c: finite(p.c()),
            d: finite(p.d()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RSquaredEntry {
    pub return_period: u32,
    pub r_squared: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRowOut {
    pub return_period: f64,
    pub duration_min: f64,
    pub depth_mm: Option<f64>,
    pub intensity_mm_h: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdfReport {
    pub n_years: usize,
    pub annual_maxima: Vec<AnnualMaxEntry>,
    pub annual_max_mean: Option<f64>,
    pub annual_max_sd: Option<f64>,
    pub quantiles: Vec<QuantileEntry>,
    pub parameters: ParametersOut,
    pub fit_status: String,
    pub evaluations: usize,
    pub sum_squares: Option<f64>,
    pub r_squared: Vec<RSquaredEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<TableRowOut>>,
}

/// Coefficient of determination of the fitted curve within each return
/// period's rows of `table`. `None` where undefined.
pub fn r_squared_by_return_period(
    table: &DurationIntensityTable,
    params: IdfParameters,
) -> Vec<RSquaredEntry> {
    constants::RETURN_PERIODS
        .iter()
        .map(|&tr| {
            let rows = table.rows_for_return_period(tr);
            let observed: Vec<f64> = rows.iter().map(|r| r.intensity_mm_h).collect();
            let predicted: Vec<f64> = rows
                .iter()
                .map(|r| params.intensity(r.return_period, r.duration_min))
                .collect();
            let r_squared = if params.is_fitted() {
                pluvio_stats::r_squared(&observed, &predicted).and_then(finite)
            } else {
                None
            };
            RSquaredEntry {
                return_period: tr,
                r_squared,
            }
        })
        .collect()
}

/// Quantiles, intensity table and fitted IDF curve for one series.
///
/// # Errors
///
/// Propagates [`IdfError`] for an empty series or invalid configuration.
/// A failed fit is not an error; it shows as null parameters.
pub fn build_idf_report(
    series: &DailySeries,
    config: &IdfFitConfig,
    include_table: bool,
) -> Result<IdfReport, IdfError> {
    let maxima = AnnualMaxima::from_series(series);
    let quantiles = estimate_quantiles(series)?;
    let table = disaggregate(&quantiles);
    let fit = fit_idf_with(&table, config)?;

    let rows = include_table.then(|| {
        table
            .rows()
            .iter()
            .map(|r| TableRowOut {
                return_period: r.return_period,
                duration_min: r.duration_min,
                depth_mm: finite(r.depth_mm),
                intensity_mm_h: finite(r.intensity_mm_h),
            })
            .collect()
    });

    Ok(IdfReport {
        n_years: maxima.len(),
        annual_maxima: maxima
            .iter()
            .map(|(year, max_mm)| AnnualMaxEntry { year, max_mm })
            .collect(),
        annual_max_mean: finite(maxima.mean()),
        annual_max_sd: finite(maxima.sd()),
        quantiles: quantiles
            .iter()
            .map(|(return_period, depth)| QuantileEntry {
                return_period,
                depth_mm: finite(depth),
            })
            .collect(),
        parameters: fit.params().into(),
        fit_status: fit.status().as_str().to_string(),
        evaluations: fit.evaluations(),
        sum_squares: finite(fit.sum_squares()),
        r_squared: r_squared_by_return_period(&table, fit.params()),
        table: rows,
    })
}

// ---------------------------------------------------------------------------
// SPI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiEntry {
    pub year_month: String,
    pub total_mm: f64,
    pub spi: Option<f64>,
    pub class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthStatsOut {
    pub month: u8,
    pub n_occurrences: usize,
    pub mean_mm: Option<f64>,
    pub zero_probability: Option<f64>,
    pub shape: Option<f64>,
    pub scale: Option<f64>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiReport {
    pub series: Vec<SpiEntry>,
    pub monthly_stats: Vec<MonthStatsOut>,
    /// Months classed moderately dry or worse.
    pub n_dry_months: usize,
}

/// Monthly SPI series and the 12 calendar-month statistics.
///
/// # Errors
///
/// Propagates [`SpiError`] when the series is empty or has no rain.
pub fn build_spi_report(series: &DailySeries, config: &SpiConfig) -> Result<SpiReport, SpiError> {
    let result = compute_spi(series, config)?;
    let n_dry_months = result
        .series()
        .iter()
        .filter(|p| p.class().is_some_and(|c| c.is_dry()))
        .count();
    Ok(SpiReport {
        series: result
            .series()
            .iter()
            .map(|p| SpiEntry {
                year_month: p.year_month.to_string(),
                total_mm: p.total_mm,
                spi: finite(p.spi),
                class: p.class().map(|c| c.label().to_string()),
            })
            .collect(),
        monthly_stats: result
            .stats()
            .iter()
            .map(|s| MonthStatsOut {
                month: s.month,
                n_occurrences: s.n_occurrences,
                mean_mm: finite(s.mean_mm),
                zero_probability: finite(s.zero_probability),
                shape: finite(s.shape),
                scale: finite(s.scale),
                status: s.status.as_str().to_string(),
            })
            .collect(),
        n_dry_months,
    })
}

// ---------------------------------------------------------------------------
// Combined station report and batch summary
// ---------------------------------------------------------------------------

/// IDF and SPI results for one series. Depends only on the series and the
/// analysis settings, so it can be reused while both are unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationAnalysis {
    pub idf: Option<IdfReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idf_error: Option<String>,
    pub spi: Option<SpiReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spi_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    pub station: StationInfo,
    #[serde(flatten)]
    pub analysis: StationAnalysis,
}

impl StationReport {
    /// Pairs an analysis, possibly reused from the cache, with fresh station metadata.
    pub fn new(station: &Station, analysis: StationAnalysis) -> Self {
        Self {
            station: StationInfo::from(station),
            analysis,
        }
    }
}

/// Run both analyses; a failure in either is recorded, never raised.
pub fn analyze_station(
    station: &Station,
    idf_config: &IdfFitConfig,
    spi_config: &SpiConfig,
    include_table: bool,
) -> StationAnalysis {
    let (idf, idf_error) = match build_idf_report(&station.series, idf_config, include_table) {
        Ok(r) => (Some(r), None),
        Err(e) => {
            warn!(code = %station.code(), error = %e, "IDF analysis failed");
            (None, Some(e.to_string()))
        }
    };
    let (spi, spi_error) = match build_spi_report(&station.series, spi_config) {
        Ok(r) => (Some(r), None),
        Err(e) => {
            warn!(code = %station.code(), error = %e, "SPI analysis failed");
            (None, Some(e.to_string()))
        }
    };
    StationAnalysis {
        idf,
        idf_error,
        spi,
        spi_error,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryEntry {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub n_days: usize,
    pub fit_status: Option<String>,
    pub parameters: Option<ParametersOut>,
    pub spi_months_defined: Option<usize>,
    pub spi_dry_months: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedOut {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureOut {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub n_stations: usize,
    /// Stations whose analysis was reused from the result cache.
    pub n_reused: usize,
    pub stations: Vec<SummaryEntry>,
    pub skipped: Vec<SkippedOut>,
    pub idf_failures: Vec<FailureOut>,
    pub spi_failures: Vec<FailureOut>,
}

impl BatchSummary {
    /// Summarises every report and skipped file of one batch run.
    pub fn new(reports: &BTreeMap<String, StationReport>, skipped: &[SkippedFile]) -> Self {
        let stations = reports
            .values()
            .map(|r| (&r.station, &r.analysis))
            .map(|(station, r)| SummaryEntry {
                code: station.code.clone(),
                name: station.name.clone(),
                latitude: station.latitude,
                longitude: station.longitude,
                altitude: station.altitude,
                n_days: station.n_days,
                fit_status: r.idf.as_ref().map(|i| i.fit_status.clone()),
                parameters: r.idf.as_ref().map(|i| i.parameters),
                spi_months_defined: r
                    .spi
                    .as_ref()
                    .map(|s| s.series.iter().filter(|e| e.spi.is_some()).count()),
                spi_dry_months: r.spi.as_ref().map(|s| s.n_dry_months),
            })
            .collect();

        let failures = |pick: fn(&StationAnalysis) -> Option<&String>| -> Vec<FailureOut> {
            reports
                .iter()
                .filter_map(|(code, r)| {
                    pick(&r.analysis).map(|reason| FailureOut {
                        code: code.clone(),
                        reason: reason.clone(),
                    })
                })
                .collect()
        };

        Self {
            n_stations: reports.len(),
            n_reused: 0,
            stations,
            skipped: skipped
                .iter()
                .map(|s| SkippedOut {
                    path: s.path.display().to_string(),
                    reason: s.reason.clone(),
                })
                .collect(),
            idf_failures: failures(|r| r.idf_error.as_ref()),
            spi_failures: failures(|r| r.spi_error.as_ref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Serialize to pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize report")
}

/// Write JSON to `path`, or to stdout when `path` is `None`.
pub fn emit<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = to_json(value)?;
    match path {
        Some(p) => std::fs::write(p, json)
            .with_context(|| format!("failed to write report: {}", p.display())),
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{json}").context("failed to write report to stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pluvio_idf::{ReturnPeriodQuantiles, fit_idf};
    use pluvio_io::parse_station;
    use pluvio_series::NaiveDate;

    fn station_with_rain(n_years: i32) -> Station {
        let mut text = String::from(
            "Nome: TEST\nCodigo Estacao: T1\nLatitude: -10\nLongitude: -40\nAltitude: 5\n\
             Situacao: Operante\nData Inicial: 1990-01-01\nData Final: 2020-12-31\n\
             Periodicidade da Medicao: Diaria\nData Medicao;PRECIPITACAO TOTAL, DIARIO(mm);\n",
        );
        let start = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(1990 + n_years, 1, 1).unwrap();
        // Deterministic pseudo-rain with year-to-year variation in the peak.
        for (i, d) in start.iter_days().take_while(|d| *d < end).enumerate() {
            let amp = 1.0 + ((i / 365) % 4) as f64 * 0.25;
            let v = amp * ((i * 7919) % 97) as f64 * ((i % 5) as f64) / 4.0;
            text.push_str(&format!("{d};{v};\n"));
        }
        parse_station(text.as_bytes(), "T1.csv").unwrap()
    }

    #[test]
    fn finite_maps_nan_to_none() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
    }

    #[test]
    fn r_squared_perfect_for_exact_model() {
        let truth = IdfParameters::new(1000.0, 0.15, 10.0, 0.75);
        let mut tr = Vec::new();
        let mut td = Vec::new();
        let mut y = Vec::new();
        for &t in &constants::RETURN_PERIODS {
            for &d in &constants::DURATIONS_MIN {
                tr.push(f64::from(t));
                td.push(f64::from(d));
                y.push(truth.intensity(f64::from(t), f64::from(d)));
            }
        }
        let table = DurationIntensityTable::from_columns(&tr, &td, &y).unwrap();
        let r2 = r_squared_by_return_period(&table, truth);
        assert_eq!(r2.len(), 11);
        for e in &r2 {
            assert_relative_eq!(e.r_squared.unwrap(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn r_squared_null_for_sentinel() {
        let q = ReturnPeriodQuantiles::from_moments(80.0, 20.0);
        let table = disaggregate(&q);
        let r2 = r_squared_by_return_period(&table, IdfParameters::sentinel());
        assert!(r2.iter().all(|e| e.r_squared.is_none()));
        assert!(fit_idf(&table).is_converged());
    }

    #[test]
    fn station_report_serializes_nan_as_null() {
        let st = station_with_rain(1);
        let report = StationReport::new(
            &st,
            analyze_station(&st, &IdfFitConfig::new(), &SpiConfig::new(), false),
        );

        let idf = report.analysis.idf.as_ref().unwrap();
        assert_eq!(idf.n_years, 1);
        assert_eq!(idf.annual_maxima.len(), 1);
        assert_eq!(idf.annual_maxima[0].year, 1990);
        assert!(idf.annual_max_sd.is_none());
        assert_eq!(idf.fit_status, "insufficient_data");
        assert!(idf.table.is_none());

        let json = to_json(&report).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(v["idf"]["parameters"]["a"].is_null());
        assert!(v["idf"]["quantiles"][0]["depth_mm"].is_null());
        assert!(v.get("spi_error").is_none());
        assert_eq!(v["spi"]["monthly_stats"].as_array().unwrap().len(), 12);
        assert_eq!(v["station"]["code"], "T1");
    }

    #[test]
    fn analysis_survives_json_round_trip() {
        let st = station_with_rain(3);
        let analysis = analyze_station(&st, &IdfFitConfig::new(), &SpiConfig::new(), false);
        let json = to_json(&analysis).unwrap();
        let back: StationAnalysis = serde_json::from_str(&json).unwrap();

        let (idf, idf_back) = (analysis.idf.unwrap(), back.idf.unwrap());
        assert_eq!(idf_back.fit_status, idf.fit_status);
        assert_eq!(idf_back.quantiles.len(), 11);
        assert_relative_eq!(
            idf_back.quantiles[5].depth_mm.unwrap(),
            idf.quantiles[5].depth_mm.unwrap(),
            max_relative = 1e-12
        );
        assert!(back.idf_error.is_none());

        let (spi, spi_back) = (analysis.spi.unwrap(), back.spi.unwrap());
        assert_eq!(spi_back.series.len(), spi.series.len());
        assert_eq!(spi_back.monthly_stats[0].status, spi.monthly_stats[0].status);
        assert_eq!(spi_back.n_dry_months, spi.n_dry_months);
    }

    #[test]
    fn multi_year_station_fits() {
        let st = station_with_rain(12);
        let analysis = analyze_station(&st, &IdfFitConfig::new(), &SpiConfig::new(), true);
        let idf = analysis.idf.as_ref().unwrap();
        assert_eq!(idf.fit_status, "converged");
        assert_eq!(idf.table.as_ref().unwrap().len(), 143);
        assert!(idf.parameters.a.is_some());

        let spi = analysis.spi.as_ref().unwrap();
        assert!(spi.series.iter().any(|e| e.spi.is_some()));
        let dry = spi
            .series
            .iter()
            .filter(|e| matches!(e.class.as_deref(), Some(c) if c.contains("dry")))
            .count();
        assert_eq!(spi.n_dry_months, dry);
    }

    #[test]
    fn dry_station_records_spi_failure() {
        let text = "Nome: DRY\nCodigo Estacao: D1\nLatitude: 0\nLongitude: 0\nAltitude: 0\n\
                    Situacao: x\nData Inicial: 2000-01-01\nData Final: 2000-01-03\n\
                    Periodicidade da Medicao: Diaria\nData;Precipitacao\n\
                    2000-01-01;0\n2000-01-02;0\n2001-01-02;0\n";
        let st = parse_station(text.as_bytes(), "D1.csv").unwrap();
        let report = StationReport::new(
            &st,
            analyze_station(&st, &IdfFitConfig::new(), &SpiConfig::new(), false),
        );
        assert!(report.analysis.spi.is_none());
        assert_eq!(
            report.analysis.spi_error.as_deref(),
            Some("series contains no positive precipitation")
        );

        let mut reports = BTreeMap::new();
        reports.insert("D1".to_string(), report);
        let summary = BatchSummary::new(&reports, &[]);
        assert_eq!(summary.n_stations, 1);
        assert_eq!(summary.n_reused, 0);
        assert!(summary.stations[0].spi_dry_months.is_none());
        assert_eq!(summary.spi_failures.len(), 1);
        assert_eq!(summary.spi_failures[0].code, "D1");
    }
}
