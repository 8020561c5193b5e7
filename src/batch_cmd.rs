//! Batch command: every station in a directory, processed in parallel.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use pluvio_io::read_station_dir;

use crate::cache::{self, ResultCache};
use crate::cli::BatchArgs;
use crate::config::PluvioConfig;
use crate::convert;
use crate::report::{self, BatchSummary, StationAnalysis, StationReport};

/// Name of the batch summary written next to the station reports.
pub const SUMMARY_FILE: &str = "summary.json";

/// Analyses kept from the previous run, in the output directory.
pub const CACHE_FILE: &str = ".pluvio-cache.json";

/// Run IDF and SPI for every station file in `args.input_dir`.
///
/// Unless `args.no_cache` is set, a station whose cleaned series and
/// analysis settings match the previous run reuses its stored analysis.
pub fn run(args: BatchArgs, config: &PluvioConfig) -> Result<()> {
    let _cmd = info_span!("batch").entered();
    let idf_cfg = convert::build_idf_config(&config.idf)?;
    let spi_cfg = convert::build_spi_config(&config.spi)?;
    let include_table = config.batch.include_table;

    let scan = read_station_dir(&args.input_dir).with_context(|| {
        format!("failed to scan station directory: {}", args.input_dir.display())
    })?;
    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory: {}", args.output_dir.display())
    })?;

    let threads = args.threads.or(config.batch.threads).unwrap_or(0);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("failed to build worker pool")?;

    let settings = cache::settings_fingerprint(&(&idf_cfg, &spi_cfg, include_table));
    let cache_path = args.output_dir.join(CACHE_FILE);
    let cache: ResultCache<StationAnalysis> = if args.no_cache {
        ResultCache::new(settings)
    } else {
        ResultCache::load(&cache_path, settings)
    };

    let reports: BTreeMap<String, StationReport> = pool.install(|| {
        scan.stations
            .par_iter()
            .map(|station| {
                let analysis = cache.get_or_compute(station.code(), &station.series, || {
                    report::analyze_station(station, &idf_cfg, &spi_cfg, include_table)
                });
                let report = StationReport::new(station, analysis.as_ref().clone());
                (station.code().to_string(), report)
            })
            .collect()
    });

    for (code, station_report) in &reports {
        let path = station_report_path(&args.output_dir, code);
        report::emit(station_report, Some(path.as_path()))?;
    }

    if !args.no_cache {
        if let Err(e) = cache.save(&cache_path) {
            warn!(error = %format!("{e:#}"), "result cache not saved");
        }
    }

    let mut summary = BatchSummary::new(&reports, &scan.skipped);
    summary.n_reused = cache.hits();
    let summary_path = args.output_dir.join(SUMMARY_FILE);
    report::emit(&summary, Some(summary_path.as_path()))?;
    info!(
        n_stations = summary.n_stations,
        n_reused = summary.n_reused,
        n_cached = cache.len(),
        n_skipped = summary.skipped.len(),
        n_spi_failures = summary.spi_failures.len(),
        output_dir = %args.output_dir.display(),
        "batch complete"
    );
    Ok(())
}

/// `<code>.json` with path separators in the code replaced.
fn station_report_path(dir: &Path, code: &str) -> PathBuf {
    let safe: String = code
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    dir.join(format!("{safe}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn station_text(code: &str, values: &[&str]) -> String {
        let mut s = format!(
            "Nome: {code}\nCodigo Estacao: {code}\nLatitude: -1\nLongitude: -1\nAltitude: 1\n\
             Situacao: Operante\nData Inicial: 2000-01-01\nData Final: 2000-12-31\n\
             Periodicidade da Medicao: Diaria\nData Medicao;PRECIPITACAO TOTAL, DIARIO(mm);\n"
        );
        for (i, v) in values.iter().enumerate() {
            s.push_str(&format!("2000-01-{:02};{v};\n", i + 1));
        }
        s
    }

    #[test]
    fn report_path_sanitises_code() {
        let p = station_report_path(Path::new("/out"), "A/01");
        assert_eq!(p, PathBuf::from("/out/A_01.json"));
    }

    #[test]
    fn batch_writes_reports_and_summary() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("wet.csv"),
            station_text("W1", &["3,2", "0", "10", "1"]),
        )
        .unwrap();
        fs::write(input.path().join("dry.csv"), station_text("D1", &["0", "0"])).unwrap();
        fs::write(input.path().join("bad.csv"), "Nome: only one line\n").unwrap();

        let args = BatchArgs {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().join("reports"),
            threads: Some(2),
            no_cache: false,
        };
        run(args, &PluvioConfig::default()).unwrap();

        let out = output.path().join("reports");
        assert!(out.join("W1.json").is_file());
        assert!(out.join("D1.json").is_file());

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["n_stations"], 2);
        assert_eq!(summary["skipped"].as_array().unwrap().len(), 1);
        let spi_failures = summary["spi_failures"].as_array().unwrap();
        assert_eq!(spi_failures.len(), 1);
        assert_eq!(spi_failures[0]["code"], "D1");
        assert_eq!(summary["n_reused"], 0);
        assert!(out.join(CACHE_FILE).is_file());
    }

    fn read_summary(dir: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap()
    }

    fn batch_args(input: &Path, output: &Path, no_cache: bool) -> BatchArgs {
        BatchArgs {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            threads: Some(1),
            no_cache,
        }
    }

    #[test]
    fn rerun_reuses_unchanged_stations() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.csv"), station_text("A1", &["1", "4", "0"])).unwrap();
        fs::write(input.path().join("b.csv"), station_text("B1", &["2", "0", "7"])).unwrap();

        run(batch_args(input.path(), output.path(), false), &PluvioConfig::default()).unwrap();
        assert_eq!(read_summary(output.path())["n_reused"], 0);

        run(batch_args(input.path(), output.path(), false), &PluvioConfig::default()).unwrap();
        assert_eq!(read_summary(output.path())["n_reused"], 2);

        // Editing one station's data invalidates only that station.
        fs::write(input.path().join("b.csv"), station_text("B1", &["2", "0", "9"])).unwrap();
        run(batch_args(input.path(), output.path(), false), &PluvioConfig::default()).unwrap();
        let summary = read_summary(output.path());
        assert_eq!(summary["n_reused"], 1);
        assert_eq!(summary["n_stations"], 2);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.path().join("A1.json")).unwrap())
                .unwrap();
        assert_eq!(report["station"]["code"], "A1");
        assert!(report["idf"].is_object());
    }

    #[test]
    fn changed_settings_or_no_cache_recompute() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.csv"), station_text("A1", &["1", "4", "0"])).unwrap();

        run(batch_args(input.path(), output.path(), false), &PluvioConfig::default()).unwrap();

        let mut config = PluvioConfig::default();
        config.batch.include_table = false;
        run(batch_args(input.path(), output.path(), false), &config).unwrap();
        assert_eq!(read_summary(output.path())["n_reused"], 0);

        run(batch_args(input.path(), output.path(), true), &config).unwrap();
        assert_eq!(read_summary(output.path())["n_reused"], 0);
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let output = tempfile::tempdir().unwrap();
        let args = BatchArgs {
            input_dir: PathBuf::from("/tmp/pluvio_batch_missing_input"),
            output_dir: output.path().to_path_buf(),
            threads: None,
            no_cache: false,
        };
        let err = run(args, &PluvioConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to scan station directory"));
    }
}
