//! File and directory entry points.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::IoError;
use crate::station::{Station, parse_station};

/// A file that [`read_station_dir`] could not use, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of scanning a directory of station files.
#[derive(Debug, Clone, Default)]
pub struct StationScan {
    /// Successfully parsed stations, in file-name order.
    pub stations: Vec<Station>,
    pub skipped: Vec<SkippedFile>,
}

/// Read one station file from disk.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if `path` does not exist, otherwise any
/// error from [`parse_station`].
pub fn read_station(path: &Path) -> Result<Station, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| IoError::read(path, &e))?;
    let label = path.to_string_lossy();
    parse_station(BufReader::new(file), &label)
}

/// Read every `.csv` file directly inside `dir`.
///
/// A file that fails to parse, or whose station code was already seen, is
/// logged and listed in [`StationScan::skipped`]; it never aborts the scan.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if `dir` is not a directory, or
/// [`IoError::Read`] if it cannot be listed.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn read_station_dir(dir: &Path) -> Result<StationScan, IoError> {
    if !dir.is_dir() {
        return Err(IoError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| IoError::read(dir, &e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_csv(p))
        .collect();
    paths.sort();

    let mut scan = StationScan::default();
    let mut seen_codes = HashSet::new();

    for path in paths {
        match read_station(&path) {
            Ok(station) => {
                if seen_codes.insert(station.code().to_string()) {
                    scan.stations.push(station);
                } else {
                    let reason = format!("duplicate station code {}", station.code());
                    warn!(path = %path.display(), %reason, "skipping station file");
                    scan.skipped.push(SkippedFile { path, reason });
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping station file");
                scan.skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        n_stations = scan.stations.len(),
        n_skipped = scan.skipped.len(),
        "station scan complete"
    );
    Ok(scan)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
