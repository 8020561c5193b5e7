//! Station archive parsing.
//!
//! A station file starts with a fixed block of `key: value` metadata lines
//! followed by a `;`-delimited daily table with its own header row:
//!
//! ```text
//! Nome: BRASILIA
//! Codigo Estacao: A001
//! Latitude: -15.78
//! Longitude: -47.93
//! Altitude: 1159.54
//! Situacao: Operante
//! Data Inicial: 2000-01-01
//! Data Final: 2020-12-31
//! Periodicidade da Medicao: Diaria
//! Data Medicao;PRECIPITACAO TOTAL, DIARIO(mm);
//! 2000-01-01;12,4;
//! 2000-01-02;null;
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use chrono::NaiveDate;
use pluvio_series::{DailyRecord, DailySeries};
use tracing::debug;

use crate::error::IoError;
use crate::validate::{ValidationCollector, header_number, parse_decimal, validate_coordinates};

/// Number of metadata lines before the daily table.
pub const HEADER_LINES: usize = 9;

const NAME_KEYS: &[&str] = &["nome", "name"];
const CODE_KEYS: &[&str] = &["codigo_estacao", "code", "station_code"];
const STATUS_KEYS: &[&str] = &["situacao", "status"];
const START_KEYS: &[&str] = &["data_inicial", "start_date"];
const END_KEYS: &[&str] = &["data_final", "end_date"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Descriptive metadata from a station file header.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMetadata {
    pub name: String,
    /// Station identifier; falls back to the file stem when the header has none.
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A parsed station: metadata plus its cleaned daily precipitation.
#[derive(Debug, Clone)]
pub struct Station {
    pub metadata: StationMetadata,
    pub series: DailySeries,
    /// Table rows read, including those later dropped.
    pub n_rows: usize,
    /// Rows dropped because the date could not be parsed.
    pub n_bad_dates: usize,
}

impl Station {
    pub fn code(&self) -> &str {
        &self.metadata.code
    }
}

/// Parse a station file from any buffered reader.
///
/// `source` labels the input in errors and supplies the fallback station
/// code (its file stem).
///
/// # Errors
///
/// - [`IoError::Header`] if fewer than [`HEADER_LINES`] lines exist or none
///   holds a `key: value` pair.
/// - [`IoError::Validation`] if numeric header fields are malformed or the
///   coordinates are off the globe.
/// - [`IoError::Table`] if the table header is missing or no data row follows.
/// - [`IoError::Read`] on an underlying read failure.
pub fn parse_station<R: BufRead>(reader: R, source: &str) -> Result<Station, IoError> {
    let mut lines = reader.lines();

    let mut header = Vec::with_capacity(HEADER_LINES);
    while header.len() < HEADER_LINES {
        match lines.next() {
            Some(line) => header.push(line.map_err(|e| IoError::read(source, &e))?),
            None => {
                return Err(IoError::Header {
                    file: source.to_string(),
                    reason: format!(
                        "expected {HEADER_LINES} header lines, found {}",
                        header.len()
                    ),
                });
            }
        }
    }

    let fields = header_fields(&header);
    if fields.is_empty() {
        return Err(IoError::Header {
            file: source.to_string(),
            reason: "no `key: value` pairs".to_string(),
        });
    }
    let metadata = metadata_from_fields(&fields, source)?;

    let mut columns: Option<Vec<String>> = None;
    let mut records = Vec::new();
    let mut n_rows = 0usize;
    let mut n_bad_dates = 0usize;
    let mut precip_col = 1usize;

    for line in lines {
        let line = line.map_err(|e| IoError::read(source, &e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(';').map(str::trim).collect();

        if columns.is_none() {
            let names: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
            precip_col = precipitation_column(&names).ok_or_else(|| IoError::Table {
                file: source.to_string(),
                reason: format!("table header has no precipitation column: {line:?}"),
            })?;
            columns = Some(names);
            continue;
        }

        n_rows += 1;
        let Some(date) = parse_date(cells[0]) else {
            n_bad_dates += 1;
            continue;
        };
        let value = cells.get(precip_col).and_then(|c| parse_precipitation(c));
        records.push(DailyRecord {
            date,
            precipitation_mm: value,
        });
    }

    if columns.is_none() {
        return Err(IoError::Table {
            file: source.to_string(),
            reason: "missing table header".to_string(),
        });
    }
    if n_rows == 0 {
        return Err(IoError::Table {
            file: source.to_string(),
            reason: "no data rows".to_string(),
        });
    }

    let series = DailySeries::from_records(records);
    let report = series.report();
    debug!(
        source,
        code = %metadata.code,
        n_rows,
        n_bad_dates,
        n_missing = report.n_missing,
        n_duplicate = report.n_duplicate,
        n_kept = report.n_kept(),
        "parsed station"
    );

    Ok(Station {
        metadata,
        series,
        n_rows,
        n_bad_dates,
    })
}

/// `key: value` pairs with keys lower-cased and spaces replaced by `_`.
fn header_fields(lines: &[String]) -> HashMap<String, String> {
    lines
        .iter()
        .filter_map(|line| line.trim().split_once(':'))
        .map(|(k, v)| {
            (
                k.trim().to_lowercase().replace(' ', "_"),
                v.trim().to_string(),
            )
        })
        .collect()
}

fn lookup<'a>(fields: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| fields.get(*k).map(String::as_str))
}

fn metadata_from_fields(
    fields: &HashMap<String, String>,
    source: &str,
) -> Result<StationMetadata, IoError> {
    let mut c = ValidationCollector::new();
    let latitude = header_number(&mut c, "latitude", lookup(fields, &["latitude"]));
    let longitude = header_number(&mut c, "longitude", lookup(fields, &["longitude"]));
    let altitude = header_number(&mut c, "altitude", lookup(fields, &["altitude"]));
    validate_coordinates(&mut c, latitude, longitude);
    c.finish()?;

    let code = match lookup(fields, CODE_KEYS) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => file_stem(source),
    };

    Ok(StationMetadata {
        name: lookup(fields, NAME_KEYS).unwrap_or_default().to_string(),
        code,
        latitude,
        longitude,
        altitude,
        status: lookup(fields, STATUS_KEYS).unwrap_or_default().to_string(),
        start_date: lookup(fields, START_KEYS).and_then(parse_date),
        end_date: lookup(fields, END_KEYS).and_then(parse_date),
    })
}

fn file_stem(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

/// Index of the precipitation column: the first whose name mentions
/// precipitation, else the second column.
pub(crate) fn precipitation_column(columns: &[String]) -> Option<usize> {
    columns
        .iter()
        .position(|name| {
            let lower = name.to_lowercase();
            lower.contains("precip") || lower.contains("chuva") || lower.contains("rain")
        })
        .or_else(|| (columns.len() >= 2).then_some(1))
}

/// Dates are ISO `YYYY-MM-DD`, with a time-of-day suffix ignored.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split([' ', 'T']).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// Empty, `null`, non-numeric and negative values are missing.
pub(crate) fn parse_precipitation(raw: &str) -> Option<f64> {
    if raw.trim().eq_ignore_ascii_case("null") {
        return None;
    }
    parse_decimal(raw).filter(|v| *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
Nome: BRASILIA
Codigo Estacao: A001
Latitude: -15,78
Longitude: -47.93
Altitude: 1159.54
Situacao: Operante
Data Inicial: 2000-01-01
Data Final: 2000-01-31
Periodicidade da Medicao: Diaria
Data Medicao;PRECIPITACAO TOTAL, DIARIO(mm);TEMPERATURA MEDIA(C);
2000-01-01;12,4;22,1;
2000-01-02;null;21,0;
2000-01-03;0;20,5;
not-a-date;5;20,0;
2000-01-03;9;20,0;
2000-01-04;;19,0;
";

    #[test]
    fn parses_header_and_table() {
        let st = parse_station(SAMPLE.as_bytes(), "A001.csv").unwrap();
        let m = &st.metadata;
        assert_eq!(m.name, "BRASILIA");
        assert_eq!(m.code, "A001");
        assert_relative_eq!(m.latitude, -15.78);
        assert_relative_eq!(m.altitude, 1159.54);
        assert_eq!(m.status, "Operante");
        assert_eq!(m.start_date, NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(m.end_date, NaiveDate::from_ymd_opt(2000, 1, 31));

        assert_eq!(st.n_rows, 6);
        assert_eq!(st.n_bad_dates, 1);
        // 01 and 03 survive; 02 and 04 are missing; the second 03 is a duplicate.
        assert_eq!(st.series.len(), 2);
        assert_relative_eq!(st.series.precip()[0], 12.4);
        assert_relative_eq!(st.series.precip()[1], 0.0);
        assert_eq!(st.series.report().n_duplicate, 1);
    }

    #[test]
    fn code_falls_back_to_file_stem() {
        let text = SAMPLE.replace("Codigo Estacao: A001", "Comentario: none");
        let st = parse_station(text.as_bytes(), "/data/INMET_B123.csv").unwrap();
        assert_eq!(st.metadata.code, "INMET_B123");
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let text = SAMPLE.replace("Altitude: 1159.54", "Altitude:");
        let st = parse_station(text.as_bytes(), "a.csv").unwrap();
        assert_eq!(st.metadata.altitude, 0.0);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let text = SAMPLE.replace("Latitude: -15,78", "Latitude: south");
        let err = parse_station(text.as_bytes(), "a.csv").unwrap_err();
        assert!(matches!(err, IoError::Validation { count: 1, .. }), "{err:?}");
    }

    #[test]
    fn short_header_is_rejected() {
        let err = parse_station("Nome: X\nLatitude: 1\n".as_bytes(), "a.csv").unwrap_err();
        assert!(matches!(err, IoError::Header { .. }), "{err:?}");
    }

    #[test]
    fn header_without_pairs_is_rejected() {
        let text = "x\n".repeat(HEADER_LINES) + "Data;Precip\n2000-01-01;1\n";
        let err = parse_station(text.as_bytes(), "a.csv").unwrap_err();
        assert!(matches!(err, IoError::Header { .. }), "{err:?}");
    }

    #[test]
    fn table_without_rows_is_rejected() {
        let text: String = SAMPLE.lines().take(HEADER_LINES + 1).collect::<Vec<_>>().join("\n");
        let err = parse_station(text.as_bytes(), "a.csv").unwrap_err();
        assert!(matches!(err, IoError::Table { .. }), "{err:?}");
    }

    #[test]
    fn unnamed_column_falls_back_to_second() {
        let cols: Vec<String> = ["Data", "Valor", ""].iter().map(|s| s.to_string()).collect();
        assert_eq!(precipitation_column(&cols), Some(1));
        let cols: Vec<String> = ["Data", "Temp", "Chuva (mm)"].iter().map(|s| s.to_string()).collect();
        assert_eq!(precipitation_column(&cols), Some(2));
        assert_eq!(precipitation_column(&["Data".to_string()]), None);
    }

    #[test]
    fn date_formats() {
        let want = NaiveDate::from_ymd_opt(2001, 3, 9);
        assert_eq!(parse_date("2001-03-09"), want);
        assert_eq!(parse_date("09/03/2001"), want);
        assert_eq!(parse_date("2001-03-09 00:00"), want);
        assert_eq!(parse_date("2001-13-09"), None);
    }

    #[test]
    fn precipitation_values() {
        assert_eq!(parse_precipitation("3,5"), Some(3.5));
        assert_eq!(parse_precipitation("NULL"), None);
        assert_eq!(parse_precipitation(""), None);
        assert_eq!(parse_precipitation("-1"), None);
        assert_eq!(parse_precipitation("x"), None);
    }
}
