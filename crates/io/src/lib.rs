//! # pluvio-io
//!
//! Read weather-station archives: a fixed block of `key: value` metadata
//! lines followed by a `;`-delimited daily table. Produces cleaned
//! [`DailySeries`](pluvio_series::DailySeries) values for the IDF and SPI
//! crates.

mod error;
mod reader;
mod station;
mod validate;

pub use error::IoError;
pub use reader::{SkippedFile, StationScan, read_station, read_station_dir};
pub use station::{HEADER_LINES, Station, StationMetadata, parse_station};
