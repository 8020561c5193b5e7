//! Raw daily precipitation record.

use chrono::NaiveDate;

/// One day of station data as delivered by ingestion.
///
/// `precipitation_mm` is `None` when the source value was empty or not a
/// number. Non-finite values are treated as missing by [`crate::DailySeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    /// Observation date.
    pub date: NaiveDate,
    /// Daily precipitation total in millimetres.
    pub precipitation_mm: Option<f64>,
}

impl DailyRecord {
    /// Creates a record with a known precipitation value.
    pub fn new(date: NaiveDate, precipitation_mm: f64) -> Self {
        Self {
            date,
            precipitation_mm: Some(precipitation_mm),
        }
    }

    /// Creates a record whose precipitation value is missing.
    pub fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            precipitation_mm: None,
        }
    }

    /// Returns the precipitation value if it is present and finite.
    pub fn valid_precipitation(&self) -> Option<f64> {
        self.precipitation_mm.filter(|p| p.is_finite())
    }
}
