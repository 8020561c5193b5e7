//! Calendar (year, month) key.

use chrono::{Datelike, NaiveDate};

use crate::error::SeriesError;

/// A calendar month in a specific year.
///
/// Ordering is chronological: by year, then by month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

impl YearMonth {
    /// Creates a new `YearMonth`.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::InvalidMonth`] if `month` is outside 1..=12.
    pub fn new(year: i32, month: u8) -> Result<Self, SeriesError> {
        if !(1..=12).contains(&month) {
            return Err(SeriesError::InvalidMonth { month });
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            // chrono guarantees 1..=12
            month: date.month() as u8,
        }
    }

    /// Returns the year.
    pub fn year(self) -> i32 {
        self.year
    }

    /// Returns the month (1..=12).
    pub fn month(self) -> u8 {
        self.month
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_valid() {
        let ym = YearMonth::new(2001, 7).unwrap();
        assert_eq!(ym.year(), 2001);
        assert_eq!(ym.month(), 7);
    }

    #[test]
    fn new_invalid_month() {
        assert_eq!(
            YearMonth::new(2001, 0).unwrap_err(),
            SeriesError::InvalidMonth { month: 0 }
        );
        assert!(YearMonth::new(2001, 13).is_err());
    }

    #[test]
    fn from_date() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(YearMonth::from_date(date), YearMonth::new(1999, 12).unwrap());
    }

    #[test]
    fn chronological_order() {
        let a = YearMonth::new(2000, 12).unwrap();
        let b = YearMonth::new(2001, 1).unwrap();
        let c = YearMonth::new(2001, 2).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn display() {
        assert_eq!(YearMonth::new(2003, 4).unwrap().to_string(), "2003-04");
    }
}
