//! Cleaned daily precipitation series.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::record::DailyRecord;
use crate::year_month::YearMonth;

/// Counts of what [`DailySeries::from_records`] discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    /// Number of records supplied.
    pub n_input: usize,
    /// Records dropped because precipitation was missing or non-finite.
    pub n_missing: usize,
    /// Records dropped because their date had already been seen.
    pub n_duplicate: usize,
}

impl CleaningReport {
    /// Number of records that survived cleaning.
    pub fn n_kept(&self) -> usize {
        self.n_input - self.n_missing - self.n_duplicate
    }
}

/// A date-ordered daily precipitation series with no missing values and
/// no repeated dates.
///
/// Dates need not be contiguous; gaps are simply absent days.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    dates: Vec<NaiveDate>,
    precip: Vec<f64>,
    report: CleaningReport,
}

impl DailySeries {
    /// Builds a series from raw records.
    ///
    /// Records are sorted by date (stable, so input order breaks ties),
    /// records with missing or non-finite precipitation are dropped, and
    /// for each date only the first remaining record is kept.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DailyRecord>,
    {
        let mut records: Vec<DailyRecord> = records.into_iter().collect();
        records.sort_by_key(|r| r.date);

        let mut report = CleaningReport {
            n_input: records.len(),
            ..CleaningReport::default()
        };
        let mut dates = Vec::with_capacity(records.len());
        let mut precip = Vec::with_capacity(records.len());

        for record in &records {
            let Some(value) = record.valid_precipitation() else {
                report.n_missing += 1;
                continue;
            };
            if dates.last() == Some(&record.date) {
                report.n_duplicate += 1;
                continue;
            }
            dates.push(record.date);
            precip.push(value);
        }

        Self {
            dates,
            precip,
            report,
        }
    }

    /// Builds a series from parallel date and value slices.
    ///
    /// Equivalent to [`from_records`](Self::from_records) on the zipped
    /// pairs; extra elements in the longer slice are ignored.
    pub fn from_values(dates: &[NaiveDate], precip: &[f64]) -> Self {
        Self::from_records(
            dates
                .iter()
                .zip(precip.iter())
                .map(|(&date, &p)| DailyRecord::new(date, p)),
        )
    }

    /// Number of valid days.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns `true` if no valid day survived cleaning.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observation dates in ascending order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Precipitation values (mm), aligned with [`dates`](Self::dates).
    pub fn precip(&self) -> &[f64] {
        &self.precip
    }

    /// What was discarded while building the series.
    pub fn report(&self) -> CleaningReport {
        self.report
    }

    /// Iterates `(date, precipitation)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.precip.iter().copied())
    }

    /// Returns `true` if any day recorded strictly positive precipitation.
    pub fn has_positive(&self) -> bool {
        self.precip.iter().any(|&p| p > 0.0)
    }

    /// Distinct calendar years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.dates.iter().map(|d| d.year()).collect();
        years.dedup();
        years
    }

    /// Largest daily value in each calendar year.
    pub fn annual_maxima(&self) -> BTreeMap<i32, f64> {
        let mut maxima: BTreeMap<i32, f64> = BTreeMap::new();
        for (date, p) in self.iter() {
            maxima
                .entry(date.year())
                .and_modify(|m| *m = m.max(p))
                .or_insert(p);
        }
        maxima
    }

    /// Sum of daily values in each (year, month) present in the series.
    pub fn monthly_totals(&self) -> BTreeMap<YearMonth, f64> {
        let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
        for (date, p) in self.iter() {
            *totals.entry(YearMonth::from_date(date)).or_insert(0.0) += p;
        }
        totals
    }
}
