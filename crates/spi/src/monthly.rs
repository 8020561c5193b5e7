//! Aggregation of a daily series into calendar-month totals.

use std::collections::BTreeMap;

use pluvio_series::{DailySeries, YearMonth};

/// Monthly precipitation totals keyed by year-month, in chronological order.
///
/// Only months holding at least one valid daily record appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyPrecipitation {
    totals: BTreeMap<YearMonth, f64>,
}

impl MonthlyPrecipitation {
    /// Wraps totals already keyed by year-month.
    pub fn from_totals(totals: BTreeMap<YearMonth, f64>) -> Self {
        Self { totals }
    }

    /// Returns the number of months holding a total.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Returns `true` when no month holds a total.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Returns the total for `ym`, if that month has one.
    pub fn get(&self, ym: YearMonth) -> Option<f64> {
        self.totals.get(&ym).copied()
    }

    /// Chronological `(year-month, total)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, f64)> + '_ {
        self.totals.iter().map(|(&ym, &v)| (ym, v))
    }

    /// All occurrences of one calendar month across years, chronologically.
    pub fn occurrences(&self, month: u8) -> Vec<(YearMonth, f64)> {
        self.iter().filter(|(ym, _)| ym.month() == month).collect()
    }
}

/// Sums daily values into monthly totals.
pub fn aggregate_monthly(series: &DailySeries) -> MonthlyPrecipitation {
    MonthlyPrecipitation::from_totals(series.monthly_totals())
}
