//! SPI output types.

use pluvio_series::YearMonth;

use crate::class::SpiClass;

/// Why a calendar month does or does not carry fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthStatus {
    /// Gamma parameters fitted; SPI defined for every occurrence.
    Fitted,
    /// Fewer occurrences than `min_occurrences`.
    InsufficientHistory,
    /// Every occurrence totals zero.
    AllZero,
    /// Fewer strictly positive totals than `min_positive`.
    TooFewPositive,
    /// The gamma fit or the normal transform failed.
    FitFailed,
    /// The calendar month never appears in the input.
    Absent,
}

impl MonthStatus {
    /// Returns `true` for [`MonthStatus::Fitted`].
    pub fn is_fitted(self) -> bool {
        self == Self::Fitted
    }

    /// Returns the snake_case name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fitted => "fitted",
            Self::InsufficientHistory => "insufficient_history",
            Self::AllZero => "all_zero",
            Self::TooFewPositive => "too_few_positive",
            Self::FitFailed => "fit_failed",
            Self::Absent => "absent",
        }
    }
}

/// Distribution summary for one calendar month, pooled across years.
///
/// Unavailable values are NaN: `mean_mm` and `zero_probability` when the
/// month is [`MonthStatus::Absent`], `shape` and `scale` unless it is
/// [`MonthStatus::Fitted`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyDistributionStats {
    pub month: u8,
    pub n_occurrences: usize,
    pub mean_mm: f64,
    pub zero_probability: f64,
    pub shape: f64,
    pub scale: f64,
    pub status: MonthStatus,
}

impl MonthlyDistributionStats {
    pub(crate) fn absent(month: u8) -> Self {
        Self {
            month,
            n_occurrences: 0,
            mean_mm: f64::NAN,
            zero_probability: f64::NAN,
            shape: f64::NAN,
            scale: f64::NAN,
            status: MonthStatus::Absent,
        }
    }
}

/// One month-year of the SPI series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiPoint {
    pub year_month: YearMonth,
    pub total_mm: f64,
    /// NaN when the calendar month could not be fitted.
    pub spi: f64,
}

impl SpiPoint {
    /// Returns the drought class, or `None` for an undefined SPI.
    pub fn class(&self) -> Option<SpiClass> {
        SpiClass::from_spi(self.spi)
    }
}

/// Result of [`compute_spi`](crate::compute_spi).
#[derive(Debug, Clone)]
pub struct SpiResult {
    series: Vec<SpiPoint>,
    stats: Vec<MonthlyDistributionStats>,
}

impl SpiResult {
    pub(crate) fn new(series: Vec<SpiPoint>, stats: Vec<MonthlyDistributionStats>) -> Self {
        debug_assert_eq!(stats.len(), 12);
        Self { series, stats }
    }

    /// Chronological SPI series, one point per month-year present in the input.
    pub fn series(&self) -> &[SpiPoint] {
        &self.series
    }

    /// Exactly 12 rows, January first.
    pub fn stats(&self) -> &[MonthlyDistributionStats] {
        &self.stats
    }

    /// Stats for a 1-indexed calendar month; `None` outside 1..=12.
    pub fn stats_for_month(&self, month: u8) -> Option<&MonthlyDistributionStats> {
        if !(1..=12).contains(&month) {
            return None;
        }
        self.stats.get(usize::from(month - 1))
    }

    /// Calendar months whose SPI is the sentinel.
    pub fn undefined_months(&self) -> Vec<u8> {
        self.stats
            .iter()
            .filter(|s| !s.status.is_fitted())
            .map(|s| s.month)
            .collect()
    }

    /// Number of points with a defined SPI value.
    pub fn n_defined(&self) -> usize {
        self.series.iter().filter(|p| !p.spi.is_nan()).count()
    }
}
