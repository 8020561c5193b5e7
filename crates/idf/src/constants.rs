//! Fixed return periods, durations and disaggregation ratios.
//!
//! These tables define the shape of every output in this crate: quantiles
//! follow [`RETURN_PERIODS`] order and intensity tables follow
//! [`RETURN_PERIODS`] × [`DURATIONS_MIN`] order.

/// Number of return periods.
pub const N_RETURN_PERIODS: usize = 11;

/// Number of durations.
pub const N_DURATIONS: usize = 13;

/// Return periods in years, ascending.
pub const RETURN_PERIODS: [u32; N_RETURN_PERIODS] = [2, 5, 10, 15, 20, 25, 50, 100, 250, 500, 1000];

/// Durations in minutes, descending from one day to five minutes.
pub const DURATIONS_MIN: [u32; N_DURATIONS] = [1440, 720, 600, 480, 360, 180, 60, 30, 25, 20, 15, 10, 5];

/// Ratio between the 24-hour depth and the 1-day (fixed observation window)
/// depth.
pub const ONE_DAY_TO_24H: f64 = 1.14;

/// One step of the disaggregation cascade.
///
/// `depth(DURATIONS_MIN[i + 1]) = depth(DURATIONS_MIN[base]) * factor` for
/// the `i`-th entry of [`CASCADE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeStep {
    /// Target duration in minutes.
    pub duration_min: u32,
    /// Index into [`DURATIONS_MIN`] of the depth this step scales.
    pub base: usize,
    /// Multiplier applied to the base depth.
    pub factor: f64,
}

const fn step(duration_min: u32, base: usize, factor: f64) -> CascadeStep {
    CascadeStep {
        duration_min,
        base,
        factor,
    }
}

/// Cascade for every duration after 1440 min, in [`DURATIONS_MIN`] order.
///
/// 720..=60 min scale the 24-hour depth, 30 min scales the 1-hour depth,
/// and 25..=5 min scale the 30-minute depth.
pub const CASCADE: [CascadeStep; N_DURATIONS - 1] = [
    step(720, 0, 0.85),
    step(600, 0, 0.78),
    step(480, 0, 0.72),
    step(360, 0, 0.54),
    step(180, 0, 0.48),
    step(60, 0, 0.42),
    step(30, 6, 0.74),
    step(25, 7, 0.91),
    step(20, 7, 0.81),
    step(15, 7, 0.70),
    step(10, 7, 0.54),
    step(5, 7, 0.34),
];

/// Position of `tr` in [`RETURN_PERIODS`].
pub fn return_period_index(tr: u32) -> Option<usize> {
    RETURN_PERIODS.iter().position(|&t| t == tr)
}

/// Position of `td` in [`DURATIONS_MIN`].
pub fn duration_index(td: u32) -> Option<usize> {
    DURATIONS_MIN.iter().position(|&d| d == td)
}
