//! Sub-daily disaggregation of 1-day quantiles into an intensity table.

use crate::constants::{
    CASCADE, DURATIONS_MIN, N_DURATIONS, N_RETURN_PERIODS, ONE_DAY_TO_24H, RETURN_PERIODS,
};
use crate::error::IdfError;
use crate::gumbel::ReturnPeriodQuantiles;

/// One (return period, duration) cell of an intensity table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRow {
    /// Return period in years.
    pub return_period: f64,
    /// Duration in minutes.
    pub duration_min: f64,
    /// Precipitation depth over the duration (mm). NaN when not known.
    pub depth_mm: f64,
    /// Mean intensity over the duration (mm/h).
    pub intensity_mm_h: f64,
}

/// Long-form intensity table.
///
/// Tables built by [`disaggregate`] hold `11 × 13 = 143` rows ordered by
/// return period ([`RETURN_PERIODS`]) and, within each return period, by
/// duration ([`DURATIONS_MIN`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationIntensityTable {
    rows: Vec<IntensityRow>,
}

impl DurationIntensityTable {
    /// Wraps rows supplied by a caller.
    pub fn from_rows(rows: Vec<IntensityRow>) -> Self {
        Self { rows }
    }

    /// Builds a table from parallel columns. Depths are unknown (NaN).
    ///
    /// # Errors
    ///
    /// Returns [`IdfError::LengthMismatch`] if the columns differ in length.
    pub fn from_columns(
        return_periods: &[f64],
        durations_min: &[f64],
        intensities_mm_h: &[f64],
    ) -> Result<Self, IdfError> {
        if return_periods.len() != durations_min.len()
            || return_periods.len() != intensities_mm_h.len()
        {
            return Err(IdfError::LengthMismatch {
                return_periods_len: return_periods.len(),
                durations_len: durations_min.len(),
                intensities_len: intensities_mm_h.len(),
            });
        }

        let rows = return_periods
            .iter()
            .zip(durations_min)
            .zip(intensities_mm_h)
            .map(|((&tr, &td), &i)| IntensityRow {
                return_period: tr,
                duration_min: td,
                depth_mm: f64::NAN,
                intensity_mm_h: i,
            })
            .collect();

        Ok(Self { rows })
    }

    /// All rows in table order.
    pub fn rows(&self) -> &[IntensityRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Intensity for an exact (return period, duration) pair.
    pub fn intensity_at(&self, return_period: u32, duration_min: u32) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| {
                r.return_period == f64::from(return_period)
                    && r.duration_min == f64::from(duration_min)
            })
            .map(|r| r.intensity_mm_h)
    }

    /// Rows belonging to one return period, in table order.
    pub fn rows_for_return_period(&self, return_period: u32) -> Vec<IntensityRow> {
        self.rows
            .iter()
            .filter(|r| r.return_period == f64::from(return_period))
            .copied()
            .collect()
    }
}

/// Depths (mm) for every duration in [`DURATIONS_MIN`] from one 1-day depth.
pub(crate) fn cascade_depths(one_day_depth: f64) -> [f64; N_DURATIONS] {
    let mut depths = [0.0; N_DURATIONS];
    depths[0] = one_day_depth * ONE_DAY_TO_24H;
    for (i, step) in CASCADE.iter().enumerate() {
        depths[i + 1] = depths[step.base] * step.factor;
    }
    depths
}

/// Expands 1-day return-period depths into the 143-row intensity table.
///
/// Each depth is converted to intensity by dividing by the duration in
/// hours. Sentinel (NaN) quantiles propagate to NaN rows, which the fitter
/// discards.
pub fn disaggregate(quantiles: &ReturnPeriodQuantiles) -> DurationIntensityTable {
    let mut rows = Vec::with_capacity(N_RETURN_PERIODS * N_DURATIONS);

    for (tr, one_day) in quantiles.iter() {
        let depths = cascade_depths(one_day);
        for (&td, &depth) in DURATIONS_MIN.iter().zip(depths.iter()) {
            let hours = f64::from(td) / 60.0;
            rows.push(IntensityRow {
                return_period: f64::from(tr),
                duration_min: f64::from(td),
                depth_mm: depth,
                intensity_mm_h: depth / hours,
            });
        }
    }

    debug_assert_eq!(rows.len(), RETURN_PERIODS.len() * DURATIONS_MIN.len());
    DurationIntensityTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cascade_from_100mm() {
        let d = cascade_depths(100.0);
        assert_relative_eq!(d[0], 114.0, epsilon = 1e-10);
        assert_relative_eq!(d[1], 114.0 * 0.85, epsilon = 1e-10);
        assert_relative_eq!(d[6], 47.88, epsilon = 1e-10);
        assert_relative_eq!(d[7], 47.88 * 0.74, epsilon = 1e-10);
        assert_relative_eq!(d[12], 47.88 * 0.74 * 0.34, epsilon = 1e-10);
    }

    #[test]
    fn table_shape_and_order() {
        let q = ReturnPeriodQuantiles::from_moments(80.0, 20.0);
        let table = disaggregate(&q);
        assert_eq!(table.len(), 143);

        let first = table.rows()[0];
        assert_eq!(first.return_period, 2.0);
        assert_eq!(first.duration_min, 1440.0);
        let second = table.rows()[1];
        assert_eq!(second.return_period, 2.0);
        assert_eq!(second.duration_min, 720.0);
        let last = table.rows()[142];
        assert_eq!(last.return_period, 1000.0);
        assert_eq!(last.duration_min, 5.0);
    }

    #[test]
    fn intensity_from_100mm_quantile() {
        let q = ReturnPeriodQuantiles::from_depths(&[100.0; 11]).unwrap();
        let table = disaggregate(&q);
        assert_relative_eq!(table.intensity_at(10, 1440).unwrap(), 4.75, epsilon = 1e-10);
        assert_relative_eq!(table.intensity_at(10, 60).unwrap(), 47.88, epsilon = 1e-10);
        // 30 min: 47.88 * 0.74 over half an hour
        assert_relative_eq!(
            table.intensity_at(10, 30).unwrap(),
            47.88 * 0.74 * 2.0,
            epsilon = 1e-10
        );
        assert!(table.intensity_at(3, 60).is_none());
    }

    #[test]
    fn one_day_depth_is_scaled_quantile() {
        let q = ReturnPeriodQuantiles::from_moments(55.0, 12.0);
        let table = disaggregate(&q);
        for (tr, depth) in q.iter() {
            let rows = table.rows_for_return_period(tr);
            assert_eq!(rows.len(), 13);
            assert_relative_eq!(rows[0].depth_mm, depth * 1.14, epsilon = 1e-10);
        }
    }

    #[test]
    fn nan_quantiles_propagate() {
        let q = ReturnPeriodQuantiles::from_moments(10.0, f64::NAN);
        let table = disaggregate(&q);
        assert_eq!(table.len(), 143);
        assert!(table.rows().iter().all(|r| r.intensity_mm_h.is_nan()));
    }

    #[test]
    fn from_columns_length_mismatch() {
        let err = DurationIntensityTable::from_columns(&[2.0], &[60.0, 30.0], &[1.0]).unwrap_err();
        assert!(matches!(err, IdfError::LengthMismatch { .. }));
    }
}
