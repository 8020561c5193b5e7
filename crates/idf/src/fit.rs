//! IDF curve fitting: `I = a·Tr^b / (td + c)^d` by Levenberg-Marquardt.

use argmin::core::{Jacobian, Operator};
use tracing::{debug, warn};

use crate::config::IdfFitConfig;
use crate::disaggregate::DurationIntensityTable;
use crate::error::IdfError;
use crate::optimizer::{LmSettings, LmStatus, levenberg_marquardt};
use crate::params::IdfParameters;

/// How an IDF fit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// The optimizer reached a minimum with finite parameters.
    Converged,
    /// Fewer valid rows than [`IdfFitConfig::min_rows`]; no fit attempted.
    InsufficientData,
    /// The evaluation budget ran out before convergence.
    NotConverged,
    /// The optimizer produced non-finite parameters or cost.
    NonFinite,
}

impl FitStatus {
    /// Returns the snake_case name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::InsufficientData => "insufficient_data",
            Self::NotConverged => "not_converged",
            Self::NonFinite => "non_finite",
        }
    }
}

/// Outcome of [`fit_idf`].
///
/// On any status other than [`FitStatus::Converged`], [`params`](Self::params)
/// is [`IdfParameters::sentinel`] and [`sum_squares`](Self::sum_squares) is NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdfFit {
    params: IdfParameters,
    status: FitStatus,
    n_rows: usize,
    evaluations: usize,
    sum_squares: f64,
}

impl IdfFit {
    fn failed(status: FitStatus, n_rows: usize, evaluations: usize) -> Self {
        Self {
            params: IdfParameters::sentinel(),
            status,
            n_rows,
            evaluations,
            sum_squares: f64::NAN,
        }
    }

    /// Fitted coefficients, or the sentinel on failure.
    pub fn params(&self) -> IdfParameters {
        self.params
    }

    /// How the fit ended.
    pub fn status(&self) -> FitStatus {
        self.status
    }

    /// Returns `true` if the fit converged.
    pub fn is_converged(&self) -> bool {
        self.status == FitStatus::Converged
    }

    /// Number of valid rows the fit used.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Residual evaluations spent.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Sum of squared residuals at the solution.
    pub fn sum_squares(&self) -> f64 {
        self.sum_squares
    }
}

/// Residuals of the IDF model over `(Tr, td, I)` observations, with domain
/// guards so that no trial point yields a non-finite residual.
struct IdfProblem {
    obs: Vec<(f64, f64, f64)>,
    return_period_floor: f64,
    duration_floor: f64,
    penalty: f64,
}

impl IdfProblem {
    /// Returns `(Tr clamped, td + c unclamped, td + c clamped)`.
    fn guarded(&self, tr: f64, td: f64, c: f64) -> (f64, f64, f64) {
        let shifted = td + c;
        (
            tr.max(self.return_period_floor),
            shifted,
            shifted.max(self.duration_floor),
        )
    }
}

impl Operator for IdfProblem {
    type Param = [f64; 4];
    type Output = Vec<f64>;

    fn apply(&self, p: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let [a, b, c, d] = *p;
        Ok(self
            .obs
            .iter()
            .map(|&(tr, td, observed)| {
                let (t, _, s) = self.guarded(tr, td, c);
                let r = a * t.powf(b) / s.powf(d) - observed;
                if r.is_finite() { r } else { self.penalty }
            })
            .collect())
    }
}

impl Jacobian for IdfProblem {
    type Param = [f64; 4];
    type Jacobian = Vec<[f64; 4]>;

    fn jacobian(&self, p: &Self::Param) -> Result<Self::Jacobian, argmin::core::Error> {
        let [a, b, c, d] = *p;
        Ok(self
            .obs
            .iter()
            .map(|&(tr, td, _)| {
                let (t, shifted, s) = self.guarded(tr, td, c);
                let g = t.powf(b) / s.powf(d);
                let m = a * g;
                // The clamp flattens the model in c.
                let dc = if shifted > self.duration_floor {
                    -d * m / s
                } else {
                    0.0
                };
                let row = [g, m * t.ln(), dc, -m * s.ln()];
                if row.iter().all(|v| v.is_finite()) {
                    row
                } else {
                    [0.0; 4]
                }
            })
            .collect())
    }
}

/// Fits the IDF model to an intensity table with default settings.
///
/// Rows with a non-finite return period, duration or intensity are
/// dropped first. Never fails: degenerate input or a non-convergent fit
/// yields sentinel parameters and a non-converged [`FitStatus`].
pub fn fit_idf(table: &DurationIntensityTable) -> IdfFit {
    fit_validated(table, &IdfFitConfig::default())
}

/// Fits the IDF model with an explicit configuration.
///
/// # Errors
///
/// Returns [`IdfError::InvalidConfig`] if `config` fails validation. Fit
/// failures are reported through [`IdfFit::status`], not as errors.
pub fn fit_idf_with(
    table: &DurationIntensityTable,
    config: &IdfFitConfig,
) -> Result<IdfFit, IdfError> {
    config.validate()?;
    Ok(fit_validated(table, config))
}

#[tracing::instrument(skip_all, fields(n_rows = table.len()))]
fn fit_validated(table: &DurationIntensityTable, config: &IdfFitConfig) -> IdfFit {
    let obs: Vec<(f64, f64, f64)> = table
        .rows()
        .iter()
        .filter(|r| {
            r.return_period.is_finite() && r.duration_min.is_finite() && r.intensity_mm_h.is_finite()
        })
        .map(|r| (r.return_period, r.duration_min, r.intensity_mm_h))
        .collect();
    let n_rows = obs.len();

    if n_rows < config.min_rows() {
        warn!(
            n_valid = n_rows,
            min_rows = config.min_rows(),
            "too few valid intensity rows; IDF parameters unavailable"
        );
        return IdfFit::failed(FitStatus::InsufficientData, n_rows, 0);
    }

    let problem = IdfProblem {
        obs,
        return_period_floor: config.return_period_floor(),
        duration_floor: config.duration_floor(),
        penalty: config.penalty(),
    };
    let settings = LmSettings {
        max_evaluations: config.max_evaluations(),
        initial_damping: config.initial_damping(),
        ftol: config.ftol(),
        xtol: config.xtol(),
    };

    let outcome = levenberg_marquardt(problem, config.initial_guess(), &settings);

    let finite = outcome.cost.is_finite() && outcome.params.iter().all(|v| v.is_finite());
    let status = match outcome.status {
        _ if !finite => FitStatus::NonFinite,
        LmStatus::NonFinite => FitStatus::NonFinite,
        LmStatus::MaxEvaluations => FitStatus::NotConverged,
        s if s.is_success() => FitStatus::Converged,
        _ => FitStatus::NotConverged,
    };

    if status != FitStatus::Converged {
        warn!(
            ?status,
            evaluations = outcome.evaluations,
            "IDF fit failed; parameters unavailable"
        );
        return IdfFit::failed(status, n_rows, outcome.evaluations);
    }

    let params = IdfParameters::from_array(outcome.params);
    debug!(
        a = params.a(),
        b = params.b(),
        c = params.c(),
        d = params.d(),
        evaluations = outcome.evaluations,
        sum_squares = outcome.cost,
        "IDF fit converged"
    );

    IdfFit {
        params,
        status,
        n_rows,
        evaluations: outcome.evaluations,
        sum_squares: outcome.cost,
    }
}
