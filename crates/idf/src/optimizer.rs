//! Levenberg-Marquardt least-squares solver for `argmin`.
//!
//! Minimizes `Σ r_i(p)²` for a problem exposing residuals through
//! [`Operator`] and an analytic Jacobian through [`Jacobian`]. Damping
//! follows Marquardt's diagonal scaling of `JᵀJ`. Each iteration evaluates
//! at most one trial point, so the `Executor` iteration cap bounds the
//! number of residual evaluations.
//!
//! **Not part of the public API.**

use argmin::core::{
    ArgminError, Error, Executor, IterState, Jacobian, KV, Operator, Problem, Solver, State,
    TerminationReason,
};
use tracing::trace;

use crate::small_linalg::{SmallMat, SmallVec};

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;
const MIN_DIAGONAL: f64 = 1e-12;

const NO_IMPROVEMENT: &str = "no damping level lowers the cost";
const NON_FINITE_START: &str = "non-finite cost at the starting point";

type LmState<const P: usize> = IterState<[f64; P], (), (), (), (), f64>;

/// Stopping criteria and damping for [`levenberg_marquardt`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct LmSettings {
    pub(crate) max_evaluations: usize,
    pub(crate) initial_damping: f64,
    pub(crate) ftol: f64,
    pub(crate) xtol: f64,
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LmStatus {
    /// Relative cost reduction or step size fell below tolerance.
    Converged,
    /// No damping level produced a lower cost: the point is a local minimum
    /// to working precision.
    NoImprovement,
    /// The residual-evaluation cap was reached first.
    MaxEvaluations,
    /// The starting point produced a non-finite cost, or the problem
    /// reported an error.
    NonFinite,
}

impl LmStatus {
    /// Returns `true` for outcomes that leave the optimizer at a minimum.
    pub(crate) fn is_success(self) -> bool {
        matches!(self, LmStatus::Converged | LmStatus::NoImprovement)
    }

    fn from_reason(reason: Option<&TerminationReason>) -> Self {
        match reason {
            Some(TerminationReason::SolverConverged) => LmStatus::Converged,
            Some(TerminationReason::SolverExit(msg)) if msg == NO_IMPROVEMENT => {
                LmStatus::NoImprovement
            }
            Some(TerminationReason::SolverExit(msg)) if msg == NON_FINITE_START => {
                LmStatus::NonFinite
            }
            _ => LmStatus::MaxEvaluations,
        }
    }
}

/// Result of a Levenberg-Marquardt run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LmOutcome<const P: usize> {
    pub(crate) params: [f64; P],
    /// Sum of squared residuals at `params`.
    pub(crate) cost: f64,
    /// Residual evaluations, counting the starting point.
    pub(crate) evaluations: usize,
    pub(crate) status: LmStatus,
}

fn sum_squares(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

/// Builds `JᵀJ` and the gradient `Jᵀr`.
fn normal_equations<const P: usize>(
    jac: &[[f64; P]],
    residuals: &[f64],
) -> (SmallMat<P>, SmallVec<P>) {
    let mut jtj = SmallMat::<P>::zeros();
    let mut grad = SmallVec::<P>::zeros();
    for (row, &r) in jac.iter().zip(residuals) {
        for i in 0..P {
            grad.data[i] += row[i] * r;
            for j in 0..P {
                jtj.add(i, j, row[i] * row[j]);
            }
        }
    }
    (jtj, grad)
}

/// Damped Gauss-Newton solver. Holds the linearization at the current
/// parameters between iterations.
struct LevenbergMarquardt<const P: usize> {
    lambda: f64,
    ftol: f64,
    xtol: f64,
    jtj: SmallMat<P>,
    neg_grad: SmallVec<P>,
}

impl<const P: usize> LevenbergMarquardt<P> {
    fn new(settings: &LmSettings) -> Self {
        Self {
            lambda: settings.initial_damping,
            ftol: settings.ftol,
            xtol: settings.xtol,
            jtj: SmallMat::zeros(),
            neg_grad: SmallVec::zeros(),
        }
    }

    /// Recomputes `JᵀJ` and `-Jᵀr` at `params`; returns `true` if the
    /// gradient vanishes.
    fn linearize<O>(
        &mut self,
        problem: &mut Problem<O>,
        params: &[f64; P],
        residuals: &[f64],
    ) -> Result<bool, Error>
    where
        O: Jacobian<Param = [f64; P], Jacobian = Vec<[f64; P]>>,
    {
        let jac = problem.jacobian(params)?;
        let (jtj, grad) = normal_equations(&jac, residuals);
        self.jtj = jtj;
        self.neg_grad = SmallVec {
            data: grad.data.map(|g| -g),
        };
        Ok(grad.max_abs() == 0.0)
    }

    fn reject(&mut self, state: LmState<P>) -> LmState<P> {
        self.lambda *= 10.0;
        if self.lambda > MAX_DAMPING {
            state.terminate_with(TerminationReason::SolverExit(NO_IMPROVEMENT.to_string()))
        } else {
            state
        }
    }
}

fn current_param<const P: usize>(state: &LmState<P>) -> Result<[f64; P], Error> {
    state.get_param().copied().ok_or_else(|| {
        ArgminError::NotInitialized {
            text: "Levenberg-Marquardt requires a starting point".to_string(),
        }
        .into()
    })
}

impl<O, const P: usize> Solver<O, LmState<P>> for LevenbergMarquardt<P>
where
    O: Operator<Param = [f64; P], Output = Vec<f64>>
        + Jacobian<Param = [f64; P], Jacobian = Vec<[f64; P]>>,
{
    const NAME: &'static str = "Levenberg-Marquardt";

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        state: LmState<P>,
    ) -> Result<(LmState<P>, Option<KV>), Error> {
        let params = current_param(&state)?;
        let residuals = problem.apply(&params)?;
        let cost = sum_squares(&residuals);
        let state = state.cost(cost);
        if !cost.is_finite() {
            let reason = TerminationReason::SolverExit(NON_FINITE_START.to_string());
            return Ok((state.terminate_with(reason), None));
        }
        if self.linearize(problem, &params, &residuals)? {
            return Ok((state.terminate_with(TerminationReason::SolverConverged), None));
        }
        Ok((state, None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: LmState<P>,
    ) -> Result<(LmState<P>, Option<KV>), Error> {
        let params = current_param(&state)?;
        let cost = state.get_cost();

        let mut damped = self.jtj;
        for i in 0..P {
            damped.add(i, i, self.lambda * self.jtj.get(i, i).max(MIN_DIAGONAL));
        }
        let Some(step) = damped.solve(&self.neg_grad) else {
            return Ok((self.reject(state), None));
        };

        let mut candidate = params;
        for (p, s) in candidate.iter_mut().zip(step.data.iter()) {
            *p += s;
        }
        let trial = problem.apply(&candidate)?;
        let trial_cost = sum_squares(&trial);

        if !(trial_cost.is_finite() && trial_cost < cost) {
            return Ok((self.reject(state), None));
        }

        let reduction = cost - trial_cost;
        let candidate_norm = SmallVec { data: candidate }.norm();
        self.lambda = (self.lambda / 10.0).max(MIN_DAMPING);
        trace!(cost = trial_cost, lambda = self.lambda, "accepted step");

        let flat = self.linearize(problem, &candidate, &trial)?;
        let state = state.param(candidate).cost(trial_cost);
        if flat
            || trial_cost == 0.0
            || reduction <= self.ftol * trial_cost
            || step.norm() <= self.xtol * (candidate_norm + self.xtol)
        {
            return Ok((state.terminate_with(TerminationReason::SolverConverged), None));
        }
        Ok((state, None))
    }
}

/// Runs Levenberg-Marquardt from `start`.
///
/// The starting point costs one residual evaluation and every iteration at
/// most one more; the run stops once `settings.max_evaluations` have been
/// spent.
pub(crate) fn levenberg_marquardt<const P: usize, O>(
    problem: O,
    start: [f64; P],
    settings: &LmSettings,
) -> LmOutcome<P>
where
    O: Operator<Param = [f64; P], Output = Vec<f64>>
        + Jacobian<Param = [f64; P], Jacobian = Vec<[f64; P]>>,
{
    let max_iters = settings.max_evaluations.saturating_sub(1) as u64;
    let solver = LevenbergMarquardt::new(settings);
    let result = Executor::new(problem, solver)
        .configure(|state| state.param(start).max_iters(max_iters))
        .run();

    let result = match result {
        Ok(result) => result,
        Err(_) => {
            return LmOutcome {
                params: start,
                cost: f64::NAN,
                evaluations: 1,
                status: LmStatus::NonFinite,
            };
        }
    };

    let state = result.state();
    let status = LmStatus::from_reason(state.get_termination_reason());
    let params = state.get_param().copied().unwrap_or(start);
    LmOutcome {
        params,
        cost: state.get_cost(),
        evaluations: state.get_iter() as usize + 1,
        status,
    }
}
