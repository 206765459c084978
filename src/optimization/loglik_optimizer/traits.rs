//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait implemented by fit objectives.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by `maximize`.
//!
//! Convention: we *maximize* a log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. Analytic gradients are gradients of `ℓ`; the adapter flips
//! the sign.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, DEFAULT_MAX_ITER, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented log-likelihood interface.
///
/// - `type Data`: payload carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject invalid `θ`/`data`
///   pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   The default returns [`OptError::GradientNotImplemented`], which makes
///   the adapter fall back to finite differences.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parses case-insensitively from `"MoreThuente"` / `"HagerZhang"`; anything
/// else is `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols`: numerical tolerances and iteration limit.
/// - `line_searcher`: line-search algorithm used by L-BFGS.
/// - `verbose`: attach argmin's terminal slog observer (only with the
///   `obs_slog` feature).
/// - `lbfgs_mem`: L-BFGS history size, `None` means [`DEFAULT_LBFGS_MEM`].
///
/// Default: `tol_grad = 1e-6`, `tol_cost = 1e-12`, `max_iter = 300`,
/// More–Thuente, quiet, default memory.
///
/// [`DEFAULT_LBFGS_MEM`]: crate::optimization::loglik_optimizer::DEFAULT_LBFGS_MEM
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations. `None` means
///   [`DEFAULT_MAX_ITER`]; a run is never unbounded.
///
/// Any field can be `None` but at least one must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }

    /// Iteration cap handed to the executor.
    pub fn iteration_cap(&self) -> usize {
        self.max_iter.unwrap_or(DEFAULT_MAX_ITER)
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: Some(1e-12), max_iter: Some(DEFAULT_MAX_ITER) }
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best objective value `ℓ(θ̂)` (not the cost).
/// - `converged`: `true` only when argmin stopped because a convergence
///   criterion was met (`SolverConverged` or `TargetCostReached`). Running out
///   of iterations is *not* convergence.
/// - `status`: human-readable termination status.
/// - `iterations`: optimizer iterations performed.
/// - `fn_evals`: argmin's evaluation counters (`cost_count`, ...).
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, reason.text().to_string())
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation rules of `Tolerances::new` and `MLEOptions::new`.
    // - Case-insensitive parsing of `LineSearcher`.
    // - Mapping of argmin termination reasons into `OptimOutcome::converged`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // At least one stopping rule must be supplied.
    //
    // Given
    // -----
    // - `Tolerances::new(None, None, None)`.
    //
    // Expect
    // ------
    // - `Err(OptError::NoTolerancesProvided)`.
    fn tolerances_new_rejects_all_none() {
        // Act
        let result = Tolerances::new(None, None, None);

        // Assert
        assert_eq!(result, Err(OptError::NoTolerancesProvided));
    }

    #[test]
    // Purpose
    // -------
    // Non-positive tolerances and a zero iteration cap are rejected.
    //
    // Given
    // -----
    // - A negative gradient tolerance, a NaN cost tolerance, and `max_iter = 0`.
    //
    // Expect
    // ------
    // - The matching `InvalidTol*` / `InvalidMaxIter` variants.
    fn tolerances_new_rejects_invalid_values() {
        // Act
        let bad_grad = Tolerances::new(Some(-1.0), None, None);
        let bad_cost = Tolerances::new(None, Some(f64::NAN), None);
        let bad_iter = Tolerances::new(None, None, Some(0));

        // Assert
        assert!(matches!(bad_grad, Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(bad_cost, Err(OptError::InvalidTolCost { .. })));
        assert!(matches!(bad_iter, Err(OptError::InvalidMaxIter { max_iter: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Tolerances without an explicit cap still bound the run.
    //
    // Given
    // -----
    // - Only a gradient tolerance, then an explicit cap of 25.
    //
    // Expect
    // ------
    // - `iteration_cap()` is `DEFAULT_MAX_ITER`, then 25.
    fn iteration_cap_falls_back_to_default() {
        // Act
        let grad_only = Tolerances::new(Some(1e-8), None, None).expect("valid tolerances");
        let capped = Tolerances::new(Some(1e-8), None, Some(25)).expect("valid tolerances");

        // Assert
        assert_eq!(grad_only.iteration_cap(), DEFAULT_MAX_ITER);
        assert_eq!(capped.iteration_cap(), 25);
    }

    #[test]
    // Purpose
    // -------
    // Zero L-BFGS memory is a configuration error.
    //
    // Given
    // -----
    // - Valid tolerances and `lbfgs_mem = Some(0)`.
    //
    // Expect
    // ------
    // - `Err(OptError::InvalidLBFGSMem { mem: 0, .. })`.
    fn mle_options_new_rejects_zero_memory() {
        // Act
        let result =
            MLEOptions::new(Tolerances::default(), LineSearcher::HagerZhang, false, Some(0));

        // Assert
        assert!(matches!(result, Err(OptError::InvalidLBFGSMem { mem: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Line-search names parse regardless of case; unknown names are errors.
    //
    // Given
    // -----
    // - `"hagerZHANG"`, `"MORETHUENTE"`, and `"backtracking"`.
    //
    // Expect
    // ------
    // - The two known variants and an `InvalidLineSearch` error.
    fn line_searcher_from_str_is_case_insensitive() {
        // Act / Assert
        assert_eq!("hagerZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert_eq!("MORETHUENTE".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert!(matches!(
            "backtracking".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Hitting the iteration cap must not be reported as convergence.
    //
    // Given
    // -----
    // - Two outcomes built from `MaxItersReached` and `SolverConverged`.
    //
    // Expect
    // ------
    // - Only the `SolverConverged` outcome has `converged == true`.
    fn optim_outcome_only_flags_real_convergence() {
        // Arrange
        let theta = array![0.5];

        // Act
        let capped = OptimOutcome::new(
            Some(theta.clone()),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            10,
            FnEvalMap::new(),
            None,
        )
        .expect("outcome should be valid");
        let done = OptimOutcome::new(
            Some(theta),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            4,
            FnEvalMap::new(),
            Some(array![3.0, 4.0]),
        )
        .expect("outcome should be valid");

        // Assert
        assert!(!capped.converged);
        assert!(done.converged);
        assert_eq!(done.grad_norm, Some(5.0));
    }
}
