//! loglik_optimizer::api — public entry points for maximizing a log-likelihood.
//!
//! [`maximize`] validates `θ₀`, runs [`LogLikelihood::check`], wraps the
//! objective in an [`ArgMinAdapter`], picks the L-BFGS flavour from
//! [`MLEOptions::line_searcher`], and returns an [`OptimOutcome`].
//! [`maximize_observed`] does the same with a caller-supplied argmin observer.
use argmin::core::observers::Observe;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{SilentObserver, run_lbfgs},
        traits::{LineSearcher, LogLikelihood, MLEOptions},
        types::SolverState,
        validation::validate_theta,
    },
};

/// Maximize `f` starting from `theta0`.
///
/// The outcome's `converged` flag is `false` when the iteration cap was hit;
/// deciding whether that is an error is left to the caller.
///
/// # Errors
/// - `InvalidThetaInput` for a non-finite entry of `theta0`.
/// - Errors from `f.check`, from the solver builders, or from the run.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    maximize_observed(f, theta0, data, opts, None::<SilentObserver>)
}

/// [`maximize`] with an optional observer attached to the argmin executor.
pub fn maximize_observed<F, O>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions, observer: Option<O>,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    O: Observe<SolverState> + 'static,
{
    validate_theta(&theta0, theta0.len())?;
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver, observer)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver, observer)
        }
    }
}
