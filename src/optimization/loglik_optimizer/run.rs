//! loglik_optimizer::run — drive an argmin `Executor` and normalize the result.
//!
//! The runner seeds the executor with `θ₀` and the iteration cap, which is
//! always finite (see [`Tolerances::iteration_cap`](super::Tolerances::iteration_cap)).
//! It attaches an optional caller observer (and, with the `obs_slog` feature
//! and `MLEOptions::verbose`, argmin's terminal slog observer), then converts the
//! final [`SolverState`] into an [`OptimOutcome`] expressed on the
//! log-likelihood scale (`value = -best_cost`).
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
        types::SolverState,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{
    Executor, Solver, State,
    observers::{Observe, ObserverMode},
};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Observer that ignores every event; stands in when no observer is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl Observe<SolverState> for SilentObserver {}

/// Run a configured L-BFGS solver from `theta0`.
///
/// `observer` is attached with [`ObserverMode::Always`], so it sees the
/// initial state and every iteration.
///
/// # Errors
/// - Any error raised inside the cost/gradient closures, recovered as the
///   same [`OptError`](crate::optimization::errors::OptError) when possible.
/// - Validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S, O>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
    observer: Option<O>,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, SolverState> + Send + 'static,
    O: Observe<SolverState> + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let max_iters = opts.tols.iteration_cap() as u64;
    let mut optimizer = Executor::new(problem, solver)
        .configure(|state| state.param(theta0).max_iters(max_iters));
    if let Some(observer) = observer {
        optimizer = optimizer.add_observer(observer, ObserverMode::Always);
    }
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let slog = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(slog, ObserverMode::Always);
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    log::info!(
        "init: mean loglik(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
