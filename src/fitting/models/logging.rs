//! Fit progress reporting.
//!
//! The library never prints. A caller that wants progress passes an
//! `Arc<dyn FitLogger>` to [`FitManager::with_logger`]; the manager reports
//! the start and the end of the fit directly and wraps the logger in a
//! [`LoggerBridge`] so argmin reports every iteration through it.
//! [`LogFacade`] forwards everything to the `log` crate.
//!
//! [`FitManager::with_logger`]: crate::fitting::models::FitManager::with_logger
use std::sync::Arc;

use argmin::core::{Error, KV, State, observers::Observe};

use crate::{
    fitting::{errors::ModelError, models::fit::FitResult},
    optimization::loglik_optimizer::SolverState,
};

/// What is being fitted, reported once before the first iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct FitStart {
    pub pdf: String,
    pub n_events: usize,
    /// `(name, starting value)` of each free Variable.
    pub free_parameters: Vec<(String, f64)>,
}

/// One optimizer iteration on the log-likelihood scale (`n · ℓ̄`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iteration: u64,
    pub log_likelihood: f64,
    pub best_log_likelihood: f64,
}

/// Receiver for fit progress. Every hook defaults to a no-op.
pub trait FitLogger: Send + Sync {
    fn on_start(&self, _start: &FitStart) {}

    fn on_iteration(&self, _record: &IterationRecord) {}

    /// Non-fatal conditions, e.g. an omitted covariance matrix.
    fn on_warning(&self, _message: &str) {}

    fn on_finish(&self, _outcome: Result<&FitResult, &ModelError>) {}
}

/// [`FitLogger`] on top of the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl FitLogger for LogFacade {
    fn on_start(&self, start: &FitStart) {
        log::info!(
            "fitting {} to {} events; free parameters {:?}",
            start.pdf,
            start.n_events,
            start.free_parameters
        );
    }

    fn on_iteration(&self, record: &IterationRecord) {
        log::debug!(
            "iteration {}: logL = {:.6}, best = {:.6}",
            record.iteration,
            record.log_likelihood,
            record.best_log_likelihood
        );
    }

    fn on_warning(&self, message: &str) {
        log::warn!("{message}");
    }

    fn on_finish(&self, outcome: Result<&FitResult, &ModelError>) {
        match outcome {
            Ok(result) => log::info!(
                "fit finished after {} iterations ({}): logL = {:.6}",
                result.iterations,
                result.status,
                result.log_likelihood
            ),
            Err(err) => log::info!("fit failed: {err}"),
        }
    }
}

/// Adapts a [`FitLogger`] to argmin's observer interface.
///
/// argmin's cost is `-ℓ̄`; records are rescaled by `n_events` before they
/// reach the logger.
#[derive(Clone)]
pub struct LoggerBridge {
    logger: Arc<dyn FitLogger>,
    n_events: f64,
}

impl LoggerBridge {
    pub fn new(logger: Arc<dyn FitLogger>, n_events: usize) -> Self {
        Self { logger, n_events: n_events as f64 }
    }
}

impl Observe<SolverState> for LoggerBridge {
    fn observe_iter(&mut self, state: &SolverState, _kv: &KV) -> Result<(), Error> {
        let record = IterationRecord {
            iteration: state.get_iter(),
            log_likelihood: -state.get_cost() * self.n_events,
            best_log_likelihood: -state.get_best_cost() * self.n_events,
        };
        self.logger.on_iteration(&record);
        Ok(())
    }
}
