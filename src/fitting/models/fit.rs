//! fitting::models::fit — maximum-likelihood fit of one PDF to one Dataset.
//!
//! Purpose
//! -------
//! Drive a [`Pdf`] through `Initialized → Evaluating → Converged | Failed`:
//! maximize the unbinned likelihood over its free Variables, estimate the
//! covariance, and write the estimates back into the shared Variable handles.
//!
//! Key behaviors
//! -------------
//! - The optimizer runs on the mean log-likelihood in the unconstrained
//!   coordinates of [`UnbinnedLikelihood`]; results are reported on the total
//!   scale (`log_likelihood = n · ℓ̄`) and in external coordinates.
//! - Hitting the iteration cap is [`ModelError::ConvergenceFailure`]. A domain
//!   error raised during the search comes back as [`ModelError::Domain`].
//! - The covariance is the inverse observed information, mapped to external
//!   coordinates with the delta method. It is omitted, with a warning to the
//!   logger, when the Hessian is not positive definite.
//!
//! Invariants & assumptions
//! ------------------------
//! - Variables are written only after a converged fit; on any error they are
//!   exactly as before the call.
//! - Written values are clamped into the Variable bounds.
//! - Fixed Variables are never written.
//! - Only one fit may mutate a given set of Variables at a time; this is not
//!   enforced.
use std::sync::Arc;

use ndarray::Array2;

use crate::{
    fitting::{
        core::{Dataset, FitOptions},
        errors::{ModelError, ModelResult},
        models::{
            likelihood::UnbinnedLikelihood,
            logging::{FitLogger, FitStart, LoggerBridge},
        },
        pdf::Pdf,
    },
    inference::calc_covariance,
    optimization::{
        loglik_optimizer::{
            FnEvalMap, Grad, Theta, adapter::ArgMinAdapter, maximize_observed,
        },
        numerical_stability::delta_method,
    },
};

/// Lifecycle of a [`FitManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitState {
    Initialized,
    Evaluating,
    Converged,
    Failed,
}

/// Fitted value of one Variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FitParameter {
    pub name: String,
    pub value: f64,
    pub error: Option<f64>,
    pub fixed: bool,
}

/// Outcome of a converged fit.
///
/// `covariance` is over the free parameters, in the order they appear in
/// `parameters`, and in external coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub converged: bool,
    pub iterations: usize,
    pub log_likelihood: f64,
    pub n_events: usize,
    pub status: String,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub parameters: Vec<FitParameter>,
    pub covariance: Option<Array2<f64>>,
}

impl FitResult {
    pub fn parameter(&self, name: &str) -> Option<&FitParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Runs fits of one [`Pdf`] with fixed options and an optional logger.
///
/// ```ignore
/// let result = FitManager::new(&pdf)
///     .with_options(FitOptions::default())
///     .with_logger(Arc::new(LogFacade))
///     .fit(&data)?;
/// ```
pub struct FitManager<'p> {
    pdf: &'p Pdf,
    options: FitOptions,
    logger: Option<Arc<dyn FitLogger>>,
    state: FitState,
}

impl<'p> FitManager<'p> {
    pub fn new(pdf: &'p Pdf) -> Self {
        Self { pdf, options: FitOptions::default(), logger: None, state: FitState::Initialized }
    }

    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn FitLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn state(&self) -> FitState {
        self.state
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Fit the PDF to `data` and update its Variables.
    ///
    /// # Errors
    /// - [`ModelError::EmptyDataset`] / [`ModelError::UnknownObservable`] if
    ///   `data` has no events or lacks the PDF's Observable.
    /// - [`ModelError::Domain`] if the PDF is undefined at the start or at a
    ///   point visited by the search.
    /// - [`ModelError::ConvergenceFailure`] when the iteration cap is reached.
    /// - [`ModelError::Optimization`] for any other optimizer failure.
    pub fn fit(&mut self, data: &Dataset) -> ModelResult<FitResult> {
        self.state = FitState::Evaluating;
        let outcome = self.run(data);
        self.state = match outcome {
            Ok(_) => FitState::Converged,
            Err(_) => FitState::Failed,
        };
        if let Some(logger) = &self.logger {
            logger.on_finish(outcome.as_ref());
        }
        outcome
    }

    fn run(&self, data: &Dataset) -> ModelResult<FitResult> {
        let n_events = self.check_data(data)?;
        let likelihood = UnbinnedLikelihood::new(self.pdf, &self.options);
        if likelihood.n_free() == 0 {
            return self.evaluate_fixed(&likelihood, data);
        }
        let theta0 = likelihood.initial_theta();
        if let Some(logger) = &self.logger {
            logger.on_start(&FitStart {
                pdf: self.pdf.name().to_string(),
                n_events,
                free_parameters: likelihood
                    .free_indices()
                    .iter()
                    .map(|&k| {
                        let v = &self.pdf.variables()[k];
                        (v.name().to_string(), v.value())
                    })
                    .collect(),
            });
        }

        let bridge = self.logger.clone().map(|logger| LoggerBridge::new(logger, n_events));
        let outcome =
            maximize_observed(&likelihood, theta0, data, &self.options.mle_opts, bridge)?;
        if !outcome.converged {
            return Err(ModelError::ConvergenceFailure {
                iterations: outcome.iterations,
                status: outcome.status,
            });
        }

        let theta_hat = &outcome.theta_hat;
        let covariance = if self.options.compute_covariance {
            self.covariance(&likelihood, data, theta_hat, n_events)
        } else {
            None
        };
        let values = likelihood.external(theta_hat);
        let parameters = self.write_back(&likelihood, &values, covariance.as_ref());

        Ok(FitResult {
            converged: true,
            iterations: outcome.iterations,
            log_likelihood: outcome.value * n_events as f64,
            n_events,
            status: outcome.status,
            fn_evals: outcome.fn_evals,
            grad_norm: outcome.grad_norm,
            parameters,
            covariance,
        })
    }

    fn check_data(&self, data: &Dataset) -> ModelResult<usize> {
        if data.index_of(self.pdf.observable()).is_none() {
            return Err(ModelError::UnknownObservable {
                name: self.pdf.observable().name().to_string(),
            });
        }
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        Ok(data.len())
    }

    /// Every Variable fixed: nothing to optimize, report the likelihood.
    fn evaluate_fixed(
        &self, likelihood: &UnbinnedLikelihood, data: &Dataset,
    ) -> ModelResult<FitResult> {
        let params = self.pdf.parameter_values();
        let xs = data.column_of(self.pdf.observable()).ok_or(ModelError::EmptyDataset)?;
        let log_likelihood = likelihood.sum_log_density(xs, &params)?;
        Ok(FitResult {
            converged: true,
            iterations: 0,
            log_likelihood,
            n_events: xs.len(),
            status: "No free parameters".to_string(),
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
            parameters: self.snapshot(&params, &[], None),
            covariance: None,
        })
    }

    fn covariance(
        &self, likelihood: &UnbinnedLikelihood, data: &Dataset, theta_hat: &Theta,
        n_events: usize,
    ) -> Option<Array2<f64>> {
        let adapter = ArgMinAdapter::new(likelihood, data);
        let dim = theta_hat.len();
        let cost_grad = |theta: &Theta| {
            adapter.cost_gradient(theta).unwrap_or_else(|_| Grad::from_elem(dim, f64::NAN))
        };
        match calc_covariance(&cost_grad, theta_hat, n_events) {
            Ok(Some(cov)) => Some(delta_method(&cov, &likelihood.jacobian_diag(theta_hat))),
            Ok(None) => {
                self.warn("covariance omitted: Hessian is not positive definite");
                None
            }
            Err(err) => {
                self.warn(&format!("covariance omitted: {err}"));
                None
            }
        }
    }

    /// Store clamped values and errors in the free Variables.
    fn write_back(
        &self, likelihood: &UnbinnedLikelihood, values: &[f64], covariance: Option<&Array2<f64>>,
    ) -> Vec<FitParameter> {
        let variables = self.pdf.variables();
        let mut written = values.to_vec();
        for (slot, (&k, transform)) in
            likelihood.free_indices().iter().zip(likelihood.transforms()).enumerate()
        {
            let value = transform.clamp(values[k]);
            let error = covariance.map(|cov| cov[[slot, slot]].sqrt());
            variables[k].set_value(value);
            variables[k].set_error(error);
            written[k] = value;
        }
        self.snapshot(&written, likelihood.free_indices(), covariance)
    }

    fn snapshot(
        &self, values: &[f64], free: &[usize], covariance: Option<&Array2<f64>>,
    ) -> Vec<FitParameter> {
        self.pdf
            .variables()
            .iter()
            .enumerate()
            .map(|(k, v)| {
                let slot = free.iter().position(|&f| f == k);
                FitParameter {
                    name: v.name().to_string(),
                    value: values[k],
                    error: slot.and_then(|s| covariance.map(|cov| cov[[s, s]].sqrt())),
                    fixed: slot.is_none(),
                }
            })
            .collect()
    }

    fn warn(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger.on_warning(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fitting::{
            core::{Observable, Variable},
            errors::ErrorKind,
            models::logging::IterationRecord,
        },
        optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    };
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::sync::Mutex;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - State transitions of `FitManager` on success and failure.
    // - Write-back of values and errors, and the untouched-on-failure rule.
    // - Logger notifications.
    //
    // They intentionally DO NOT cover:
    // - Large-sample recovery and parallel equivalence (see `tests/`).
    // -------------------------------------------------------------------------

    /// Inverse-CDF draws from `exp(x/α)` on `[lo, hi]`.
    fn truncated_exponential(alpha: f64, lo: f64, hi: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let (a, b) = ((lo / alpha).exp(), (hi / alpha).exp());
        (0..n).map(|_| alpha * (a + rng.gen::<f64>() * (b - a)).ln()).collect()
    }

    fn exponential_setup(alpha0: f64) -> (Observable, Variable, Pdf, Dataset) {
        let x = Observable::new("x", 0.0, 10.0).expect("valid");
        let alpha = Variable::bounded("alpha", alpha0, 0.1, -10.0, -0.1).expect("valid");
        let pdf = Pdf::exponential("exppdf", &x, &alpha).expect("valid");
        let mut data = Dataset::new(&[x.clone()]).expect("valid");
        for v in truncated_exponential(-2.0, 0.0, 10.0, 5_000, 7) {
            x.set_value(v);
            data.add_event_filtered();
        }
        (x, alpha, pdf, data)
    }

    #[derive(Default)]
    struct Counting {
        starts: Mutex<usize>,
        iterations: Mutex<Vec<IterationRecord>>,
        finishes: Mutex<usize>,
    }

    impl FitLogger for Counting {
        fn on_start(&self, _start: &FitStart) {
            if let Ok(mut n) = self.starts.lock() {
                *n += 1;
            }
        }

        fn on_iteration(&self, record: &IterationRecord) {
            if let Ok(mut records) = self.iterations.lock() {
                records.push(*record);
            }
        }

        fn on_finish(&self, _outcome: Result<&FitResult, &ModelError>) {
            if let Ok(mut n) = self.finishes.lock() {
                *n += 1;
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A successful fit ends in `Converged`, writes α̂ and its error back, and
    // reports the total log-likelihood.
    //
    // Given
    // -----
    // - 5 000 draws from α = -2 on [0, 10], start α = -1.
    //
    // Expect
    // ------
    // - State `Converged`, |α̂ + 2| < 0.3, positive finite error on both the
    //   Variable and the result, `log_likelihood` = n · ℓ̄ at α̂.
    fn fit_converges_and_writes_back() {
        // Arrange
        let (_x, alpha, pdf, data) = exponential_setup(-1.0);
        let mut manager = FitManager::new(&pdf);

        // Act
        let result = manager.fit(&data).expect("fit converges");

        // Assert
        assert_eq!(manager.state(), FitState::Converged);
        assert!(result.converged);
        assert!((alpha.value() + 2.0).abs() < 0.3, "alpha = {}", alpha.value());
        let fitted = result.parameter("alpha").expect("present");
        assert_eq!(fitted.value, alpha.value());
        let error = alpha.error().expect("covariance computed");
        assert!(error > 0.0 && error.is_finite());
        assert_eq!(fitted.error, Some(error));
        let likelihood = UnbinnedLikelihood::new(&pdf, &FitOptions::default());
        let xs = data.column("x").expect("column");
        let expected = likelihood.sum_log_density(xs, &[alpha.value()]).expect("finite");
        assert!((result.log_likelihood - expected).abs() < 1e-6 * expected.abs());
    }

    #[test]
    // Purpose
    // -------
    // Running out of iterations fails the fit without touching Variables.
    //
    // Given
    // -----
    // - Start α = -5 and `max_iter = 1`.
    //
    // Expect
    // ------
    // - `ConvergenceFailure`, state `Failed`, α still exactly -5 with no error.
    fn iteration_cap_fails_and_leaves_variables_untouched() {
        // Arrange
        let (_x, alpha, pdf, data) = exponential_setup(-5.0);
        let tols = Tolerances::new(Some(1e-12), None, Some(1)).expect("valid");
        let mle = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).expect("valid");
        let options = FitOptions { mle_opts: mle, ..FitOptions::default() };
        let mut manager = FitManager::new(&pdf).with_options(options);

        // Act
        let err = manager.fit(&data).expect_err("cap reached");

        // Assert
        assert_eq!(err.kind(), ErrorKind::Convergence);
        assert_eq!(manager.state(), FitState::Failed);
        assert_eq!(alpha.value(), -5.0);
        assert_eq!(alpha.error(), None);
    }

    #[test]
    // Purpose
    // -------
    // A PDF whose Observable is not in the Dataset is rejected up front.
    //
    // Given
    // -----
    // - A Dataset over `y` and a PDF over `x`, both named distinctly.
    //
    // Expect
    // ------
    // - `UnknownObservable` with kind `Validation`; state `Failed`.
    fn foreign_observable_is_rejected() {
        // Arrange
        let (_x, _alpha, pdf, _) = exponential_setup(-1.0);
        let y = Observable::new("y", 0.0, 1.0).expect("valid");
        let mut other = Dataset::new(&[y.clone()]).expect("valid");
        y.set_value(0.5);
        other.add_event().expect("in domain");
        let mut manager = FitManager::new(&pdf);

        // Act
        let err = manager.fit(&other).expect_err("observable missing");

        // Assert
        assert!(matches!(err, ModelError::UnknownObservable { ref name } if name == "x"));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(manager.state(), FitState::Failed);
    }

    #[test]
    // Purpose
    // -------
    // With every Variable fixed the fit only evaluates the likelihood.
    //
    // Given
    // -----
    // - α fixed at -2.
    //
    // Expect
    // ------
    // - Converged with zero iterations, α unchanged, the parameter marked fixed.
    fn all_fixed_variables_evaluate_without_optimizing() {
        // Arrange
        let (_x, alpha, pdf, data) = exponential_setup(-2.0);
        alpha.set_fixed(true);

        // Act
        let result = pdf.fit_to(&data).expect("evaluation succeeds");

        // Assert
        assert_eq!(result.iterations, 0);
        assert_eq!(alpha.value(), -2.0);
        let fitted = result.parameter("alpha").expect("present");
        assert!(fitted.fixed);
        assert_eq!(fitted.error, None);
        assert!(result.log_likelihood.is_finite());
    }

    #[test]
    // Purpose
    // -------
    // The logger sees one start, at least one iteration, and one finish.
    //
    // Given
    // -----
    // - A counting logger attached through `with_logger`.
    //
    // Expect
    // ------
    // - starts = finishes = 1, iterations ≥ 1, all iteration logLs finite.
    fn logger_receives_start_iterations_and_finish() {
        // Arrange
        let (_x, _alpha, pdf, data) = exponential_setup(-1.0);
        let logger = Arc::new(Counting::default());
        let mut manager = FitManager::new(&pdf).with_logger(logger.clone());

        // Act
        manager.fit(&data).expect("fit converges");

        // Assert
        assert_eq!(*logger.starts.lock().expect("lock"), 1);
        assert_eq!(*logger.finishes.lock().expect("lock"), 1);
        let records = logger.iterations.lock().expect("lock");
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.log_likelihood.is_finite()));
    }
}
