//! Adapter that exposes a `LogLikelihood` as an `argmin` problem.
//!
//! Maximizing `ℓ(θ)` becomes minimizing `c(θ) = -ℓ(θ)`. Analytic gradients
//! are negated; finite-difference gradients are taken on the cost closure
//! directly, so that branch needs no sign flip.
use std::cell::RefCell;

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a `LogLikelihood` to argmin's `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a log-likelihood and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }

    /// Cost `c(θ) = -ℓ(θ)` on the crate error surface.
    pub fn cost_value(&self, theta: &Theta) -> OptResult<Cost> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err(OptError::NonFiniteCost { value: output });
        }
        Ok(-output)
    }

    /// Gradient of the cost on the crate error surface.
    ///
    /// Uses the analytic `∇ℓ` when available. Otherwise central differences
    /// of the cost, retried with forward differences when a cost evaluation
    /// failed or the central result did not validate.
    pub fn cost_gradient(&self, theta: &Theta) -> OptResult<Grad> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost_value(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e.into());
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => run_fd_diff(theta, &cost_func, &closure_err),
                }
            }
            Err(e) => Err(e),
        }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.cost_value(theta)?)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.cost_gradient(theta)?)
    }
}
