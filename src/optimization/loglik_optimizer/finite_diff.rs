//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Give the optimizer and the covariance code numeric derivatives without
//! depending on the `finitediff` API directly. Densities without an analytic
//! gradient (e.g. numerically normalized families) are optimized through
//! [`run_fd_diff`]; every fit's covariance goes through [`compute_hessian`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Closures that can fail route their first error into a shared
//!   `closure_err` cell and return `NaN`; that error wins over any
//!   validation failure.
//! - Returned gradients / Hessians always pass [`validate_grad`] /
//!   [`validate_hessian`].
//! - Central differences are preferred for Hessians; forward differences
//!   are the fallback when the central result does not validate.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient with error capture and validation.
///
/// Clears `closure_err`, differentiates `func` at `theta`, then returns the
/// captured error if `func` failed, or the validated gradient otherwise.
///
/// # Errors
/// - Any error captured in `closure_err` (mapped through
///   `From<argmin::core::Error> for OptError`).
/// - `GradientDimMismatch` / `InvalidGradient` from [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

/// Finite-difference Hessian of a gradient map, validated and symmetrized.
///
/// `f` maps `θ` to a gradient vector; the result is its Jacobian at `theta`.
/// Central differences first, forward differences if the central matrix
/// fails validation. Only the forward-difference validation error is
/// surfaced.
///
/// # Errors
/// - `HessianDimMismatch` / `InvalidHessian` from [`validate_hessian`].
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut cent_hess = theta.central_hessian(f);
    match validate_hessian(&cent_hess, dim) {
        Ok(_) => {
            symmetrize_hess(&mut cent_hess);
            Ok(cent_hess)
        }
        Err(_) => {
            let mut forward_hess = theta.forward_hessian(f);
            validate_hessian(&forward_hess, dim)?;
            symmetrize_hess(&mut forward_hess);
            Ok(forward_hess)
        }
    }
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
