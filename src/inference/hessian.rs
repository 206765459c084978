//! inference::hessian — covariance of the MLE from the observed information.
//!
//! Purpose
//! -------
//! Turn a finite-difference Hessian of the mean cost `-ℓ̄(θ)` into the
//! covariance of `θ̂`, or report that the Hessian is unusable.
//!
//! Key behaviors
//! -------------
//! - [`calc_covariance`] differentiates a cost gradient with
//!   [`compute_hessian`] to obtain the per-event information `J(θ̂)`.
//! - [`covariance_from_information`] inverts `J` through its symmetric
//!   eigen-decomposition (nalgebra) and divides by the number of events.
//!
//! Invariants & assumptions
//! ------------------------
//! - `J` is on the mean scale, so `Cov(θ̂) = J⁻¹ / n`.
//! - `J` must be positive definite: any eigenvalue at or below
//!   `EIGEN_EPS · λ_max` yields `None` instead of a pseudo-inverse. The cutoff
//!   is relative, so the overall scale of `J` does not matter.
//! - Symmetry is enforced upstream by `compute_hessian`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{Grad, Theta, finite_diff::compute_hessian},
    numerical_stability::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Covariance of `θ̂` from the gradient of the mean cost.
///
/// # Errors
/// Propagates [`compute_hessian`] failures (non-finite or non-square
/// Hessian). A finite Hessian that is not positive definite is `Ok(None)`.
pub fn calc_covariance<F: Fn(&Theta) -> Grad>(
    cost_grad: &F, theta_hat: &Theta, n_events: usize,
) -> OptResult<Option<Array2<f64>>> {
    let info = compute_hessian(cost_grad, theta_hat)?;
    Ok(covariance_from_information(&info, n_events))
}

/// `J⁻¹ / n` for a symmetric positive-definite `J`, `None` otherwise.
pub fn covariance_from_information(info: &Array2<f64>, n_events: usize) -> Option<Array2<f64>> {
    let dim = info.nrows();
    if dim == 0 || dim != info.ncols() || n_events == 0 {
        return None;
    }
    let eigen = to_dmatrix(info).symmetric_eigen();
    let lambda_max = eigen.eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(lambda_max > 0.0) {
        return None;
    }
    let cutoff = EIGEN_EPS * lambda_max;
    if eigen.eigenvalues.iter().any(|&lambda| !(lambda > cutoff)) {
        return None;
    }
    let q = &eigen.eigenvectors;
    let n = n_events as f64;
    let mut cov = Array2::<f64>::zeros((dim, dim));
    for ((i, j), v) in cov.indexed_iter_mut() {
        *v = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .map(|(k, &lambda)| q[(i, k)] * q[(j, k)] / lambda)
            .sum::<f64>()
            / n;
    }
    Some(cov)
}

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}
