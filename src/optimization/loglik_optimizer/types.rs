//! loglik_optimizer::types — numeric aliases and pre-wired solver types.
//!
//! Every optimizer module speaks in terms of these aliases rather than raw
//! `ndarray` / argmin generics, so swapping the backend touches one file.
//!
//! - `Theta`, `Grad`: unconstrained parameter vector and its gradient, both
//!   `Array1<f64>` of length equal to the number of free Variables.
//! - `Hessian`: dense `dim × dim` matrix.
//! - `Cost`: scalar cost `c(θ) = -ℓ̄(θ)`; sign flips happen in the adapter.
//! - `SolverState`: the argmin iteration state shared by the runner and the
//!   observer bridge.
use argmin::{
    core::IterState,
    solver::{
        linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
        quasinewton::LBFGS,
    },
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Unconstrained parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector, same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense second-derivative matrix, `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective handed to argmin (`-ℓ̄(θ)`).
pub type Cost = f64;

/// Function-evaluation counters reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Iteration state used by every L-BFGS run in this crate.
pub type SolverState = IterState<Theta, Grad, (), (), (), f64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Iteration cap applied when [`Tolerances::max_iter`](super::Tolerances) is `None`.
pub const DEFAULT_MAX_ITER: usize = 300;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
