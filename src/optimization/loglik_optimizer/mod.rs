//! loglik_optimizer — argmin-backed maximizer for log-likelihoods.
//!
//! Purpose
//! -------
//! Turn any [`LogLikelihood`] into an L-BFGS run. Callers implement `ℓ(θ)`
//! (and optionally `∇ℓ(θ)`) on an unconstrained parameter vector and call
//! [`maximize`] or [`maximize_observed`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ` into the argmin cost `c = -ℓ`,
//!   falling back to finite differences when no analytic gradient exists.
//! - [`builders`] picks the line search, [`run`] drives the executor, and
//!   [`OptimOutcome`] normalizes the final state.
//! - [`finite_diff::compute_hessian`] provides the numeric Hessian used for
//!   covariance estimates.
//!
//! Invariants & assumptions
//! ------------------------
//! - Always maximize `ℓ`; never implement the cost directly.
//! - Recoverable failures in `value`/`grad` are [`OptError`] values. They
//!   cross the argmin boundary and come back as the same variant.
//! - Reaching `max_iter` is not convergence.
//!
//! [`OptError`]: crate::optimization::errors::OptError
pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::{maximize, maximize_observed};
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{
    Cost, DEFAULT_LBFGS_MEM, DEFAULT_MAX_ITER, FnEvalMap, Grad, SolverState, Theta,
};

pub mod prelude {
    pub use super::api::{maximize, maximize_observed};
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
