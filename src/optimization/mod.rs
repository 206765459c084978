//! optimization — log-likelihood maximization and its numerical helpers.
//!
//! - [`loglik_optimizer`]: argmin L-BFGS driver for any `LogLikelihood`.
//! - [`numerical_stability`]: bounded ↔ unconstrained parameter transforms.
//! - [`errors`]: the optimizer error surface ([`OptError`](errors::OptError)).
pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
