//! fitting::models — the likelihood and the fit driver.
//!
//! - [`UnbinnedLikelihood`]: mean log-likelihood of a PDF over a Dataset in
//!   unconstrained coordinates.
//! - [`FitManager`]: runs the optimizer, estimates the covariance, and writes
//!   results back into the Variables.
//! - [`FitLogger`] / [`LogFacade`]: optional progress reporting.
pub mod fit;
pub mod likelihood;
pub mod logging;

pub use self::fit::{FitManager, FitParameter, FitResult, FitState};
pub use self::likelihood::UnbinnedLikelihood;
pub use self::logging::{FitLogger, FitStart, IterationRecord, LogFacade, LoggerBridge};
