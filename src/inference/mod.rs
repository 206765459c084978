//! inference — post-fit uncertainty estimates.
//!
//! [`hessian`] converts the observed information at `θ̂` into a covariance
//! matrix; the fit layer maps it to external coordinates with the delta
//! method.
pub mod hessian;

pub use self::hessian::{calc_covariance, covariance_from_information};

pub mod prelude {
    pub use super::hessian::{calc_covariance, covariance_from_information};
}
