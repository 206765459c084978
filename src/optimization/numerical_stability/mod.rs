//! numerical_stability — guarded transforms used to keep fits on ℝ.
pub mod transformations;

pub use self::transformations::{
    BoundTransform, EIGEN_EPS, LOGIT_EPS, delta_method, safe_logistic, safe_logit, safe_softplus,
    safe_softplus_inv,
};

pub mod prelude {
    pub use super::transformations::{BoundTransform, EIGEN_EPS, delta_method};
}
