//! Numerically stable transforms between bounded and unconstrained space.
//!
//! Bounded fit parameters are optimized on ℝ through a smooth bijection and
//! mapped back afterwards:
//!
//! | bounds          | external `x(θ)`                       |
//! |-----------------|---------------------------------------|
//! | none            | `θ`                                   |
//! | `[lo, ∞)`       | `lo + softplus(θ)`                    |
//! | `(-∞, hi]`      | `hi - softplus(θ)`                    |
//! | `[lo, hi]`      | `lo + (hi - lo) · logistic(θ)`        |
//!
//! Softplus and logistic use explicit cutoffs (`|x| > 20`) to stay clear of
//! overflow in `exp`.
//!
//! Unbounded and one-sided coordinates carry the units of the parameter. The
//! optimizer divides them by [`BoundTransform::coordinate_scale`] so that a
//! parameter of order 1e5 is searched on the same footing as one of order 1.
use ndarray::{Array1, Array2};

/// Clamp margin for probabilities fed into `logit`, and for distances to a
/// one-sided bound fed into `softplus⁻¹`.
pub const LOGIT_EPS: f64 = 1e-12;

/// Relative eigenvalue cutoff used when inverting information matrices.
pub const EIGEN_EPS: f64 = 1e-10;

/// Numerically stable softplus: `ln(1 + exp(x))`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: `ln(exp(x) - 1)`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic `1 / (1 + exp(-x))`.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(p / (1 - p))` with `p` clamped into `[LOGIT_EPS, 1 - LOGIT_EPS]`.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    p.ln() - (-p).ln_1p()
}

/// Bijection between a (possibly) bounded external value and ℝ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundTransform {
    Identity,
    Lower(f64),
    Upper(f64),
    Interval(f64, f64),
}

impl BoundTransform {
    /// Pick the transform matching the bounds that are present.
    pub fn from_bounds(lower: Option<f64>, upper: Option<f64>) -> Self {
        match (lower, upper) {
            (None, None) => BoundTransform::Identity,
            (Some(lo), None) => BoundTransform::Lower(lo),
            (None, Some(hi)) => BoundTransform::Upper(hi),
            (Some(lo), Some(hi)) => BoundTransform::Interval(lo, hi),
        }
    }

    /// External value → internal coordinate. Values on or beyond a bound map
    /// to a large but finite coordinate.
    pub fn to_internal(&self, x: f64) -> f64 {
        match *self {
            BoundTransform::Identity => x,
            BoundTransform::Lower(lo) => safe_softplus_inv((x - lo).max(LOGIT_EPS)),
            BoundTransform::Upper(hi) => safe_softplus_inv((hi - x).max(LOGIT_EPS)),
            BoundTransform::Interval(lo, hi) => safe_logit((x - lo) / (hi - lo)),
        }
    }

    /// Internal coordinate → external value, clamped into the bounds.
    pub fn to_external(&self, theta: f64) -> f64 {
        match *self {
            BoundTransform::Identity => theta,
            BoundTransform::Lower(lo) => lo + safe_softplus(theta),
            BoundTransform::Upper(hi) => hi - safe_softplus(theta),
            BoundTransform::Interval(lo, hi) => {
                (lo + (hi - lo) * safe_logistic(theta)).clamp(lo, hi)
            }
        }
    }

    /// Jacobian `dx/dθ` at an internal coordinate.
    pub fn derivative(&self, theta: f64) -> f64 {
        match *self {
            BoundTransform::Identity => 1.0,
            BoundTransform::Lower(_) => safe_logistic(theta),
            BoundTransform::Upper(_) => -safe_logistic(theta),
            BoundTransform::Interval(lo, hi) => {
                let s = safe_logistic(theta);
                (hi - lo) * s * (1.0 - s)
            }
        }
    }

    /// Characteristic size of the internal coordinate around `x0`.
    ///
    /// Interval coordinates are dimensionless and keep scale 1. Otherwise the
    /// scale is the larger of `|to_internal(x0)|` and the step hint, and never
    /// below 1.
    pub fn coordinate_scale(&self, x0: f64, step: Option<f64>) -> f64 {
        match *self {
            BoundTransform::Interval(..) => 1.0,
            _ => self.to_internal(x0).abs().max(step.unwrap_or(0.0)).max(1.0),
        }
    }

    /// Clamp an external value into the bounds (no-op without bounds).
    pub fn clamp(&self, x: f64) -> f64 {
        match *self {
            BoundTransform::Identity => x,
            BoundTransform::Lower(lo) => x.max(lo),
            BoundTransform::Upper(hi) => x.min(hi),
            BoundTransform::Interval(lo, hi) => x.clamp(lo, hi),
        }
    }
}

/// Delta method for an element-wise reparametrization.
///
/// Given `Cov(θ)` and the diagonal Jacobian `J = diag(dx/dθ)`, returns
/// `Cov(x) = J · Cov(θ) · J`.
pub fn delta_method(cov_internal: &Array2<f64>, jac_diag: &Array1<f64>) -> Array2<f64> {
    let mut out = cov_internal.clone();
    for ((i, j), v) in out.indexed_iter_mut() {
        *v *= jac_diag[i] * jac_diag[j];
    }
    out
}
