//! Variable — a named fit parameter with optional step and bounds.
//!
//! Like [`Observable`](super::observable::Observable), a [`Variable`] is a
//! shared handle. A fit writes its optimum (and uncertainty) back into the
//! handles it was built with, so callers observe the result through their
//! own clones.
//!
//! Only one fit may mutate a given Variable at a time. This is a documented
//! precondition and is not enforced by a lock.
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use crate::{
    fitting::errors::{ModelError, ModelResult},
    optimization::numerical_stability::BoundTransform,
};

struct VariableInner {
    name: String,
    step: Option<f64>,
    lower: Option<f64>,
    upper: Option<f64>,
    value: AtomicU64,
    // NaN bits encode "no error available".
    error: AtomicU64,
    fixed: AtomicBool,
}

#[derive(Clone)]
pub struct Variable {
    inner: Arc<VariableInner>,
}

impl Variable {
    /// Unbounded variable without a step hint.
    pub fn new(name: impl Into<String>, value: f64) -> ModelResult<Self> {
        Self::build(name, value, None, None, None)
    }

    /// Unbounded variable with a step hint.
    pub fn with_step(name: impl Into<String>, value: f64, step: f64) -> ModelResult<Self> {
        Self::build(name, value, Some(step), None, None)
    }

    /// Variable with step and both bounds, as in `Variable("alpha", -2, 0.1, -10, 10)`.
    pub fn bounded(
        name: impl Into<String>, value: f64, step: f64, lower: f64, upper: f64,
    ) -> ModelResult<Self> {
        Self::build(name, value, Some(step), Some(lower), Some(upper))
    }

    /// General constructor; every optional part may be omitted.
    ///
    /// # Errors
    /// - [`ModelError::EmptyName`].
    /// - [`ModelError::NonFiniteValue`] for a non-finite value.
    /// - [`ModelError::InvalidStep`] unless the step is finite and `> 0`.
    /// - [`ModelError::InvalidBounds`] for non-finite bounds or `lower >= upper`.
    /// - [`ModelError::ValueOutsideBounds`] if the value violates a bound.
    pub fn build(
        name: impl Into<String>, value: f64, step: Option<f64>, lower: Option<f64>,
        upper: Option<f64>,
    ) -> ModelResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if !value.is_finite() {
            return Err(ModelError::NonFiniteValue { name, value });
        }
        if let Some(step) = step {
            if !step.is_finite() || step <= 0.0 {
                return Err(ModelError::InvalidStep { name, step });
            }
        }
        let lo = lower.unwrap_or(f64::NEG_INFINITY);
        let hi = upper.unwrap_or(f64::INFINITY);
        let bad_bound = lower.is_some_and(|l| !l.is_finite())
            || upper.is_some_and(|u| !u.is_finite())
            || (lower.is_some() && upper.is_some() && lo >= hi);
        if bad_bound {
            return Err(ModelError::InvalidBounds { name, lower: lo, upper: hi });
        }
        if value < lo || value > hi {
            return Err(ModelError::ValueOutsideBounds { name, value, lower: lo, upper: hi });
        }
        let inner = VariableInner {
            name,
            step,
            lower,
            upper,
            value: AtomicU64::new(value.to_bits()),
            error: AtomicU64::new(f64::NAN.to_bits()),
            fixed: AtomicBool::new(false),
        };
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.inner.value.load(Ordering::Relaxed))
    }

    /// Set the value. Unrestricted; the fit maps it into the bounds.
    pub fn set_value(&self, value: f64) {
        self.inner.value.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn step(&self) -> Option<f64> {
        self.inner.step
    }

    pub fn lower(&self) -> Option<f64> {
        self.inner.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.inner.upper
    }

    /// Fixed variables are excluded from the free parameter vector.
    pub fn is_fixed(&self) -> bool {
        self.inner.fixed.load(Ordering::Relaxed)
    }

    pub fn set_fixed(&self, fixed: bool) {
        self.inner.fixed.store(fixed, Ordering::Relaxed);
    }

    /// Uncertainty from the most recent successful fit, if one was computed.
    pub fn error(&self) -> Option<f64> {
        let e = f64::from_bits(self.inner.error.load(Ordering::Relaxed));
        if e.is_nan() { None } else { Some(e) }
    }

    pub(crate) fn set_error(&self, error: Option<f64>) {
        let bits = error.unwrap_or(f64::NAN).to_bits();
        self.inner.error.store(bits, Ordering::Relaxed);
    }

    /// Internal-space transform matching this variable's bounds.
    pub fn transform(&self) -> BoundTransform {
        BoundTransform::from_bounds(self.inner.lower, self.inner.upper)
    }

    /// Pointer identity.
    pub fn same(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.inner.name)
            .field("value", &self.value())
            .field("error", &self.error())
            .field("step", &self.inner.step)
            .field("lower", &self.inner.lower)
            .field("upper", &self.inner.upper)
            .field("fixed", &self.is_fixed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::errors::ErrorKind;

    #[test]
    // Purpose
    // -------
    // Bounded construction checks value and bound ordering.
    //
    // Given
    // -----
    // - Value above the upper bound, reversed bounds, a zero step.
    //
    // Expect
    // ------
    // - `ValueOutsideBounds`, `InvalidBounds`, `InvalidStep`.
    fn bounded_rejects_inconsistent_arguments() {
        // Act
        let above = Variable::bounded("a", 11.0, 0.1, -10.0, 10.0);
        let reversed = Variable::bounded("a", 0.0, 0.1, 10.0, -10.0);
        let zero_step = Variable::with_step("a", 0.0, 0.0);

        // Assert
        assert!(matches!(above, Err(ModelError::ValueOutsideBounds { .. })));
        assert!(matches!(reversed, Err(ModelError::InvalidBounds { .. })));
        assert!(matches!(zero_step, Err(ModelError::InvalidStep { .. })));
        assert_eq!(Variable::new("", 1.0).expect_err("empty").kind(), ErrorKind::Validation);
    }

    #[test]
    // Purpose
    // -------
    // Values on a bound, one-sided bounds, and unrestricted `set_value` are fine.
    //
    // Given
    // -----
    // - `alpha = -10` on `[-10, 10]` and a lower-bounded variable.
    //
    // Expect
    // ------
    // - Both construct; `set_value` outside the bounds is stored as-is.
    fn boundary_values_and_one_sided_bounds_are_accepted() {
        // Act
        let alpha = Variable::bounded("alpha", -10.0, 0.1, -10.0, 10.0).expect("on bound");
        let sigma = Variable::build("sigma", 1.0, None, Some(0.0), None).expect("lower only");
        alpha.set_value(42.0);

        // Assert
        assert_eq!(alpha.value(), 42.0);
        assert_eq!(sigma.transform(), BoundTransform::Lower(0.0));
        assert_eq!(sigma.upper(), None);
    }

    #[test]
    // Purpose
    // -------
    // Fixed flag and fitted error are shared through clones.
    //
    // Given
    // -----
    // - A variable, a clone, `set_fixed(true)` and `set_error(Some(0.2))`.
    //
    // Expect
    // ------
    // - The first handle reports both; clearing the error yields `None`.
    fn fixed_flag_and_error_are_shared() {
        // Arrange
        let v = Variable::new("mu", 0.0).expect("valid");
        let alias = v.clone();

        // Act
        alias.set_fixed(true);
        alias.set_error(Some(0.2));

        // Assert
        assert!(v.is_fixed());
        assert_eq!(v.error(), Some(0.2));
        alias.set_error(None);
        assert_eq!(v.error(), None);
    }
}
