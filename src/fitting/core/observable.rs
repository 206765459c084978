//! Observable — a named measured dimension with a bounded domain.
//!
//! An [`Observable`] is a shared handle: clones point at the same instance,
//! so setting the value through one clone is visible through all of them.
//! Datasets and PDFs keep handles to the exact instances they were built
//! with; identity is pointer identity ([`Observable::same`]).
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::fitting::errors::{ModelError, ModelResult};

struct ObservableInner {
    name: String,
    lower: f64,
    upper: f64,
    value: AtomicU64,
}

#[derive(Clone)]
pub struct Observable {
    inner: Arc<ObservableInner>,
}

impl Observable {
    /// Create an observable on `[lower, upper]`.
    ///
    /// The current value starts at `lower`.
    ///
    /// # Errors
    /// - [`ModelError::EmptyName`] for an empty name.
    /// - [`ModelError::InvalidBounds`] unless both bounds are finite and
    ///   `lower < upper`.
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> ModelResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(ModelError::InvalidBounds { name, lower, upper });
        }
        let inner =
            ObservableInner { name, lower, upper, value: AtomicU64::new(lower.to_bits()) };
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn lower(&self) -> f64 {
        self.inner.lower
    }

    pub fn upper(&self) -> f64 {
        self.inner.upper
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.inner.lower, self.inner.upper)
    }

    /// Current value; read by `Dataset::add_event`.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.inner.value.load(Ordering::Relaxed))
    }

    /// Set the current value. Unrestricted; bounds are enforced on ingestion.
    pub fn set_value(&self, value: f64) {
        self.inner.value.store(value.to_bits(), Ordering::Relaxed);
    }

    /// `true` when `x` is finite and inside `[lower, upper]`.
    pub fn contains(&self, x: f64) -> bool {
        x.is_finite() && x >= self.inner.lower && x <= self.inner.upper
    }

    /// Pointer identity.
    pub fn same(&self, other: &Observable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Observable {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.inner.name)
            .field("lower", &self.inner.lower)
            .field("upper", &self.inner.upper)
            .field("value", &self.value())
            .finish()
    }
}
