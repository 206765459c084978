//! Errors for observables, datasets, PDFs and fits.
//!
//! Two types live here:
//! - [`DomainError`]: a PDF parameter makes the density or its normalization
//!   undefined. Shared with the optimizer layer (`OptError::Domain`) so it
//!   survives a round trip through argmin unchanged.
//! - [`ModelError`]: everything the public fitting API can return. Each
//!   variant belongs to one [`ErrorKind`].
//!
//! ## Conventions
//! - Event indices are 0-based and refer to the input column (matrix import)
//!   or to the position the event would have taken (single append).
//! - Optimizer failures other than domain errors are wrapped unchanged in
//!   [`ModelError::Optimization`].
#[cfg(feature = "python-bindings")]
use pyo3::{
    PyErr,
    exceptions::{PyArithmeticError, PyRuntimeError, PyValueError},
};

use crate::optimization::errors::OptError;

/// Result alias for the fitting API.
pub type ModelResult<T> = Result<T, ModelError>;

/// Coarse classification of [`ModelError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad construction arguments.
    Validation,
    /// A non-filtered import or append violated an Observable's bounds.
    OutOfDomain,
    /// A PDF parameter makes the density or normalization undefined.
    Domain,
    /// The iteration budget ran out before convergence.
    Convergence,
    /// Any other optimizer failure.
    Optimizer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Exponential slope parameter is exactly zero.
    ZeroSlope { name: String },

    /// A parameter value is NaN or infinite.
    NonFiniteParameter { name: String, value: f64 },

    /// Width parameter (e.g. Gaussian sigma) is not strictly positive.
    NonPositiveWidth { name: String, value: f64 },

    /// Parameter outside the family's admissible range.
    InvalidParameter { name: String, value: f64, reason: &'static str },

    /// Normalization integral is non-positive or non-finite.
    NonPositiveNormalization { pdf: String, value: f64 },

    /// Log-density evaluated to NaN or +∞.
    NonFiniteDensity { pdf: String, value: f64 },
}

impl std::error::Error for DomainError {}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::ZeroSlope { name } => {
                write!(f, "Slope parameter '{name}' must be non-zero.")
            }
            DomainError::NonFiniteParameter { name, value } => {
                write!(f, "Parameter '{name}' must be finite; got: {value}")
            }
            DomainError::NonPositiveWidth { name, value } => {
                write!(f, "Width parameter '{name}' must be > 0; got: {value}")
            }
            DomainError::InvalidParameter { name, value, reason } => {
                write!(f, "Parameter '{name}' = {value} is outside the admissible range. {reason}")
            }
            DomainError::NonPositiveNormalization { pdf, value } => {
                write!(f, "Normalization of PDF '{pdf}' must be positive and finite; got: {value}")
            }
            DomainError::NonFiniteDensity { pdf, value } => {
                write!(f, "PDF '{pdf}' produced a non-finite log-density: {value}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Validation ----
    EmptyName,

    InvalidBounds { name: String, lower: f64, upper: f64 },

    NonFiniteValue { name: String, value: f64 },

    ValueOutsideBounds { name: String, value: f64, lower: f64, upper: f64 },

    InvalidStep { name: String, step: f64 },

    NoObservables,

    DuplicateObservable { name: String },

    UnknownObservable { name: String },

    ShapeMismatch { expected_rows: usize, actual_rows: usize },

    EmptyDataset,

    InvalidOption { name: &'static str, reason: &'static str },

    // ---- Out of domain ----
    OutOfDomain { observable: String, event: usize, value: f64, lower: f64, upper: f64 },

    // ---- PDF domain ----
    Domain(DomainError),

    // ---- Convergence ----
    ConvergenceFailure { iterations: usize, status: String },

    // ---- Optimizer ----
    Optimization(OptError),
}

impl ModelError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::EmptyName
            | ModelError::InvalidBounds { .. }
            | ModelError::NonFiniteValue { .. }
            | ModelError::ValueOutsideBounds { .. }
            | ModelError::InvalidStep { .. }
            | ModelError::NoObservables
            | ModelError::DuplicateObservable { .. }
            | ModelError::UnknownObservable { .. }
            | ModelError::ShapeMismatch { .. }
            | ModelError::EmptyDataset
            | ModelError::InvalidOption { .. } => ErrorKind::Validation,
            ModelError::OutOfDomain { .. } => ErrorKind::OutOfDomain,
            ModelError::Domain(_) => ErrorKind::Domain,
            ModelError::ConvergenceFailure { .. } => ErrorKind::Convergence,
            ModelError::Optimization(_) => ErrorKind::Optimizer,
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Domain(err) => Some(err),
            ModelError::Optimization(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Validation ----
            ModelError::EmptyName => write!(f, "Name must be non-empty."),
            ModelError::InvalidBounds { name, lower, upper } => {
                write!(
                    f,
                    "'{name}' requires finite bounds with lower < upper; got [{lower}, {upper}]"
                )
            }
            ModelError::NonFiniteValue { name, value } => {
                write!(f, "'{name}' requires a finite value; got: {value}")
            }
            ModelError::ValueOutsideBounds { name, value, lower, upper } => {
                write!(f, "'{name}' = {value} lies outside its bounds [{lower}, {upper}]")
            }
            ModelError::InvalidStep { name, step } => {
                write!(f, "Step of '{name}' must be finite and > 0; got: {step}")
            }
            ModelError::NoObservables => write!(f, "A dataset needs at least one observable."),
            ModelError::DuplicateObservable { name } => {
                write!(f, "Observable '{name}' is registered more than once.")
            }
            ModelError::UnknownObservable { name } => {
                write!(f, "Observable '{name}' is not part of the dataset.")
            }
            ModelError::ShapeMismatch { expected_rows, actual_rows } => {
                write!(
                    f,
                    "Matrix must have one row per observable: expected {expected_rows}, \
                     got {actual_rows}"
                )
            }
            ModelError::EmptyDataset => write!(f, "Cannot fit an empty dataset."),
            ModelError::InvalidOption { name, reason } => {
                write!(f, "Invalid fit option '{name}': {reason}")
            }
            // ---- Out of domain ----
            ModelError::OutOfDomain { observable, event, value, lower, upper } => {
                write!(
                    f,
                    "Event {event}: '{observable}' = {value} lies outside [{lower}, {upper}]"
                )
            }
            // ---- PDF domain ----
            ModelError::Domain(err) => write!(f, "Domain error: {err}"),
            // ---- Convergence ----
            ModelError::ConvergenceFailure { iterations, status } => {
                write!(f, "Fit did not converge after {iterations} iterations: {status}")
            }
            // ---- Optimizer ----
            ModelError::Optimization(err) => write!(f, "Optimizer failed: {err}"),
        }
    }
}

impl From<DomainError> for ModelError {
    fn from(err: DomainError) -> Self {
        ModelError::Domain(err)
    }
}

impl From<OptError> for ModelError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::Domain(domain) => ModelError::Domain(domain),
            other => ModelError::Optimization(other),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ModelError> for PyErr {
    fn from(err: ModelError) -> PyErr {
        match err.kind() {
            ErrorKind::Validation | ErrorKind::OutOfDomain => {
                PyValueError::new_err(err.to_string())
            }
            ErrorKind::Domain => PyArithmeticError::new_err(err.to_string()),
            ErrorKind::Convergence | ErrorKind::Optimizer => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}
