//! fitting::pdf — normalized densities over one Observable.
//!
//! Purpose
//! -------
//! Model a closed set of density families behind one trait,
//! [`DensityFamily`], and a [`Pdf`] that binds a family to the exact
//! Observable and Variable handles it was built with.
//!
//! Key behaviors
//! -------------
//! - Each family supplies `ln f(x; p)` and parameter validation, and may
//!   supply an analytic `ln Z(p)` plus analytic gradients.
//! - [`Pdf::log_normalization_at`] uses the analytic normalization when the
//!   family has one and composite Gauss–Legendre quadrature otherwise.
//! - The fit code only talks to [`Pdf`]; it never matches on the family.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter slices are ordered like [`Pdf::variables`] and hold
//!   external (bounded) values.
//! - A normalization that is non-positive or non-finite is a
//!   [`DomainError`], never a silent `NaN`/`∞`.
use std::fmt;

use crate::fitting::{
    core::{DataPoint, Dataset, FitOptions, Observable, Variable},
    errors::{DomainError, ModelError, ModelResult},
    models::{FitManager, FitResult},
};

pub mod argus;
pub mod exponential;
pub mod gaussian;
pub mod normalization;

pub use self::argus::Argus;
pub use self::exponential::Exponential;
pub use self::gaussian::Gaussian;

/// One family of one-dimensional densities.
///
/// Gradient hooks are only called when [`has_analytic_gradient`] is `true`;
/// such families must also provide [`log_normalization`].
///
/// [`has_analytic_gradient`]: DensityFamily::has_analytic_gradient
/// [`log_normalization`]: DensityFamily::log_normalization
pub trait DensityFamily: fmt::Debug + Send + Sync {
    fn family(&self) -> &'static str;

    fn n_params(&self) -> usize;

    /// Reject parameter values for which the density is undefined.
    /// `names` are the Variable names, in parameter order.
    fn validate(&self, params: &[f64], names: &[&str]) -> Result<(), DomainError>;

    /// `ln f(x; p)`; `-∞` where the density is zero.
    fn log_unnormalized(&self, x: f64, params: &[f64]) -> f64;

    /// Closed-form `ln Z(p)` over `[lo, hi]`, if the family has one.
    fn log_normalization(&self, _params: &[f64], _lo: f64, _hi: f64) -> Option<f64> {
        None
    }

    /// Integration range for numeric normalization.
    fn support(&self, _params: &[f64], lo: f64, hi: f64) -> (f64, f64) {
        (lo, hi)
    }

    fn has_analytic_gradient(&self) -> bool {
        false
    }

    /// Add `∂ ln f(x; p)/∂p` into `out`.
    fn add_grad_log_unnormalized(&self, _x: f64, _params: &[f64], _out: &mut [f64]) {}

    /// Write `∂ ln Z(p)/∂p` into `out`.
    fn grad_log_normalization(&self, _params: &[f64], _lo: f64, _hi: f64, _out: &mut [f64]) {}
}

/// Closed set of supported families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfKind {
    Exponential(Exponential),
    Gaussian(Gaussian),
    Argus(Argus),
}

impl PdfKind {
    pub fn family(&self) -> &dyn DensityFamily {
        match self {
            PdfKind::Exponential(f) => f,
            PdfKind::Gaussian(f) => f,
            PdfKind::Argus(f) => f,
        }
    }
}

/// A named density bound to its Observable and Variables.
///
/// Stateless with respect to data; the same `Pdf` can be fitted to any
/// [`Dataset`] that contains its Observable.
#[derive(Debug, Clone)]
pub struct Pdf {
    name: String,
    observable: Observable,
    variables: Vec<Variable>,
    kind: PdfKind,
}

impl Pdf {
    /// `exp(x / alpha)` on the Observable's domain.
    pub fn exponential(
        name: impl Into<String>, observable: &Observable, alpha: &Variable,
    ) -> ModelResult<Self> {
        Self::build(name, observable, vec![alpha.clone()], PdfKind::Exponential(Exponential))
    }

    /// Gaussian truncated to the Observable's domain.
    pub fn gaussian(
        name: impl Into<String>, observable: &Observable, mean: &Variable, sigma: &Variable,
    ) -> ModelResult<Self> {
        Self::build(
            name,
            observable,
            vec![mean.clone(), sigma.clone()],
            PdfKind::Gaussian(Gaussian),
        )
    }

    /// ARGUS shape with endpoint `m0`, curvature `slope` and `power`.
    pub fn argus(
        name: impl Into<String>, observable: &Observable, m0: &Variable, slope: &Variable,
        power: &Variable,
    ) -> ModelResult<Self> {
        Self::build(
            name,
            observable,
            vec![m0.clone(), slope.clone(), power.clone()],
            PdfKind::Argus(Argus),
        )
    }

    fn build(
        name: impl Into<String>, observable: &Observable, variables: Vec<Variable>, kind: PdfKind,
    ) -> ModelResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        Ok(Self { name, observable: observable.clone(), variables, kind })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn kind(&self) -> PdfKind {
        self.kind
    }

    pub fn family(&self) -> &dyn DensityFamily {
        self.kind.family()
    }

    /// Current values of all Variables, in parameter order.
    pub fn parameter_values(&self) -> Vec<f64> {
        self.variables.iter().map(Variable::value).collect()
    }

    pub(crate) fn parameter_names(&self) -> Vec<&str> {
        self.variables.iter().map(Variable::name).collect()
    }

    /// Validate `params` for this family.
    pub fn validate_params(&self, params: &[f64]) -> Result<(), DomainError> {
        self.family().validate(params, &self.parameter_names())
    }

    /// `ln Z(params)` over the Observable's domain, analytic when available.
    ///
    /// # Errors
    /// - Family validation errors.
    /// - [`DomainError::NonPositiveNormalization`] if `Z` is not positive and finite.
    pub fn log_normalization_at(&self, params: &[f64]) -> Result<f64, DomainError> {
        self.validate_params(params)?;
        let family = self.family();
        let (lo, hi) = self.observable.bounds();
        let log_z = match family.log_normalization(params, lo, hi) {
            Some(log_z) => log_z,
            None => {
                let (a, b) = family.support(params, lo, hi);
                normalization::log_integrate(|x| family.log_unnormalized(x, params), a, b)
            }
        };
        if !log_z.is_finite() {
            return Err(DomainError::NonPositiveNormalization {
                pdf: self.name.clone(),
                value: log_z.exp(),
            });
        }
        Ok(log_z)
    }

    /// Normalization constant `Z` at the current Variable values.
    pub fn normalization(&self) -> ModelResult<f64> {
        Ok(self.log_normalization_at(&self.parameter_values())?.exp())
    }

    /// Unnormalized density `f(x)` at the current Variable values.
    pub fn unnormalized(&self, x: f64) -> f64 {
        self.family().log_unnormalized(x, &self.parameter_values()).exp()
    }

    /// Normalized log-density of one event at the current Variable values.
    ///
    /// # Errors
    /// - [`ModelError::UnknownObservable`] if the point has no coordinate for
    ///   this PDF's Observable.
    /// - [`ModelError::Domain`] for invalid parameters, a degenerate
    ///   normalization, or a zero density at the point.
    pub fn log_density(&self, point: &DataPoint<'_>) -> ModelResult<f64> {
        let x = point.get(&self.observable).ok_or_else(|| ModelError::UnknownObservable {
            name: self.observable.name().to_string(),
        })?;
        let params = self.parameter_values();
        let log_z = self.log_normalization_at(&params)?;
        Ok(self.log_density_with(x, &params, log_z)?)
    }

    /// `ln f(x) - ln Z`, rejecting non-finite results.
    pub(crate) fn log_density_with(
        &self, x: f64, params: &[f64], log_z: f64,
    ) -> Result<f64, DomainError> {
        let value = self.family().log_unnormalized(x, params) - log_z;
        if !value.is_finite() {
            return Err(DomainError::NonFiniteDensity { pdf: self.name.clone(), value });
        }
        Ok(value)
    }

    /// Fit to `data` with default options; see [`FitManager::fit`].
    pub fn fit_to(&self, data: &Dataset) -> ModelResult<FitResult> {
        FitManager::new(self).fit(data)
    }

    /// Fit to `data` with explicit options.
    pub fn fit_to_with(&self, data: &Dataset, options: FitOptions) -> ModelResult<FitResult> {
        FitManager::new(self).with_options(options).fit(data)
    }
}
