//! rust_unbinned — unbinned maximum-likelihood fitting with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the fitting API to Python via the `_rust_unbinned` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`fitting`] (observables, variables,
//!   datasets, PDFs, and the fit), [`optimization`] (argmin-backed maximizer),
//!   and [`inference`] (covariance from the observed information).
//! - [`fit_info`] returns version and thread-pool information as a value;
//!   nothing in the crate prints.
//! - With `python-bindings`, define `#[pyclass]` wrappers and the
//!   `#[pymodule]` initializer for `_rust_unbinned`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - Python wrappers share the underlying handles: an `Observable` passed to
//!   both a dataset and a PDF is the same instance on the Rust side.
//!
//! Conventions
//! -----------
//! - Python method names follow the historical camelCase API (`addEvent`,
//!   `fitTo`) next to snake_case properties.
//! - Errors from core Rust code are converted to `PyErr` at the boundary
//!   (`ValueError` for validation, `ArithmeticError` for domain failures,
//!   `RuntimeError` otherwise).
//!
//! Example
//! -------
//! ```no_run
//! use rust_unbinned::fitting::prelude::*;
//!
//! # fn main() -> rust_unbinned::fitting::errors::ModelResult<()> {
//! let x = Observable::new("xvar", 0.0, 10.0)?;
//! let mut data = Dataset::new(&[x.clone()])?;
//! for v in [0.3, 1.2, 2.5, 0.7] {
//!     x.set_value(v);
//!     data.add_event()?;
//! }
//! let alpha = Variable::bounded("alpha", -2.0, 0.1, -10.0, 10.0)?;
//! let pdf = Pdf::exponential("exppdf", &x, &alpha)?;
//! let result = pdf.fit_to(&data)?;
//! println!("alpha = {} ± {:?}", alpha.value(), alpha.error());
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

pub mod fitting;
pub mod inference;
pub mod info;
pub mod optimization;
pub mod utils;

pub use crate::info::{FitInfo, fit_info};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyValueError,
    prelude::*,
    types::{PyAny, PyTuple},
};

#[cfg(feature = "python-bindings")]
use crate::{
    fitting::{
        core::{Dataset, Observable, Variable},
        models::FitResult,
        pdf::Pdf,
    },
    utils::{extract_f64_matrix, extract_fit_options},
};

/// Observable — bounded measured dimension.
///
/// Constructed from Python via `Observable(name, lower, upper)`. The `value`
/// property is the current coordinate read by `UnbinnedDataSet.addEvent`.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "Observable", module = "rust_unbinned")]
#[derive(Clone)]
pub struct PyObservable {
    inner: Observable,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyObservable {
    #[new]
    #[pyo3(text_signature = "(name, lower, upper)")]
    pub fn new(name: &str, lower: f64, upper: f64) -> PyResult<Self> {
        Ok(PyObservable { inner: Observable::new(name, lower, upper)? })
    }

    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    #[getter]
    pub fn lower(&self) -> f64 {
        self.inner.lower()
    }

    #[getter]
    pub fn upper(&self) -> f64 {
        self.inner.upper()
    }

    #[getter]
    pub fn get_value(&self) -> f64 {
        self.inner.value()
    }

    #[setter]
    pub fn set_value(&self, value: f64) {
        self.inner.set_value(value);
    }

    fn __repr__(&self) -> String {
        format!(
            "Observable({:?}, {}, {})",
            self.inner.name(),
            self.inner.lower(),
            self.inner.upper()
        )
    }
}

/// Variable — fit parameter, updated in place by `fitTo`.
///
/// Constructed from Python via `Variable(name, value, step=None, lower=None,
/// upper=None)`; bounds must bracket `value`.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "Variable", module = "rust_unbinned")]
#[derive(Clone)]
pub struct PyVariable {
    inner: Variable,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyVariable {
    #[new]
    #[pyo3(
        signature = (name, value, step = None, lower = None, upper = None),
        text_signature = "(name, value, /, step=None, lower=None, upper=None)"
    )]
    pub fn new(
        name: &str, value: f64, step: Option<f64>, lower: Option<f64>, upper: Option<f64>,
    ) -> PyResult<Self> {
        Ok(PyVariable { inner: Variable::build(name, value, step, lower, upper)? })
    }

    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    #[getter]
    pub fn get_value(&self) -> f64 {
        self.inner.value()
    }

    #[setter]
    pub fn set_value(&self, value: f64) {
        self.inner.set_value(value);
    }

    #[getter]
    pub fn error(&self) -> Option<f64> {
        self.inner.error()
    }

    #[getter]
    pub fn lower(&self) -> Option<f64> {
        self.inner.lower()
    }

    #[getter]
    pub fn upper(&self) -> Option<f64> {
        self.inner.upper()
    }

    #[getter]
    pub fn get_fixed(&self) -> bool {
        self.inner.is_fixed()
    }

    #[setter]
    pub fn set_fixed(&self, fixed: bool) {
        self.inner.set_fixed(fixed);
    }

    fn __repr__(&self) -> String {
        match self.inner.error() {
            Some(err) => {
                format!("Variable({:?}, {} ± {})", self.inner.name(), self.inner.value(), err)
            }
            None => format!("Variable({:?}, {})", self.inner.name(), self.inner.value()),
        }
    }
}

/// UnbinnedDataSet — column-wise event storage over one or more Observables.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "UnbinnedDataSet", module = "rust_unbinned")]
pub struct PyUnbinnedDataSet {
    inner: Dataset,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyUnbinnedDataSet {
    #[new]
    #[pyo3(signature = (*observables), text_signature = "(*observables)")]
    pub fn new(observables: &Bound<'_, PyTuple>) -> PyResult<Self> {
        let observables = observables
            .iter()
            .map(|obs| obs.extract::<PyObservable>().map(|o| o.inner))
            .collect::<PyResult<Vec<_>>>()?;
        Ok(PyUnbinnedDataSet { inner: Dataset::new(&observables)? })
    }

    /// Append one event from the Observables' current values.
    #[pyo3(name = "addEvent")]
    pub fn add_event(&mut self) -> PyResult<()> {
        Ok(self.inner.add_event()?)
    }

    /// Bulk import of an `observables × events` matrix; returns the number of
    /// events kept.
    #[pyo3(signature = (matrix, filter = false), text_signature = "(matrix, /, filter=False)")]
    pub fn from_matrix<'py>(
        &mut self, py: Python<'py>, matrix: &Bound<'py, PyAny>, filter: bool,
    ) -> PyResult<usize> {
        let arr = extract_f64_matrix(py, matrix)?;
        Ok(self.inner.from_matrix(arr.as_array(), filter)?)
    }

    #[pyo3(name = "getNumEvents")]
    pub fn num_events(&self) -> usize {
        self.inner.len()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Stored values of one Observable, in event order.
    pub fn column(&self, name: &str) -> PyResult<Vec<f64>> {
        self.inner
            .column(name)
            .map(<[f64]>::to_vec)
            .ok_or_else(|| PyValueError::new_err(format!("no observable named {name:?}")))
    }
}

/// Shared `fitTo` body for the PDF wrappers.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
fn fit_pdf(
    pdf: &Pdf, data: &PyUnbinnedDataSet, tol_grad: Option<f64>, tol_cost: Option<f64>,
    max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
    verbose: Option<bool>, compute_covariance: Option<bool>, parallel: Option<bool>,
) -> PyResult<PyFitResult> {
    let options = extract_fit_options(
        tol_grad,
        tol_cost,
        max_iter,
        line_searcher,
        lbfgs_mem,
        verbose,
        compute_covariance,
        parallel,
    )?;
    Ok(PyFitResult { inner: pdf.fit_to_with(&data.inner, options)? })
}

/// ExpPdf — `exp(x / alpha)` on the Observable's domain.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "ExpPdf", module = "rust_unbinned")]
pub struct PyExpPdf {
    inner: Pdf,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyExpPdf {
    #[new]
    #[pyo3(text_signature = "(name, observable, alpha)")]
    pub fn new(
        name: &str, observable: PyRef<'_, PyObservable>, alpha: PyRef<'_, PyVariable>,
    ) -> PyResult<Self> {
        Ok(PyExpPdf { inner: Pdf::exponential(name, &observable.inner, &alpha.inner)? })
    }

    /// Normalization constant at the current Variable values.
    pub fn normalization(&self) -> PyResult<f64> {
        Ok(self.inner.normalization()?)
    }

    #[pyo3(
        name = "fitTo",
        signature = (
            data,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            verbose = None,
            compute_covariance = None,
            parallel = None,
        ),
        text_signature = "(data, /, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None, verbose=None, \
                          compute_covariance=None, parallel=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit_to(
        &self, data: PyRef<'_, PyUnbinnedDataSet>, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
        verbose: Option<bool>, compute_covariance: Option<bool>, parallel: Option<bool>,
    ) -> PyResult<PyFitResult> {
        fit_pdf(
            &self.inner,
            &data,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            verbose,
            compute_covariance,
            parallel,
        )
    }
}

/// GaussianPdf — normal density truncated to the Observable's domain.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "GaussianPdf", module = "rust_unbinned")]
pub struct PyGaussianPdf {
    inner: Pdf,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyGaussianPdf {
    #[new]
    #[pyo3(text_signature = "(name, observable, mean, sigma)")]
    pub fn new(
        name: &str, observable: PyRef<'_, PyObservable>, mean: PyRef<'_, PyVariable>,
        sigma: PyRef<'_, PyVariable>,
    ) -> PyResult<Self> {
        Ok(PyGaussianPdf {
            inner: Pdf::gaussian(name, &observable.inner, &mean.inner, &sigma.inner)?,
        })
    }

    pub fn normalization(&self) -> PyResult<f64> {
        Ok(self.inner.normalization()?)
    }

    #[pyo3(
        name = "fitTo",
        signature = (
            data,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            verbose = None,
            compute_covariance = None,
            parallel = None,
        ),
        text_signature = "(data, /, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None, verbose=None, \
                          compute_covariance=None, parallel=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit_to(
        &self, data: PyRef<'_, PyUnbinnedDataSet>, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
        verbose: Option<bool>, compute_covariance: Option<bool>, parallel: Option<bool>,
    ) -> PyResult<PyFitResult> {
        fit_pdf(
            &self.inner,
            &data,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            verbose,
            compute_covariance,
            parallel,
        )
    }
}

/// ArgusPdf — ARGUS shape with endpoint `m0`, curvature `c` and power `p`.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "ArgusPdf", module = "rust_unbinned")]
pub struct PyArgusPdf {
    inner: Pdf,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyArgusPdf {
    #[new]
    #[pyo3(text_signature = "(name, observable, m0, c, p)")]
    pub fn new(
        name: &str, observable: PyRef<'_, PyObservable>, m0: PyRef<'_, PyVariable>,
        c: PyRef<'_, PyVariable>, p: PyRef<'_, PyVariable>,
    ) -> PyResult<Self> {
        Ok(PyArgusPdf {
            inner: Pdf::argus(name, &observable.inner, &m0.inner, &c.inner, &p.inner)?,
        })
    }

    /// Normalization by Gauss–Legendre quadrature at the current values.
    pub fn normalization(&self) -> PyResult<f64> {
        Ok(self.inner.normalization()?)
    }

    #[pyo3(
        name = "fitTo",
        signature = (
            data,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            verbose = None,
            compute_covariance = None,
            parallel = None,
        ),
        text_signature = "(data, /, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None, verbose=None, \
                          compute_covariance=None, parallel=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit_to(
        &self, data: PyRef<'_, PyUnbinnedDataSet>, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
        verbose: Option<bool>, compute_covariance: Option<bool>, parallel: Option<bool>,
    ) -> PyResult<PyFitResult> {
        fit_pdf(
            &self.inner,
            &data,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            verbose,
            compute_covariance,
            parallel,
        )
    }
}

/// FitResult — read-only view of a converged fit.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FitResult", module = "rust_unbinned")]
pub struct PyFitResult {
    inner: FitResult,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFitResult {
    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn log_likelihood(&self) -> f64 {
        self.inner.log_likelihood
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn grad_norm(&self) -> Option<f64> {
        self.inner.grad_norm
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.inner.fn_evals.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    /// `(name, value, error)` for every Variable of the PDF.
    #[getter]
    pub fn parameters(&self) -> Vec<(String, f64, Option<f64>)> {
        self.inner.parameters.iter().map(|p| (p.name.clone(), p.value, p.error)).collect()
    }

    /// Covariance of the free parameters as nested lists, if it was computed.
    #[getter]
    pub fn covariance(&self) -> Option<Vec<Vec<f64>>> {
        self.inner
            .covariance
            .as_ref()
            .map(|cov| cov.rows().into_iter().map(|row| row.to_vec()).collect())
    }
}

/// Version and worker-thread count, formatted for display.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "fit_info")]
fn py_fit_info() -> String {
    fit_info().to_string()
}

/// _rust_unbinned — PyO3 module initializer for the Python extension.
///
/// Registers every wrapper class and `fit_info` on the top-level module;
/// there are no submodules.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_unbinned<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<PyObservable>()?;
    m.add_class::<PyVariable>()?;
    m.add_class::<PyUnbinnedDataSet>()?;
    m.add_class::<PyExpPdf>()?;
    m.add_class::<PyGaussianPdf>()?;
    m.add_class::<PyArgusPdf>()?;
    m.add_class::<PyFitResult>()?;
    m.add_function(wrap_pyfunction!(py_fit_info, m)?)?;
    Ok(())
}
