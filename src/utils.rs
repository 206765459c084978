//! Python-side argument conversion shared by the bindings in `lib.rs`.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    fitting::{core::FitOptions, errors::ModelError},
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

/// Accept a float64 ndarray, a pandas Series, or any float sequence.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            return Ok(series_ro);
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Accept a 2-D float64 ndarray (observables × events).
///
/// A 1-D input is read as a single observable row, which covers the common
/// `from_matrix(x)` call on a one-dimensional dataset.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray2<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro);
    }
    let row = extract_f64_array(py, raw_data)?;
    let values = row.as_array().to_owned();
    let n = values.len();
    let matrix = values
        .into_shape((1, n))
        .map_err(|e| PyValueError::new_err(format!("cannot reshape events: {e}")))?;
    Ok(matrix.into_pyarray(py).readonly())
}

/// Build [`FitOptions`] from optional Python keyword arguments.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn extract_fit_options(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: Option<bool>,
    compute_covariance: Option<bool>, parallel: Option<bool>,
) -> PyResult<FitOptions> {
    use std::str::FromStr;

    let defaults = FitOptions::default();

    // Tolerances::new -> OptResult<Tolerances> -> ModelError -> PyErr
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        defaults.mle_opts.tols
    } else {
        let max_iter = max_iter.or(defaults.mle_opts.tols.max_iter);
        Tolerances::new(tol_grad, tol_cost, max_iter).map_err(ModelError::from)?
    };

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(ModelError::from)?,
        None => LineSearcher::MoreThuente,
    };

    let mle_opts = MLEOptions::new(tols, ls, verbose.unwrap_or(false), lbfgs_mem)
        .map_err(ModelError::from)?;

    Ok(FitOptions::new(
        mle_opts,
        compute_covariance.unwrap_or(defaults.compute_covariance),
        parallel.unwrap_or(defaults.parallel),
        defaults.parallel_threshold,
        defaults.chunk_size,
    )?)
}
