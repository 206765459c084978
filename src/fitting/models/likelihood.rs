//! Unbinned log-likelihood of one [`Pdf`] over a [`Dataset`].
//!
//! Purpose
//! -------
//! Expose `ℓ̄(θ) = (1/n) Σᵢ [ln f(xᵢ; p(θ)) - ln Z(p(θ))]` as a
//! [`LogLikelihood`] on the unconstrained vector θ of free Variables.
//!
//! Key behaviors
//! -------------
//! - Free Variables map to θ through their [`BoundTransform`], divided by a
//!   per-coordinate scale fixed at construction
//!   ([`BoundTransform::coordinate_scale`]). θ is therefore of order one
//!   whatever the units of the parameter, and the gradient tolerance means
//!   the same thing for every parameter. Fixed Variables keep the value they
//!   had when the likelihood was built.
//! - Events are reduced in fixed-size chunks. Partial sums are combined in
//!   chunk order whether the chunks ran on rayon or sequentially, so the two
//!   paths return bit-identical values.
//! - The analytic gradient is used when the family provides one; otherwise
//!   [`OptError::GradientNotImplemented`] lets the adapter fall back to finite
//!   differences.
//!
//! Invariants & assumptions
//! ------------------------
//! - The value is a mean, not a sum, so tolerances do not scale with `n`.
//!   The fit layer multiplies by `n` when reporting.
//! - Any domain failure aborts the evaluation with [`OptError::Domain`].
use rayon::prelude::*;

use crate::{
    fitting::{
        core::{Dataset, FitOptions},
        errors::DomainError,
        pdf::Pdf,
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, Grad, LogLikelihood, Theta, validation::validate_theta},
        numerical_stability::BoundTransform,
    },
};

/// Mean log-likelihood of a [`Pdf`] in the free-parameter coordinates.
#[derive(Debug, Clone)]
pub struct UnbinnedLikelihood {
    pdf: Pdf,
    /// Positions of the free Variables in `pdf.variables()`.
    free: Vec<usize>,
    transforms: Vec<BoundTransform>,
    /// `θ = to_internal(x) / scale` for each free Variable.
    scales: Vec<f64>,
    /// External values of every Variable; free slots are overwritten per call.
    base: Vec<f64>,
    chunk_size: usize,
    parallel_threshold: usize,
    parallel: bool,
}

impl UnbinnedLikelihood {
    /// Snapshot `pdf`'s Variables: which are free, their transforms, and the
    /// current values of the fixed ones.
    pub fn new(pdf: &Pdf, options: &FitOptions) -> Self {
        let variables = pdf.variables();
        let free: Vec<usize> =
            variables.iter().enumerate().filter(|(_, v)| !v.is_fixed()).map(|(k, _)| k).collect();
        let transforms: Vec<BoundTransform> =
            free.iter().map(|&k| variables[k].transform()).collect();
        let base = pdf.parameter_values();
        let scales = free
            .iter()
            .zip(&transforms)
            .map(|(&k, t)| t.coordinate_scale(base[k], variables[k].step()))
            .collect();
        Self {
            pdf: pdf.clone(),
            free,
            transforms,
            scales,
            base,
            chunk_size: options.chunk_size.max(1),
            parallel_threshold: options.parallel_threshold,
            parallel: options.parallel,
        }
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    /// Indices of the free Variables within the PDF's Variable list.
    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    pub fn transforms(&self) -> &[BoundTransform] {
        &self.transforms
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Internal starting point from the current external values.
    pub fn initial_theta(&self) -> Theta {
        self.free
            .iter()
            .zip(self.transforms.iter().zip(&self.scales))
            .map(|(&k, (t, &s))| t.to_internal(self.base[k]) / s)
            .collect()
    }

    /// Full external parameter vector for `theta`.
    pub fn external(&self, theta: &Theta) -> Vec<f64> {
        let mut params = self.base.clone();
        for ((&k, (t, &s)), &th) in
            self.free.iter().zip(self.transforms.iter().zip(&self.scales)).zip(theta.iter())
        {
            params[k] = t.to_external(s * th);
        }
        params
    }

    /// Diagonal Jacobian `dx/dθ` of the free parameters.
    pub fn jacobian_diag(&self, theta: &Theta) -> Theta {
        self.transforms
            .iter()
            .zip(&self.scales)
            .zip(theta.iter())
            .map(|((t, &s), &th)| s * t.derivative(s * th))
            .collect()
    }

    fn column<'d>(&self, data: &'d Dataset) -> OptResult<&'d [f64]> {
        match data.column_of(self.pdf.observable()) {
            Some(xs) if !xs.is_empty() => Ok(xs),
            _ => Err(OptError::EmptyData),
        }
    }

    /// Map every chunk of `xs` through `f`, keeping chunk order.
    fn reduce_chunks<T, F>(&self, xs: &[f64], f: F) -> Result<Vec<T>, DomainError>
    where
        T: Send,
        F: Fn(&[f64]) -> Result<T, DomainError> + Sync + Send,
    {
        let partials: Vec<Result<T, DomainError>> =
            if self.parallel && xs.len() >= self.parallel_threshold {
                xs.par_chunks(self.chunk_size).map(&f).collect()
            } else {
                xs.chunks(self.chunk_size).map(&f).collect()
            };
        partials.into_iter().collect()
    }

    /// Sum of normalized log-densities over `xs` at external `params`.
    pub fn sum_log_density(&self, xs: &[f64], params: &[f64]) -> Result<f64, DomainError> {
        let log_z = self.pdf.log_normalization_at(params)?;
        let partials = self.reduce_chunks(xs, |chunk| {
            chunk.iter().try_fold(0.0, |acc, &x| {
                Ok::<f64, DomainError>(acc + self.pdf.log_density_with(x, params, log_z)?)
            })
        })?;
        Ok(partials.iter().sum())
    }
}

impl LogLikelihood for UnbinnedLikelihood {
    type Data = Dataset;

    /// Mean log-likelihood at internal `θ`.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost> {
        let xs = self.column(data)?;
        let params = self.external(theta);
        Ok(self.sum_log_density(xs, &params)? / xs.len() as f64)
    }

    /// Rejects an empty problem, a θ of the wrong length, and a starting
    /// point where the PDF is not defined.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        if self.free.is_empty() {
            return Err(OptError::NoFreeParameters);
        }
        validate_theta(theta, self.free.len())?;
        self.column(data)?;
        self.pdf.log_normalization_at(&self.external(theta))?;
        Ok(())
    }

    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let family = self.pdf.family();
        if !family.has_analytic_gradient() {
            return Err(OptError::GradientNotImplemented);
        }
        let xs = self.column(data)?;
        let params = self.external(theta);
        self.pdf.validate_params(&params)?;
        let n_params = params.len();

        let partials = self.reduce_chunks(xs, |chunk| {
            let mut acc = vec![0.0; n_params];
            for &x in chunk {
                family.add_grad_log_unnormalized(x, &params, &mut acc);
            }
            Ok(acc)
        })?;
        let mut grad_ext = vec![0.0; n_params];
        for partial in &partials {
            for (g, p) in grad_ext.iter_mut().zip(partial) {
                *g += p;
            }
        }

        let (lo, hi) = self.pdf.observable().bounds();
        let mut grad_log_z = vec![0.0; n_params];
        family.grad_log_normalization(&params, lo, hi, &mut grad_log_z);

        let n = xs.len() as f64;
        let jacobian = self.jacobian_diag(theta);
        let grad = self
            .free
            .iter()
            .zip(jacobian.iter())
            .map(|(&k, &dx)| (grad_ext[k] / n - grad_log_z[k]) * dx)
            .collect();
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::core::{Observable, Variable};
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - θ ↔ external mapping with fixed, bounded and large-valued Variables.
    // - Chunk size clamping.
    // - Mean log-likelihood against a direct per-event sum.
    // - Analytic gradients against central differences.
    // - Bit-identical parallel and sequential reductions.
    //
    // They intentionally DO NOT cover:
    // - Running the optimizer (see `fit` and `tests/`).
    // -------------------------------------------------------------------------

    fn dataset(x: &Observable, values: &[f64]) -> Dataset {
        let mut data = Dataset::new(&[x.clone()]).expect("valid dataset");
        for &v in values {
            x.set_value(v);
            data.add_event().expect("in domain");
        }
        data
    }

    fn spread(n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n).map(|i| lo + (hi - lo) * ((i as f64 * 0.618_033_988_75) % 1.0)).collect()
    }

    #[test]
    // Purpose
    // -------
    // Fixed Variables stay out of θ and keep their values in the external vector.
    //
    // Given
    // -----
    // - A Gaussian with μ = 1 (fixed) and σ = 2 bounded to [0.1, 10].
    //
    // Expect
    // ------
    // - One free parameter; `external(initial_theta())` reproduces (1, 2).
    fn fixed_variables_are_excluded_from_theta() {
        // Arrange
        let x = Observable::new("x", -5.0, 5.0).expect("valid");
        let mu = Variable::new("mu", 1.0).expect("valid");
        mu.set_fixed(true);
        let sigma = Variable::bounded("sigma", 2.0, 0.1, 0.1, 10.0).expect("valid");
        let pdf = Pdf::gaussian("g", &x, &mu, &sigma).expect("valid");

        // Act
        let ll = UnbinnedLikelihood::new(&pdf, &FitOptions::default());
        let theta0 = ll.initial_theta();
        let params = ll.external(&theta0);

        // Assert
        assert_eq!(ll.n_free(), 1);
        assert_eq!(ll.free_indices(), &[1]);
        assert_eq!(params[0], 1.0);
        assert_relative_eq!(params[1], 2.0, max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // `value` is the mean of per-event log-densities.
    //
    // Given
    // -----
    // - An exponential with α = -2 on [0, 10] and four events.
    //
    // Expect
    // ------
    // - value = mean(x/α) - ln Z.
    fn value_is_mean_normalized_log_density() {
        // Arrange
        let x = Observable::new("x", 0.0, 10.0).expect("valid");
        let alpha = Variable::new("alpha", -2.0).expect("valid");
        let pdf = Pdf::exponential("e", &x, &alpha).expect("valid");
        let data = dataset(&x, &[0.5, 1.0, 2.5, 7.0]);
        let ll = UnbinnedLikelihood::new(&pdf, &FitOptions::default());
        let log_z = pdf.log_normalization_at(&[-2.0]).expect("valid");

        // Act
        let value = ll.value(&ll.initial_theta(), &data).expect("finite");

        // Assert
        let expected = (0.5 + 1.0 + 2.5 + 7.0) / -2.0 / 4.0 - log_z;
        assert_relative_eq!(value, expected, max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The analytic gradient (with the bound chain rule) matches central
    // differences of `value`.
    //
    // Given
    // -----
    // - A Gaussian with μ free and σ bounded to [0.1, 10], 200 events on [-4, 4].
    //
    // Expect
    // ------
    // - Each component within 1e-6.
    fn analytic_gradient_matches_finite_differences() {
        // Arrange
        let x = Observable::new("x", -4.0, 4.0).expect("valid");
        let mu = Variable::new("mu", 0.3).expect("valid");
        let sigma = Variable::bounded("sigma", 1.5, 0.1, 0.1, 10.0).expect("valid");
        let pdf = Pdf::gaussian("g", &x, &mu, &sigma).expect("valid");
        let data = dataset(&x, &spread(200, -4.0, 4.0));
        let ll = UnbinnedLikelihood::new(&pdf, &FitOptions::default());
        let theta = ll.initial_theta();
        let h = 1e-6;

        // Act
        let grad = ll.grad(&theta, &data).expect("analytic");

        // Assert
        for k in 0..theta.len() {
            let (mut up, mut down) = (theta.clone(), theta.clone());
            up[k] += h;
            down[k] -= h;
            let v_up = ll.value(&up, &data).expect("finite");
            let v_down = ll.value(&down, &data).expect("finite");
            let fd = (v_up - v_down) / (2.0 * h);
            assert!((grad[k] - fd).abs() < 1e-6, "component {k}: {} vs {fd}", grad[k]);
        }
    }

    #[test]
    // Purpose
    // -------
    // Families without an analytic gradient defer to finite differences.
    //
    // Given
    // -----
    // - An ARGUS PDF.
    //
    // Expect
    // ------
    // - `grad` returns `GradientNotImplemented`.
    fn argus_gradient_is_not_implemented() {
        // Arrange
        let m = Observable::new("m", 5.2, 5.3).expect("valid");
        let m0 = Variable::new("m0", 5.291).expect("valid");
        let c = Variable::new("c", -20.0).expect("valid");
        let p = Variable::new("p", 0.5).expect("valid");
        let pdf = Pdf::argus("a", &m, &m0, &c, &p).expect("valid");
        let data = dataset(&m, &[5.25, 5.27]);
        let ll = UnbinnedLikelihood::new(&pdf, &FitOptions::default());

        // Act
        let err = ll.grad(&ll.initial_theta(), &data).expect_err("numeric only");

        // Assert
        assert!(matches!(err, OptError::GradientNotImplemented));
    }

    #[test]
    // Purpose
    // -------
    // Parallel and sequential chunk reductions give identical bits.
    //
    // Given
    // -----
    // - 50 000 events, chunk size 1000, threshold 0 for the parallel run.
    //
    // Expect
    // ------
    // - Equal values and gradients under `==`.
    fn parallel_and_sequential_reductions_are_bit_identical() {
        // Arrange
        let x = Observable::new("x", 0.0, 10.0).expect("valid");
        let alpha = Variable::new("alpha", -1.7).expect("valid");
        let pdf = Pdf::exponential("e", &x, &alpha).expect("valid");
        let data = dataset(&x, &spread(50_000, 0.0, 10.0));
        let base = FitOptions::new(Default::default(), false, true, 0, 1000).expect("valid");
        let par = UnbinnedLikelihood::new(&pdf, &base);
        let seq = UnbinnedLikelihood::new(&pdf, &base.clone().with_parallel(false));
        let theta: Array1<f64> = array![-1.7];

        // Act
        let (v_par, v_seq) = (par.value(&theta, &data), seq.value(&theta, &data));
        let (g_par, g_seq) = (par.grad(&theta, &data), seq.grad(&theta, &data));

        // Assert
        assert_eq!(v_par.expect("finite"), v_seq.expect("finite"));
        assert_eq!(g_par.expect("analytic"), g_seq.expect("analytic"));
    }

    #[test]
    // Purpose
    // -------
    // A zero slope surfaces as a domain error, and a PDF with only fixed
    // Variables is rejected by `check`.
    //
    // Given
    // -----
    // - α = 0, then α fixed at -1.
    //
    // Expect
    // ------
    // - `OptError::Domain(ZeroSlope)`, then `NoFreeParameters`.
    fn check_reports_domain_and_empty_problems() {
        // Arrange
        let x = Observable::new("x", 0.0, 10.0).expect("valid");
        let alpha = Variable::new("alpha", 0.0).expect("valid");
        let pdf = Pdf::exponential("e", &x, &alpha).expect("valid");
        let data = dataset(&x, &[1.0]);

        // Act
        let ll = UnbinnedLikelihood::new(&pdf, &FitOptions::default());
        let zero = ll.check(&ll.initial_theta(), &data);
        alpha.set_value(-1.0);
        alpha.set_fixed(true);
        let ll = UnbinnedLikelihood::new(&pdf, &FitOptions::default());
        let fixed = ll.check(&ll.initial_theta(), &data);

        // Assert
        assert!(matches!(zero, Err(OptError::Domain(DomainError::ZeroSlope { .. }))));
        assert!(matches!(fixed, Err(OptError::NoFreeParameters)));
    }

    #[test]
    // Purpose
    // -------
    // A parameter of order 1e5 is searched in a coordinate of order one, and
    // its gradient is as large as that of the same problem in unit scale.
    //
    // Given
    // -----
    // - Exponentials on [0, 10] with α = -1.5 and on [0, 1e6] with α = -1.5e5,
    //   with the same events multiplied by 1e5.
    //
    // Expect
    // ------
    // - Scales 1.5 and 1.5e5, so θ₀ = -1 for both problems.
    // - `external` restores -1.5e5, and the gradients in θ agree up to
    //   rounding.
    fn large_parameters_are_rescaled_to_unit_coordinates() {
        // Arrange
        let events = spread(500, 0.0, 10.0);
        let x_unit = Observable::new("x", 0.0, 10.0).expect("valid");
        let a_unit = Variable::new("alpha", -1.5).expect("valid");
        let unit = Pdf::exponential("e", &x_unit, &a_unit).expect("valid");
        let d_unit = dataset(&x_unit, &events);
        let x_big = Observable::new("x", 0.0, 1e6).expect("valid");
        let a_big = Variable::new("alpha", -1.5e5).expect("valid");
        let big = Pdf::exponential("e", &x_big, &a_big).expect("valid");
        let scaled: Vec<f64> = events.iter().map(|v| v * 1e5).collect();
        let d_big = dataset(&x_big, &scaled);

        // Act
        let ll_unit = UnbinnedLikelihood::new(&unit, &FitOptions::default());
        let ll_big = UnbinnedLikelihood::new(&big, &FitOptions::default());
        let theta = ll_big.initial_theta();
        let g_unit = ll_unit.grad(&ll_unit.initial_theta(), &d_unit).expect("analytic");
        let g_big = ll_big.grad(&theta, &d_big).expect("analytic");

        // Assert
        assert_eq!((ll_unit.scales(), ll_big.scales()), (&[1.5][..], &[1.5e5][..]));
        assert_relative_eq!(theta[0], -1.0, max_relative = 1e-12);
        assert_relative_eq!(ll_big.external(&theta)[0], -1.5e5, max_relative = 1e-12);
        assert_relative_eq!(g_big[0], g_unit[0], max_relative = 1e-8);
    }

    #[test]
    // Purpose
    // -------
    // A zero chunk size built by struct update is treated as one event per
    // chunk instead of panicking.
    //
    // Given
    // -----
    // - `FitOptions { chunk_size: 0, .. }` and four events.
    //
    // Expect
    // ------
    // - The same value as with default options.
    fn zero_chunk_size_is_clamped_to_one() {
        // Arrange
        let x = Observable::new("x", 0.0, 10.0).expect("valid");
        let alpha = Variable::new("alpha", -2.0).expect("valid");
        let pdf = Pdf::exponential("e", &x, &alpha).expect("valid");
        let data = dataset(&x, &[0.5, 1.0, 2.5, 7.0]);
        let zero = FitOptions { chunk_size: 0, ..FitOptions::default() };
        let ll = UnbinnedLikelihood::new(&pdf, &zero);
        let reference = UnbinnedLikelihood::new(&pdf, &FitOptions::default());

        // Act
        let value = ll.value(&ll.initial_theta(), &data).expect("finite");

        // Assert
        let expected = reference.value(&reference.initial_theta(), &data).expect("finite");
        assert_relative_eq!(value, expected, max_relative = 1e-12);
    }
}
