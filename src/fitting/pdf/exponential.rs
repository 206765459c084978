//! Exponential density `f(x) = exp(x / α)` on `[lo, hi]`.
//!
//! Normalization is analytic: `Z(α) = α (e^{hi/α} - e^{lo/α})`, evaluated in
//! log space through the slope `λ = 1/α` so that small `|α|` does not overflow.
use crate::fitting::{errors::DomainError, pdf::DensityFamily};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exponential;

impl Exponential {
    /// Plain closed form `α (e^{hi/α} - e^{lo/α})`. Overflows for small `|α|`;
    /// the fit always goes through [`log_z_and_mean`].
    pub fn z(alpha: f64, lo: f64, hi: f64) -> f64 {
        alpha * ((hi / alpha).exp() - (lo / alpha).exp())
    }
}

impl DensityFamily for Exponential {
    fn family(&self) -> &'static str {
        "exponential"
    }

    fn n_params(&self) -> usize {
        1
    }

    fn validate(&self, params: &[f64], names: &[&str]) -> Result<(), DomainError> {
        let alpha = params[0];
        if !alpha.is_finite() {
            return Err(DomainError::NonFiniteParameter {
                name: names[0].to_string(),
                value: alpha,
            });
        }
        if alpha == 0.0 {
            return Err(DomainError::ZeroSlope { name: names[0].to_string() });
        }
        Ok(())
    }

    fn log_unnormalized(&self, x: f64, params: &[f64]) -> f64 {
        x / params[0]
    }

    fn log_normalization(&self, params: &[f64], lo: f64, hi: f64) -> Option<f64> {
        Some(log_z_and_mean(1.0 / params[0], lo, hi).0)
    }

    fn has_analytic_gradient(&self) -> bool {
        true
    }

    fn add_grad_log_unnormalized(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let alpha = params[0];
        out[0] -= x / (alpha * alpha);
    }

    fn grad_log_normalization(&self, params: &[f64], lo: f64, hi: f64, out: &mut [f64]) {
        // d logZ/dα = E[x] · dλ/dα = -E[x] / α².
        let alpha = params[0];
        let (_, mean) = log_z_and_mean(1.0 / alpha, lo, hi);
        out[0] = -mean / (alpha * alpha);
    }
}

/// `(ln ∫ₗₒʰⁱ e^{λx} dx, E[x])` for the truncated exponential family.
pub fn log_z_and_mean(lambda: f64, lo: f64, hi: f64) -> (f64, f64) {
    // Flat over the whole range: e^{λx} varies by less than 1e-12.
    if (lambda * (hi - lo)).abs() < 1e-12 {
        return ((hi - lo).ln(), 0.5 * (lo + hi));
    }
    let (t_lo, t_hi) = (lambda * lo, lambda * hi);
    let (big, small, x_big, x_small) =
        if t_hi >= t_lo { (t_hi, t_lo, hi, lo) } else { (t_lo, t_hi, lo, hi) };
    // r = e^{small - big} ∈ [0, 1)
    let r = (small - big).exp();
    let denom = 1.0 - r;
    if denom <= 0.0 {
        return ((hi - lo).ln(), 0.5 * (lo + hi));
    }
    let log_z = big + (-r).ln_1p() - lambda.abs().ln();
    let mean = (x_big - x_small * r) / denom - 1.0 / lambda;
    (log_z, mean)
}
