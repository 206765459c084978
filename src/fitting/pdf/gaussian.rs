//! Gaussian density truncated to the observable's domain.
//!
//! `f(x) = exp(-½ z²)` with `z = (x - μ)/σ`, normalized analytically by
//! `Z = σ √(2π) (Φ(b) - Φ(a))` where `a, b` are the standardized bounds.
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use statrs::function::erf::{erf, erfc};

use crate::fitting::{errors::DomainError, pdf::DensityFamily};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gaussian;

impl DensityFamily for Gaussian {
    fn family(&self) -> &'static str {
        "gaussian"
    }

    fn n_params(&self) -> usize {
        2
    }

    fn validate(&self, params: &[f64], names: &[&str]) -> Result<(), DomainError> {
        for (k, &value) in params.iter().enumerate() {
            if !value.is_finite() {
                return Err(DomainError::NonFiniteParameter { name: names[k].to_string(), value });
            }
        }
        let sigma = params[1];
        if sigma <= 0.0 {
            return Err(DomainError::NonPositiveWidth { name: names[1].to_string(), value: sigma });
        }
        Ok(())
    }

    fn log_unnormalized(&self, x: f64, params: &[f64]) -> f64 {
        let z = (x - params[0]) / params[1];
        -0.5 * z * z
    }

    fn log_normalization(&self, params: &[f64], lo: f64, hi: f64) -> Option<f64> {
        let (mu, sigma) = (params[0], params[1]);
        let p = standard_normal_mass((lo - mu) / sigma, (hi - mu) / sigma);
        Some(sigma.ln() + 0.5 * (2.0 * PI).ln() + p.ln())
    }

    fn has_analytic_gradient(&self) -> bool {
        true
    }

    fn add_grad_log_unnormalized(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let sigma = params[1];
        let z = (x - params[0]) / sigma;
        out[0] += z / sigma;
        out[1] += z * z / sigma;
    }

    fn grad_log_normalization(&self, params: &[f64], lo: f64, hi: f64, out: &mut [f64]) {
        let (mu, sigma) = (params[0], params[1]);
        let (a, b) = ((lo - mu) / sigma, (hi - mu) / sigma);
        let p = standard_normal_mass(a, b);
        let (phi_a, phi_b) = (standard_normal_pdf(a), standard_normal_pdf(b));
        out[0] = (phi_a - phi_b) / (sigma * p);
        out[1] = 1.0 / sigma + (a * phi_a - b * phi_b) / (sigma * p);
    }
}

fn standard_normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

/// `Φ(b) - Φ(a)` without cancellation in either tail.
fn standard_normal_mass(a: f64, b: f64) -> f64 {
    if a >= 0.0 {
        0.5 * (erfc(a * FRAC_1_SQRT_2) - erfc(b * FRAC_1_SQRT_2))
    } else if b <= 0.0 {
        0.5 * (erfc(-b * FRAC_1_SQRT_2) - erfc(-a * FRAC_1_SQRT_2))
    } else {
        0.5 * (erf(b * FRAC_1_SQRT_2) - erf(a * FRAC_1_SQRT_2))
    }
}
