//! Numeric normalization by composite Gauss–Legendre quadrature.
//!
//! Used for families without a closed-form integral. The integrand is passed
//! in log space and the panel sums are combined with log-sum-exp, so steep
//! densities neither overflow nor lose their tails.
use std::f64::consts::PI;

/// Nodes per panel.
pub const GL_ORDER: usize = 32;

/// Equal-width panels over the integration range.
pub const GL_PANELS: usize = 16;

/// Gauss–Legendre nodes and weights on `[-1, 1]` (Newton iteration on `Pₙ`).
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;
    for i in 0..n.div_ceil(2) {
        let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            let (mut p1, mut p2) = (1.0, 0.0);
            for j in 0..n {
                let p3 = p2;
                p2 = p1;
                let jf = j as f64;
                p1 = ((2.0 * jf + 1.0) * z * p2 - jf * p3) / (jf + 1.0);
            }
            dp = nf * (z * p1 - p2) / (z * z - 1.0);
            let z_prev = z;
            z = z_prev - p1 / dp;
            if (z - z_prev).abs() < 1e-15 {
                break;
            }
        }
        let w = 2.0 / ((1.0 - z * z) * dp * dp);
        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }
    (nodes, weights)
}

/// `ln ∫ₗₒʰⁱ exp(log_f(x)) dx`.
///
/// Returns `-∞` when no node has a finite log-integrand, or when
/// `hi <= lo`; callers turn that into a domain error.
pub fn log_integrate<F: Fn(f64) -> f64>(log_f: F, lo: f64, hi: f64) -> f64 {
    if !(hi > lo) {
        return f64::NEG_INFINITY;
    }
    let (nodes, weights) = gauss_legendre(GL_ORDER);
    let width = (hi - lo) / GL_PANELS as f64;
    let half = 0.5 * width;
    let mut terms = Vec::with_capacity(GL_ORDER * GL_PANELS);
    for panel in 0..GL_PANELS {
        let mid = lo + (panel as f64 + 0.5) * width;
        for (&t, &w) in nodes.iter().zip(&weights) {
            let lf = log_f(mid + half * t);
            if lf.is_finite() {
                terms.push(lf + (w * half).ln());
            }
        }
    }
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = terms.iter().map(|&t| (t - max).exp()).sum();
    max + sum.ln()
}

/// Plain composite Gauss–Legendre integral of `f` over `[lo, hi]`.
pub fn integrate<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64) -> f64 {
    let (nodes, weights) = gauss_legendre(GL_ORDER);
    let width = (hi - lo) / GL_PANELS as f64;
    let half = 0.5 * width;
    (0..GL_PANELS)
        .map(|panel| {
            let mid = lo + (panel as f64 + 0.5) * width;
            nodes.iter().zip(&weights).map(|(&t, &w)| w * f(mid + half * t)).sum::<f64>() * half
        })
        .sum()
}
