//! ARGUS background shape.
//!
//! `f(m) = m (1 - (m/m₀)²)^p exp(c (1 - (m/m₀)²))` for `0 < m < m₀`, zero
//! elsewhere. Parameters are ordered `(m₀, c, p)`. There is no closed-form
//! integral over an arbitrary window, so normalization is numeric and the
//! gradient comes from finite differences.
use crate::fitting::{errors::DomainError, pdf::DensityFamily};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Argus;

impl DensityFamily for Argus {
    fn family(&self) -> &'static str {
        "argus"
    }

    fn n_params(&self) -> usize {
        3
    }

    fn validate(&self, params: &[f64], names: &[&str]) -> Result<(), DomainError> {
        for (k, &value) in params.iter().enumerate() {
            if !value.is_finite() {
                return Err(DomainError::NonFiniteParameter { name: names[k].to_string(), value });
            }
        }
        if params[0] <= 0.0 {
            return Err(DomainError::InvalidParameter {
                name: names[0].to_string(),
                value: params[0],
                reason: "The endpoint must be > 0.",
            });
        }
        if params[2] < 0.0 {
            return Err(DomainError::InvalidParameter {
                name: names[2].to_string(),
                value: params[2],
                reason: "The power must be >= 0.",
            });
        }
        Ok(())
    }

    fn log_unnormalized(&self, x: f64, params: &[f64]) -> f64 {
        let (m0, c, p) = (params[0], params[1], params[2]);
        let t = x / m0;
        let u = 1.0 - t * t;
        if x <= 0.0 || u <= 0.0 {
            return f64::NEG_INFINITY;
        }
        x.ln() + p * u.ln() + c * u
    }

    fn support(&self, params: &[f64], lo: f64, hi: f64) -> (f64, f64) {
        (lo.max(0.0), hi.min(params[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::pdf::normalization::{integrate, log_integrate};
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // The density vanishes outside `(0, m₀)`.
    //
    // Given
    // -----
    // - m₀ = 5.29, c = -20, p = 0.5 at m ∈ {0, 5.29, 6}.
    //
    // Expect
    // ------
    // - `-∞` at all three points, finite inside.
    fn log_unnormalized_is_zero_density_outside_support() {
        // Arrange
        let params = [5.29, -20.0, 0.5];

        // Act / Assert
        for m in [0.0, 5.29, 6.0] {
            assert_eq!(Argus.log_unnormalized(m, &params), f64::NEG_INFINITY);
        }
        assert!(Argus.log_unnormalized(5.2, &params).is_finite());
    }

    #[test]
    // Purpose
    // -------
    // Numeric normalization over the support makes the density integrate to one.
    //
    // Given
    // -----
    // - m₀ = 5.29, c = -20, p = 0.5 on the window [5.2, 5.3].
    //
    // Expect
    // ------
    // - ∫ exp(log f - log Z) over the support ≈ 1.
    fn numeric_normalization_integrates_to_one() {
        // Arrange
        let params = [5.29, -20.0, 0.5];
        let (lo, hi) = Argus.support(&params, 5.2, 5.3);

        // Act
        let log_z = log_integrate(|m| Argus.log_unnormalized(m, &params), lo, hi);
        let total = integrate(|m| (Argus.log_unnormalized(m, &params) - log_z).exp(), lo, hi);

        // Assert
        assert_eq!(hi, 5.29);
        assert_relative_eq!(total, 1.0, max_relative = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Non-positive endpoints and negative powers are domain errors.
    //
    // Given
    // -----
    // - m₀ = 0, then p = -1.
    //
    // Expect
    // ------
    // - `InvalidParameter` naming the offending variable.
    fn validate_rejects_bad_endpoint_and_power() {
        // Arrange
        let names = ["m0", "c", "p"];

        // Act
        let endpoint = Argus.validate(&[0.0, -1.0, 0.5], &names);
        let power = Argus.validate(&[5.0, -1.0, -1.0], &names);

        // Assert
        assert!(matches!(
            endpoint,
            Err(DomainError::InvalidParameter { ref name, .. }) if name == "m0"
        ));
        assert!(matches!(
            power,
            Err(DomainError::InvalidParameter { ref name, .. }) if name == "p"
        ));
    }
}
