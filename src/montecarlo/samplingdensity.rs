use std::fmt::Debug;

use rand::Rng;
use rand_pcg::Pcg64;

use crate::integrator::integrationerror::IntegrationError;

/// Density with an analytic inverse CDF, used to draw importance samples.
///
/// `pdf` must be normalised to one over `support()` and positive inside it.
pub trait SamplingDensity: Send + Sync + Debug {
    fn pdf(&self, z: f64) -> f64;

    /// Maps `u ∈ [0, 1)` to a point of the support.
    fn inverse_cdf(&self, u: f64) -> f64;

    fn support(&self) -> (f64, f64);

    fn sample(&self, rng: &mut Pcg64) -> f64 {
        self.inverse_cdf(rng.random::<f64>())
    }
}

fn validate_support(lower: f64, upper: f64) -> Result<(), IntegrationError> {
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(IntegrationError::invalid_parameter(
            "density",
            format!("support [{}, {}] is not a finite interval", lower, upper),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// LinearDensity
// ─────────────────────────────────────────────────────────────────────────────

/// `pdf(z) = slope·z + intercept` on `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDensity {
    slope: f64,
    intercept: f64,
    lower: f64,
    upper: f64,
}

impl LinearDensity {
    const NORMALISATION_TOLERANCE: f64 = 1e-9;

    pub fn new(slope: f64,
               intercept: f64,
               lower: f64,
               upper: f64) -> Result<LinearDensity, IntegrationError> {
        validate_support(lower, upper)?;
        let density = LinearDensity { slope, intercept, lower, upper };
        if !(density.pdf(lower) >= 0.0 && density.pdf(upper) >= 0.0) {
            return Err(IntegrationError::invalid_parameter(
                "density",
                format!("linear pdf {}·z + {} is negative on [{}, {}]", slope, intercept, lower, upper),
            ));
        }
        let mass = slope * (upper * upper - lower * lower) / 2.0 + intercept * (upper - lower);
        if (mass - 1.0).abs() > Self::NORMALISATION_TOLERANCE {
            return Err(IntegrationError::invalid_parameter(
                "density",
                format!("linear pdf integrates to {} instead of 1", mass),
            ));
        }
        Ok(density)
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Default for LinearDensity {
    /// `pdf(z) = -0.48z + 0.98` on `[0, 2]`.
    fn default() -> Self {
        LinearDensity {
            slope: -0.48,
            intercept: 0.98,
            lower: 0.0,
            upper: 2.0,
        }
    }
}

impl SamplingDensity for LinearDensity {
    fn pdf(&self, z: f64) -> f64 {
        if z < self.lower || z > self.upper {
            return 0.0;
        }
        self.slope * z + self.intercept
    }

    // cdf(lower + t) = p0·t + slope·t²/2, solved for t in the cancellation-free form
    fn inverse_cdf(&self, u: f64) -> f64 {
        let p0 = self.slope * self.lower + self.intercept;
        let denominator = p0 + (p0 * p0 + 2.0 * self.slope * u).max(0.0).sqrt();
        if denominator <= 0.0 {
            return self.lower;
        }
        (self.lower + 2.0 * u / denominator).clamp(self.lower, self.upper)
    }

    fn support(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UniformDensity
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDensity {
    lower: f64,
    upper: f64,
}

impl UniformDensity {
    pub fn new(lower: f64, upper: f64) -> Result<UniformDensity, IntegrationError> {
        validate_support(lower, upper)?;
        Ok(UniformDensity { lower, upper })
    }
}

impl SamplingDensity for UniformDensity {
    fn pdf(&self, z: f64) -> f64 {
        if z < self.lower || z > self.upper {
            return 0.0;
        }
        1.0 / (self.upper - self.lower)
    }

    fn inverse_cdf(&self, u: f64) -> f64 {
        self.lower + (self.upper - self.lower) * u
    }

    fn support(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TruncatedCauchyDensity
// ─────────────────────────────────────────────────────────────────────────────
//
// Cauchy 分布截斷在 [lower, upper]：cdf 以 atan 表示，反函數直接用 tan。

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncatedCauchyDensity {
    location: f64,
    scale: f64,
    lower: f64,
    upper: f64,
    angle_lower: f64,
    mass: f64,
}

impl TruncatedCauchyDensity {
    pub fn new(location: f64,
               scale: f64,
               lower: f64,
               upper: f64) -> Result<TruncatedCauchyDensity, IntegrationError> {
        validate_support(lower, upper)?;
        if !location.is_finite() || !scale.is_finite() || scale <= 0.0 {
            return Err(IntegrationError::invalid_parameter(
                "density",
                format!("cauchy location {} and scale {} must be finite with scale > 0", location, scale),
            ));
        }
        let angle_lower = ((lower - location) / scale).atan();
        let angle_upper = ((upper - location) / scale).atan();
        Ok(TruncatedCauchyDensity {
            location,
            scale,
            lower,
            upper,
            angle_lower,
            mass: angle_upper - angle_lower,
        })
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl SamplingDensity for TruncatedCauchyDensity {
    fn pdf(&self, z: f64) -> f64 {
        if z < self.lower || z > self.upper {
            return 0.0;
        }
        let x = (z - self.location) / self.scale;
        1.0 / (self.scale * (1.0 + x * x) * self.mass)
    }

    fn inverse_cdf(&self, u: f64) -> f64 {
        let z = self.location + self.scale * (self.angle_lower + u * self.mass).tan();
        z.clamp(self.lower, self.upper)
    }

    fn support(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::integrator::Integrator;
    use crate::montecarlo::sampler::master_rng;
    use crate::newtoncotes::simpson::SimpsonRule;
    use approx::assert_abs_diff_eq;

    fn mass_of(density: &dyn SamplingDensity) -> f64 {
        let (lower, upper) = density.support();
        SimpsonRule::default()
            .integrate(&|z: f64| density.pdf(z), lower, upper, 1e-10)
            .unwrap()
            .estimate()
    }

    #[test]
    fn test_default_linear_density() {
        let density = LinearDensity::default();
        assert_eq!(density.support(), (0.0, 2.0));
        assert_abs_diff_eq!(density.pdf(0.0), 0.98);
        assert_abs_diff_eq!(density.pdf(2.0), 0.02, epsilon = 1e-12);
        assert_eq!(density.pdf(2.5), 0.0);
        assert_eq!(LinearDensity::new(-0.48, 0.98, 0.0, 2.0).unwrap(), density);
    }

    #[test]
    fn test_linear_inverse_matches_closed_form() {
        let density = LinearDensity::default();
        for u in [0.0, 0.1, 0.25, 0.5, 0.75, 0.999] {
            let closed_form = (-0.98 + (0.98f64 * 0.98 - 4.0 * 0.24 * u).sqrt()) / -0.48;
            assert_abs_diff_eq!(density.inverse_cdf(u), closed_form, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_draws_follow_pdf() {
        let density = LinearDensity::default();
        let mut rng = master_rng(Some(2024));
        let draws = 100_000;
        let bins = 10;
        let mut counts = vec![0usize; bins];
        for _ in 0..draws {
            let z = density.sample(&mut rng);
            assert!((0.0..2.0).contains(&z));
            counts[((z / 2.0 * bins as f64) as usize).min(bins - 1)] += 1;
        }
        let cdf = |z: f64| 0.98 * z - 0.24 * z * z;
        for (i, count) in counts.iter().enumerate() {
            let left = 2.0 * i as f64 / bins as f64;
            let right = 2.0 * (i + 1) as f64 / bins as f64;
            let expected = cdf(right) - cdf(left);
            assert_abs_diff_eq!(*count as f64 / draws as f64, expected, epsilon = 0.006);
        }
    }

    #[test]
    fn test_densities_are_normalised() {
        assert_abs_diff_eq!(mass_of(&LinearDensity::default()), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(mass_of(&UniformDensity::new(-3.0, 1.0).unwrap()), 1.0, epsilon = 1e-8);
        let cauchy = TruncatedCauchyDensity::new(0.5, 1.5, -5.0, 5.0).unwrap();
        assert_abs_diff_eq!(mass_of(&cauchy), 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_cauchy_inverse_stays_in_support() {
        let cauchy = TruncatedCauchyDensity::new(0.0, 1.0, -5.0, 5.0).unwrap();
        assert_abs_diff_eq!(cauchy.inverse_cdf(0.0), -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cauchy.inverse_cdf(0.5), 0.0, epsilon = 1e-12);
        assert!(cauchy.inverse_cdf(0.999_999) <= 5.0);
    }

    #[test]
    fn test_invalid_densities() {
        // mass 2
        assert!(LinearDensity::new(0.0, 1.0, 0.0, 2.0).is_err());
        // negative near the upper end
        assert!(LinearDensity::new(-1.0, 1.5, 0.0, 2.0).is_err());
        assert!(UniformDensity::new(1.0, 1.0).is_err());
        assert!(TruncatedCauchyDensity::new(0.0, 0.0, -1.0, 1.0).is_err());
        assert!(TruncatedCauchyDensity::new(0.0, 1.0, f64::NEG_INFINITY, 1.0).is_err());
    }
}
