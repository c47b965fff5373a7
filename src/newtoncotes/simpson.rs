use crate::integrator::convergence::{
    ConvergenceCriterion,
    RefinementTracker
};
use crate::integrator::integrand::Integrand;
use crate::integrator::integrationerror::IntegrationError;
use crate::integrator::integrationmethod::IntegrationMethod;
use crate::integrator::integrator::{
    IntegrationDomain,
    IntegrationResult,
    Integrator
};
use crate::newtoncotes::trapezoidrefinement::TrapezoidRefinement;

/// Evaluations of the two-level bootstrap: T_0 (both endpoints) and T_1 (midpoint).
const BOOTSTRAP_EVALUATIONS: usize = 3;

/// Richardson extrapolation of two successive trapezoidal sums,
/// S = (4·T_{j+1} - T_j) / 3, cancelling the O(h²) term.
fn richardson(fine: f64, coarse: f64) -> f64 {
    4.0 * fine / 3.0 - coarse / 3.0
}

/// Extended Simpson's rule built on the same step-halving trapezoidal
/// refinement as [`TrapezoidalRule`](crate::newtoncotes::trapezoidal::TrapezoidalRule).
#[derive(Debug, Clone)]
pub struct SimpsonRule {
    criterion: ConvergenceCriterion,
}

impl SimpsonRule {
    pub fn new(criterion: ConvergenceCriterion) -> SimpsonRule {
        SimpsonRule { criterion }
    }

    pub fn criterion(&self) -> &ConvergenceCriterion {
        &self.criterion
    }
}

impl Default for SimpsonRule {
    fn default() -> Self {
        SimpsonRule::new(ConvergenceCriterion::newton_cotes())
    }
}

impl Integrator for SimpsonRule {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::Simpson
    }

    fn integrate(
        &self,
        integrand: &dyn Integrand,
        lower: f64,
        upper: f64,
        tolerance: f64,
    ) -> Result<IntegrationResult, IntegrationError> {
        let domain = IntegrationDomain::new(lower, upper)?;
        ConvergenceCriterion::validate_tolerance(tolerance)?;
        self.criterion.validate()?;

        let mut tracker = RefinementTracker::new(self.method(), &self.criterion, tolerance);
        tracker.begin_bootstrap(BOOTSTRAP_EVALUATIONS)?;
        let mut refinement = TrapezoidRefinement::new(integrand, &domain);
        let mut coarse = refinement.value();
        refinement.refine(integrand);
        tracker.bootstrap(richardson(refinement.value(), coarse))?;

        let relative_accuracy = loop {
            tracker.begin_round(refinement.next_evaluations())?;
            coarse = refinement.value();
            refinement.refine(integrand);
            let relative_accuracy = tracker.record(richardson(refinement.value(), coarse))?;
            if relative_accuracy < tolerance {
                break relative_accuracy;
            }
        };

        let error = tracker.estimate() * 0.5 * relative_accuracy;
        Ok(tracker.finish(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newtoncotes::trapezoidal::TrapezoidalRule;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::PI;

    fn gaussian(z: f64) -> f64 {
        (-z * z).exp() / PI.sqrt()
    }

    #[test]
    fn test_gaussian_integral() {
        let result = SimpsonRule::default().integrate(&gaussian, -5.0, 5.0, 1e-4).unwrap();
        assert_relative_eq!(result.estimate(), 1.0, max_relative = 5e-4);
    }

    #[test]
    fn test_exact_for_cubics() {
        let cubic = |x: f64| x * x * x - 2.0 * x + 1.0;
        let result = SimpsonRule::default().integrate(&cubic, 0.0, 2.0, 1e-10).unwrap();
        // ∫_0^2 = 4 - 4 + 2
        assert_abs_diff_eq!(result.estimate(), 2.0, epsilon = 1e-12);
        assert_eq!(result.iterations(), 1);
        assert_eq!(result.evaluation_count(), BOOTSTRAP_EVALUATIONS + 2);
    }

    #[test]
    fn test_evaluation_count_is_grid_size() {
        let result = SimpsonRule::default().integrate(&f64::exp, 0.0, 1.0, 1e-9).unwrap();
        // the finest trapezoidal level holds 2^(k+1) + 1 points after k rounds
        assert_eq!(result.evaluation_count(), (1 << (result.iterations() + 1)) + 1);
        assert_abs_diff_eq!(result.estimate(), std::f64::consts::E - 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_fewer_evaluations_than_trapezoid_for_smooth_integrand() {
        let f = |x: f64| x.exp();
        let simpson = SimpsonRule::default().integrate(&f, 0.0, 1.0, 1e-8).unwrap();
        let trapezoid = TrapezoidalRule::default().integrate(&f, 0.0, 1.0, 1e-8).unwrap();
        assert!(simpson.evaluation_count() < trapezoid.evaluation_count());
    }

    #[test]
    fn test_deterministic_and_monotone() {
        let rule = SimpsonRule::default();
        let f = |x: f64| 1.0 / (1.0 + x * x);
        let mut previous = 0;
        for tolerance in [1e-3, 1e-4, 1e-5, 1e-6] {
            let first = rule.integrate(&f, 0.0, 4.0, tolerance).unwrap();
            let second = rule.integrate(&f, 0.0, 4.0, tolerance).unwrap();
            assert_eq!(first, second);
            assert!(first.evaluation_count() >= previous);
            previous = first.evaluation_count();
        }
    }

    #[test]
    fn test_invalid_tolerance() {
        assert!(matches!(
            SimpsonRule::default().integrate(&gaussian, 0.0, 1.0, -1e-3),
            Err(IntegrationError::InvalidTolerance { .. })
        ));
    }
}
