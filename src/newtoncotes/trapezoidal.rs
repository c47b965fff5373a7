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

/// Extended trapezoidal rule, doubling the grid until two successive sums
/// agree to the requested relative accuracy.
///
/// The error estimate `0.5 · I · relative_accuracy` is a heuristic O(h²)
/// proxy, not a bound.
#[derive(Debug, Clone)]
pub struct TrapezoidalRule {
    criterion: ConvergenceCriterion,
}

impl TrapezoidalRule {
    pub fn new(criterion: ConvergenceCriterion) -> TrapezoidalRule {
        TrapezoidalRule { criterion }
    }

    pub fn criterion(&self) -> &ConvergenceCriterion {
        &self.criterion
    }
}

impl Default for TrapezoidalRule {
    fn default() -> Self {
        TrapezoidalRule::new(ConvergenceCriterion::newton_cotes())
    }
}

impl Integrator for TrapezoidalRule {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::Trapezoidal
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
        tracker.begin_bootstrap(TrapezoidRefinement::INITIAL_EVALUATIONS)?;
        let mut refinement = TrapezoidRefinement::new(integrand, &domain);
        tracker.bootstrap(refinement.value())?;

        let relative_accuracy = loop {
            tracker.begin_round(refinement.next_evaluations())?;
            refinement.refine(integrand);
            let relative_accuracy = tracker.record(refinement.value())?;
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
    use crate::integrator::convergence::ZeroReferencePolicy;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::PI;

    fn gaussian(z: f64) -> f64 {
        (-z * z).exp() / PI.sqrt()
    }

    #[test]
    fn test_gaussian_integral() {
        let result = TrapezoidalRule::default().integrate(&gaussian, -5.0, 5.0, 1e-4).unwrap();
        assert_relative_eq!(result.estimate(), 1.0, max_relative = 5e-4);
        assert!(result.error_estimate() >= 0.0);
    }

    #[test]
    fn test_constant_converges_after_first_round() {
        for tolerance in [1e-2, 1e-8, 1e-14] {
            let result = TrapezoidalRule::default().integrate(&|_x: f64| 3.0, 0.0, 2.0, tolerance).unwrap();
            assert_eq!(result.estimate(), 6.0);
            assert_eq!(result.iterations(), 1);
            assert_eq!(result.evaluation_count(), 3);
            assert_eq!(result.error_estimate(), 0.0);
        }
    }

    #[test]
    fn test_sine() {
        let result = TrapezoidalRule::default().integrate(&f64::sin, 0.0, PI, 1e-8).unwrap();
        assert_abs_diff_eq!(result.estimate(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let rule = TrapezoidalRule::default();
        let first = rule.integrate(&gaussian, -5.0, 5.0, 1e-6).unwrap();
        let second = rule.integrate(&gaussian, -5.0, 5.0, 1e-6).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.estimate().to_bits(), second.estimate().to_bits());
    }

    #[test]
    fn test_evaluations_monotone_in_tolerance() {
        let rule = TrapezoidalRule::default();
        let f = |x: f64| x.exp() * x.cos();
        let mut previous = 0;
        for tolerance in [1e-3, 1e-4, 1e-5, 1e-6] {
            let result = rule.integrate(&f, 0.0, 2.0, tolerance).unwrap();
            assert!(result.evaluation_count() >= previous);
            previous = result.evaluation_count();
        }
    }

    #[test]
    fn test_evaluation_count_is_grid_size() {
        let result = TrapezoidalRule::default().integrate(&|x: f64| x * x, 0.0, 1.0, 1e-6).unwrap();
        // after k rounds the grid has 2^k + 1 points
        assert_eq!(result.evaluation_count(), (1 << result.iterations()) + 1);
    }

    #[test]
    fn test_invalid_input() {
        let rule = TrapezoidalRule::default();
        assert_eq!(
            rule.integrate(&gaussian, 1.0, -1.0, 1e-4),
            Err(IntegrationError::InvalidInterval { lower: 1.0, upper: -1.0 })
        );
        assert_eq!(
            rule.integrate(&gaussian, -1.0, 1.0, 0.0),
            Err(IntegrationError::InvalidTolerance { tolerance: 0.0 })
        );
    }

    #[test]
    fn test_odd_integrand_on_symmetric_domain() {
        // T_0 is exactly zero, the fallback compares absolute change
        let result = TrapezoidalRule::default().integrate(&f64::sin, -1.0, 1.0, 1e-6).unwrap();
        assert_abs_diff_eq!(result.estimate(), 0.0, epsilon = 1e-12);

        let strict = TrapezoidalRule::new(
            ConvergenceCriterion::newton_cotes().with_zero_reference(ZeroReferencePolicy::Fail),
        );
        assert_eq!(
            strict.integrate(&f64::sin, -1.0, 1.0, 1e-6),
            Err(IntegrationError::ZeroReference {
                method: IntegrationMethod::Trapezoidal,
                iteration: 1
            })
        );
    }

    #[test]
    fn test_iteration_cap() {
        let capped = TrapezoidalRule::new(ConvergenceCriterion::newton_cotes().with_max_iterations(2));
        let result = capped.integrate(&gaussian, -5.0, 5.0, 1e-12);
        assert!(matches!(
            result,
            Err(IntegrationError::DidNotConverge { iterations: 2, evaluations: 5, .. })
        ));
    }
}
