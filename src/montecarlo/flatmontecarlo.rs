use std::sync::Arc;

use rand::Rng;
use rand_pcg::Pcg64;

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
use crate::montecarlo::sampler::{
    master_rng,
    MonteCarloOptions
};

/// Monte Carlo integration with uniformly distributed points.
///
/// Every round draws a fresh batch, 1% larger than the previous one, and
/// estimates `(b-a)·mean(f)`. The reported error is the standard error of the
/// last batch only; repeat the call and average when a confidence interval is
/// needed.
#[derive(Debug, Clone)]
pub struct FlatMonteCarlo {
    options: MonteCarloOptions,
    criterion: ConvergenceCriterion,
}

impl FlatMonteCarlo {
    pub fn new(options: MonteCarloOptions,
               criterion: ConvergenceCriterion) -> Result<FlatMonteCarlo, IntegrationError> {
        options.validate()?;
        criterion.validate()?;
        Ok(FlatMonteCarlo { options, criterion })
    }

    pub fn options(&self) -> &MonteCarloOptions {
        &self.options
    }

    pub fn criterion(&self) -> &ConvergenceCriterion {
        &self.criterion
    }
}

impl Default for FlatMonteCarlo {
    fn default() -> Self {
        FlatMonteCarlo {
            options: MonteCarloOptions::default(),
            criterion: ConvergenceCriterion::monte_carlo(),
        }
    }
}

impl Integrator for FlatMonteCarlo {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::FlatMonteCarlo
    }

    fn reseeded(&self, seed: u64) -> Option<Arc<dyn Integrator>> {
        Some(Arc::new(FlatMonteCarlo {
            options: self.options.with_seed(seed),
            ..self.clone()
        }))
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

        let sampler = self.options.sampler();
        let mut rng = master_rng(self.options.seed);
        let draw = |rng: &mut Pcg64| integrand.value(domain.point_at(rng.random::<f64>()));

        let mut tracker = RefinementTracker::new(self.method(), &self.criterion, tolerance);
        let mut samples = self.options.initial_samples;
        tracker.begin_bootstrap(samples)?;
        let mut moments = sampler.sample(&mut rng, samples, draw);
        tracker.bootstrap(domain.width() * moments.mean())?;

        loop {
            samples = self.options.next_sample_count(samples);
            tracker.begin_round(samples)?;
            moments = sampler.sample(&mut rng, samples, draw);
            let relative_accuracy = tracker.record(domain.width() * moments.mean())?;
            if relative_accuracy <= tolerance {
                break;
            }
        }

        Ok(tracker.finish(moments.standard_error()))
    }
}
