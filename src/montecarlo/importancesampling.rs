use std::sync::Arc;

use rand_pcg::Pcg64;
use tracing::warn;

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
use crate::montecarlo::samplingdensity::{
    LinearDensity,
    SamplingDensity
};

/// Monte Carlo integration with points drawn from `density`, each weighted
/// by `f(z)/pdf(z)`.
///
/// The density fixes the integration range: its support is used even when the
/// caller asks for a different interval.
#[derive(Debug, Clone)]
pub struct ImportanceSampling {
    density: Arc<dyn SamplingDensity>,
    options: MonteCarloOptions,
    criterion: ConvergenceCriterion,
}

impl ImportanceSampling {
    pub fn new(density: Arc<dyn SamplingDensity>,
               options: MonteCarloOptions,
               criterion: ConvergenceCriterion) -> Result<ImportanceSampling, IntegrationError> {
        options.validate()?;
        criterion.validate()?;
        Ok(ImportanceSampling { density, options, criterion })
    }

    pub fn density(&self) -> &Arc<dyn SamplingDensity> {
        &self.density
    }

    pub fn options(&self) -> &MonteCarloOptions {
        &self.options
    }

    pub fn criterion(&self) -> &ConvergenceCriterion {
        &self.criterion
    }
}

impl Default for ImportanceSampling {
    fn default() -> Self {
        ImportanceSampling {
            density: Arc::new(LinearDensity::default()),
            options: MonteCarloOptions::default(),
            criterion: ConvergenceCriterion::monte_carlo(),
        }
    }
}

impl Integrator for ImportanceSampling {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::ImportanceSampling
    }

    fn reseeded(&self, seed: u64) -> Option<Arc<dyn Integrator>> {
        Some(Arc::new(ImportanceSampling {
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
        IntegrationDomain::new(lower, upper)?;
        ConvergenceCriterion::validate_tolerance(tolerance)?;

        let (support_lower, support_upper) = self.density.support();
        if support_lower != lower || support_upper != upper {
            warn!(
                lower,
                upper,
                support_lower,
                support_upper,
                "sampling density support differs from the requested interval, integrating over the support"
            );
        }

        let sampler = self.options.sampler();
        let mut rng = master_rng(self.options.seed);
        let density = self.density.as_ref();
        let draw = |rng: &mut Pcg64| {
            let z = density.sample(rng);
            integrand.value(z) / density.pdf(z)
        };

        let mut tracker = RefinementTracker::new(self.method(), &self.criterion, tolerance);
        let mut samples = self.options.initial_samples;
        tracker.begin_bootstrap(samples)?;
        let mut moments = sampler.sample(&mut rng, samples, draw);
        tracker.bootstrap(moments.mean())?;

        loop {
            samples = self.options.next_sample_count(samples);
            tracker.begin_round(samples)?;
            moments = sampler.sample(&mut rng, samples, draw);
            let relative_accuracy = tracker.record(moments.mean())?;
            if relative_accuracy <= tolerance {
                break;
            }
        }

        Ok(tracker.finish(moments.standard_error()))
    }
}
