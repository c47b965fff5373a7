use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::Deserialize;

use crate::integrator::convergence::{
    ConvergenceCriterion,
    RefinementTracker
};
use crate::integrator::integrand::Integrand;
use crate::integrator::integrationerror::IntegrationError;
use crate::integrator::integrationmethod::IntegrationMethod;
use crate::integrator::integrator::{
    equal_spans,
    IntegrationDomain,
    IntegrationResult,
    Integrator
};
use crate::montecarlo::sampler::master_rng;
use crate::montecarlo::subinterval::{
    sample_sub_interval,
    SubInterval
};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptions {
    /// Pieces of the initial partition, and children of every split (default 10).
    pub divisions: usize,
    /// Uniform points drawn in every sub-interval per round (default 100).
    pub sampling_size: usize,
    pub seed: Option<u64>,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        AdaptiveOptions {
            divisions: 10,
            sampling_size: 100,
            seed: None,
        }
    }
}

impl AdaptiveOptions {
    pub fn with_seed(mut self, seed: u64) -> AdaptiveOptions {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), IntegrationError> {
        if self.divisions < 2 {
            return Err(IntegrationError::invalid_parameter("divisions", "must be at least 2"));
        }
        if self.sampling_size < 2 {
            return Err(IntegrationError::invalid_parameter("sampling_size", "must be at least 2"));
        }
        Ok(())
    }
}

/// Result of an adaptive run together with the final partition.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveOutcome {
    pub result: IntegrationResult,
    pub partition: Vec<SubInterval>,
}

/// Monte Carlo integration over a partition that is refined where the
/// sampled integrand varies most.
///
/// Every round splits the sub-interval with the largest spread into
/// `divisions` equal children and re-samples the whole partition.
#[derive(Debug, Clone)]
pub struct AdaptiveMonteCarlo {
    options: AdaptiveOptions,
    criterion: ConvergenceCriterion,
}

impl AdaptiveMonteCarlo {
    pub fn new(options: AdaptiveOptions,
               criterion: ConvergenceCriterion) -> Result<AdaptiveMonteCarlo, IntegrationError> {
        options.validate()?;
        criterion.validate()?;
        Ok(AdaptiveMonteCarlo { options, criterion })
    }

    pub fn options(&self) -> &AdaptiveOptions {
        &self.options
    }

    pub fn criterion(&self) -> &ConvergenceCriterion {
        &self.criterion
    }

    /// Same as [`Integrator::integrate`], also returning the final partition.
    pub fn integrate_with_partition(&self,
                                    integrand: &dyn Integrand,
                                    lower: f64,
                                    upper: f64,
                                    tolerance: f64) -> Result<AdaptiveOutcome, IntegrationError> {
        let domain = IntegrationDomain::new(lower, upper)?;
        ConvergenceCriterion::validate_tolerance(tolerance)?;

        let mut tracker = RefinementTracker::new(self.method(), &self.criterion, tolerance);
        tracker.begin_bootstrap(self.round_evaluations(self.options.divisions))?;

        let mut rng = master_rng(self.options.seed);
        let mut spans = domain.equal_spans(self.options.divisions);
        let mut partition = self.sample_partition(integrand, &spans, &mut rng);
        tracker.bootstrap(total(&partition))?;

        loop {
            // a split replaces one piece with `divisions` children
            let pieces = spans.len().saturating_add(self.options.divisions - 1);
            tracker.begin_round(self.round_evaluations(pieces))?;

            let index = widest_spread(&partition);
            let (left, right) = spans[index];
            spans.splice(index..=index, equal_spans(left, right, self.options.divisions));
            partition = self.sample_partition(integrand, &spans, &mut rng);
            let relative_accuracy = tracker.record(total(&partition))?;
            if relative_accuracy < tolerance {
                break;
            }
        }

        let error = self.error_estimate(&partition, domain.width());
        Ok(AdaptiveOutcome {
            result: tracker.finish(error),
            partition,
        })
    }

    fn round_evaluations(&self, pieces: usize) -> usize {
        pieces.saturating_mul(self.options.sampling_size)
    }

    // one stream per sub-interval, seeded in partition order
    fn sample_partition(&self,
                        integrand: &dyn Integrand,
                        spans: &[(f64, f64)],
                        master: &mut Pcg64) -> Vec<SubInterval> {
        let seeded: Vec<((f64, f64), u64)> = spans
            .iter()
            .map(|&span| (span, master.random::<u64>()))
            .collect();
        seeded
            .par_iter()
            .map(|&((left, right), seed)| {
                let mut rng = Pcg64::seed_from_u64(seed);
                sample_sub_interval(integrand, left, right, self.options.sampling_size, &mut rng)
            })
            .collect()
    }

    fn error_estimate(&self, partition: &[SubInterval], width: f64) -> f64 {
        let weighted: f64 = partition
            .iter()
            .map(|piece| (piece.width() / width).powi(2) * piece.sample_variance())
            .sum();
        (weighted / (partition.len() * self.options.sampling_size) as f64).sqrt()
    }
}

impl Default for AdaptiveMonteCarlo {
    fn default() -> Self {
        AdaptiveMonteCarlo {
            options: AdaptiveOptions::default(),
            criterion: ConvergenceCriterion::adaptive_monte_carlo(),
        }
    }
}

impl Integrator for AdaptiveMonteCarlo {
    fn method(&self) -> IntegrationMethod {
        IntegrationMethod::AdaptiveMonteCarlo
    }

    fn reseeded(&self, seed: u64) -> Option<Arc<dyn Integrator>> {
        Some(Arc::new(AdaptiveMonteCarlo {
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
        self.integrate_with_partition(integrand, lower, upper, tolerance)
            .map(|outcome| outcome.result)
    }
}

fn total(partition: &[SubInterval]) -> f64 {
    partition.iter().map(SubInterval::partial_integral).sum()
}

/// Index of the largest spread, the first one on ties.
fn widest_spread(partition: &[SubInterval]) -> usize {
    let mut index = 0;
    for (i, piece) in partition.iter().enumerate().skip(1) {
        if piece.sample_variance() > partition[index].sample_variance() {
            index = i;
        }
    }
    index
}
