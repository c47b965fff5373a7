use std::time::{
    Duration,
    Instant
};

use tracing::debug;

use crate::integrator::integrand::Integrand;
use crate::integrator::integrationerror::IntegrationError;
use crate::integrator::integrator::{
    IntegrationResult,
    Integrator
};
use crate::trial::trialstatistics::{
    mean,
    standard_error_of_mean
};

/// Aggregate of `runs` independent calls of one integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSummary {
    runs: usize,
    mean_estimate: f64,
    estimate_standard_error: f64,
    mean_reported_error: f64,
    mean_evaluations: f64,
    evaluations_standard_error: f64,
    mean_duration: Duration,
}

impl TrialSummary {
    fn from_results(results: &[IntegrationResult], elapsed: Duration) -> TrialSummary {
        let estimates: Vec<f64> = results.iter().map(IntegrationResult::estimate).collect();
        let errors: Vec<f64> = results.iter().map(IntegrationResult::error_estimate).collect();
        let evaluations: Vec<f64> = results.iter().map(|result| result.evaluation_count() as f64).collect();
        TrialSummary {
            runs: results.len(),
            mean_estimate: mean(&estimates),
            estimate_standard_error: standard_error_of_mean(&estimates),
            mean_reported_error: mean(&errors),
            mean_evaluations: mean(&evaluations),
            evaluations_standard_error: standard_error_of_mean(&evaluations),
            mean_duration: elapsed / results.len() as u32,
        }
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn mean_estimate(&self) -> f64 {
        self.mean_estimate
    }

    /// `std(estimates) / sqrt(runs)`, the trustworthy error of a Monte Carlo trial.
    pub fn estimate_standard_error(&self) -> f64 {
        self.estimate_standard_error
    }

    pub fn mean_reported_error(&self) -> f64 {
        self.mean_reported_error
    }

    pub fn mean_evaluations(&self) -> f64 {
        self.mean_evaluations
    }

    pub fn evaluations_standard_error(&self) -> f64 {
        self.evaluations_standard_error
    }

    pub fn mean_duration(&self) -> Duration {
        self.mean_duration
    }
}

/// Repeats an integration and summarises the spread of the results.
///
/// With a base seed, run `i` uses a copy of a stochastic integrator seeded
/// with `seed + i`, which makes a whole trial reproducible.
#[derive(Debug, Clone, Copy)]
pub struct TrialRunner {
    repetitions: usize,
    seed: Option<u64>,
}

impl TrialRunner {
    pub fn new(repetitions: usize) -> Result<TrialRunner, IntegrationError> {
        if repetitions == 0 || repetitions > u32::MAX as usize {
            return Err(IntegrationError::invalid_parameter(
                "repetitions",
                format!("must be between 1 and {}, got {}", u32::MAX, repetitions),
            ));
        }
        Ok(TrialRunner { repetitions, seed: None })
    }

    pub fn with_seed(mut self, seed: u64) -> TrialRunner {
        self.seed = Some(seed);
        self
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn run(&self,
               integrator: &dyn Integrator,
               integrand: &dyn Integrand,
               lower: f64,
               upper: f64,
               tolerance: f64) -> Result<TrialSummary, IntegrationError> {
        self.run_with(integrator, integrand, lower, upper, tolerance, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_result` after every finished run.
    pub fn run_with<F>(&self,
                       integrator: &dyn Integrator,
                       integrand: &dyn Integrand,
                       lower: f64,
                       upper: f64,
                       tolerance: f64,
                       mut on_result: F) -> Result<TrialSummary, IntegrationError>
    where
        F: FnMut(usize, &IntegrationResult),
    {
        let mut results = Vec::with_capacity(self.repetitions);
        let start = Instant::now();
        for run in 0..self.repetitions {
            let reseeded = self.seed.and_then(|seed| integrator.reseeded(seed.wrapping_add(run as u64)));
            let current: &dyn Integrator = match &reseeded {
                Some(seeded) => seeded.as_ref(),
                None => integrator,
            };
            let run_start = Instant::now();
            let result = current.integrate(integrand, lower, upper, tolerance)?;
            debug!(
                method = integrator.name(),
                run,
                estimate = result.estimate(),
                error = result.error_estimate(),
                evaluations = result.evaluation_count(),
                elapsed = ?run_start.elapsed(),
                "trial run"
            );
            on_result(run, &result);
            results.push(result);
        }
        Ok(TrialSummary::from_results(&results, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::convergence::ConvergenceCriterion;
    use crate::montecarlo::flatmontecarlo::FlatMonteCarlo;
    use crate::montecarlo::sampler::MonteCarloOptions;
    use crate::newtoncotes::trapezoidal::TrapezoidalRule;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_deterministic_method_has_no_spread() {
        let runner = TrialRunner::new(4).unwrap();
        let summary = runner.run(&TrapezoidalRule::default(), &f64::exp, 0.0, 1.0, 1e-8).unwrap();
        assert_eq!(summary.runs(), 4);
        assert_abs_diff_eq!(summary.mean_estimate(), std::f64::consts::E - 1.0, epsilon = 1e-6);
        assert_eq!(summary.estimate_standard_error(), 0.0);
        assert_eq!(summary.evaluations_standard_error(), 0.0);
    }

    #[test]
    fn test_callback_sees_every_run() {
        let runner = TrialRunner::new(5).unwrap();
        let mut seen = Vec::new();
        let summary = runner
            .run_with(&FlatMonteCarlo::default(), &|x: f64| x, 0.0, 2.0, 1e-2, |run, result| {
                seen.push((run, result.evaluation_count()));
            })
            .unwrap();
        assert_eq!(seen.iter().map(|(run, _)| *run).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        let mean_evaluations = seen.iter().map(|(_, evaluations)| *evaluations as f64).sum::<f64>() / 5.0;
        assert_abs_diff_eq!(summary.mean_evaluations(), mean_evaluations, epsilon = 1e-9);
    }

    #[test]
    fn test_first_failure_aborts() {
        let capped = FlatMonteCarlo::new(
            MonteCarloOptions::default(),
            ConvergenceCriterion::monte_carlo().with_max_iterations(1),
        )
        .unwrap();
        let runner = TrialRunner::new(3).unwrap();
        let mut calls = 0;
        let outcome = runner.run_with(&capped, &|x: f64| x.sin(), 0.0, 1.0, 1e-12, |_, _| calls += 1);
        assert!(matches!(outcome, Err(IntegrationError::DidNotConverge { .. })));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_seeded_trials_are_reproducible_and_distinct() {
        let runner = TrialRunner::new(6).unwrap().with_seed(17);
        let integrator = FlatMonteCarlo::default();
        let mut first = Vec::new();
        let summary = runner
            .run_with(&integrator, &|x: f64| x * x, 0.0, 1.0, 1e-2, |_, result| first.push(result.estimate()))
            .unwrap();
        let mut second = Vec::new();
        runner
            .run_with(&integrator, &|x: f64| x * x, 0.0, 1.0, 1e-2, |_, result| second.push(result.estimate()))
            .unwrap();
        assert_eq!(first, second);
        assert!(first.windows(2).any(|pair| pair[0] != pair[1]));
        assert!(summary.estimate_standard_error() > 0.0);
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        assert!(TrialRunner::new(0).is_err());
    }
}
