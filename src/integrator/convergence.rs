use serde::Deserialize;
use tracing::{debug, warn};

use crate::integrator::integrationerror::IntegrationError;
use crate::integrator::integrationmethod::IntegrationMethod;
use crate::integrator::integrator::IntegrationResult;

/// What the relative-accuracy test does when the previous estimate is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ZeroReferencePolicy {
    /// Compare `|new - old|` against the tolerance instead.
    #[default]
    AbsoluteFallback,
    /// Stop with `IntegrationError::ZeroReference`.
    Fail,
}

/// Shared stopping rule of all methods: relative accuracy between two
/// successive estimates, bounded by an iteration cap and an evaluation budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceCriterion {
    max_iterations: usize,
    max_evaluations: usize,
    zero_threshold: f64,
    zero_reference: ZeroReferencePolicy,
}

impl ConvergenceCriterion {
    pub fn new(max_iterations: usize, max_evaluations: usize) -> ConvergenceCriterion {
        ConvergenceCriterion {
            max_iterations,
            max_evaluations,
            zero_threshold: f64::EPSILON,
            zero_reference: ZeroReferencePolicy::AbsoluteFallback,
        }
    }

    /// 30 grid doublings, 2^28 evaluations.
    pub fn newton_cotes() -> ConvergenceCriterion {
        ConvergenceCriterion::new(30, 1 << 28)
    }

    pub fn monte_carlo() -> ConvergenceCriterion {
        ConvergenceCriterion::new(5_000, 100_000_000)
    }

    pub fn adaptive_monte_carlo() -> ConvergenceCriterion {
        ConvergenceCriterion::new(1_000, 100_000_000)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> ConvergenceCriterion {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> ConvergenceCriterion {
        self.max_evaluations = max_evaluations;
        self
    }

    /// References with `|old| <= zero_threshold` count as zero.
    pub fn with_zero_threshold(mut self, zero_threshold: f64) -> ConvergenceCriterion {
        self.zero_threshold = zero_threshold;
        self
    }

    pub fn with_zero_reference(mut self, zero_reference: ZeroReferencePolicy) -> ConvergenceCriterion {
        self.zero_reference = zero_reference;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    pub fn zero_threshold(&self) -> f64 {
        self.zero_threshold
    }

    pub fn zero_reference(&self) -> ZeroReferencePolicy {
        self.zero_reference
    }

    pub fn validate(&self) -> Result<(), IntegrationError> {
        if self.max_iterations == 0 {
            return Err(IntegrationError::invalid_parameter("max_iterations", "must be at least 1"));
        }
        if self.max_evaluations == 0 {
            return Err(IntegrationError::invalid_parameter("max_evaluations", "must be at least 1"));
        }
        if !self.zero_threshold.is_finite() || self.zero_threshold < 0.0 {
            return Err(IntegrationError::invalid_parameter(
                "zero_threshold",
                format!("must be finite and non-negative, got {}", self.zero_threshold),
            ));
        }
        Ok(())
    }

    pub fn validate_tolerance(tolerance: f64) -> Result<(), IntegrationError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(IntegrationError::InvalidTolerance { tolerance });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RefinementTracker
// ─────────────────────────────────────────────────────────────────────────────
//
// 每次呼叫各自建立一個 tracker，記錄 iteration / evaluation 計數與上一輪估計值。

pub struct RefinementTracker<'a> {
    method: IntegrationMethod,
    criterion: &'a ConvergenceCriterion,
    tolerance: f64,
    iterations: usize,
    evaluations: usize,
    estimate: f64,
    relative_accuracy: f64,
    zero_reference_reported: bool,
}

impl<'a> RefinementTracker<'a> {
    pub fn new(method: IntegrationMethod,
               criterion: &'a ConvergenceCriterion,
               tolerance: f64) -> RefinementTracker<'a> {
        RefinementTracker {
            method,
            criterion,
            tolerance,
            iterations: 0,
            evaluations: 0,
            estimate: f64::NAN,
            relative_accuracy: f64::INFINITY,
            zero_reference_reported: false,
        }
    }

    /// Reserves the budget of the initial estimate before any point is sampled.
    pub fn begin_bootstrap(&mut self, evaluations: usize) -> Result<(), IntegrationError> {
        if self.exceeds_budget(evaluations) {
            return Err(self.did_not_converge());
        }
        self.evaluations += evaluations;
        Ok(())
    }

    /// Records the initial estimate, which is never compared against anything.
    pub fn bootstrap(&mut self, estimate: f64) -> Result<(), IntegrationError> {
        if !estimate.is_finite() {
            return Err(IntegrationError::NonFiniteEstimate {
                method: self.method,
                iteration: 0,
            });
        }
        self.estimate = estimate;
        debug!(method = %self.method, estimate, evaluations = self.evaluations, "initial estimate");
        Ok(())
    }

    /// Reserves the budget of the next round, failing once a cap would be exceeded.
    pub fn begin_round(&mut self, round_evaluations: usize) -> Result<(), IntegrationError> {
        if self.iterations >= self.criterion.max_iterations() || self.exceeds_budget(round_evaluations) {
            return Err(self.did_not_converge());
        }
        self.iterations += 1;
        self.evaluations += round_evaluations;
        Ok(())
    }

    fn exceeds_budget(&self, evaluations: usize) -> bool {
        self.evaluations
            .checked_add(evaluations)
            .map_or(true, |total| total > self.criterion.max_evaluations())
    }

    fn did_not_converge(&self) -> IntegrationError {
        IntegrationError::DidNotConverge {
            method: self.method,
            iterations: self.iterations,
            evaluations: self.evaluations,
            last_estimate: self.estimate,
            relative_accuracy: self.relative_accuracy,
            tolerance: self.tolerance,
        }
    }

    /// Stores the new estimate and returns its accuracy relative to the previous one.
    pub fn record(&mut self, estimate: f64) -> Result<f64, IntegrationError> {
        if !estimate.is_finite() {
            return Err(IntegrationError::NonFiniteEstimate {
                method: self.method,
                iteration: self.iterations,
            });
        }

        let previous = self.estimate;
        let relative_accuracy = if previous.abs() <= self.criterion.zero_threshold() {
            match self.criterion.zero_reference() {
                ZeroReferencePolicy::Fail => {
                    return Err(IntegrationError::ZeroReference {
                        method: self.method,
                        iteration: self.iterations,
                    });
                }
                ZeroReferencePolicy::AbsoluteFallback => {
                    if !self.zero_reference_reported {
                        warn!(
                            method = %self.method,
                            iteration = self.iterations,
                            previous,
                            "previous estimate is zero, comparing absolute change instead"
                        );
                        self.zero_reference_reported = true;
                    }
                    (estimate - previous).abs()
                }
            }
        } else {
            ((estimate - previous) / previous).abs()
        };

        debug!(
            method = %self.method,
            iteration = self.iterations,
            estimate,
            relative_accuracy,
            evaluations = self.evaluations,
            "refinement round"
        );

        self.estimate = estimate;
        self.relative_accuracy = relative_accuracy;
        Ok(relative_accuracy)
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn finish(self, error_estimate: f64) -> IntegrationResult {
        IntegrationResult::new(self.estimate, error_estimate, self.evaluations, self.iterations)
    }
}
