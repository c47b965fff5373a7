use std::sync::Arc;

use crate::integrator::integrand::Integrand;
use crate::integrator::integrationerror::IntegrationError;
use crate::integrator::integrationmethod::IntegrationMethod;

/// Common contract of every integration method: `(f, a, b, ε) → (I, err, evals)`.
///
/// Implementations hold only immutable tuning parameters, so one instance can
/// be shared and called repeatedly; every call is independent.
pub trait Integrator: Send + Sync {
    fn method(&self) -> IntegrationMethod;

    fn integrate(
        &self,
        integrand: &dyn Integrand,
        lower: f64,
        upper: f64,
        tolerance: f64,
    ) -> Result<IntegrationResult, IntegrationError>;

    fn name(&self) -> &'static str {
        self.method().name()
    }

    /// A copy drawing from a fixed seed, or `None` for deterministic methods.
    fn reseeded(&self, _seed: u64) -> Option<Arc<dyn Integrator>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationResult {
    estimate: f64,
    error_estimate: f64,
    evaluation_count: usize,
    iterations: usize,
}

impl IntegrationResult {
    pub fn new(estimate: f64,
               error_estimate: f64,
               evaluation_count: usize,
               iterations: usize) -> IntegrationResult {
        IntegrationResult {
            estimate: estimate,
            error_estimate: error_estimate.abs(),
            evaluation_count: evaluation_count,
            iterations: iterations
        }
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn error_estimate(&self) -> f64 {
        self.error_estimate
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluation_count
    }

    /// Refinement rounds performed after the initial estimate.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// A validated integration range `[lower, upper]` with `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationDomain {
    lower: f64,
    upper: f64,
}

impl IntegrationDomain {
    pub fn new(lower: f64, upper: f64) -> Result<IntegrationDomain, IntegrationError> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(IntegrationError::InvalidInterval { lower, upper });
        }
        Ok(IntegrationDomain { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Maps `u ∈ [0, 1)` onto the domain.
    pub fn point_at(&self, u: f64) -> f64 {
        self.lower + self.width() * u
    }

    /// Splits the domain into `pieces` equal spans; the last span ends exactly at `upper`.
    pub fn equal_spans(&self, pieces: usize) -> Vec<(f64, f64)> {
        equal_spans(self.lower, self.upper, pieces)
    }
}

pub(crate) fn equal_spans(left: f64, right: f64, pieces: usize) -> Vec<(f64, f64)> {
    let step = (right - left) / pieces as f64;
    (0..pieces)
        .map(|i| {
            let start = left + i as f64 * step;
            let end = if i + 1 == pieces { right } else { left + (i + 1) as f64 * step };
            (start, end)
        })
        .collect()
}
