use rand::Rng;
use rand_pcg::Pcg64;

use crate::integrator::integrand::Integrand;

/// One piece of an adaptive partition together with its latest sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubInterval {
    left: f64,
    right: f64,
    partial_integral: f64,
    sample_variance: f64,
}

impl SubInterval {
    pub(crate) fn new(left: f64,
                      right: f64,
                      partial_integral: f64,
                      sample_variance: f64) -> SubInterval {
        SubInterval { left, right, partial_integral, sample_variance }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// `width · mean(f)` over the sampled points.
    pub fn partial_integral(&self) -> f64 {
        self.partial_integral
    }

    /// Unnormalised spread `Σ (f_i - mean)²` of the sampled values.
    pub fn sample_variance(&self) -> f64 {
        self.sample_variance
    }

    pub fn contains(&self, x: f64) -> bool {
        self.left <= x && x <= self.right
    }
}

/// Samples `sampling_size` uniform points of `[left, right]`.
pub(crate) fn sample_sub_interval(integrand: &dyn Integrand,
                                  left: f64,
                                  right: f64,
                                  sampling_size: usize,
                                  rng: &mut Pcg64) -> SubInterval {
    let width = right - left;
    let values: Vec<f64> = (0..sampling_size)
        .map(|_| integrand.value(left + width * rng.random::<f64>()))
        .collect();
    let mean = values.iter().sum::<f64>() / sampling_size as f64;
    let sample_variance: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    SubInterval::new(left, right, width * mean, sample_variance)
}
