use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::Deserialize;

use crate::integrator::integrationerror::IntegrationError;

// ─────────────────────────────────────────────────────────────────────────────
// SampleMoments
// ─────────────────────────────────────────────────────────────────────────────

/// Running Σf and Σf² over one batch of samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleMoments {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl SampleMoments {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn merge(self, other: SampleMoments) -> SampleMoments {
        SampleMoments {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance Σf²/n - (Σf/n)², clamped at zero against round-off.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }

    /// sqrt(Var(f) / n)
    pub fn standard_error(&self) -> f64 {
        (self.variance() / self.count as f64).sqrt()
    }
}

impl FromIterator<f64> for SampleMoments {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut moments = SampleMoments::default();
        for value in iter {
            moments.push(value);
        }
        moments
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MonteCarloOptions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonteCarloOptions {
    /// Batch size of the initial estimate (default 10).
    pub initial_samples: usize,
    /// Each round grows the batch by ⌈growth_fraction · n⌉ + 1 (default 0.01, at most 1).
    pub growth_fraction: f64,
    /// Samples per parallel work item (default 4096).
    pub chunk_size: usize,
    /// Fixed seed for reproducible runs; fresh entropy per call when absent.
    pub seed: Option<u64>,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        MonteCarloOptions {
            initial_samples: 10,
            growth_fraction: 0.01,
            chunk_size: 4096,
            seed: None,
        }
    }
}

impl MonteCarloOptions {
    pub fn with_seed(mut self, seed: u64) -> MonteCarloOptions {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), IntegrationError> {
        if self.initial_samples < 2 {
            return Err(IntegrationError::invalid_parameter("initial_samples", "must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.growth_fraction) {
            return Err(IntegrationError::invalid_parameter(
                "growth_fraction",
                format!("must lie in [0, 1], got {}", self.growth_fraction),
            ));
        }
        if self.chunk_size == 0 {
            return Err(IntegrationError::invalid_parameter("chunk_size", "must be at least 1"));
        }
        Ok(())
    }

    /// Saturates at `usize::MAX`, which no evaluation budget admits.
    pub fn next_sample_count(&self, samples: usize) -> usize {
        let growth = (self.growth_fraction * samples as f64).ceil() as usize;
        samples.saturating_add(growth).saturating_add(1)
    }

    pub fn sampler(&self) -> BatchSampler {
        BatchSampler::new(self.chunk_size)
    }
}

/// Master generator of one call: seeded when a seed is given, otherwise
/// drawn from the thread-local generator so every call is independent.
pub fn master_rng(seed: Option<u64>) -> Pcg64 {
    match seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_rng(&mut rand::rng()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BatchSampler
// ─────────────────────────────────────────────────────────────────────────────
//
// 一個 batch 切成固定大小的 chunk，每個 chunk 由 master rng 依序取得自己的 seed，
// 平行計算部分和後再依 chunk 順序合併：固定 seed 時結果與執行緒數無關。

#[derive(Debug, Clone, Copy)]
pub struct BatchSampler {
    chunk_size: usize,
}

impl BatchSampler {
    pub fn new(chunk_size: usize) -> BatchSampler {
        BatchSampler { chunk_size: chunk_size.max(1) }
    }

    /// Draws `count` independent values with `draw` and reduces them to moments.
    pub fn sample<G>(&self, master: &mut Pcg64, count: usize, draw: G) -> SampleMoments
    where
        G: Fn(&mut Pcg64) -> f64 + Sync,
    {
        let work: Vec<(u64, usize)> = (0..count)
            .step_by(self.chunk_size)
            .map(|start| (master.random::<u64>(), self.chunk_size.min(count - start)))
            .collect();

        let partials: Vec<SampleMoments> = work
            .par_iter()
            .map(|&(seed, len)| {
                let mut rng = Pcg64::seed_from_u64(seed);
                (0..len).map(|_| draw(&mut rng)).collect()
            })
            .collect();

        partials
            .into_iter()
            .fold(SampleMoments::default(), SampleMoments::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_moments() {
        let moments: SampleMoments = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
        assert_eq!(moments.count(), 4);
        assert_abs_diff_eq!(moments.mean(), 2.5);
        assert_abs_diff_eq!(moments.variance(), 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(moments.standard_error(), (1.25f64 / 4.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_has_zero_variance() {
        let moments: SampleMoments = std::iter::repeat(0.1).take(1000).collect();
        assert!(moments.variance() >= 0.0);
        assert!(moments.standard_error() < 1e-8);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64).sqrt()).collect();
        let whole: SampleMoments = values.iter().copied().collect();
        let left: SampleMoments = values[..37].iter().copied().collect();
        let right: SampleMoments = values[37..].iter().copied().collect();
        let merged = left.merge(right);
        assert_eq!(merged.count(), whole.count());
        assert_abs_diff_eq!(merged.sum(), whole.sum(), epsilon = 1e-10);
        assert_abs_diff_eq!(merged.sum_sq(), whole.sum_sq(), epsilon = 1e-10);
    }

    #[test]
    fn test_sampler_counts_every_draw() {
        let sampler = BatchSampler::new(7);
        let mut rng = master_rng(Some(1));
        let moments = sampler.sample(&mut rng, 100, |_rng| 1.0);
        assert_eq!(moments.count(), 100);
        assert_eq!(moments.sum(), 100.0);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let sampler = BatchSampler::new(64);
        let draw = |rng: &mut Pcg64| rng.random::<f64>();
        let first = sampler.sample(&mut master_rng(Some(42)), 1000, draw);
        let second = sampler.sample(&mut master_rng(Some(42)), 1000, draw);
        assert_eq!(first, second);
        assert_abs_diff_eq!(first.mean(), 0.5, epsilon = 0.05);
    }

    #[test]
    fn test_options() {
        let options = MonteCarloOptions::default();
        assert!(options.validate().is_ok());
        // ⌈0.01 n⌉ + 1
        assert_eq!(options.next_sample_count(10), 12);
        assert_eq!(options.next_sample_count(100), 102);
        assert_eq!(options.next_sample_count(250), 254);
        assert!(MonteCarloOptions { initial_samples: 1, ..options }.validate().is_err());
        assert!(MonteCarloOptions { growth_fraction: -0.5, ..options }.validate().is_err());
        assert!(MonteCarloOptions { growth_fraction: 1e30, ..options }.validate().is_err());
        assert!(MonteCarloOptions { growth_fraction: f64::NAN, ..options }.validate().is_err());
        assert!(MonteCarloOptions { chunk_size: 0, ..options }.validate().is_err());
    }

    #[test]
    fn test_sample_count_saturates() {
        let options = MonteCarloOptions { growth_fraction: 1.0, ..MonteCarloOptions::default() };
        assert_eq!(options.next_sample_count(usize::MAX / 2 + 1), usize::MAX);
        assert_eq!(options.next_sample_count(usize::MAX), usize::MAX);
    }
}
