//! Summary statistics over repeated runs.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with divisor `n`.
pub fn population_std(values: &[f64]) -> f64 {
    let mu = mean(values);
    let spread: f64 = values.iter().map(|value| (value - mu).powi(2)).sum();
    (spread / values.len() as f64).sqrt()
}

/// `population_std / sqrt(n)`
pub fn standard_error_of_mean(values: &[f64]) -> f64 {
    population_std(values) / (values.len() as f64).sqrt()
}
