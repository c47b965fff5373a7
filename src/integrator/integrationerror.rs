use thiserror::Error;

use crate::integrator::integrationmethod::IntegrationMethod;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("invalid interval [{lower}, {upper}]: bounds must be finite and satisfy lower < upper")]
    InvalidInterval { lower: f64, upper: f64 },

    #[error("invalid tolerance {tolerance}: must be finite and positive")]
    InvalidTolerance { tolerance: f64 },

    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    /// The previous estimate used as the relative-accuracy denominator was zero
    /// and the criterion was configured to fail instead of falling back.
    #[error("{method}: relative accuracy undefined, previous estimate is zero at iteration {iteration}")]
    ZeroReference {
        method: IntegrationMethod,
        iteration: usize,
    },

    #[error(
        "{method}: did not converge after {iterations} iterations and {evaluations} evaluations \
         (last estimate {last_estimate:.6e}, relative accuracy {relative_accuracy:.2e}, tolerance {tolerance:.2e})"
    )]
    DidNotConverge {
        method: IntegrationMethod,
        iterations: usize,
        evaluations: usize,
        last_estimate: f64,
        relative_accuracy: f64,
        tolerance: f64,
    },

    #[error("{method}: estimate became non-finite at iteration {iteration}")]
    NonFiniteEstimate {
        method: IntegrationMethod,
        iteration: usize,
    },
}

impl IntegrationError {
    pub fn invalid_parameter(parameter: &'static str, message: impl Into<String>) -> IntegrationError {
        IntegrationError::InvalidParameter {
            parameter,
            message: message.into(),
        }
    }
}
