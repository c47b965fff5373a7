use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{
    Deserialize,
    Serialize
};

use crate::integrator::integrator::Integrator;
use crate::montecarlo::adaptivemontecarlo::AdaptiveMonteCarlo;
use crate::montecarlo::flatmontecarlo::FlatMonteCarlo;
use crate::montecarlo::importancesampling::ImportanceSampling;
use crate::newtoncotes::simpson::SimpsonRule;
use crate::newtoncotes::trapezoidal::TrapezoidalRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationMethod {
    Trapezoidal,
    Simpson,
    FlatMonteCarlo,
    ImportanceSampling,
    AdaptiveMonteCarlo,
}

impl IntegrationMethod {
    pub const ALL: [IntegrationMethod; 5] = [
        IntegrationMethod::Trapezoidal,
        IntegrationMethod::Simpson,
        IntegrationMethod::FlatMonteCarlo,
        IntegrationMethod::ImportanceSampling,
        IntegrationMethod::AdaptiveMonteCarlo,
    ];

    /// Menu numbering, 1 to 5.
    pub fn from_choice(choice: u32) -> Option<IntegrationMethod> {
        match choice {
            1 => Some(IntegrationMethod::Trapezoidal),
            2 => Some(IntegrationMethod::Simpson),
            3 => Some(IntegrationMethod::FlatMonteCarlo),
            4 => Some(IntegrationMethod::ImportanceSampling),
            5 => Some(IntegrationMethod::AdaptiveMonteCarlo),
            _ => None,
        }
    }

    pub fn choice(&self) -> u32 {
        match self {
            IntegrationMethod::Trapezoidal => 1,
            IntegrationMethod::Simpson => 2,
            IntegrationMethod::FlatMonteCarlo => 3,
            IntegrationMethod::ImportanceSampling => 4,
            IntegrationMethod::AdaptiveMonteCarlo => 5,
        }
    }

    /// Canonical registry name.
    pub fn name(&self) -> &'static str {
        match self {
            IntegrationMethod::Trapezoidal => "trapezoidal",
            IntegrationMethod::Simpson => "simpson",
            IntegrationMethod::FlatMonteCarlo => "flat_monte_carlo",
            IntegrationMethod::ImportanceSampling => "importance_sampling",
            IntegrationMethod::AdaptiveMonteCarlo => "adaptive_monte_carlo",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            IntegrationMethod::Trapezoidal => "Extended Trapezoidal rule",
            IntegrationMethod::Simpson => "Extended Simpson's rule",
            IntegrationMethod::FlatMonteCarlo => "Monte Carlo with flat pdf",
            IntegrationMethod::ImportanceSampling => "Monte Carlo with importance sampling",
            IntegrationMethod::AdaptiveMonteCarlo => "Adaptive Monte Carlo",
        }
    }

    pub fn is_stochastic(&self) -> bool {
        match self {
            IntegrationMethod::Trapezoidal | IntegrationMethod::Simpson => false,
            _ => true,
        }
    }

    /// The method with all tuning constants at their defaults.
    pub fn default_integrator(&self) -> Arc<dyn Integrator> {
        match self {
            IntegrationMethod::Trapezoidal => Arc::new(TrapezoidalRule::default()),
            IntegrationMethod::Simpson => Arc::new(SimpsonRule::default()),
            IntegrationMethod::FlatMonteCarlo => Arc::new(FlatMonteCarlo::default()),
            IntegrationMethod::ImportanceSampling => Arc::new(ImportanceSampling::default()),
            IntegrationMethod::AdaptiveMonteCarlo => Arc::new(AdaptiveMonteCarlo::default()),
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMethodError(String);

impl fmt::Display for ParseMethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown integration method '{}'", self.0)
    }
}

impl std::error::Error for ParseMethodError {}

/// Accepts a menu number (`"3"`) or a canonical name (`"flat_monte_carlo"`).
impl FromStr for IntegrationMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(choice) = trimmed.parse::<u32>() {
            return IntegrationMethod::from_choice(choice).ok_or_else(|| ParseMethodError(s.to_owned()));
        }
        IntegrationMethod::ALL
            .iter()
            .copied()
            .find(|method| method.name() == trimmed.to_ascii_lowercase())
            .ok_or_else(|| ParseMethodError(s.to_owned()))
    }
}
