use std::sync::Arc;

use serde::Deserialize;

use crate::integrator::convergence::{
    ConvergenceCriterion,
    ZeroReferencePolicy
};
use crate::integrator::integrationmethod::IntegrationMethod;
use crate::integrator::integrator::Integrator;
use crate::manager::manager::Manager;
use crate::manager::managererror::ManagerError;
use crate::montecarlo::adaptivemontecarlo::{
    AdaptiveMonteCarlo,
    AdaptiveOptions
};
use crate::montecarlo::flatmontecarlo::FlatMonteCarlo;
use crate::montecarlo::importancesampling::ImportanceSampling;
use crate::montecarlo::sampler::MonteCarloOptions;
use crate::montecarlo::samplingdensity::{
    LinearDensity,
    SamplingDensity,
    TruncatedCauchyDensity,
    UniformDensity
};
use crate::newtoncotes::simpson::SimpsonRule;
use crate::newtoncotes::trapezoidal::TrapezoidalRule;

#[derive(Deserialize)]
struct IntegratorTypedObject {
    method: IntegrationMethod
}


/// Optional overrides of the method's default stopping rule.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ConvergenceJsonProp {
    max_iterations: Option<usize>,
    max_evaluations: Option<usize>,
    zero_threshold: Option<f64>,
    zero_reference: Option<ZeroReferencePolicy>
}

impl ConvergenceJsonProp {
    fn criterion(&self, base: ConvergenceCriterion) -> Result<ConvergenceCriterion, ManagerError> {
        let mut criterion = base;
        if let Some(max_iterations) = self.max_iterations {
            criterion = criterion.with_max_iterations(max_iterations);
        }
        if let Some(max_evaluations) = self.max_evaluations {
            criterion = criterion.with_max_evaluations(max_evaluations);
        }
        if let Some(zero_threshold) = self.zero_threshold {
            criterion = criterion.with_zero_threshold(zero_threshold);
        }
        if let Some(zero_reference) = self.zero_reference {
            criterion = criterion.with_zero_reference(zero_reference);
        }
        criterion.validate()?;
        Ok(criterion)
    }
}


#[derive(Deserialize)]
enum DensityType {
    Linear,
    Uniform,
    TruncatedCauchy
}


#[derive(Deserialize)]
struct DensityTypedObject {
    density_type: DensityType
}


#[derive(Deserialize)]
struct LinearDensityJsonProp {
    slope: f64,
    intercept: f64,
    lower: f64,
    upper: f64
}


#[derive(Deserialize)]
struct UniformDensityJsonProp {
    lower: f64,
    upper: f64
}


#[derive(Deserialize)]
struct TruncatedCauchyDensityJsonProp {
    location: f64,
    scale: f64,
    lower: f64,
    upper: f64
}


#[derive(Deserialize)]
struct ImportanceSamplingJsonProp {
    density: Option<serde_json::Value>
}


pub fn density_from_json(json_value: serde_json::Value) -> Result<Arc<dyn SamplingDensity>, ManagerError> {
    let density_typed_object: DensityTypedObject = ManagerError::from_json_or_json_parse_error(json_value.clone())?;
    let density: Arc<dyn SamplingDensity> = match density_typed_object.density_type {
        DensityType::Linear => {
            let prop: LinearDensityJsonProp = ManagerError::from_json_or_json_parse_error(json_value)?;
            Arc::new(LinearDensity::new(prop.slope, prop.intercept, prop.lower, prop.upper)?)
        },
        DensityType::Uniform => {
            let prop: UniformDensityJsonProp = ManagerError::from_json_or_json_parse_error(json_value)?;
            Arc::new(UniformDensity::new(prop.lower, prop.upper)?)
        },
        DensityType::TruncatedCauchy => {
            let prop: TruncatedCauchyDensityJsonProp = ManagerError::from_json_or_json_parse_error(json_value)?;
            Arc::new(TruncatedCauchyDensity::new(prop.location, prop.scale, prop.lower, prop.upper)?)
        }
    };
    Ok(density)
}


pub fn integrator_from_json(json_value: serde_json::Value) -> Result<Arc<dyn Integrator>, ManagerError> {
    let typed_object: IntegratorTypedObject = ManagerError::from_json_or_json_parse_error(json_value.clone())?;
    let convergence: ConvergenceJsonProp = ManagerError::from_json_or_json_parse_error(json_value.clone())?;
    let integrator: Arc<dyn Integrator> = match typed_object.method {
        IntegrationMethod::Trapezoidal => {
            Arc::new(TrapezoidalRule::new(convergence.criterion(ConvergenceCriterion::newton_cotes())?))
        },
        IntegrationMethod::Simpson => {
            Arc::new(SimpsonRule::new(convergence.criterion(ConvergenceCriterion::newton_cotes())?))
        },
        IntegrationMethod::FlatMonteCarlo => {
            let options: MonteCarloOptions = ManagerError::from_json_or_json_parse_error(json_value)?;
            Arc::new(FlatMonteCarlo::new(options, convergence.criterion(ConvergenceCriterion::monte_carlo())?)?)
        },
        IntegrationMethod::ImportanceSampling => {
            let prop: ImportanceSamplingJsonProp = ManagerError::from_json_or_json_parse_error(json_value.clone())?;
            let options: MonteCarloOptions = ManagerError::from_json_or_json_parse_error(json_value)?;
            let density: Arc<dyn SamplingDensity> = match prop.density {
                Some(density_json) => density_from_json(density_json)?,
                None => Arc::new(LinearDensity::default())
            };
            Arc::new(ImportanceSampling::new(density, options, convergence.criterion(ConvergenceCriterion::monte_carlo())?)?)
        },
        IntegrationMethod::AdaptiveMonteCarlo => {
            let options: AdaptiveOptions = ManagerError::from_json_or_json_parse_error(json_value)?;
            Arc::new(AdaptiveMonteCarlo::new(options, convergence.criterion(ConvergenceCriterion::adaptive_monte_carlo())?)?)
        }
    };
    Ok(integrator)
}


pub struct IntegratorManager;


impl IntegratorManager {
    pub fn new() -> Manager<Arc<dyn Integrator>> {
        Manager::new(integrator_from_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::manager::IManager;
    use serde_json::json;

    #[test]
    fn test_every_method_from_minimal_entry() {
        for method in IntegrationMethod::ALL {
            let integrator = integrator_from_json(json!({ "name": "x", "method": method })).unwrap();
            assert_eq!(integrator.method(), method);
        }
    }

    #[test]
    fn test_convergence_overrides() {
        let integrator = integrator_from_json(json!({
            "name": "short",
            "method": "Trapezoidal",
            "max_iterations": 2
        }))
        .unwrap();
        let gaussian = |z: f64| (-z * z).exp();
        assert!(matches!(
            integrator.integrate(&gaussian, -5.0, 5.0, 1e-12),
            Err(crate::integrator::integrationerror::IntegrationError::DidNotConverge { iterations: 2, .. })
        ));
    }

    #[test]
    fn test_density_entries() {
        let linear = density_from_json(json!({
            "density_type": "Linear", "slope": -0.48, "intercept": 0.98, "lower": 0.0, "upper": 2.0
        }))
        .unwrap();
        assert_eq!(linear.support(), (0.0, 2.0));
        let cauchy = density_from_json(json!({
            "density_type": "TruncatedCauchy", "location": 0.0, "scale": 1.0, "lower": -5.0, "upper": 5.0
        }))
        .unwrap();
        assert_eq!(cauchy.support(), (-5.0, 5.0));
        assert!(matches!(
            density_from_json(json!({ "density_type": "Uniform", "lower": 1.0, "upper": 0.0 })),
            Err(ManagerError::InvalidParameter(_))
        ));
        assert!(matches!(
            density_from_json(json!({ "density_type": "Gamma" })),
            Err(ManagerError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_invalid_tuning_is_reported() {
        assert!(matches!(
            integrator_from_json(json!({ "name": "bad", "method": "AdaptiveMonteCarlo", "divisions": 1 })),
            Err(ManagerError::InvalidParameter(_))
        ));
        assert!(matches!(
            integrator_from_json(json!({ "name": "bad", "method": "Simpson", "max_iterations": 0 })),
            Err(ManagerError::InvalidParameter(_))
        ));
        assert!(matches!(
            integrator_from_json(json!({ "name": "bad", "method": "Romberg" })),
            Err(ManagerError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_manager_registers_by_name() {
        let manager = IntegratorManager::new();
        manager
            .insert_obj_from_json_vec(&[
                json!({ "name": "coarse", "method": "Simpson" }),
                json!({ "name": "adaptive", "method": "AdaptiveMonteCarlo", "sampling_size": 50, "seed": 7 })
            ])
            .unwrap();
        assert_eq!(manager.get("coarse").unwrap().method(), IntegrationMethod::Simpson);
        assert_eq!(manager.get("adaptive").unwrap().name(), "adaptive_monte_carlo");
    }
}
