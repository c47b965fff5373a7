use std::cell::{
    RefCell,
    RefMut
};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use serde::Deserialize;

use crate::integrator::integrationmethod::IntegrationMethod;
use crate::integrator::integrator::Integrator;
use crate::integrator::integratormanager::IntegratorManager;
use crate::manager::managererror::ManagerError;
use crate::manager::manager::{
    IManager,
    Manager
};


#[derive(Deserialize)]
struct ConfigurationJsonProp {
    #[serde(default)]
    integrators: Vec<serde_json::Value>
}

pub struct Configuration {
    integrator_manager_cell: RefCell<Manager<Arc<dyn Integrator>>>
}


impl Configuration {
    /// Registers every method with its default tuning under its canonical name.
    pub fn new() -> Configuration {
        let integrator_manager = IntegratorManager::new();
        for method in IntegrationMethod::ALL {
            integrator_manager.insert(method.name(), method.default_integrator());
        }
        Configuration {
            integrator_manager_cell: RefCell::new(integrator_manager)
        }
    }

    pub fn integrator_manager(&self) -> RefMut<'_, Manager<Arc<dyn Integrator>>> {
        self.integrator_manager_cell.borrow_mut()
    }

    pub fn integrator(&self, name: &str) -> Result<Arc<dyn Integrator>, ManagerError> {
        self.integrator_manager().get(name)
    }

    pub fn from_json_value(&self, json_value: serde_json::Value) -> Result<(), ManagerError> {
        let json_prop: ConfigurationJsonProp = ManagerError::from_json_or_json_parse_error(json_value)?;
        self.integrator_manager().insert_obj_from_json_vec(&json_prop.integrators)
    }

    pub fn from_reader(&self, file_path: &str) -> Result<(), ManagerError> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let json_value: serde_json::Value = serde_json::from_reader(reader)?;
        self.from_json_value(json_value)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}
