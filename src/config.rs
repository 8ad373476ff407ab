/*!
Simulator configuration, read from a TOML file. Every field has a default, so an
empty file is a valid configuration.

```toml
mac_seed = 7
log_filter = "ospf_sim=debug"

[solver]
endpoint = "http://localhost:8000"
timeout_ms = 5000
step_by_step = true
```
*/

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SolverConfig {
    /// Base URL; requests go to `{endpoint}/ospf`.
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_step_by_step")]
    pub step_by_step: bool,
}

impl SolverConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: default_timeout_ms(),
            step_by_step: default_step_by_step(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_step_by_step() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub solver: Option<SolverConfig>,
    pub mac_seed: u64,
    pub log_filter: Option<String>,
}

impl SimulatorConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// Points the solver at `endpoint`, keeping any configured timeout.
    pub fn with_solver_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        match self.solver.as_mut() {
            Some(solver) => solver.endpoint = endpoint,
            None => self.solver = Some(SolverConfig::new(endpoint)),
        }
        self
    }
}
