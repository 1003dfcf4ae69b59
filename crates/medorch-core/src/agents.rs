use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Coordinate};

/// One delivery agent as declared in the registry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub phone: String,
    pub vehicle: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl AgentConfig {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentsFile {
    pub agents: Vec<AgentConfig>,
}

/// Load and validate the delivery-agent registry from a YAML file.
///
/// File order is significant: it defines agent indices and the tie-break
/// order of the nearest-agent scan.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_agents(path: &Path) -> Result<AgentsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AgentsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_agents(&content)
}

/// Parse and validate registry YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_agents(content: &str) -> Result<AgentsFile, ConfigError> {
    let agents_file: AgentsFile = serde_yaml::from_str(content)?;
    validate_agents(&agents_file)?;
    Ok(agents_file)
}

fn validate_agents(agents_file: &AgentsFile) -> Result<(), ConfigError> {
    if agents_file.agents.is_empty() {
        return Err(ConfigError::Validation(
            "at least one agent is required".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for agent in &agents_file.agents {
        if agent.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "agent name must be non-empty".to_string(),
            ));
        }

        if !agent.coordinate().is_valid() {
            return Err(ConfigError::Validation(format!(
                "agent '{}' has invalid coordinates ({}, {})",
                agent.name, agent.latitude, agent.longitude
            )));
        }

        if !seen_names.insert(agent.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate agent name: '{}'",
                agent.name
            )));
        }
    }

    Ok(())
}
