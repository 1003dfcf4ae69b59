//! Shared configuration and primitive types for the medorch workspace.

pub mod agents;
pub mod app_config;
pub mod config;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use agents::{load_agents, parse_agents, AgentConfig, AgentsFile};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `[lat, lon]`, the pair shape the routing collaborator consumes.
    #[must_use]
    pub const fn as_pair(self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }

    /// True when both components are finite and within WGS84 bounds.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read agents file {path}: {source}")]
    AgentsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse agents file: {0}")]
    AgentsFileParse(#[from] serde_yaml::Error),

    #[error("agents validation failed: {0}")]
    Validation(String),
}
