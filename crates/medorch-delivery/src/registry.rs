use medorch_core::{AgentConfig, Coordinate};
use serde::Serialize;

use crate::error::DeliveryError;
use crate::geo::haversine_m;

/// Stable index of an agent in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AgentId(pub usize);

/// Read-only set of delivery agents, indexed in file order.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentConfig>,
}

impl AgentRegistry {
    /// # Errors
    ///
    /// Returns [`DeliveryError::EmptyRegistry`] when `agents` is empty.
    pub fn new(agents: Vec<AgentConfig>) -> Result<Self, DeliveryError> {
        if agents.is_empty() {
            return Err(DeliveryError::EmptyRegistry);
        }
        Ok(Self { agents })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`DeliveryError::UnknownAgent`] for an index past the end.
    pub fn get(&self, id: AgentId) -> Result<&AgentConfig, DeliveryError> {
        self.agents.get(id.0).ok_or(DeliveryError::UnknownAgent(id.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &AgentConfig)> {
        self.agents.iter().enumerate().map(|(i, a)| (AgentId(i), a))
    }

    /// The agent closest to `target` by haversine distance, with that distance.
    ///
    /// Linear scan in registry order; on an exact tie the earlier agent wins.
    #[must_use]
    pub fn nearest(&self, target: Coordinate) -> (AgentId, f64) {
        let mut best = (AgentId(0), f64::INFINITY);
        for (id, agent) in self.iter() {
            let distance = haversine_m(target, agent.coordinate());
            if distance < best.1 {
                best = (id, distance);
            }
        }
        best
    }
}
