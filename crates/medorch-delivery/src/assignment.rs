use medorch_core::{AgentConfig, Coordinate};
use serde::Serialize;

use crate::error::DeliveryError;
use crate::geo::haversine_m;
use crate::registry::{AgentId, AgentRegistry};

/// One agent bound to one store pickup and an origin drop-off.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub agent_idx: AgentId,
    pub agent: AgentConfig,
    pub store: Coordinate,
    pub origin: Coordinate,
    pub agent_to_store_m: f64,
    pub store_to_origin_m: f64,
    pub total_m: f64,
    /// Flat delivery fee in rupees.
    pub charge: u32,
}

impl Assignment {
    /// Assign the agent nearest to `store` and price the two-leg trip.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidArgument`] if either coordinate is out
    /// of range.
    pub fn nearest(
        registry: &AgentRegistry,
        store: Coordinate,
        origin: Coordinate,
    ) -> Result<Self, DeliveryError> {
        validate(store, "store")?;
        validate(origin, "origin")?;
        let (agent_idx, _) = registry.nearest(store);
        Self::with_agent(registry, agent_idx, store, origin)
    }

    /// Price the trip for a specific agent.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::UnknownAgent`] if `agent_idx` is not in the
    /// registry.
    pub fn with_agent(
        registry: &AgentRegistry,
        agent_idx: AgentId,
        store: Coordinate,
        origin: Coordinate,
    ) -> Result<Self, DeliveryError> {
        let agent = registry.get(agent_idx)?.clone();
        let agent_to_store_m = haversine_m(agent.coordinate(), store);
        let store_to_origin_m = haversine_m(store, origin);
        let total_m = agent_to_store_m + store_to_origin_m;

        tracing::info!(
            agent = agent.name.as_str(),
            agent_idx = agent_idx.0,
            total_m,
            "delivery agent assigned"
        );

        Ok(Self {
            agent_idx,
            agent,
            store,
            origin,
            agent_to_store_m,
            store_to_origin_m,
            total_m,
            charge: delivery_charge(total_m),
        })
    }
}

fn validate(point: Coordinate, what: &str) -> Result<(), DeliveryError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(DeliveryError::InvalidArgument(format!(
            "{what} coordinates ({}, {}) are out of range",
            point.latitude, point.longitude
        )))
    }
}

/// Fee bands: up to 5 km is 20, up to 10 km is 30, anything longer is 50.
#[must_use]
pub fn delivery_charge(total_m: f64) -> u32 {
    let km = total_m / 1000.0;
    if km <= 5.0 {
        20
    } else if km <= 10.0 {
        30
    } else {
        50
    }
}
