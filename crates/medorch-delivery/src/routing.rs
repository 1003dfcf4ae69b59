//! Input document for the route-planning collaborator.

use medorch_core::Coordinate;
use serde::Serialize;

use crate::availability::{ClassifiedLocation, PriorityTier};
use crate::registry::AgentId;

/// Store coordinates grouped by tier color, each list in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierLists {
    pub green_stores: Vec<[f64; 2]>,
    pub yellow_stores: Vec<[f64; 2]>,
    pub red_stores: Vec<[f64; 2]>,
}

impl TierLists {
    #[must_use]
    pub fn from_classified(locations: &[ClassifiedLocation]) -> Self {
        let mut lists = Self::default();
        for location in locations {
            let pair = location.coordinate().as_pair();
            match location.tier {
                PriorityTier::Highest => lists.green_stores.push(pair),
                PriorityTier::Medium => lists.yellow_stores.push(pair),
                PriorityTier::Low => lists.red_stores.push(pair),
            }
        }
        lists
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingRequest {
    pub origin: [f64; 2],
    #[serde(flatten)]
    pub tiers: TierLists,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_store: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub create_delivery: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_idx: Option<AgentId>,
}

impl RoutingRequest {
    /// Map-only request: origin plus the tiered store markers.
    #[must_use]
    pub fn map(origin: Coordinate, tiers: TierLists) -> Self {
        Self {
            origin: origin.as_pair(),
            tiers,
            best_store: None,
            create_delivery: false,
            agent_idx: None,
        }
    }

    /// Ask the collaborator to also draw the delivery route for `agent_idx`.
    #[must_use]
    pub fn with_delivery(mut self, store: Coordinate, agent_idx: AgentId) -> Self {
        self.best_store = Some(store.as_pair());
        self.create_delivery = true;
        self.agent_idx = Some(agent_idx);
        self
    }
}
