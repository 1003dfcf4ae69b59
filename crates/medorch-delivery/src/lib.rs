//! Availability classification and delivery-agent assignment.
//!
//! Everything here is a pure function of its inputs plus the read-only
//! [`AgentRegistry`] loaded at startup.

pub mod assignment;
pub mod availability;
pub mod error;
pub mod geo;
pub mod registry;
pub mod routing;

pub use assignment::{delivery_charge, Assignment};
pub use availability::{
    classify, classify_stores, resolve, ClassifiedLocation, LocationAvailability, PriorityTier,
    RankedStore, RankingResponse, Substitution,
};
pub use error::DeliveryError;
pub use geo::{haversine_m, EARTH_RADIUS_M};
pub use registry::{AgentId, AgentRegistry};
pub use routing::{RoutingRequest, TierLists};
