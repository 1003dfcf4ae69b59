//! Three-tier availability classification for ranked pharmacies.

use std::collections::HashSet;

use medorch_core::Coordinate;
use serde::{Deserialize, Serialize};

/// An alternate product offered for a requested medicine.
///
/// The ranking step emits either `{ "requested", "found" }` or a bare name
/// (which then stands for both).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Substitution {
    Pair { requested: String, found: String },
    Named(String),
}

impl Substitution {
    #[must_use]
    pub fn requested(&self) -> &str {
        match self {
            Substitution::Pair { requested, .. } | Substitution::Named(requested) => requested.as_str(),
        }
    }

    #[must_use]
    pub fn found(&self) -> &str {
        match self {
            Substitution::Pair { found, .. } | Substitution::Named(found) => found.as_str(),
        }
    }
}

/// Per-location medicine status as reported under `medicine_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAvailability {
    #[serde(default)]
    pub available: Vec<String>,
    #[serde(default, rename = "alternative")]
    pub substitutable: Vec<Substitution>,
    #[serde(default, rename = "missing")]
    pub absent: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Highest,
    Medium,
    Low,
}

impl PriorityTier {
    /// Marker color shown to users for this tier.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            PriorityTier::Highest => "green",
            PriorityTier::Medium => "yellow",
            PriorityTier::Low => "red",
        }
    }

    /// Rank 0 is always `Highest`, even with missing items; after that a
    /// single absent item drops the location to `Low`.
    #[must_use]
    pub fn for_rank(rank: usize, availability: &LocationAvailability) -> Self {
        if rank == 0 {
            PriorityTier::Highest
        } else if availability.absent.is_empty() {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityTier::Highest => write!(f, "highest"),
            PriorityTier::Medium => write!(f, "medium"),
            PriorityTier::Low => write!(f, "low"),
        }
    }
}

/// Resolve duplicates and conflicts between the three lists.
///
/// Steps, in order: dedupe each list by requested name (first wins), drop
/// anything absent from the other two lists, then drop substitutions for
/// names that are exactly available.
#[must_use]
pub fn resolve(raw: &LocationAvailability) -> LocationAvailability {
    let available = dedupe_by(&raw.available, String::as_str);
    let substitutable = dedupe_by(&raw.substitutable, Substitution::requested);
    let absent = dedupe_by(&raw.absent, String::as_str);

    let absent_names: HashSet<&str> = absent.iter().map(String::as_str).collect();
    let available: Vec<String> = available
        .into_iter()
        .filter(|name| !absent_names.contains(name.as_str()))
        .collect();

    let available_names: HashSet<&str> = available.iter().map(String::as_str).collect();
    let substitutable = substitutable
        .into_iter()
        .filter(|s| !absent_names.contains(s.requested()))
        .filter(|s| !available_names.contains(s.requested()))
        .collect();

    LocationAvailability {
        available,
        substitutable,
        absent,
    }
}

fn dedupe_by<T: Clone>(items: &[T], key: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(key(*item).to_string()))
        .cloned()
        .collect()
}

/// Resolve and tier an ordered list of locations; index is rank.
#[must_use]
pub fn classify(locations: &[LocationAvailability]) -> Vec<(LocationAvailability, PriorityTier)> {
    locations
        .iter()
        .enumerate()
        .map(|(rank, raw)| {
            let resolved = resolve(raw);
            let tier = PriorityTier::for_rank(rank, &resolved);
            (resolved, tier)
        })
        .collect()
}

/// One entry of the ranking collaborator's `ranked_stores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStore {
    pub store_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub distance_from_source: Option<f64>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub medicine_status: LocationAvailability,
}

impl RankedStore {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Ranking collaborator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResponse {
    #[serde(default)]
    pub source_location: serde_json::Value,
    #[serde(default)]
    pub ranked_stores: Vec<RankedStore>,
}

/// A ranked store after conflict resolution, with its tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLocation {
    pub rank: usize,
    pub store_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_source: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    pub medicine_status: LocationAvailability,
    pub tier: PriorityTier,
    pub color: &'static str,
}

impl ClassifiedLocation {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Classify the stores of one ranking response, keeping their order.
#[must_use]
pub fn classify_stores(stores: &[RankedStore]) -> Vec<ClassifiedLocation> {
    let statuses: Vec<LocationAvailability> =
        stores.iter().map(|s| s.medicine_status.clone()).collect();

    stores
        .iter()
        .zip(classify(&statuses))
        .enumerate()
        .map(|(rank, (store, (medicine_status, tier)))| ClassifiedLocation {
            rank,
            store_name: store.store_name.clone(),
            latitude: store.latitude,
            longitude: store.longitude,
            distance_from_source: store.distance_from_source,
            total_price: store.total_price,
            medicine_status,
            tier,
            color: tier.color(),
        })
        .collect()
}
