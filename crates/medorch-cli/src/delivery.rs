//! `classify` and `nearest` commands.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use medorch_core::Coordinate;
use medorch_delivery::{classify_stores, AgentRegistry, RankingResponse, TierLists};
use serde_json::json;

pub(crate) fn read_ranking(path: &Path) -> anyhow::Result<RankingResponse> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading ranking file {}", path.display()))?
    };
    serde_json::from_str(&content).context("parsing ranking response")
}

pub(crate) fn classify_json(ranking: &RankingResponse) -> serde_json::Value {
    let stores = classify_stores(&ranking.ranked_stores);
    let tiers = TierLists::from_classified(&stores);
    json!({ "stores": stores, "tiers": tiers })
}

pub(crate) fn run_classify(path: &Path) -> anyhow::Result<()> {
    let ranking = read_ranking(path)?;
    println!("{}", serde_json::to_string_pretty(&classify_json(&ranking))?);
    Ok(())
}

pub(crate) fn nearest_json(
    registry: &AgentRegistry,
    target: Coordinate,
) -> anyhow::Result<serde_json::Value> {
    if !target.is_valid() {
        anyhow::bail!(
            "coordinates ({}, {}) are out of range",
            target.latitude,
            target.longitude
        );
    }
    let (id, distance_m) = registry.nearest(target);
    let agent = registry.get(id)?;
    Ok(json!({
        "agent_idx": id,
        "agent": agent,
        "distance_m": distance_m,
    }))
}

pub(crate) fn run_nearest(agents_path: &Path, lat: f64, lon: f64) -> anyhow::Result<()> {
    let file = medorch_core::load_agents(agents_path)?;
    let registry = AgentRegistry::new(file.agents)?;
    let result = nearest_json(&registry, Coordinate::new(lat, lon))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
