//! Shared test helpers for unit, property and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so downstream
//! test crates can enable them through the `test-utils` feature.

use crate::config::EngineConfig;
use crate::engine::SkillTreeEngine;
use crate::graph::{NodeDefinition, TierDefinition, TreeDefinition};

// ===========================================================================
// Definition builders
// ===========================================================================

/// A node costing `cost` points and no seals.
pub fn node(id: &str, cost: u32, children: &[&str]) -> NodeDefinition {
    sealed_node(id, cost, 0, children)
}

pub fn sealed_node(id: &str, cost: u32, seal: u32, children: &[&str]) -> NodeDefinition {
    NodeDefinition {
        cost,
        seal,
        children: children.iter().map(|c| c.to_string()).collect(),
        ..NodeDefinition::new(id)
    }
}

pub fn tier(id: &str, nodes: Vec<NodeDefinition>) -> TierDefinition {
    TierDefinition::new(id, nodes)
}

pub fn collapsed_tier(id: &str, nodes: Vec<NodeDefinition>) -> TierDefinition {
    TierDefinition {
        collapsed: true,
        ..TierDefinition::new(id, nodes)
    }
}

// ===========================================================================
// Sample tree
// ===========================================================================

/// Base tier `Verdo` (5 points), open specialization `Smite` (5 points) and
/// collapsed specialization `Lifeb` (4 points).
///
/// ```text
/// Verdo:  v1 -> v2 -> v4        Smite:  Smite01 -> Smite02 -> Smite04
///         v1 -> v3                      Smite01 -> Smite03
/// Lifeb:  Lifeb01 -> Lifeb02 -> Lifeb03
/// ```
pub fn sample_tiers() -> Vec<TierDefinition> {
    vec![
        tier(
            "Verdo",
            vec![
                node("v1", 1, &["v2", "v3"]),
                node("v2", 1, &["v4"]),
                node("v3", 1, &[]),
                node("v4", 2, &[]),
            ],
        ),
        tier(
            "Smite",
            vec![
                node("Smite01", 1, &["Smite02", "Smite03"]),
                node("Smite02", 1, &["Smite04"]),
                node("Smite03", 2, &[]),
                node("Smite04", 1, &[]),
            ],
        ),
        collapsed_tier(
            "Lifeb",
            vec![
                node("Lifeb01", 1, &["Lifeb02"]),
                node("Lifeb02", 1, &["Lifeb03"]),
                node("Lifeb03", 2, &[]),
            ],
        ),
    ]
}

pub fn sample_tree() -> TreeDefinition {
    TreeDefinition {
        tiers: sample_tiers(),
    }
}

// ===========================================================================
// Engine construction
// ===========================================================================

/// Build an engine from tier definitions. Panics on an invalid definition.
pub fn build_engine(tiers: Vec<TierDefinition>, config: EngineConfig) -> SkillTreeEngine {
    SkillTreeEngine::from_definition(TreeDefinition { tiers }, &config)
        .expect("test tree definition should be valid")
}

/// The sample tree with the given budget caps.
pub fn sample_engine(points_cap: u32, seal_cap: u32) -> SkillTreeEngine {
    build_engine(
        sample_tiers(),
        EngineConfig::new().with_caps(points_cap, seal_cap),
    )
}
