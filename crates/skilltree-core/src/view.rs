//! Read-only snapshots of engine state for rendering.
//!
//! A [`TreeSnapshot`] is a plain serializable value keyed by string ids. It
//! is derived entirely from the engine; nothing in it feeds back.

use crate::budget::Cost;
use crate::engine::{Blocker, SkillTreeEngine};
use crate::id::{GridPos, NodeKey};
use serde::Serialize;

/// Derived display state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Locked,
    /// Locked, and every unlock gate currently passes.
    Available,
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub name: String,
    pub tier: String,
    pub state: NodeState,
    pub visible: bool,
    pub cost: u32,
    pub seal: u32,
    /// Absolute grid position: tier origin plus node offset.
    pub position: GridPos,
    pub is_root: bool,
    /// Why a locked node is not available. `None` for available and
    /// unlocked nodes.
    pub blocker: Option<Blocker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    /// Both endpoints visible.
    pub visible: bool,
    /// Parent unlocked.
    pub lit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierView {
    pub id: String,
    pub name: String,
    pub is_base: bool,
    pub revealed: bool,
    pub active: bool,
    pub unlocked: usize,
    pub total: usize,
    pub origin: GridPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetView {
    pub spent: u32,
    pub cap: u32,
    pub seals_spent: u32,
    pub seal_cap: u32,
    pub remaining: Cost,
}

/// Everything a presentation layer needs to draw the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub revision: u64,
    pub budget: BudgetView,
    pub base_complete: bool,
    pub base_progress: (usize, usize),
    /// Id of the tier "reset current" would target.
    pub active_tier: String,
    pub active_specialization: Option<String>,
    pub tiers: Vec<TierView>,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl SkillTreeEngine {
    pub fn node_state(&self, key: NodeKey) -> NodeState {
        if self.is_unlocked(key) {
            NodeState::Unlocked
        } else if self.can_unlock(key) {
            NodeState::Available
        } else {
            NodeState::Locked
        }
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let graph = self.graph();
        let budget = self.budget();

        let tiers = graph
            .tiers()
            .map(|(key, tier)| TierView {
                id: tier.id.clone(),
                name: tier.name.clone(),
                is_base: tier.is_base,
                revealed: self.is_tier_revealed(key),
                active: self.active_specialization() == Some(key),
                unlocked: self.unlocked_in_tier(key),
                total: tier.nodes.len(),
                origin: tier.origin,
            })
            .collect();

        let nodes = graph
            .nodes()
            .map(|(key, node)| {
                let tier = &graph[node.tier];
                NodeView {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    tier: tier.id.clone(),
                    state: self.node_state(key),
                    visible: self.is_node_visible(key),
                    cost: node.cost,
                    seal: node.seal,
                    position: node.position.offset(tier.origin),
                    is_root: tier.root == Some(key),
                    blocker: self
                        .check_unlock(key)
                        .err()
                        .filter(|b| *b != Blocker::AlreadyUnlocked),
                }
            })
            .collect();

        let edges = graph
            .edges()
            .map(|(from, to)| EdgeView {
                from: graph[from].id.clone(),
                to: graph[to].id.clone(),
                visible: self.is_node_visible(from) && self.is_node_visible(to),
                lit: self.is_unlocked(from),
            })
            .collect();

        TreeSnapshot {
            revision: self.revision(),
            budget: BudgetView {
                spent: budget.spent(),
                cap: budget.cap(),
                seals_spent: budget.seals_spent(),
                seal_cap: budget.seal_cap(),
                remaining: budget.remaining(),
            },
            base_complete: self.is_base_complete(),
            base_progress: self.base_progress(),
            active_tier: graph[self.active_tier()].id.clone(),
            active_specialization: self.active_specialization().map(|key| graph[key].id.clone()),
            tiers,
            nodes,
            edges,
        }
    }
}
