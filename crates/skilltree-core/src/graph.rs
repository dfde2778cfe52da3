//! The graph index: canonical node and tier tables plus the derived parent
//! index.
//!
//! A [`SkillGraph`] is built once from a [`TreeDefinition`] and is immutable
//! afterwards. Node and tier identities are slotmap keys; string ids are
//! resolved through [`SkillGraph::node_key`] and [`SkillGraph::tier_key`].
//! Runtime unlock state is not stored here; it belongs to the engine.

use crate::budget::Cost;
use crate::id::{GridPos, NodeKey, ROOT_SUFFIX, TierKey};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;
use std::ops::Index;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that make a tree definition unusable. Building stops at the first
/// one; no partial graph is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("tree definition contains no tiers")]
    NoTiers,

    #[error("duplicate tier id: {0}")]
    DuplicateTierId(String),

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("node {parent} lists unknown child {child}")]
    DanglingChild { parent: String, child: String },

    #[error("tier {tier} requires unknown node {node}")]
    DanglingRequirement { tier: String, node: String },

    #[error("specialization tier {0} has no root node")]
    MissingRoot(String),

    #[error("root {root} of tier {tier} is not a member of that tier")]
    RootNotInTier { tier: String, root: String },
}

// ---------------------------------------------------------------------------
// Definitions (input)
// ---------------------------------------------------------------------------

/// A node as declared in a tree definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    pub name: String,
    pub desc: Option<String>,
    /// Opaque to the engine; passed through to the presentation layer.
    pub icon: Option<String>,
    pub cost: u32,
    pub seal: u32,
    /// Position relative to the owning tier's origin.
    pub position: GridPos,
    pub children: Vec<String>,
}

impl NodeDefinition {
    /// A free node with no children, named after its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Self::default()
        }
    }
}

/// A tier as declared in a tree definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub id: String,
    pub name: String,
    pub origin: GridPos,
    /// Hide members other than the root until the tier is selected.
    /// Ignored for the base tier.
    pub collapsed: bool,
    /// Explicit root node id. Falls back to `<id>01` when absent.
    pub root: Option<String>,
    /// Nodes that must all be unlocked before any member can be unlocked.
    pub requires_unlocked: Vec<String>,
    pub nodes: Vec<NodeDefinition>,
}

impl TierDefinition {
    pub fn new(id: impl Into<String>, nodes: Vec<NodeDefinition>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            nodes,
            ..Self::default()
        }
    }
}

/// A complete tree definition. The first tier is the base tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDefinition {
    pub tiers: Vec<TierDefinition>,
}

// ---------------------------------------------------------------------------
// Built records
// ---------------------------------------------------------------------------

/// A node in the built graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub desc: Option<String>,
    pub icon: Option<String>,
    pub cost: u32,
    pub seal: u32,
    pub position: GridPos,
    pub tier: TierKey,
    pub children: Vec<NodeKey>,
}

impl Node {
    /// The combined points/seal price of this node.
    pub fn price(&self) -> Cost {
        Cost::new(self.cost, self.seal)
    }
}

/// A tier in the built graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tier {
    pub id: String,
    pub name: String,
    pub origin: GridPos,
    pub collapsed: bool,
    pub is_base: bool,
    pub root: Option<NodeKey>,
    pub requires_unlocked: Vec<NodeKey>,
    /// Members in definition order.
    pub nodes: Vec<NodeKey>,
}

// ---------------------------------------------------------------------------
// SkillGraph
// ---------------------------------------------------------------------------

/// The immutable topology of a skill tree.
///
/// A graph only comes out of [`SkillGraph::build`]; it serializes for
/// inspection but cannot be read back.
///
/// ```compile_fail
/// let _ = serde_json::from_str::<skilltree_core::graph::SkillGraph>("{}");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SkillGraph {
    nodes: SlotMap<NodeKey, Node>,
    tiers: SlotMap<TierKey, Tier>,
    node_order: Vec<NodeKey>,
    tier_order: Vec<TierKey>,
    node_index: HashMap<String, NodeKey>,
    tier_index: HashMap<String, TierKey>,
    /// Reverse edges: for each node, the nodes that list it as a child.
    parents: SecondaryMap<NodeKey, Vec<NodeKey>>,
    /// For each node, the tiers whose `requires_unlocked` names it.
    required_by: SecondaryMap<NodeKey, Vec<TierKey>>,
    base: TierKey,
}

impl SkillGraph {
    /// Build the graph from a definition.
    ///
    /// Ids must be globally unique across all tiers. Every child and tier
    /// requirement must name an existing node, and every non-base tier must
    /// resolve a root.
    pub fn build(definition: TreeDefinition) -> Result<Self, DefinitionError> {
        if definition.tiers.is_empty() {
            return Err(DefinitionError::NoTiers);
        }

        let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
        let mut tiers: SlotMap<TierKey, Tier> = SlotMap::with_key();
        let mut node_order = Vec::new();
        let mut tier_order = Vec::with_capacity(definition.tiers.len());
        let mut node_index = HashMap::new();
        let mut tier_index = HashMap::new();

        let mut pending_children: Vec<(NodeKey, Vec<String>)> = Vec::new();
        let mut pending_tiers: Vec<(TierKey, Option<String>, Vec<String>)> = Vec::new();

        // Phase 1: register tiers and nodes.
        for (index, tier_def) in definition.tiers.into_iter().enumerate() {
            if tier_index.contains_key(&tier_def.id) {
                return Err(DefinitionError::DuplicateTierId(tier_def.id));
            }

            let is_base = index == 0;
            let tier_key = tiers.insert(Tier {
                id: tier_def.id.clone(),
                name: tier_def.name,
                origin: tier_def.origin,
                collapsed: tier_def.collapsed && !is_base,
                is_base,
                root: None,
                requires_unlocked: Vec::new(),
                nodes: Vec::with_capacity(tier_def.nodes.len()),
            });
            tier_index.insert(tier_def.id, tier_key);
            tier_order.push(tier_key);

            for node_def in tier_def.nodes {
                if node_index.contains_key(&node_def.id) {
                    return Err(DefinitionError::DuplicateNodeId(node_def.id));
                }
                let key = nodes.insert(Node {
                    id: node_def.id.clone(),
                    name: node_def.name,
                    desc: node_def.desc,
                    icon: node_def.icon,
                    cost: node_def.cost,
                    seal: node_def.seal,
                    position: node_def.position,
                    tier: tier_key,
                    children: Vec::new(),
                });
                node_index.insert(node_def.id, key);
                node_order.push(key);
                tiers[tier_key].nodes.push(key);
                pending_children.push((key, node_def.children));
            }

            pending_tiers.push((tier_key, tier_def.root, tier_def.requires_unlocked));
        }

        // Phase 2: resolve children and derive the parent index.
        let mut parents: SecondaryMap<NodeKey, Vec<NodeKey>> =
            node_order.iter().map(|&key| (key, Vec::new())).collect();
        for (key, child_ids) in pending_children {
            let mut children = Vec::with_capacity(child_ids.len());
            for child_id in child_ids {
                let child = node_index.get(&child_id).copied().ok_or_else(|| {
                    DefinitionError::DanglingChild {
                        parent: nodes[key].id.clone(),
                        child: child_id.clone(),
                    }
                })?;
                if children.contains(&child) {
                    continue;
                }
                children.push(child);
                let child_parents = &mut parents[child];
                if !child_parents.contains(&key) {
                    child_parents.push(key);
                }
            }
            nodes[key].children = children;
        }

        // Phase 3: resolve tier roots and requirements.
        let mut required_by: SecondaryMap<NodeKey, Vec<TierKey>> =
            node_order.iter().map(|&key| (key, Vec::new())).collect();
        for (tier_key, explicit_root, requirement_ids) in pending_tiers {
            let tier = &tiers[tier_key];
            let root = match explicit_root {
                Some(root_id) => {
                    let key = node_index
                        .get(&root_id)
                        .copied()
                        .filter(|&key| nodes[key].tier == tier_key)
                        .ok_or_else(|| DefinitionError::RootNotInTier {
                            tier: tier.id.clone(),
                            root: root_id.clone(),
                        })?;
                    Some(key)
                }
                None => node_index
                    .get(&format!("{}{ROOT_SUFFIX}", tier.id))
                    .copied()
                    .filter(|&key| nodes[key].tier == tier_key),
            };
            if root.is_none() && !tier.is_base {
                return Err(DefinitionError::MissingRoot(tier.id.clone()));
            }

            let mut requires_unlocked = Vec::with_capacity(requirement_ids.len());
            for node_id in requirement_ids {
                let key = node_index.get(&node_id).copied().ok_or_else(|| {
                    DefinitionError::DanglingRequirement {
                        tier: tier.id.clone(),
                        node: node_id.clone(),
                    }
                })?;
                if !requires_unlocked.contains(&key) {
                    requires_unlocked.push(key);
                    required_by[key].push(tier_key);
                }
            }

            let tier = &mut tiers[tier_key];
            tier.root = root;
            tier.requires_unlocked = requires_unlocked;
        }

        let base = tier_order[0];
        Ok(Self {
            nodes,
            tiers,
            node_order,
            tier_order,
            node_index,
            tier_index,
            parents,
            required_by,
            base,
        })
    }

    // -- Tier queries --

    /// The base tier: the first tier in definition order.
    pub fn base_tier(&self) -> TierKey {
        self.base
    }

    /// Id of the base tier.
    pub fn base_tier_id(&self) -> &str {
        &self.tiers[self.base].id
    }

    pub fn tier_key(&self, id: &str) -> Option<TierKey> {
        self.tier_index.get(id).copied()
    }

    pub fn tier(&self, key: TierKey) -> Option<&Tier> {
        self.tiers.get(key)
    }

    /// Tiers in definition order.
    pub fn tiers(&self) -> impl Iterator<Item = (TierKey, &Tier)> + '_ {
        self.tier_order.iter().map(|&key| (key, &self.tiers[key]))
    }

    /// Non-base tiers in definition order.
    pub fn specializations(&self) -> impl Iterator<Item = (TierKey, &Tier)> + '_ {
        self.tiers().skip(1)
    }

    pub fn tier_count(&self) -> usize {
        self.tier_order.len()
    }

    /// The root of `tier`, if it has one.
    pub fn root_of(&self, tier: TierKey) -> Option<NodeKey> {
        self.tiers.get(tier).and_then(|t| t.root)
    }

    // -- Node queries --

    pub fn node_key(&self, id: &str) -> Option<NodeKey> {
        self.node_index.get(id).copied()
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Nodes in definition order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.node_order.iter().map(|&key| (key, &self.nodes[key]))
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn parents(&self, key: NodeKey) -> &[NodeKey] {
        self.parents.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map_or(&[], |node| node.children.as_slice())
    }

    /// Tiers that list `key` in their `requires_unlocked`.
    pub fn tiers_requiring(&self, key: NodeKey) -> &[TierKey] {
        self.required_by.get(key).map_or(&[], Vec::as_slice)
    }

    /// Whether `key` is the root of a non-base tier.
    pub fn is_specialization_root(&self, key: NodeKey) -> bool {
        self.nodes.get(key).is_some_and(|node| {
            let tier = &self.tiers[node.tier];
            !tier.is_base && tier.root == Some(key)
        })
    }

    /// Every (parent, child) edge, parents in definition order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeKey, NodeKey)> + '_ {
        self.node_order.iter().flat_map(move |&parent| {
            self.nodes[parent]
                .children
                .iter()
                .map(move |&child| (parent, child))
        })
    }
}

impl Index<NodeKey> for SkillGraph {
    type Output = Node;

    fn index(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }
}

impl Index<TierKey> for SkillGraph {
    type Output = Tier;

    fn index(&self, key: TierKey) -> &Tier {
        &self.tiers[key]
    }
}

// ===========================================================================
// Tests
// ===========================================================================
