//! Serde data file structs for skill tree definitions.
//!
//! These structs define the on-disk format. Field names follow the tree
//! JSON document (`requiresUnlocked`, flat `gx`/`gy` per node). They are
//! deserialized from RON, JSON, or TOML and then converted into core
//! definition types.

use serde::{Deserialize, Serialize};
use skilltree_core::graph::{NodeDefinition, TierDefinition, TreeDefinition};
use skilltree_core::id::GridPos;

// ===========================================================================
// Tree
// ===========================================================================

/// A whole tree document. The first tier is the base tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeData {
    pub tiers: Vec<TierData>,
}

// ===========================================================================
// Tiers
// ===========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierData {
    pub id: String,
    /// Display name. Defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub origin: OriginData,
    #[serde(default)]
    pub collapsed: bool,
    /// Explicit root node id; `<id>01` is used when absent.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub requires_unlocked: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeData>,
}

/// Tier origin on the layout grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginData {
    #[serde(default)]
    pub gx: f64,
    #[serde(default)]
    pub gy: f64,
}

// ===========================================================================
// Nodes
// ===========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub seal: u32,
    /// Offset from the tier origin.
    #[serde(default)]
    pub gx: f64,
    #[serde(default)]
    pub gy: f64,
    #[serde(default)]
    pub children: Vec<String>,
}

// ===========================================================================
// Conversion
// ===========================================================================

impl From<NodeData> for NodeDefinition {
    fn from(data: NodeData) -> Self {
        NodeDefinition {
            name: data.name.unwrap_or_else(|| data.id.clone()),
            id: data.id,
            desc: data.desc,
            icon: data.icon,
            cost: data.cost,
            seal: data.seal,
            position: GridPos::new(data.gx, data.gy),
            children: data.children,
        }
    }
}

impl From<TierData> for TierDefinition {
    fn from(data: TierData) -> Self {
        TierDefinition {
            name: data.name.unwrap_or_else(|| data.id.clone()),
            id: data.id,
            origin: GridPos::new(data.origin.gx, data.origin.gy),
            collapsed: data.collapsed,
            root: data.root,
            requires_unlocked: data.requires_unlocked,
            nodes: data.nodes.into_iter().map(NodeDefinition::from).collect(),
        }
    }
}

impl From<TreeData> for TreeDefinition {
    fn from(data: TreeData) -> Self {
        TreeDefinition {
            tiers: data.tiers.into_iter().map(TierDefinition::from).collect(),
        }
    }
}
