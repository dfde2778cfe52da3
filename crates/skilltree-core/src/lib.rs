//! Skilltree Core -- the unlock engine for tiered skill trees.
//!
//! A skill tree is a set of tiers. The first tier is the **base** tier; every
//! other tier is a **specialization** entered through its root node. Nodes
//! are connected by parent -> child edges, and a node may be unlocked once
//! any one of its parents is unlocked (OR prerequisites).
//!
//! # Rules
//!
//! - Unlocking debits a point cost and a seal cost against two ceilings.
//! - Refunding a node also refunds every descendant that would otherwise be
//!   left without an unlocked parent.
//! - Specialization roots open only once the base tier is complete, and at
//!   most one specialization is active: selecting another resets the first.
//! - Lowering a ceiling below current usage evicts the most recently
//!   unlocked nodes until usage fits again.
//!
//! # Key Types
//!
//! - [`graph::SkillGraph`] -- Immutable topology built from a
//!   [`graph::TreeDefinition`].
//! - [`engine::SkillTreeEngine`] -- Owns the graph and all mutable state;
//!   exposes the user operations.
//! - [`budget::Budget`] -- Point and seal counters with ceilings.
//! - [`event::SkillEvent`] -- Drainable record of every state transition.
//! - [`view::TreeSnapshot`] -- Serializable render state.
//!
//! ```rust,ignore
//! let mut engine = SkillTreeEngine::from_definition(definition, &EngineConfig::new())?;
//! engine.max_tier("Verdo");
//! engine.unlock("Smite01");
//! for event in engine.drain_events() { /* ... */ }
//! ```

pub mod budget;
pub mod config;
pub mod engine;
pub mod event;
pub mod exclusivity;
pub mod graph;
pub mod history;
pub mod id;
pub mod validation;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use budget::{Budget, Ceiling, Cost};
pub use config::EngineConfig;
pub use engine::{Blocker, SkillTreeEngine, UnlockOutcome};
pub use event::{SkillEvent, SkillEventKind};
pub use graph::{DefinitionError, NodeDefinition, SkillGraph, TierDefinition, TreeDefinition};
pub use id::{GridPos, NodeKey, TierKey};
pub use view::{NodeState, TreeSnapshot};
