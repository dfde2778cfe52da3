//! Events recorded by the engine for the presentation layer.
//!
//! Every state transition is recorded as a [`SkillEvent`], including those
//! performed silently as part of a cascade or reconciliation. Separately, a
//! [`SkillEvent::Changed`] notification is recorded once per non-silent
//! operation that modified state; presentation code re-renders on it.
//! Events accumulate until drained with `SkillTreeEngine::drain_events`.

use crate::budget::{Ceiling, Cost};
use crate::id::{NodeKey, TierKey};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillEvent {
    // -- Nodes --
    NodeUnlocked {
        node: NodeKey,
        tier: TierKey,
        cost: Cost,
    },
    NodeRefunded {
        node: NodeKey,
        tier: TierKey,
        cost: Cost,
    },
    /// A node was chosen for eviction after a ceiling was lowered. Followed
    /// by `NodeRefunded` for it and any cascaded descendants.
    NodeEvicted { node: NodeKey },

    // -- Tiers --
    SpecializationSelected { tier: TierKey },
    TierRevealed { tier: TierKey },
    TierHidden { tier: TierKey },
    TierMaxed { tier: TierKey, unlocked: usize },
    TierReset { tier: TierKey, refunded: usize },
    AllReset { refunded: usize },
    /// The base tier reached its completion threshold.
    BaseCompleted,
    /// "Max current" was requested with a complete base tier but no
    /// specialization selected.
    SpecializationRequired,

    // -- Budget --
    CeilingChanged { ceiling: Ceiling, value: u32 },

    /// State changed; re-render. Carries the new revision number.
    Changed { revision: u64 },
}

/// Discriminant tag for [`SkillEvent`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillEventKind {
    NodeUnlocked,
    NodeRefunded,
    NodeEvicted,
    SpecializationSelected,
    TierRevealed,
    TierHidden,
    TierMaxed,
    TierReset,
    AllReset,
    BaseCompleted,
    SpecializationRequired,
    CeilingChanged,
    Changed,
}

impl SkillEvent {
    pub fn kind(&self) -> SkillEventKind {
        match self {
            SkillEvent::NodeUnlocked { .. } => SkillEventKind::NodeUnlocked,
            SkillEvent::NodeRefunded { .. } => SkillEventKind::NodeRefunded,
            SkillEvent::NodeEvicted { .. } => SkillEventKind::NodeEvicted,
            SkillEvent::SpecializationSelected { .. } => SkillEventKind::SpecializationSelected,
            SkillEvent::TierRevealed { .. } => SkillEventKind::TierRevealed,
            SkillEvent::TierHidden { .. } => SkillEventKind::TierHidden,
            SkillEvent::TierMaxed { .. } => SkillEventKind::TierMaxed,
            SkillEvent::TierReset { .. } => SkillEventKind::TierReset,
            SkillEvent::AllReset { .. } => SkillEventKind::AllReset,
            SkillEvent::BaseCompleted => SkillEventKind::BaseCompleted,
            SkillEvent::SpecializationRequired => SkillEventKind::SpecializationRequired,
            SkillEvent::CeilingChanged { .. } => SkillEventKind::CeilingChanged,
            SkillEvent::Changed { .. } => SkillEventKind::Changed,
        }
    }
}
