//! Base-tier completion, mutually exclusive specializations and tier
//! visibility.
//!
//! The base tier is complete once enough of its members are unlocked. Only
//! then can a specialization root be unlocked, and unlocking one resets
//! whichever other specialization was active. Collapsed specialization
//! tiers show only their root until they are revealed by selection.

use crate::engine::SkillTreeEngine;
use crate::event::SkillEvent;
use crate::graph::SkillGraph;
use crate::id::{NodeKey, TierKey};
use slotmap::SecondaryMap;
use tracing::{debug, info, warn};

/// Completion threshold plus per-tier reveal flags.
#[derive(Debug, Clone)]
pub struct TierExclusivity {
    threshold: usize,
    revealed: SecondaryMap<TierKey, bool>,
}

impl TierExclusivity {
    /// `threshold` of `None` requires every base-tier node.
    pub fn new(graph: &SkillGraph, threshold: Option<u32>) -> Self {
        let base_size = graph[graph.base_tier()].nodes.len();
        let threshold = threshold.map_or(base_size, |t| t as usize);
        if threshold > base_size {
            warn!(
                threshold,
                base_size, "completion threshold exceeds base tier size; specializations unreachable"
            );
        }
        let revealed = graph.tiers().map(|(key, _)| (key, false)).collect();
        Self {
            threshold,
            revealed,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn is_revealed(&self, tier: TierKey) -> bool {
        self.revealed.get(tier).copied().unwrap_or(false)
    }
}

impl SkillTreeEngine {
    /// True once the number of unlocked base-tier nodes reaches the
    /// completion threshold.
    pub fn is_base_complete(&self) -> bool {
        self.unlocked_in_tier(self.graph.base_tier()) >= self.exclusivity.threshold
    }

    /// `(unlocked, threshold)` for the base tier.
    pub fn base_progress(&self) -> (usize, usize) {
        (
            self.unlocked_in_tier(self.graph.base_tier()),
            self.exclusivity.threshold,
        )
    }

    /// The specialization whose root is unlocked, if any. There is at most one.
    pub fn active_specialization(&self) -> Option<TierKey> {
        self.graph
            .specializations()
            .find(|(_, tier)| tier.root.is_some_and(|root| self.is_unlocked(root)))
            .map(|(key, _)| key)
    }

    /// True for the base tier and for a specialization whose root is unlocked.
    pub fn is_tier_active(&self, tier: TierKey) -> bool {
        match self.graph.tier(tier) {
            Some(t) if t.is_base => true,
            Some(t) => t.root.is_some_and(|root| self.is_unlocked(root)),
            None => false,
        }
    }

    /// Whether all members of a tier are shown. Base and non-collapsed tiers
    /// always are; collapsed tiers only after selection.
    pub fn is_tier_revealed(&self, tier: TierKey) -> bool {
        match self.graph.tier(tier) {
            Some(t) => t.is_base || !t.collapsed || self.exclusivity.is_revealed(tier),
            None => false,
        }
    }

    /// Roots are always visible; other members follow their tier.
    pub fn is_node_visible(&self, key: NodeKey) -> bool {
        let Some(node) = self.graph.node(key) else {
            return false;
        };
        self.graph[node.tier].root == Some(key) || self.is_tier_revealed(node.tier)
    }

    /// Make `tier_id` the selected specialization: reset every other active
    /// specialization and reveal this one. Requires a complete base tier and
    /// met tier requirements. Returns whether the selection happened.
    pub fn select_specialization(&mut self, tier_id: &str) -> bool {
        let Some(tier) = self.graph.tier_key(tier_id) else {
            debug!(tier = tier_id, "select ignored: unknown tier");
            return false;
        };
        if self.graph[tier].is_base {
            debug!(tier = tier_id, "select ignored: base tier");
            return false;
        }
        if !self.is_base_complete() || !self.tier_requirements_met(tier) {
            debug!(tier = tier_id, "select ignored: tier is gated");
            return false;
        }
        self.select_specialization_key(tier);
        self.flush_changes();
        true
    }

    pub(crate) fn select_specialization_key(&mut self, tier: TierKey) {
        let others: Vec<TierKey> = self
            .graph
            .specializations()
            .map(|(key, _)| key)
            .filter(|&key| key != tier)
            .collect();
        for other in others {
            if !self.is_tier_active(other) {
                // Revealed by an earlier selection whose root never unlocked.
                self.hide_tier(other);
                continue;
            }
            info!(
                from = %self.graph[other].id,
                to = %self.graph[tier].id,
                "switching specialization"
            );
            self.reset_tier_key(other);
        }
        if self.reveal_tier(tier) {
            self.events.push(SkillEvent::SpecializationSelected { tier });
        }
    }

    /// Returns whether the flag changed.
    pub(crate) fn reveal_tier(&mut self, tier: TierKey) -> bool {
        if self.exclusivity.is_revealed(tier) {
            return false;
        }
        self.exclusivity.revealed.insert(tier, true);
        self.dirty = true;
        self.events.push(SkillEvent::TierRevealed { tier });
        true
    }

    pub(crate) fn hide_tier(&mut self, tier: TierKey) {
        if !self.exclusivity.is_revealed(tier) {
            return;
        }
        self.exclusivity.revealed.insert(tier, false);
        self.dirty = true;
        self.events.push(SkillEvent::TierHidden { tier });
    }
}
