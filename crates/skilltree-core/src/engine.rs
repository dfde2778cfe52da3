//! The unlock engine: the state machine over a [`SkillGraph`].
//!
//! # Node lifecycle
//!
//! A node is **locked** until unlocked, then **unlocked** until refunded.
//! "Available" is derived on demand: a locked node whose gates all pass (see
//! [`SkillTreeEngine::check_unlock`]). Nothing about availability is stored.
//!
//! # Operations
//!
//! User-facing handlers take string ids and never fail. Unknown ids and
//! ineligible requests are no-ops, reported through the return value and
//! logged at `debug`. Each non-silent handler that changed state records one
//! [`SkillEvent::Changed`] notification when it finishes.
//!
//! - [`unlock`](SkillTreeEngine::unlock) / [`refund`](SkillTreeEngine::refund)
//! - [`max_tier`](SkillTreeEngine::max_tier) / [`reset_tier`](SkillTreeEngine::reset_tier)
//! - [`reset_all`](SkillTreeEngine::reset_all)
//! - [`set_ceiling`](SkillTreeEngine::set_ceiling), which evicts the most
//!   recently unlocked nodes until usage fits again
//! - [`max_current`](SkillTreeEngine::max_current) /
//!   [`reset_current`](SkillTreeEngine::reset_current) / [`focus`](SkillTreeEngine::focus)
//!
//! Specialization handling (base completion, exclusive tiers, visibility)
//! lives in [`crate::exclusivity`].

use crate::budget::{Budget, Ceiling, Cost};
use crate::config::EngineConfig;
use crate::event::SkillEvent;
use crate::exclusivity::TierExclusivity;
use crate::graph::{DefinitionError, SkillGraph, TreeDefinition};
use crate::history::UnlockHistory;
use crate::id::{NodeKey, TierKey};
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use std::collections::HashSet;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a node cannot be unlocked right now. Checked in declaration order;
/// the first failing gate is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocker {
    AlreadyUnlocked,
    /// A node listed in the tier's `requires_unlocked` is locked.
    TierRequirementUnmet,
    /// Specialization root, but the base tier is not complete.
    BaseIncomplete,
    /// Specialization member, but the tier's root is locked.
    RootLocked,
    /// The node has parents and none of them is unlocked.
    PrerequisiteUnmet,
    InsufficientPoints,
    InsufficientSeals,
}

/// Result of an unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    NotFound,
    Blocked(Blocker),
}

impl UnlockOutcome {
    pub fn is_unlocked(self) -> bool {
        matches!(self, UnlockOutcome::Unlocked)
    }
}

// ---------------------------------------------------------------------------
// SkillTreeEngine
// ---------------------------------------------------------------------------

/// Owns a skill graph together with all of its mutable state: unlock flags,
/// budget, unlock history, tier visibility and the active-tier context.
///
/// Events queue up until [`drain_events`](Self::drain_events) is called.
/// The queue is unbounded, so a caller that only polls
/// [`revision`](Self::revision) or [`snapshot`](Self::snapshot) must still
/// drain it periodically.
#[derive(Debug, Clone)]
pub struct SkillTreeEngine {
    pub(crate) graph: SkillGraph,
    pub(crate) unlocked: SecondaryMap<NodeKey, bool>,
    pub(crate) budget: Budget,
    pub(crate) history: UnlockHistory,
    pub(crate) exclusivity: TierExclusivity,
    /// Tier of the most recent unlock, max or focus; target of "reset current".
    pub(crate) active_tier: TierKey,
    /// Set by every mutation, cleared when a `Changed` notification is recorded.
    pub(crate) dirty: bool,
    pub(crate) revision: u64,
    /// Pending events, oldest first. Only `drain_events` clears it.
    pub(crate) events: Vec<SkillEvent>,
}

impl SkillTreeEngine {
    /// Create an engine over `graph` with nothing unlocked.
    pub fn new(graph: SkillGraph, config: &EngineConfig) -> Self {
        let unlocked = graph.nodes().map(|(key, _)| (key, false)).collect();
        let exclusivity = TierExclusivity::new(&graph, config.base_completion_threshold);
        let active_tier = graph.base_tier();
        Self {
            graph,
            unlocked,
            budget: Budget::new(config.points_cap, config.seal_cap),
            history: UnlockHistory::new(),
            exclusivity,
            active_tier,
            dirty: false,
            revision: 0,
            events: Vec::new(),
        }
    }

    /// Build the graph from `definition` and wrap it in a fresh engine.
    pub fn from_definition(
        definition: TreeDefinition,
        config: &EngineConfig,
    ) -> Result<Self, DefinitionError> {
        Ok(Self::new(SkillGraph::build(definition)?, config))
    }

    // -- Query API --

    pub fn graph(&self) -> &SkillGraph {
        &self.graph
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn history(&self) -> &UnlockHistory {
        &self.history
    }

    /// The tier targeted by [`reset_current`](Self::reset_current).
    pub fn active_tier(&self) -> TierKey {
        self.active_tier
    }

    /// Incremented each time a `Changed` notification is recorded.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_unlocked(&self, key: NodeKey) -> bool {
        self.unlocked.get(key).copied().unwrap_or(false)
    }

    /// [`is_unlocked`](Self::is_unlocked) by string id. Unknown ids are locked.
    pub fn is_unlocked_id(&self, id: &str) -> bool {
        self.graph.node_key(id).is_some_and(|key| self.is_unlocked(key))
    }

    /// Ids of unlocked nodes in definition order.
    pub fn unlocked_ids(&self) -> Vec<&str> {
        self.graph
            .nodes()
            .filter(|(key, _)| self.is_unlocked(*key))
            .map(|(_, node)| node.id.as_str())
            .collect()
    }

    /// Number of unlocked members of `tier`.
    pub fn unlocked_in_tier(&self, tier: TierKey) -> usize {
        self.graph.tier(tier).map_or(0, |t| {
            t.nodes.iter().filter(|&&key| self.is_unlocked(key)).count()
        })
    }

    /// True if the node has no parents or at least one unlocked parent.
    pub fn parents_satisfied(&self, key: NodeKey) -> bool {
        let parents = self.graph.parents(key);
        parents.is_empty() || parents.iter().any(|&p| self.is_unlocked(p))
    }

    /// Evaluate every unlock gate for `key`, in order, stopping at the first
    /// that fails.
    pub fn check_unlock(&self, key: NodeKey) -> Result<(), Blocker> {
        if self.is_unlocked(key) {
            return Err(Blocker::AlreadyUnlocked);
        }
        let node = &self.graph[key];
        let tier = &self.graph[node.tier];

        if !self.tier_requirements_met(node.tier) {
            return Err(Blocker::TierRequirementUnmet);
        }
        if !tier.is_base {
            if tier.root == Some(key) {
                if !self.is_base_complete() {
                    return Err(Blocker::BaseIncomplete);
                }
            } else if let Some(root) = tier.root
                && !self.is_unlocked(root)
            {
                return Err(Blocker::RootLocked);
            }
        }
        if !self.parents_satisfied(key) {
            return Err(Blocker::PrerequisiteUnmet);
        }
        match self.budget_for(key).shortfall(node.price()) {
            Some(Ceiling::Points) => Err(Blocker::InsufficientPoints),
            Some(Ceiling::Seals) => Err(Blocker::InsufficientSeals),
            None => Ok(()),
        }
    }

    /// The budget `key` would be charged against. Unlocking the root of a
    /// competing specialization refunds the active one first, so that
    /// tier's spend counts as available.
    fn budget_for(&self, key: NodeKey) -> Budget {
        let mut budget = self.budget.clone();
        let tier = self.graph[key].tier;
        if self.graph.is_specialization_root(key)
            && let Some(active) = self.active_specialization()
            && active != tier
        {
            budget.credit(self.tier_spend(active));
        }
        budget
    }

    /// Total price of the unlocked members of `tier`.
    pub fn tier_spend(&self, tier: TierKey) -> Cost {
        self.graph[tier]
            .nodes
            .iter()
            .filter(|&&key| self.is_unlocked(key))
            .map(|&key| self.graph[key].price())
            .fold(Cost::ZERO, |sum, cost| {
                Cost::new(sum.points + cost.points, sum.seals + cost.seals)
            })
    }

    pub fn can_unlock(&self, key: NodeKey) -> bool {
        self.check_unlock(key).is_ok()
    }

    pub(crate) fn tier_requirements_met(&self, tier: TierKey) -> bool {
        self.graph[tier]
            .requires_unlocked
            .iter()
            .all(|&key| self.is_unlocked(key))
    }

    // -- User actions --

    /// Unlock a node. Selecting a specialization root first clears any other
    /// active specialization, so a previous branch's spending cannot block
    /// the switch.
    pub fn unlock(&mut self, node_id: &str) -> UnlockOutcome {
        let Some(key) = self.graph.node_key(node_id) else {
            debug!(node = node_id, "unlock ignored: unknown node");
            return UnlockOutcome::NotFound;
        };
        let outcome = self.unlock_node(key);
        if let UnlockOutcome::Blocked(blocker) = outcome {
            debug!(node = node_id, ?blocker, "unlock blocked");
        }
        self.notify();
        outcome
    }

    /// Refund a node and every descendant left without an unlocked parent.
    /// Returns the number of nodes refunded.
    pub fn refund(&mut self, node_id: &str) -> usize {
        let refunded = self.refund_by_id(node_id);
        self.notify();
        refunded
    }

    /// [`refund`](Self::refund) without a change notification. The pending
    /// change is reported by the next notifying operation or by
    /// [`flush_changes`](Self::flush_changes).
    pub fn refund_silent(&mut self, node_id: &str) -> usize {
        self.refund_by_id(node_id)
    }

    /// Repeatedly unlock every eligible member of a tier until no more can
    /// be unlocked. For a specialization, the root is unlocked first.
    /// Returns the number of nodes unlocked.
    pub fn max_tier(&mut self, tier_id: &str) -> usize {
        let Some(tier) = self.graph.tier_key(tier_id) else {
            debug!(tier = tier_id, "max ignored: unknown tier");
            return 0;
        };
        let unlocked = self.max_tier_key(tier);
        self.notify();
        unlocked
    }

    /// Refund every unlocked member of a tier, root last. Returns the number
    /// of nodes refunded, including cascades into other tiers.
    pub fn reset_tier(&mut self, tier_id: &str) -> usize {
        let refunded = self.reset_tier_by_id(tier_id);
        self.notify();
        refunded
    }

    /// [`reset_tier`](Self::reset_tier) without a change notification.
    pub fn reset_tier_silent(&mut self, tier_id: &str) -> usize {
        self.reset_tier_by_id(tier_id)
    }

    /// Reset every tier.
    pub fn reset_all(&mut self) -> usize {
        let tiers: Vec<TierKey> = self.graph.tiers().map(|(key, _)| key).collect();
        let refunded = tiers
            .into_iter()
            .map(|tier| self.reset_tier_key(tier))
            .sum();
        self.events.push(SkillEvent::AllReset { refunded });
        self.notify();
        refunded
    }

    /// Change a budget ceiling. If usage now exceeds either ceiling, the most
    /// recently unlocked nodes are refunded until it fits. Returns the number
    /// of nodes refunded.
    pub fn set_ceiling(&mut self, which: Ceiling, value: u32) -> usize {
        if self.budget.ceiling(which) != value {
            self.budget.set_ceiling(which, value);
            self.events.push(SkillEvent::CeilingChanged {
                ceiling: which,
                value,
            });
            self.dirty = true;
        }
        let evicted = self.reconcile();
        self.notify();
        evicted
    }

    /// Max the base tier while it is incomplete, otherwise the active
    /// specialization. With no specialization selected, records
    /// [`SkillEvent::SpecializationRequired`] and changes nothing.
    pub fn max_current(&mut self) -> usize {
        let unlocked = if !self.is_base_complete() {
            self.max_tier_key(self.graph.base_tier())
        } else if let Some(tier) = self.active_specialization() {
            self.max_tier_key(tier)
        } else {
            self.events.push(SkillEvent::SpecializationRequired);
            0
        };
        self.notify();
        unlocked
    }

    /// Reset the active tier.
    pub fn reset_current(&mut self) -> usize {
        let refunded = self.reset_tier_key(self.active_tier);
        self.notify();
        refunded
    }

    /// Make `tier_id` the active tier without touching unlock state.
    /// Returns false for unknown tiers.
    pub fn focus(&mut self, tier_id: &str) -> bool {
        let Some(tier) = self.graph.tier_key(tier_id) else {
            debug!(tier = tier_id, "focus ignored: unknown tier");
            return false;
        };
        self.set_active_tier(tier);
        self.notify();
        true
    }

    // -- Event API --

    /// Drain all pending events. Nothing else empties the queue.
    pub fn drain_events(&mut self) -> Vec<SkillEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[SkillEvent] {
        &self.events
    }

    /// Record a `Changed` notification for changes made by silent
    /// operations. Returns whether anything was pending.
    pub fn flush_changes(&mut self) -> bool {
        let pending = self.dirty;
        self.notify();
        pending
    }

    // -- Internal helpers --

    fn notify(&mut self) {
        if self.dirty {
            self.dirty = false;
            self.revision += 1;
            self.events.push(SkillEvent::Changed {
                revision: self.revision,
            });
        }
    }

    fn set_active_tier(&mut self, tier: TierKey) {
        if self.active_tier != tier {
            self.active_tier = tier;
            self.dirty = true;
        }
    }

    pub(crate) fn unlock_node(&mut self, key: NodeKey) -> UnlockOutcome {
        if self.is_unlocked(key) {
            return UnlockOutcome::Blocked(Blocker::AlreadyUnlocked);
        }
        let tier = self.graph[key].tier;

        // Switching specialization happens before the eligibility check. It
        // is skipped when the root could never pass the gates anyway.
        if self.graph.is_specialization_root(key)
            && self.is_base_complete()
            && self.tier_requirements_met(tier)
        {
            self.select_specialization_key(tier);
        }

        if let Err(blocker) = self.check_unlock(key) {
            return UnlockOutcome::Blocked(blocker);
        }

        let was_complete = self.is_base_complete();
        let cost = self.graph[key].price();
        self.unlocked.insert(key, true);
        self.budget.debit(cost);
        self.history.push(key);
        self.dirty = true;
        self.set_active_tier(tier);
        self.events.push(SkillEvent::NodeUnlocked {
            node: key,
            tier,
            cost,
        });

        if !was_complete && self.is_base_complete() {
            info!(tier = self.graph.base_tier_id(), "base tier complete");
            self.events.push(SkillEvent::BaseCompleted);
        }
        UnlockOutcome::Unlocked
    }

    fn refund_by_id(&mut self, node_id: &str) -> usize {
        let Some(key) = self.graph.node_key(node_id) else {
            debug!(node = node_id, "refund ignored: unknown node");
            return 0;
        };
        if !self.is_unlocked(key) {
            debug!(node = node_id, "refund ignored: node is locked");
            return 0;
        }
        self.refund_node(key)
    }

    pub(crate) fn refund_node(&mut self, key: NodeKey) -> usize {
        let mut visited = HashSet::new();
        self.refund_cascade(key, &mut visited)
    }

    /// Refund `key` and whatever depends on it. `visited` holds every node
    /// refunded so far in this call; a child whose only unlocked parents are
    /// in it is refunded too.
    fn refund_cascade(&mut self, key: NodeKey, visited: &mut HashSet<NodeKey>) -> usize {
        if !self.is_unlocked(key) || !visited.insert(key) {
            return 0;
        }
        let mut refunded = 0;

        let children = self.graph.children(key).to_vec();
        for child in children {
            if self.is_unlocked(child) && !self.has_unlocked_parent_outside(child, visited) {
                refunded += self.refund_cascade(child, visited);
            }
        }

        let tier = self.graph[key].tier;
        let cost: Cost = self.graph[key].price();
        self.unlocked.insert(key, false);
        self.budget.credit(cost);
        self.history.remove(key);
        self.dirty = true;
        self.events.push(SkillEvent::NodeRefunded {
            node: key,
            tier,
            cost,
        });
        refunded += 1;

        // A specialization cannot keep members once its root is gone.
        if self.graph.is_specialization_root(key) {
            self.hide_tier(tier);
            refunded += self.refund_members(tier, visited);
        }

        // Nor can a tier whose requirement was just withdrawn.
        for dependent in self.graph.tiers_requiring(key).to_vec() {
            refunded += self.refund_members(dependent, visited);
        }

        refunded
    }

    fn refund_members(&mut self, tier: TierKey, visited: &mut HashSet<NodeKey>) -> usize {
        let members = self.graph[tier].nodes.clone();
        members
            .into_iter()
            .map(|member| self.refund_cascade(member, visited))
            .sum()
    }

    fn has_unlocked_parent_outside(&self, key: NodeKey, excluded: &HashSet<NodeKey>) -> bool {
        self.graph
            .parents(key)
            .iter()
            .any(|p| self.is_unlocked(*p) && !excluded.contains(p))
    }

    pub(crate) fn max_tier_key(&mut self, tier: TierKey) -> usize {
        let mut unlocked = 0;

        if !self.graph[tier].is_base
            && let Some(root) = self.graph[tier].root
            && !self.is_unlocked(root)
            && self.unlock_node(root).is_unlocked()
        {
            unlocked += 1;
        }

        let members = self.graph[tier].nodes.clone();
        loop {
            let mut progressed = false;
            for &member in &members {
                if self.can_unlock(member) && self.unlock_node(member).is_unlocked() {
                    unlocked += 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        self.set_active_tier(tier);
        self.events.push(SkillEvent::TierMaxed { tier, unlocked });
        unlocked
    }

    fn reset_tier_by_id(&mut self, tier_id: &str) -> usize {
        match self.graph.tier_key(tier_id) {
            Some(tier) => self.reset_tier_key(tier),
            None => {
                debug!(tier = tier_id, "reset ignored: unknown tier");
                0
            }
        }
    }

    pub(crate) fn reset_tier_key(&mut self, tier: TierKey) -> usize {
        let root = self.graph[tier].root;
        let mut order: Vec<NodeKey> = self.graph[tier]
            .nodes
            .iter()
            .copied()
            .filter(|&key| Some(key) != root)
            .collect();
        order.extend(root);

        let mut refunded = 0;
        for key in order {
            if self.is_unlocked(key) {
                refunded += self.refund_node(key);
            }
        }
        if !self.graph[tier].is_base {
            self.hide_tier(tier);
        }

        self.events.push(SkillEvent::TierReset { tier, refunded });
        refunded
    }

    /// Evict most-recently-unlocked nodes until usage fits both ceilings.
    fn reconcile(&mut self) -> usize {
        let mut evicted = 0;
        while self.budget.is_over_ceiling() {
            let Some(key) = self.history.pop() else {
                break;
            };
            if !self.is_unlocked(key) {
                continue;
            }
            info!(
                node = %self.graph[key].id,
                spent = self.budget.spent(),
                cap = self.budget.cap(),
                seals_spent = self.budget.seals_spent(),
                seal_cap = self.budget.seal_cap(),
                "evicting node to fit budget ceiling"
            );
            self.events.push(SkillEvent::NodeEvicted { node: key });
            evicted += self.refund_node(key);
        }
        evicted
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SkillEventKind;
    use crate::test_utils::*;

    fn key(engine: &SkillTreeEngine, id: &str) -> NodeKey {
        engine.graph().node_key(id).unwrap()
    }

    /// v1 -> v2 -> v3, v1 -> v4, all in the base tier.
    fn small_engine(cap: u32) -> SkillTreeEngine {
        build_engine(
            vec![tier(
                "Verdo",
                vec![
                    node("v1", 1, &["v2", "v4"]),
                    node("v2", 1, &["v3"]),
                    node("v3", 1, &[]),
                    node("v4", 2, &[]),
                ],
            )],
            EngineConfig::new().with_caps(cap, 10),
        )
    }

    // -----------------------------------------------------------------------
    // Unlock gating
    // -----------------------------------------------------------------------

    #[test]
    fn prerequisite_blocks_until_parent_unlocked() {
        let mut engine = small_engine(10);

        assert_eq!(
            engine.unlock("v2"),
            UnlockOutcome::Blocked(Blocker::PrerequisiteUnmet)
        );
        assert_eq!(engine.budget().spent(), 0);

        assert!(engine.unlock("v1").is_unlocked());
        assert!(engine.unlock("v2").is_unlocked());
        assert_eq!(engine.budget().spent(), 2);
    }

    #[test]
    fn any_unlocked_parent_satisfies_prerequisite() {
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![
                    node("a", 1, &["c"]),
                    node("b", 1, &["c"]),
                    node("c", 1, &[]),
                ],
            )],
            EngineConfig::new(),
        );
        engine.unlock("b");
        assert!(engine.unlock("c").is_unlocked());
    }

    #[test]
    fn budget_blocks_unaffordable_node() {
        let mut engine = small_engine(2);
        engine.unlock("v1");
        assert_eq!(
            engine.unlock("v4"),
            UnlockOutcome::Blocked(Blocker::InsufficientPoints)
        );
        assert!(engine.unlock("v2").is_unlocked());
        assert_eq!(engine.budget().spent(), 2);
    }

    #[test]
    fn seal_budget_blocks_independently() {
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![sealed_node("a", 0, 2, &[]), sealed_node("b", 0, 2, &[])],
            )],
            EngineConfig::new().with_caps(100, 3),
        );
        assert!(engine.unlock("a").is_unlocked());
        assert_eq!(
            engine.unlock("b"),
            UnlockOutcome::Blocked(Blocker::InsufficientSeals)
        );
        assert_eq!(engine.budget().seals_spent(), 2);
    }

    #[test]
    fn unknown_node_is_not_found() {
        let mut engine = small_engine(10);
        assert_eq!(engine.unlock("nope"), UnlockOutcome::NotFound);
        assert_eq!(engine.refund("nope"), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn unlock_twice_is_noop() {
        let mut engine = small_engine(10);
        engine.unlock("v1");
        let spent = engine.budget().spent();
        let revision = engine.revision();

        assert_eq!(
            engine.unlock("v1"),
            UnlockOutcome::Blocked(Blocker::AlreadyUnlocked)
        );
        assert_eq!(engine.budget().spent(), spent);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn unlock_records_event_and_notification() {
        let mut engine = small_engine(10);
        engine.unlock("v1");
        let events = engine.drain_events();
        assert_eq!(
            events,
            vec![
                SkillEvent::NodeUnlocked {
                    node: key(&engine, "v1"),
                    tier: engine.graph().base_tier(),
                    cost: Cost::new(1, 0),
                },
                SkillEvent::Changed { revision: 1 },
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Refund and cascade
    // -----------------------------------------------------------------------

    #[test]
    fn refund_cascades_to_sole_parent_descendants() {
        let mut engine = small_engine(10);
        for id in ["v1", "v2", "v3", "v4"] {
            engine.unlock(id);
        }
        assert_eq!(engine.budget().spent(), 5);

        assert_eq!(engine.refund("v1"), 4);
        assert!(engine.unlocked_ids().is_empty());
        assert_eq!(engine.budget().spent(), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn refund_keeps_child_with_other_unlocked_parent() {
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![
                    node("p", 1, &["c"]),
                    node("q", 1, &["c"]),
                    node("c", 1, &[]),
                ],
            )],
            EngineConfig::new(),
        );
        engine.unlock("p");
        engine.unlock("q");
        engine.unlock("c");

        assert_eq!(engine.refund("p"), 1);
        assert!(engine.is_unlocked_id("c"));
        assert!(engine.is_unlocked_id("q"));
    }

    #[test]
    fn convergent_cascade_refunds_each_node_once() {
        // p -> q -> c and p -> c; c lists before q among p's children.
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![
                    node("p", 1, &["c", "q"]),
                    node("q", 1, &["c"]),
                    node("c", 1, &[]),
                ],
            )],
            EngineConfig::new(),
        );
        engine.unlock("p");
        engine.unlock("q");
        engine.unlock("c");

        assert_eq!(engine.refund("p"), 3);
        assert!(engine.unlocked_ids().is_empty());
        assert_eq!(engine.budget().spent(), 0);
        let refunds = engine
            .drain_events()
            .iter()
            .filter(|e| e.kind() == SkillEventKind::NodeRefunded)
            .count();
        assert_eq!(refunds, 3);
    }

    #[test]
    fn refund_of_leaf_restores_budget() {
        let mut engine = small_engine(10);
        engine.unlock("v1");
        let before = engine.budget().clone();
        engine.unlock("v4");
        assert_eq!(engine.refund("v4"), 1);
        assert_eq!(engine.budget(), &before);
        assert!(engine.is_unlocked_id("v1"));
    }

    #[test]
    fn refund_of_locked_node_is_noop() {
        let mut engine = small_engine(10);
        assert_eq!(engine.refund("v1"), 0);
        assert_eq!(engine.revision(), 0);
    }

    #[test]
    fn silent_refund_defers_notification() {
        let mut engine = small_engine(10);
        engine.unlock("v1");
        engine.drain_events();

        assert_eq!(engine.refund_silent("v1"), 1);
        assert!(
            !engine
                .pending_events()
                .iter()
                .any(|e| e.kind() == SkillEventKind::Changed)
        );
        assert!(engine.flush_changes());
        assert!(!engine.flush_changes());
        assert_eq!(
            engine.pending_events().last(),
            Some(&SkillEvent::Changed { revision: 2 })
        );
    }

    // -----------------------------------------------------------------------
    // Ceiling reconciliation
    // -----------------------------------------------------------------------

    #[test]
    fn lowering_cap_evicts_most_recent_first() {
        let mut engine = build_engine(
            vec![tier("Verdo", vec![node("a", 2, &[]), node("b", 3, &[])])],
            EngineConfig::new().with_caps(5, 0),
        );
        engine.unlock("a");
        engine.unlock("b");
        assert_eq!(engine.budget().spent(), 5);

        assert_eq!(engine.set_ceiling(Ceiling::Points, 2), 1);
        assert_eq!(engine.budget().spent(), 2);
        assert_eq!(engine.unlocked_ids(), vec!["a"]);
    }

    #[test]
    fn eviction_continues_until_within_cap() {
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![node("a", 2, &[]), node("b", 3, &[]), node("c", 1, &[])],
            )],
            EngineConfig::new().with_caps(6, 0),
        );
        engine.unlock("a");
        engine.unlock("b");
        engine.unlock("c");

        assert_eq!(engine.set_ceiling(Ceiling::Points, 2), 2);
        assert_eq!(engine.unlocked_ids(), vec!["a"]);
    }

    #[test]
    fn zero_cap_evicts_everything() {
        let mut engine = small_engine(10);
        engine.unlock("v1");
        engine.unlock("v4");
        engine.unlock("v2");
        assert_eq!(engine.set_ceiling(Ceiling::Points, 0), 3);
        assert!(engine.unlocked_ids().is_empty());
        assert!(engine.history().is_empty());
        let evictions = engine
            .drain_events()
            .iter()
            .filter(|e| e.kind() == SkillEventKind::NodeEvicted)
            .count();
        assert_eq!(evictions, 3);
    }

    #[test]
    fn lowering_seal_cap_evicts() {
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![sealed_node("a", 1, 1, &[]), sealed_node("b", 1, 0, &[])],
            )],
            EngineConfig::new().with_caps(10, 5),
        );
        engine.unlock("b");
        engine.unlock("a");
        assert_eq!(engine.set_ceiling(Ceiling::Seals, 0), 1);
        assert_eq!(engine.unlocked_ids(), vec!["b"]);
        assert_eq!(engine.budget().seals_spent(), 0);
    }

    #[test]
    fn raising_cap_changes_nothing_else() {
        let mut engine = small_engine(3);
        engine.unlock("v1");
        assert_eq!(engine.set_ceiling(Ceiling::Points, 50), 0);
        assert_eq!(engine.unlocked_ids(), vec!["v1"]);
        assert_eq!(engine.budget().cap(), 50);
    }

    // -----------------------------------------------------------------------
    // Max / reset
    // -----------------------------------------------------------------------

    #[test]
    fn max_tier_unlocks_everything_affordable() {
        let mut engine = small_engine(100);
        assert_eq!(engine.max_tier("Verdo"), 4);
        assert_eq!(engine.budget().spent(), 5);
    }

    #[test]
    fn max_tier_stops_at_budget() {
        let mut engine = small_engine(3);
        // Stable order: v1, v2, v3 fit; v4 (2) does not.
        assert_eq!(engine.max_tier("Verdo"), 3);
        assert_eq!(engine.unlocked_ids(), vec!["v1", "v2", "v3"]);
    }

    #[test]
    fn max_tier_reaches_nodes_listed_before_parents() {
        let mut engine = build_engine(
            vec![tier(
                "Verdo",
                vec![node("c", 1, &[]), node("b", 1, &["c"]), node("a", 1, &["b"])],
            )],
            EngineConfig::new(),
        );
        assert_eq!(engine.max_tier("Verdo"), 3);
    }

    #[test]
    fn max_tier_is_fixed_point() {
        let mut engine = small_engine(3);
        engine.max_tier("Verdo");
        let unlocked = engine.unlocked_ids().join(",");
        let budget = engine.budget().clone();
        let revision = engine.revision();

        assert_eq!(engine.max_tier("Verdo"), 0);
        assert_eq!(engine.unlocked_ids().join(","), unlocked);
        assert_eq!(engine.budget(), &budget);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn reset_tier_refunds_all_members() {
        let mut engine = small_engine(100);
        engine.max_tier("Verdo");
        assert_eq!(engine.reset_tier("Verdo"), 4);
        assert!(engine.unlocked_ids().is_empty());
        assert_eq!(engine.budget().spent(), 0);
    }

    #[test]
    fn unknown_tier_operations_are_noops() {
        let mut engine = small_engine(100);
        assert_eq!(engine.max_tier("Nope"), 0);
        assert_eq!(engine.reset_tier("Nope"), 0);
        assert!(!engine.focus("Nope"));
        assert_eq!(engine.revision(), 0);
    }

    #[test]
    fn reset_all_clears_every_tier() {
        let mut engine = build_engine(sample_tiers(), EngineConfig::new());
        engine.max_tier("Verdo");
        engine.max_tier("Smite");
        assert!(engine.budget().spent() > 0);

        engine.reset_all();
        assert!(engine.unlocked_ids().is_empty());
        assert_eq!(engine.budget().used(), Cost::ZERO);
        assert!(engine.history().is_empty());
        let events = engine.drain_events();
        let changed = events
            .iter()
            .filter(|e| e.kind() == SkillEventKind::Changed)
            .count();
        assert!(events.iter().any(|e| e.kind() == SkillEventKind::AllReset));
        assert_eq!(changed, 3);
    }

    // -----------------------------------------------------------------------
    // Active tier context
    // -----------------------------------------------------------------------

    #[test]
    fn unlock_and_focus_move_active_tier() {
        let mut engine = build_engine(sample_tiers(), EngineConfig::new());
        let smite = engine.graph().tier_key("Smite").unwrap();
        let verdo = engine.graph().base_tier();
        assert_eq!(engine.active_tier(), verdo);

        assert!(engine.focus("Smite"));
        assert_eq!(engine.active_tier(), smite);

        engine.unlock("v1");
        assert_eq!(engine.active_tier(), verdo);
    }

    #[test]
    fn reset_current_targets_active_tier() {
        let mut engine = build_engine(sample_tiers(), EngineConfig::new());
        engine.max_tier("Verdo");
        engine.max_tier("Smite");
        let base_spent: u32 = engine
            .graph()
            .nodes()
            .filter(|(_, n)| n.tier == engine.graph().base_tier())
            .map(|(_, n)| n.cost)
            .sum();

        engine.reset_current();
        assert!(engine.is_unlocked_id("v1"));
        assert!(!engine.is_unlocked_id("Smite01"));
        assert_eq!(engine.budget().spent(), base_spent);
    }

    #[test]
    fn max_current_fills_base_then_specialization() {
        let mut engine = build_engine(sample_tiers(), EngineConfig::new());

        engine.max_current();
        assert!(engine.is_base_complete());
        assert!(
            engine
                .drain_events()
                .iter()
                .any(|e| e.kind() == SkillEventKind::BaseCompleted)
        );

        // Base done, nothing selected.
        assert_eq!(engine.max_current(), 0);
        assert!(
            engine
                .drain_events()
                .contains(&SkillEvent::SpecializationRequired)
        );

        engine.unlock("Lifeb01");
        let lifeb = engine.graph().tier_key("Lifeb").unwrap();
        let before = engine.unlocked_in_tier(lifeb);
        assert!(engine.max_current() > 0);
        assert!(engine.unlocked_in_tier(lifeb) > before);
    }

    #[test]
    fn events_queue_until_drained() {
        let mut engine = sample_engine(20, 0);
        engine.unlock("v1");
        engine.snapshot();
        engine.unlock("v2");
        assert_eq!(engine.revision(), 2);

        let kinds: Vec<SkillEventKind> = engine.pending_events().iter().map(SkillEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SkillEventKind::NodeUnlocked,
                SkillEventKind::Changed,
                SkillEventKind::NodeUnlocked,
                SkillEventKind::Changed,
            ]
        );
        assert_eq!(engine.drain_events().len(), 4);
        assert!(engine.pending_events().is_empty());
    }
}
