//! Consistency checks over engine state.
//!
//! [`check_invariants`] recomputes everything the engine tracks
//! incrementally and reports each disagreement. A correct engine always
//! returns an empty list; property tests and the CLI's `--check` flag use it.

use crate::budget::Cost;
use crate::engine::SkillTreeEngine;
use crate::id::{NodeKey, TierKey};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Violation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Usage exceeds a ceiling after an operation completed.
    OverCeiling { used: Cost, points_cap: u32, seal_cap: u32 },
    /// Tracked usage differs from the sum of unlocked node prices.
    SpentMismatch { tracked: Cost, actual: Cost },
    /// History does not hold exactly the unlocked nodes.
    HistoryMismatch {
        missing: Vec<NodeKey>,
        extra: Vec<NodeKey>,
    },
    /// Unlocked node with parents, none of them unlocked.
    OrphanedNode(NodeKey),
    /// Unlocked specialization member whose root is locked.
    RootlessMember(NodeKey),
    /// More than one specialization root unlocked.
    MultipleSpecializations(Vec<TierKey>),
    /// Unlocked member of a tier whose requirements are not met.
    RequirementUnmet(NodeKey),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverCeiling {
                used,
                points_cap,
                seal_cap,
            } => write!(
                f,
                "usage {}/{} exceeds ceilings {points_cap}/{seal_cap}",
                used.points, used.seals
            ),
            Self::SpentMismatch { tracked, actual } => write!(
                f,
                "tracked usage {}/{} but unlocked nodes cost {}/{}",
                tracked.points, tracked.seals, actual.points, actual.seals
            ),
            Self::HistoryMismatch { missing, extra } => write!(
                f,
                "history missing {} unlocked nodes and holds {} locked ones",
                missing.len(),
                extra.len()
            ),
            Self::OrphanedNode(key) => write!(f, "node {key:?} unlocked without an unlocked parent"),
            Self::RootlessMember(key) => write!(f, "node {key:?} unlocked while its root is locked"),
            Self::MultipleSpecializations(tiers) => {
                write!(f, "{} specializations active at once", tiers.len())
            }
            Self::RequirementUnmet(key) => {
                write!(f, "node {key:?} unlocked while its tier requirements are unmet")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Every invariant the engine maintains between operations.
pub fn check_invariants(engine: &SkillTreeEngine) -> Vec<InvariantViolation> {
    let graph = engine.graph();
    let budget = engine.budget();
    let mut violations = Vec::new();

    if budget.is_over_ceiling() {
        violations.push(InvariantViolation::OverCeiling {
            used: budget.used(),
            points_cap: budget.cap(),
            seal_cap: budget.seal_cap(),
        });
    }

    let unlocked: Vec<NodeKey> = graph
        .nodes()
        .map(|(key, _)| key)
        .filter(|&key| engine.is_unlocked(key))
        .collect();

    let actual = unlocked.iter().fold(Cost::ZERO, |acc, &key| {
        let price = graph[key].price();
        Cost::new(
            acc.points.saturating_add(price.points),
            acc.seals.saturating_add(price.seals),
        )
    });
    if actual != budget.used() {
        violations.push(InvariantViolation::SpentMismatch {
            tracked: budget.used(),
            actual,
        });
    }

    let in_history: HashSet<NodeKey> = engine.history().iter().collect();
    let unlocked_set: HashSet<NodeKey> = unlocked.iter().copied().collect();
    let missing: Vec<NodeKey> = unlocked
        .iter()
        .copied()
        .filter(|key| !in_history.contains(key))
        .collect();
    let extra: Vec<NodeKey> = engine
        .history()
        .iter()
        .filter(|key| !unlocked_set.contains(key))
        .collect();
    if !missing.is_empty() || !extra.is_empty() || in_history.len() != engine.history().len() {
        violations.push(InvariantViolation::HistoryMismatch { missing, extra });
    }

    for &key in &unlocked {
        if !engine.parents_satisfied(key) {
            violations.push(InvariantViolation::OrphanedNode(key));
        }
        let tier = &graph[graph[key].tier];
        if !tier.is_base
            && let Some(root) = tier.root
            && root != key
            && !engine.is_unlocked(root)
        {
            violations.push(InvariantViolation::RootlessMember(key));
        }
        if !tier.requires_unlocked.iter().all(|&r| engine.is_unlocked(r)) {
            violations.push(InvariantViolation::RequirementUnmet(key));
        }
    }

    let active: Vec<TierKey> = graph
        .specializations()
        .map(|(key, _)| key)
        .filter(|&key| engine.is_tier_active(key))
        .collect();
    if active.len() > 1 {
        violations.push(InvariantViolation::MultipleSpecializations(active));
    }

    violations
}
