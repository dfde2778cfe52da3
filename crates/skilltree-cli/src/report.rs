//! Human-readable rendering of snapshots and events.

use skilltree_core::event::SkillEvent;
use skilltree_core::graph::SkillGraph;
use skilltree_core::view::{NodeState, TreeSnapshot};
use std::fmt::Write;

/// Multi-line summary: budget, tier progress, then node states per tier.
pub fn render_snapshot(snapshot: &TreeSnapshot) -> String {
    let mut out = String::new();
    let budget = &snapshot.budget;
    let _ = writeln!(
        out,
        "points {}/{}  seals {}/{}  revision {}",
        budget.spent,
        ceiling(budget.cap),
        budget.seals_spent,
        ceiling(budget.seal_cap),
        snapshot.revision
    );
    let (done, needed) = snapshot.base_progress;
    let _ = writeln!(
        out,
        "base {done}/{needed}{}  specialization {}  current {}",
        if snapshot.base_complete { " (complete)" } else { "" },
        snapshot.active_specialization.as_deref().unwrap_or("-"),
        snapshot.active_tier
    );

    for tier in &snapshot.tiers {
        let _ = writeln!(
            out,
            "\n[{}] {} {}/{}{}",
            tier.id,
            tier.name,
            tier.unlocked,
            tier.total,
            if tier.revealed { "" } else { " (collapsed)" }
        );
        for node in snapshot.nodes.iter().filter(|n| n.tier == tier.id && n.visible) {
            let mark = match node.state {
                NodeState::Unlocked => '#',
                NodeState::Available => '+',
                NodeState::Locked => '.',
            };
            let _ = write!(out, "  {mark} {:<16} {:>3}", node.id, node.cost);
            if node.seal > 0 {
                let _ = write!(out, " +{}s", node.seal);
            }
            if let Some(blocker) = node.blocker {
                let _ = write!(out, "  {blocker:?}");
            }
            out.push('\n');
        }
    }
    out
}

fn ceiling(value: u32) -> String {
    if value == u32::MAX {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// One line per event, with keys resolved to ids.
pub fn describe_event(graph: &SkillGraph, event: &SkillEvent) -> String {
    let node = |key| graph.node(key).map_or("?", |n| n.id.as_str());
    let tier = |key| graph.tier(key).map_or("?", |t| t.id.as_str());
    match event {
        SkillEvent::NodeUnlocked { node: n, cost, .. } => {
            format!("unlocked {} ({}p {}s)", node(*n), cost.points, cost.seals)
        }
        SkillEvent::NodeRefunded { node: n, cost, .. } => {
            format!("refunded {} ({}p {}s)", node(*n), cost.points, cost.seals)
        }
        SkillEvent::NodeEvicted { node: n } => format!("evicted {}", node(*n)),
        SkillEvent::SpecializationSelected { tier: t } => format!("selected {}", tier(*t)),
        SkillEvent::TierRevealed { tier: t } => format!("revealed {}", tier(*t)),
        SkillEvent::TierHidden { tier: t } => format!("hid {}", tier(*t)),
        SkillEvent::TierMaxed { tier: t, unlocked } => {
            format!("maxed {} (+{unlocked})", tier(*t))
        }
        SkillEvent::TierReset { tier: t, refunded } => {
            format!("reset {} (-{refunded})", tier(*t))
        }
        SkillEvent::AllReset { refunded } => format!("reset everything (-{refunded})"),
        SkillEvent::BaseCompleted => format!("{} complete", graph.base_tier_id()),
        SkillEvent::SpecializationRequired => "select a specialization first".to_string(),
        SkillEvent::CeilingChanged { ceiling, value } => format!("{ceiling:?} ceiling {value}"),
        SkillEvent::Changed { revision } => format!("changed (revision {revision})"),
    }
}
