//! Budget tracking for the two unlock currencies: points and seals.
//!
//! A [`Budget`] holds two running totals and two ceilings. Ceilings may be
//! lowered below current usage at any time; restoring compliance is the
//! engine's job (see `SkillTreeEngine::set_ceiling`), because it requires
//! refunding nodes.

use serde::{Deserialize, Serialize};

/// Which of the two ceilings an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ceiling {
    /// The primary talent-point ceiling.
    Points,
    /// The secondary seal ceiling.
    Seals,
}

/// A price in both currencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    pub points: u32,
    pub seals: u32,
}

impl Cost {
    pub const ZERO: Cost = Cost {
        points: 0,
        seals: 0,
    };

    pub fn new(points: u32, seals: u32) -> Self {
        Self { points, seals }
    }
}

/// Running totals against user-configurable ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    spent: u32,
    seals_spent: u32,
    cap: u32,
    seal_cap: u32,
}

impl Budget {
    /// A budget with nothing spent.
    pub fn new(cap: u32, seal_cap: u32) -> Self {
        Self {
            spent: 0,
            seals_spent: 0,
            cap,
            seal_cap,
        }
    }

    pub fn spent(&self) -> u32 {
        self.spent
    }

    pub fn seals_spent(&self) -> u32 {
        self.seals_spent
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn seal_cap(&self) -> u32 {
        self.seal_cap
    }

    /// Current value of the given ceiling.
    pub fn ceiling(&self, which: Ceiling) -> u32 {
        match which {
            Ceiling::Points => self.cap,
            Ceiling::Seals => self.seal_cap,
        }
    }

    /// Both running totals as a [`Cost`].
    pub fn used(&self) -> Cost {
        Cost::new(self.spent, self.seals_spent)
    }

    /// Headroom left under each ceiling. Zero when a ceiling is exceeded.
    pub fn remaining(&self) -> Cost {
        Cost::new(
            self.cap.saturating_sub(self.spent),
            self.seal_cap.saturating_sub(self.seals_spent),
        )
    }

    /// The first ceiling that `cost` would exceed, points checked first.
    pub fn shortfall(&self, cost: Cost) -> Option<Ceiling> {
        let fits =
            |used: u32, extra: u32, cap: u32| used.checked_add(extra).is_some_and(|t| t <= cap);
        if !fits(self.spent, cost.points, self.cap) {
            Some(Ceiling::Points)
        } else if !fits(self.seals_spent, cost.seals, self.seal_cap) {
            Some(Ceiling::Seals)
        } else {
            None
        }
    }

    /// True iff `cost` fits under both ceilings.
    pub fn can_afford(&self, cost: Cost) -> bool {
        self.shortfall(cost).is_none()
    }

    pub fn debit(&mut self, cost: Cost) {
        self.spent = self.spent.saturating_add(cost.points);
        self.seals_spent = self.seals_spent.saturating_add(cost.seals);
    }

    /// Return `cost` to the budget. Totals never go below zero.
    pub fn credit(&mut self, cost: Cost) {
        self.spent = self.spent.saturating_sub(cost.points);
        self.seals_spent = self.seals_spent.saturating_sub(cost.seals);
    }

    /// Update one ceiling. Usage is left untouched, so the budget may be
    /// over its ceiling afterwards.
    pub fn set_ceiling(&mut self, which: Ceiling, value: u32) {
        match which {
            Ceiling::Points => self.cap = value,
            Ceiling::Seals => self.seal_cap = value,
        }
    }

    /// Whether either total currently exceeds its ceiling.
    pub fn is_over_ceiling(&self) -> bool {
        self.spent > self.cap || self.seals_spent > self.seal_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn afford_checks_both_ceilings() {
        let mut budget = Budget::new(5, 2);
        budget.debit(Cost::new(3, 1));

        assert!(budget.can_afford(Cost::new(2, 1)));
        assert_eq!(budget.shortfall(Cost::new(3, 0)), Some(Ceiling::Points));
        assert_eq!(budget.shortfall(Cost::new(0, 2)), Some(Ceiling::Seals));
        assert_eq!(budget.shortfall(Cost::new(3, 2)), Some(Ceiling::Points));
    }

    #[test]
    fn afford_is_inclusive_of_cap() {
        let budget = Budget::new(4, 0);
        assert!(budget.can_afford(Cost::new(4, 0)));
        assert!(!budget.can_afford(Cost::new(5, 0)));
        assert!(budget.can_afford(Cost::ZERO));
    }

    #[test]
    fn afford_does_not_overflow() {
        let mut budget = Budget::new(u32::MAX, u32::MAX);
        budget.debit(Cost::new(u32::MAX - 1, 0));
        assert!(budget.can_afford(Cost::new(1, 0)));
        assert!(!budget.can_afford(Cost::new(2, 0)));
    }

    #[test]
    fn credit_floors_at_zero() {
        let mut budget = Budget::new(10, 10);
        budget.debit(Cost::new(2, 1));
        budget.credit(Cost::new(5, 3));
        assert_eq!(budget.used(), Cost::ZERO);
    }

    #[test]
    fn lowering_ceiling_reports_overage() {
        let mut budget = Budget::new(5, 5);
        budget.debit(Cost::new(5, 0));
        assert!(!budget.is_over_ceiling());

        budget.set_ceiling(Ceiling::Points, 2);
        assert!(budget.is_over_ceiling());
        assert_eq!(budget.ceiling(Ceiling::Points), 2);
        assert_eq!(budget.remaining(), Cost::new(0, 5));

        budget.credit(Cost::new(3, 0));
        assert!(!budget.is_over_ceiling());
    }

    #[test]
    fn seal_ceiling_independent_of_points() {
        let mut budget = Budget::new(5, 5);
        budget.debit(Cost::new(0, 4));
        budget.set_ceiling(Ceiling::Seals, 3);
        assert!(budget.is_over_ceiling());
        assert_eq!(budget.cap(), 5);
        assert_eq!(budget.seal_cap(), 3);
    }
}
