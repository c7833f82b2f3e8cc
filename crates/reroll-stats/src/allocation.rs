//! The pre-game point-allocation stage (budgeted variant).
//!
//! The player distributes a fixed total across the profile's stats before
//! the session starts, one point at a time, from a non-zero baseline.

use reroll_core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{StatName, StatProfile, StatSet};

/// Allocation parameters fixed at session configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRules {
    /// Total points available, counting the per-stat baselines.
    pub total_budget: i64,
    /// Starting value for every stat in the profile.
    pub baseline: i64,
}

/// An in-progress initial-budget distribution.
///
/// Invariant: `remaining() == total_budget - sum(values)` after every
/// operation, including rejected ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAllocation {
    profile: StatProfile,
    total_budget: i64,
    values: BTreeMap<StatName, i64>,
}

impl PointAllocation {
    /// Starts an allocation with every stat at the rules' baseline.
    #[must_use]
    pub fn new(profile: StatProfile, rules: AllocationRules) -> Self {
        Self {
            profile,
            total_budget: rules.total_budget,
            values: profile
                .names()
                .iter()
                .map(|&n| (n, rules.baseline))
                .collect(),
        }
    }

    /// The profile being allocated.
    #[must_use]
    pub fn profile(&self) -> StatProfile {
        self.profile
    }

    /// The current value of `stat`, or `None` outside the profile.
    #[must_use]
    pub fn get(&self, stat: StatName) -> Option<i64> {
        self.values.get(&stat).copied()
    }

    /// Points not yet distributed.
    #[must_use]
    pub fn remaining(&self) -> i64 {
        self.total_budget - self.values.values().sum::<i64>()
    }

    /// Adjusts one stat by `delta` points.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` — leaving the allocation
    /// untouched — when the stat is outside the profile, the stat would go
    /// negative, or the increase exceeds the remaining budget.
    pub fn adjust(&mut self, stat: StatName, delta: i64) -> Result<(), DomainError> {
        let Some(current) = self.values.get(&stat).copied() else {
            return Err(DomainError::Validation(format!(
                "stat {stat} is not part of this profile"
            )));
        };
        if current + delta < 0 {
            return Err(DomainError::Validation(format!(
                "stat {stat} cannot go below zero"
            )));
        }
        if delta > self.remaining() {
            return Err(DomainError::Validation(
                "no unallocated budget remaining".to_owned(),
            ));
        }
        self.values.insert(stat, current + delta);
        Ok(())
    }

    /// Finishes the allocation stage, producing the initial stat set.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` — with no state change — unless
    /// the remaining budget is exactly zero.
    pub fn commit(&self) -> Result<StatSet, DomainError> {
        let remaining = self.remaining();
        if remaining != 0 {
            return Err(DomainError::Validation(format!(
                "allocation incomplete: {remaining} points unallocated"
            )));
        }
        Ok(StatSet::from_values(self.profile, self.values.clone()))
    }
}
