//! Session configuration.
//!
//! The three observed application variants — plain yearly progression,
//! semester-subdivided progression, and action-point-budgeted progression
//! — are one engine configured at session start, not three
//! implementations.

use reroll_stats::{AllocationRules, StatProfile};
use serde::{Deserialize, Serialize};

/// How the career calendar subdivides a school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calendar {
    /// Five turns per year; age increments on every period wrap.
    Annual,
    /// Five turns per semester; age increments only on the
    /// spring-to-autumn wrap.
    Semester,
}

/// Action-point economy parameters (budgeted variant only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPointRules {
    /// Pool value right after the allocation stage.
    pub starting_pool: i64,
    /// Smallest per-turn recovery roll, inclusive.
    pub recovery_min: u32,
    /// Largest per-turn recovery roll, inclusive.
    pub recovery_max: u32,
    /// Initial-budget distribution parameters.
    pub allocation: AllocationRules,
}

/// Everything fixed about a session at start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Calendar policy driving period/age advancement.
    pub calendar: Calendar,
    /// The stat key set for the whole run.
    pub profile: StatProfile,
    /// Starting value for every stat when there is no allocation stage.
    pub default_baseline: i64,
    /// Action-point economy; `None` for the non-budgeted variants.
    pub action_points: Option<ActionPointRules>,
    /// How many recent history entries the generator sees.
    pub history_window: usize,
}

impl SessionConfig {
    /// Plain yearly progression: five turns a year, no action points.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            calendar: Calendar::Annual,
            profile: StatProfile::Wellbeing,
            default_baseline: 10,
            action_points: None,
            history_window: 10,
        }
    }

    /// Semester-subdivided progression with a tight prompt window.
    #[must_use]
    pub fn semester() -> Self {
        Self {
            calendar: Calendar::Semester,
            profile: StatProfile::Wellbeing,
            default_baseline: 10,
            action_points: None,
            history_window: 3,
        }
    }

    /// Action-point-budgeted progression: allocation stage, per-turn
    /// costs with random recovery, and a staged review step.
    #[must_use]
    pub fn budgeted() -> Self {
        Self {
            calendar: Calendar::Annual,
            profile: StatProfile::Fortune,
            default_baseline: 10,
            action_points: Some(ActionPointRules {
                starting_pool: 10,
                recovery_min: 1,
                recovery_max: 3,
                allocation: AllocationRules {
                    total_budget: 45,
                    baseline: 5,
                },
            }),
            history_window: 10,
        }
    }

    /// Whether this session runs the action-point economy.
    #[must_use]
    pub fn is_budgeted(&self) -> bool {
        self.action_points.is_some()
    }

    /// Whether a computed turn is held for explicit acknowledgement
    /// before being applied. Tied to the budgeted variant.
    #[must_use]
    pub fn staged_review(&self) -> bool {
        self.is_budgeted()
    }
}
