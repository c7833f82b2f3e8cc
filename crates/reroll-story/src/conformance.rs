//! Generator-contract conformance checking.
//!
//! The generation contract obliges the backend to produce an option for
//! every placeholder, a matching placeholder for every option, and (in the
//! budgeted variant) a zero-cost escape hatch per slot. None of that is
//! enforceable at the source, so this boundary layer reports violations
//! for the caller to log. Policy is best-effort render: issues never drop
//! the turn, and inert options are rejected at assignment time instead.

use std::collections::BTreeSet;
use std::fmt;

use crate::content::TurnContent;
use crate::template::required_slots;

/// A single violation of the generation contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConformanceIssue {
    /// An option's slot index matches no placeholder in the template.
    InertOption {
        /// The offending option id.
        option_id: String,
        /// Its declared slot index.
        slot_index: u32,
    },
    /// A placeholder has no eligible option at all.
    UnfillableSlot {
        /// The slot index.
        slot_index: u32,
    },
    /// Budgeted variant: a slot offers no zero-cost option, so a drained
    /// pool could dead-end the run.
    NoFreeOption {
        /// The slot index.
        slot_index: u32,
    },
    /// Two options share an id within one turn.
    DuplicateOptionId {
        /// The duplicated id.
        option_id: String,
    },
}

impl fmt::Display for ConformanceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InertOption {
                option_id,
                slot_index,
            } => write!(
                f,
                "option {option_id} targets slot {slot_index}, which has no placeholder"
            ),
            Self::UnfillableSlot { slot_index } => {
                write!(f, "slot {slot_index} has no eligible option")
            }
            Self::NoFreeOption { slot_index } => {
                write!(f, "slot {slot_index} has no zero-cost option")
            }
            Self::DuplicateOptionId { option_id } => {
                write!(f, "option id {option_id} appears more than once")
            }
        }
    }
}

/// Checks one turn's content against the generation contract.
///
/// `budgeted` enables the zero-cost-option obligation.
#[must_use]
pub fn check_turn_content(content: &TurnContent, budgeted: bool) -> Vec<ConformanceIssue> {
    let required = required_slots(&content.story_template);
    let mut issues = Vec::new();

    let mut seen_ids = BTreeSet::new();
    for option in &content.options {
        if !seen_ids.insert(option.id.as_str()) {
            issues.push(ConformanceIssue::DuplicateOptionId {
                option_id: option.id.clone(),
            });
        }
        if !required.contains(&option.slot_index) {
            issues.push(ConformanceIssue::InertOption {
                option_id: option.id.clone(),
                slot_index: option.slot_index,
            });
        }
    }

    for &slot in &required {
        let eligible = content.options_for_slot(slot);
        if eligible.is_empty() {
            issues.push(ConformanceIssue::UnfillableSlot { slot_index: slot });
        } else if budgeted && !eligible.iter().any(|option| option.cost == 0) {
            issues.push(ConformanceIssue::NoFreeOption { slot_index: slot });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TurnOption;
    use reroll_stats::Effect;

    fn option(id: &str, slot: u32, cost: u32) -> TurnOption {
        TurnOption {
            id: id.to_owned(),
            text: id.to_owned(),
            slot_index: slot,
            cost,
            effect: Effect::empty(),
        }
    }

    fn content(template: &str, options: Vec<TurnOption>) -> TurnContent {
        TurnContent {
            story_template: template.to_owned(),
            options,
            next_story_snippet: String::new(),
            is_game_over: false,
            game_over_summary: None,
        }
    }

    #[test]
    fn test_conformant_content_reports_nothing() {
        let content = content(
            "去__1__还是__2__",
            vec![option("a", 1, 0), option("b", 1, 3), option("c", 2, 0)],
        );

        assert!(check_turn_content(&content, true).is_empty());
    }

    #[test]
    fn test_inert_option_is_reported() {
        let content = content("只有__1__", vec![option("a", 1, 0), option("x", 9, 0)]);

        let issues = check_turn_content(&content, false);

        assert_eq!(
            issues,
            vec![ConformanceIssue::InertOption {
                option_id: "x".to_owned(),
                slot_index: 9,
            }]
        );
    }

    #[test]
    fn test_unfillable_slot_is_reported() {
        let content = content("__1__和__2__", vec![option("a", 1, 0)]);

        let issues = check_turn_content(&content, false);

        assert_eq!(
            issues,
            vec![ConformanceIssue::UnfillableSlot { slot_index: 2 }]
        );
    }

    #[test]
    fn test_missing_free_option_only_matters_when_budgeted() {
        let content = content("__1__", vec![option("a", 1, 2), option("b", 1, 5)]);

        assert!(check_turn_content(&content, false).is_empty());
        assert_eq!(
            check_turn_content(&content, true),
            vec![ConformanceIssue::NoFreeOption { slot_index: 1 }]
        );
    }

    #[test]
    fn test_duplicate_option_ids_are_reported() {
        let content = content("__1__", vec![option("a", 1, 0), option("a", 1, 0)]);

        let issues = check_turn_content(&content, false);

        assert_eq!(
            issues,
            vec![ConformanceIssue::DuplicateOptionId {
                option_id: "a".to_owned(),
            }]
        );
    }
}
