//! Per-turn slot assignments.
//!
//! An assignment is transient UI state scoped to exactly one turn. It is
//! reset whenever new turn content is installed, so an option from a prior
//! turn can never satisfy a slot after that turn is replaced.

use std::collections::BTreeMap;

use reroll_core::error::DomainError;
use serde::{Deserialize, Serialize};

use crate::content::TurnOption;
use crate::template::{TemplateSegment, parse_segments};

/// A mapping from slot index to the option currently filling it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    selections: BTreeMap<u32, TurnOption>,
}

impl Assignment {
    /// An empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `option` into `slot`, replacing any previous selection for
    /// that slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` — leaving the assignment
    /// untouched — when the option's declared slot index differs from the
    /// target slot, when the slot has no placeholder in the current
    /// template (an inert option can never be legally assigned), or when
    /// the option is already filling a different slot.
    pub fn assign(
        &mut self,
        slot: u32,
        option: TurnOption,
        required: &[u32],
    ) -> Result<(), DomainError> {
        if option.slot_index != slot {
            return Err(DomainError::Validation(format!(
                "option {} is declared for slot {}, not slot {slot}",
                option.id, option.slot_index
            )));
        }
        if !required.contains(&slot) {
            return Err(DomainError::Validation(format!(
                "slot {slot} has no placeholder in the current story"
            )));
        }
        let elsewhere = self
            .selections
            .iter()
            .any(|(&s, selected)| s != slot && selected.id == option.id);
        if elsewhere {
            return Err(DomainError::Validation(format!(
                "option {} is already placed in another slot",
                option.id
            )));
        }
        self.selections.insert(slot, option);
        Ok(())
    }

    /// Clears the selection for `slot`, if any.
    pub fn clear(&mut self, slot: u32) {
        self.selections.remove(&slot);
    }

    /// The option currently filling `slot`.
    #[must_use]
    pub fn selected(&self, slot: u32) -> Option<&TurnOption> {
        self.selections.get(&slot)
    }

    /// True iff every required slot has a selection. Selections for slots
    /// outside `required` never affect the result.
    #[must_use]
    pub fn is_complete(&self, required: &[u32]) -> bool {
        required.iter().all(|slot| self.selections.contains_key(slot))
    }

    /// Total action-point cost of the current selections.
    #[must_use]
    pub fn total_cost(&self) -> u64 {
        self.selections
            .values()
            .map(|option| u64::from(option.cost))
            .sum()
    }

    /// Iterates the selected options.
    pub fn options(&self) -> impl Iterator<Item = &TurnOption> {
        self.selections.values()
    }
}

/// One piece of a story rendered against an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedSegment {
    /// Literal story text.
    Literal {
        /// The text, byte-for-byte from the template.
        text: String,
    },
    /// A placeholder filled by the current selection.
    Filled {
        /// The slot index.
        slot: u32,
        /// The selected option's display text.
        text: String,
    },
    /// A placeholder with no selection yet.
    Unfilled {
        /// The slot index.
        slot: u32,
    },
}

/// Splits a template against an assignment, preserving literal text and
/// visiting placeholders in textual order. Duplicate occurrences of one
/// slot each render independently but share the same current selection.
#[must_use]
pub fn render_with_selections(template: &str, assignment: &Assignment) -> Vec<RenderedSegment> {
    parse_segments(template)
        .into_iter()
        .map(|segment| match segment {
            TemplateSegment::Literal(text) => RenderedSegment::Literal { text },
            TemplateSegment::Placeholder(slot) => match assignment.selected(slot) {
                Some(option) => RenderedSegment::Filled {
                    slot,
                    text: option.text.clone(),
                },
                None => RenderedSegment::Unfilled { slot },
            },
        })
        .collect()
}

/// Builds the permanent history rendering of a resolved turn: every
/// occurrence of an assigned slot becomes the bracketed option text.
/// Unresolved slots (which cannot occur once the assignment is complete)
/// fall back to the raw placeholder token.
#[must_use]
pub fn substitute_for_history(template: &str, assignment: &Assignment) -> String {
    parse_segments(template)
        .into_iter()
        .map(|segment| match segment {
            TemplateSegment::Literal(text) => text,
            TemplateSegment::Placeholder(slot) => match assignment.selected(slot) {
                Some(option) => format!("[{}]", option.text),
                None => format!("__{slot}__"),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::required_slots;
    use reroll_stats::{Effect, StatName};

    fn option(id: &str, slot: u32, text: &str, cost: u32) -> TurnOption {
        TurnOption {
            id: id.to_owned(),
            text: text.to_owned(),
            slot_index: slot,
            cost,
            effect: Effect::from_deltas(&[(StatName::Intelligence, 1)]),
        }
    }

    #[test]
    fn test_assign_then_render_fills_the_story() {
        let template = "你在__1__遇到了__2__";
        let required = required_slots(template);
        let mut assignment = Assignment::new();

        assignment
            .assign(1, option("a", 1, "操场", 0), &required)
            .unwrap();
        assignment
            .assign(2, option("b", 2, "班主任", 0), &required)
            .unwrap();

        assert_eq!(required, vec![1, 2]);
        assert!(assignment.is_complete(&required));

        let rendered: String = render_with_selections(template, &assignment)
            .into_iter()
            .map(|segment| match segment {
                RenderedSegment::Literal { text } | RenderedSegment::Filled { text, .. } => text,
                RenderedSegment::Unfilled { slot } => format!("__{slot}__"),
            })
            .collect();
        assert_eq!(rendered, "你在操场遇到了班主任");

        assert_eq!(
            substitute_for_history(template, &assignment),
            "你在[操场]遇到了[班主任]"
        );
    }

    #[test]
    fn test_assign_rejects_wrong_slot_index() {
        let required = vec![1, 2];
        let mut assignment = Assignment::new();

        let result = assignment.assign(2, option("a", 1, "操场", 0), &required);

        assert!(result.is_err());
        assert!(assignment.selected(2).is_none());
    }

    #[test]
    fn test_assign_rejects_inert_option() {
        // Slot 7 has no placeholder in the template, so an option declared
        // for it can never be placed.
        let required = vec![1, 2];
        let mut assignment = Assignment::new();

        let result = assignment.assign(7, option("x", 7, "迟到", 0), &required);

        assert!(result.is_err());
    }

    #[test]
    fn test_assign_rejects_option_already_used_elsewhere() {
        let required = vec![1, 2];
        let mut assignment = Assignment::new();
        assignment
            .assign(1, option("a", 1, "操场", 0), &required)
            .unwrap();

        let mut duplicate = option("a", 2, "操场", 0);
        duplicate.slot_index = 2;
        let result = assignment.assign(2, duplicate, &required);

        assert!(result.is_err());
    }

    #[test]
    fn test_reassign_replaces_the_previous_selection() {
        let required = vec![1];
        let mut assignment = Assignment::new();
        assignment
            .assign(1, option("a", 1, "操场", 0), &required)
            .unwrap();
        assignment
            .assign(1, option("b", 1, "小卖部", 0), &required)
            .unwrap();

        assert_eq!(assignment.selected(1).map(|o| o.id.as_str()), Some("b"));
    }

    #[test]
    fn test_is_complete_ignores_irrelevant_extra_keys() {
        let mut assignment = Assignment::new();
        assignment
            .assign(1, option("a", 1, "操场", 0), &[1, 9])
            .unwrap();
        assignment
            .assign(9, option("z", 9, "天台", 0), &[1, 9])
            .unwrap();

        // Required set is just [1]; the extra key for slot 9 changes nothing.
        assert!(assignment.is_complete(&[1]));
        assert!(!assignment.is_complete(&[1, 2]));
    }

    #[test]
    fn test_total_cost_sums_selected_costs() {
        let required = vec![1, 2];
        let mut assignment = Assignment::new();
        assert_eq!(assignment.total_cost(), 0);

        assignment
            .assign(1, option("a", 1, "操场", 3), &required)
            .unwrap();
        assignment
            .assign(2, option("b", 2, "班主任", 2), &required)
            .unwrap();

        assert_eq!(assignment.total_cost(), 5);
    }

    #[test]
    fn test_duplicate_placeholder_occurrences_share_one_selection() {
        let template = "__1__，还是__1__";
        let required = required_slots(template);
        let mut assignment = Assignment::new();
        assignment
            .assign(1, option("a", 1, "上课", 0), &required)
            .unwrap();

        let filled: Vec<_> = render_with_selections(template, &assignment)
            .into_iter()
            .filter(|segment| matches!(segment, RenderedSegment::Filled { .. }))
            .collect();
        assert_eq!(filled.len(), 2);
        assert_eq!(
            substitute_for_history(template, &assignment),
            "[上课]，还是[上课]"
        );
    }

    #[test]
    fn test_clear_removes_a_selection() {
        let required = vec![1];
        let mut assignment = Assignment::new();
        assignment
            .assign(1, option("a", 1, "操场", 0), &required)
            .unwrap();

        assignment.clear(1);

        assert!(!assignment.is_complete(&required));
        assert!(assignment.selected(1).is_none());
    }
}
