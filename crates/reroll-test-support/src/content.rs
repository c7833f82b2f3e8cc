//! Turn-content fixtures shared across engine and API tests.

use reroll_stats::Effect;
use reroll_story::{TurnContent, TurnOption};

/// Builds an option with the given id, slot, text, cost, and effect deltas.
#[must_use]
pub fn turn_option(
    id: &str,
    slot: u32,
    text: &str,
    cost: u32,
    effect: &[(reroll_stats::StatName, i64)],
) -> TurnOption {
    TurnOption {
        id: id.to_owned(),
        text: text.to_owned(),
        slot_index: slot,
        cost,
        effect: Effect::from_deltas(effect),
    }
}

/// Builds a non-terminal turn from a template, options, and a snippet.
#[must_use]
pub fn turn_content(template: &str, options: Vec<TurnOption>, snippet: &str) -> TurnContent {
    TurnContent {
        story_template: template.to_owned(),
        options,
        next_story_snippet: snippet.to_owned(),
        is_game_over: false,
        game_over_summary: None,
    }
}
