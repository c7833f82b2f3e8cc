//! Turn content — the unit of story delivered by the generator.
//!
//! Wire field names are camelCase to match the generator JSON contract.
//! Deserialization is deliberately forgiving: only the story template is
//! required; everything else falls back to an empty/absent value so a
//! partially malformed response degrades instead of crashing.

use reroll_stats::Effect;
use serde::{Deserialize, Serialize};

/// An immutable option word produced by content generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOption {
    /// Unique identifier within one turn's option list.
    pub id: String,
    /// Display text (kept short by the generation contract).
    pub text: String,
    /// The slot this option is eligible for.
    pub slot_index: u32,
    /// Action-point cost. Absent on the wire means free.
    #[serde(default)]
    pub cost: u32,
    /// Partial stat deltas applied when this option is chosen.
    #[serde(default)]
    pub effect: Effect,
}

/// One turn's story content: a template with fill-in slots, the option
/// words eligible for them, and the narrative snippet carried into future
/// prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContent {
    /// Story text containing `__N__` placeholder tokens.
    pub story_template: String,
    /// Options eligible for the template's slots.
    #[serde(default)]
    pub options: Vec<TurnOption>,
    /// Short summary of this turn, appended to the prompt history.
    #[serde(default)]
    pub next_story_snippet: String,
    /// Set when the career has reached its end.
    #[serde(default)]
    pub is_game_over: bool,
    /// Closing summary; meaningful only when `is_game_over` is set.
    #[serde(default)]
    pub game_over_summary: Option<String>,
}

impl TurnContent {
    /// Finds an option by id within this turn.
    #[must_use]
    pub fn find_option(&self, option_id: &str) -> Option<&TurnOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// The options eligible for one slot, in list order.
    #[must_use]
    pub fn options_for_slot(&self, slot: u32) -> Vec<&TurnOption> {
        self.options
            .iter()
            .filter(|option| option.slot_index == slot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reroll_stats::StatName;

    #[test]
    fn test_deserializes_full_generator_payload() {
        let json = r#"{
            "storyTemplate": "你在__1__遇到了__2__",
            "options": [
                {"id": "a", "text": "操场", "slotIndex": 1, "cost": 2,
                 "effect": {"stamina": 1}},
                {"id": "b", "text": "班主任", "slotIndex": 2}
            ],
            "nextStorySnippet": "一次偶遇",
            "isGameOver": false
        }"#;

        let content: TurnContent = serde_json::from_str(json).unwrap();

        assert_eq!(content.options.len(), 2);
        assert_eq!(content.options[0].cost, 2);
        assert_eq!(
            content.options[0].effect.0.get(&StatName::Stamina),
            Some(&1)
        );
        // Absent cost and effect fall back to free/no-op.
        assert_eq!(content.options[1].cost, 0);
        assert!(content.options[1].effect.is_empty());
        assert!(!content.is_game_over);
        assert!(content.game_over_summary.is_none());
    }

    #[test]
    fn test_deserializes_minimal_payload() {
        let content: TurnContent =
            serde_json::from_str(r#"{"storyTemplate": "平静的一天。"}"#).unwrap();

        assert!(content.options.is_empty());
        assert_eq!(content.next_story_snippet, "");
        assert!(!content.is_game_over);
    }

    #[test]
    fn test_missing_story_template_is_an_error() {
        let result = serde_json::from_str::<TurnContent>(r#"{"options": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_find_option_and_options_for_slot() {
        let content: TurnContent = serde_json::from_str(
            r#"{
                "storyTemplate": "__1__",
                "options": [
                    {"id": "a", "text": "甲", "slotIndex": 1},
                    {"id": "b", "text": "乙", "slotIndex": 1},
                    {"id": "c", "text": "丙", "slotIndex": 2}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(content.find_option("b").map(|o| o.text.as_str()), Some("乙"));
        assert!(content.find_option("zzz").is_none());
        assert_eq!(content.options_for_slot(1).len(), 2);
        assert_eq!(content.options_for_slot(3).len(), 0);
    }
}
