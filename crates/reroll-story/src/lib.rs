//! Reroll — Slot & Option Resolution bounded context.
//!
//! Responsible for story templates (placeholder scanning), turn content,
//! per-turn slot assignments, rendering, and generator-contract
//! conformance checking.

pub mod assignment;
pub mod conformance;
pub mod content;
pub mod template;

pub use assignment::{Assignment, RenderedSegment, render_with_selections, substitute_for_history};
pub use conformance::{ConformanceIssue, check_turn_content};
pub use content::{TurnContent, TurnOption};
pub use template::{TemplateSegment, parse_segments, required_slots};
