//! Query handlers for the Turn Engine context.
//!
//! This module reconstitutes sessions from stored events and projects
//! them into read-only view DTOs for the service surface.

use reroll_core::aggregate::AggregateRoot;
use reroll_core::error::DomainError;
use reroll_core::repository::EventRepository;
use reroll_generation::{LifeStage, Semester};
use reroll_stats::{StatName, normalize_for_display};
use reroll_story::{RenderedSegment, render_with_selections, required_slots};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::aggregates::SessionPhase;
use crate::domain::config::SessionConfig;

/// Scale ceiling for stat display fractions.
pub const DISPLAY_SCALE_MAX: i64 = 50;

/// One stat's value with its display projection.
#[derive(Debug, Serialize)]
pub struct StatView {
    /// The stat name.
    pub name: StatName,
    /// Chinese display label.
    pub label: &'static str,
    /// The raw, unclamped value.
    pub value: i64,
    /// Display fraction in `[0, 1]`.
    pub display: f64,
}

/// One option with its per-session presentation flags.
#[derive(Debug, Serialize)]
pub struct OptionView {
    /// The option id.
    pub id: String,
    /// Display text.
    pub text: String,
    /// The slot this option is eligible for.
    pub slot_index: u32,
    /// Action-point cost.
    pub cost: u32,
    /// Whether this option currently fills its slot.
    pub assigned: bool,
    /// Whether the option can never be placed (no matching placeholder).
    pub inert: bool,
}

/// The allocation stage's progress.
#[derive(Debug, Serialize)]
pub struct AllocationView {
    /// Points not yet distributed.
    pub remaining: i64,
    /// Current per-stat values.
    pub values: Vec<StatView>,
}

/// Read-only projection of a game session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: Uuid,
    /// Observable phase, `ReadyToAdvance` included.
    pub phase: SessionPhase,
    /// The student's age.
    pub age: u32,
    /// Life stage derived from age.
    pub stage: LifeStage,
    /// The current semester, when tracked.
    pub semester: Option<Semester>,
    /// Period within the year or semester.
    pub period: u32,
    /// Current stats, once set.
    pub stats: Option<Vec<StatView>>,
    /// The action-point pool (budgeted variant).
    pub action_points: Option<i64>,
    /// Allocation progress while in the allocation stage.
    pub allocation: Option<AllocationView>,
    /// The current story rendered against the assignment.
    pub story: Option<Vec<RenderedSegment>>,
    /// The current turn's options with presentation flags.
    pub options: Option<Vec<OptionView>>,
    /// Slots the current template requires.
    pub required_slots: Vec<u32>,
    /// Whether every required slot is filled.
    pub assignment_complete: bool,
    /// Total action-point cost of the current selections.
    pub assignment_cost: u64,
    /// Whether a computed turn awaits acknowledgement.
    pub pending_review: bool,
    /// Number of history entries recorded so far.
    pub history_len: usize,
    /// Terminal summary, once the career has ended.
    pub summary: Option<String>,
    /// Current version (event count).
    pub version: i64,
}

fn stat_views<'a>(values: impl Iterator<Item = (StatName, i64)> + 'a) -> Vec<StatView> {
    values
        .map(|(name, value)| StatView {
            name,
            label: name.label(),
            value,
            display: normalize_for_display(value, DISPLAY_SCALE_MAX),
        })
        .collect()
}

/// Retrieves a session by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_session_by_id(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<SessionView, DomainError> {
    let stored_events = repo.load_events(session_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::SessionNotFound(session_id));
    }
    let session = command_handlers::reconstitute(session_id, &stored_events)?;

    let required = session
        .current_turn()
        .map(|turn| required_slots(&turn.story_template))
        .unwrap_or_default();

    let story = session
        .current_turn()
        .map(|turn| render_with_selections(&turn.story_template, session.assignment()));

    let options = session.current_turn().map(|turn| {
        turn.options
            .iter()
            .map(|option| OptionView {
                id: option.id.clone(),
                text: option.text.clone(),
                slot_index: option.slot_index,
                cost: option.cost,
                assigned: session
                    .assignment()
                    .selected(option.slot_index)
                    .is_some_and(|selected| selected.id == option.id),
                inert: !required.contains(&option.slot_index),
            })
            .collect::<Vec<_>>()
    });

    Ok(SessionView {
        session_id,
        phase: session.phase(),
        age: session.age(),
        stage: session.stage(),
        semester: session.semester(),
        period: session.period(),
        stats: session.stats().map(|stats| stat_views(stats.iter())),
        action_points: session.action_points(),
        allocation: session.allocation().map(|allocation| AllocationView {
            remaining: allocation.remaining(),
            values: stat_views(
                allocation
                    .profile()
                    .names()
                    .iter()
                    .filter_map(|&name| allocation.get(name).map(|value| (name, value))),
            ),
        }),
        story,
        options,
        assignment_complete: session.assignment().is_complete(&required),
        assignment_cost: session.assignment().total_cost(),
        required_slots: required,
        pending_review: session.pending().is_some(),
        history_len: session.history().len(),
        summary: session.summary().map(ToOwned::to_owned),
        version: session.version(),
    })
}

/// Retrieves the configuration a session was started with, used to carry
/// it into a fresh run on restart.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no events exist for the ID
/// or the session never recorded a configuration.
pub async fn get_session_config(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<SessionConfig, DomainError> {
    let stored_events = repo.load_events(session_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::SessionNotFound(session_id));
    }
    let session = command_handlers::reconstitute(session_id, &stored_events)?;
    session
        .config()
        .copied()
        .ok_or(DomainError::SessionNotFound(session_id))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use reroll_event_store::MemoryEventRepository;
    use reroll_stats::StatName;
    use reroll_test_support::{FixedClock, ScriptedGenerator, turn_content, turn_option};

    use super::*;
    use crate::application::command_handlers::{
        handle_assign_option, handle_start_session,
    };
    use crate::application::resolution_gate::ResolutionGate;
    use crate::domain::commands::{AssignOption, StartSession};

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    async fn seeded_session(repo: &MemoryEventRepository) -> Uuid {
        let generator = ScriptedGenerator::with_contents(vec![turn_content(
            "你在__1__遇到了__2__",
            vec![
                turn_option("a", 1, "操场", 0, &[(StatName::Stamina, 2)]),
                turn_option("b", 2, "班主任", 0, &[]),
                turn_option("ghost", 9, "幽灵选项", 0, &[]),
            ],
            "一次偶遇",
        )]);
        let command = StartSession {
            correlation_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            config: crate::domain::config::SessionConfig::classic(),
        };
        handle_start_session(&command, &fixed_clock(), &generator, repo)
            .await
            .unwrap();
        command.session_id
    }

    #[tokio::test]
    async fn test_view_projects_position_stats_and_story() {
        let repo = MemoryEventRepository::new();
        let session_id = seeded_session(&repo).await;

        let view = get_session_by_id(session_id, &repo).await.unwrap();

        assert_eq!(view.session_id, session_id);
        assert_eq!(view.phase, SessionPhase::AwaitingSelection);
        assert_eq!(view.age, 6);
        assert_eq!(view.period, 1);
        assert_eq!(view.required_slots, vec![1, 2]);
        assert!(!view.assignment_complete);
        assert_eq!(view.history_len, 0);
        assert!(view.summary.is_none());

        let stats = view.stats.unwrap();
        assert_eq!(stats.len(), 5);
        let intelligence = stats
            .iter()
            .find(|s| s.name == StatName::Intelligence)
            .unwrap();
        assert_eq!(intelligence.value, 10);
        assert!((intelligence.display - 0.2).abs() < f64::EPSILON);

        // The story renders as unfilled placeholders before any assignment.
        let story = view.story.unwrap();
        assert!(
            story
                .iter()
                .any(|s| matches!(s, RenderedSegment::Unfilled { slot: 1 }))
        );
    }

    #[tokio::test]
    async fn test_view_flags_assigned_and_inert_options() {
        let repo = MemoryEventRepository::new();
        let gate = ResolutionGate::new();
        let session_id = seeded_session(&repo).await;

        let command = AssignOption {
            correlation_id: Uuid::new_v4(),
            session_id,
            slot: 1,
            option_id: "a".to_owned(),
        };
        handle_assign_option(&command, &fixed_clock(), &gate, &repo)
            .await
            .unwrap();

        let view = get_session_by_id(session_id, &repo).await.unwrap();
        let options = view.options.unwrap();

        let assigned = options.iter().find(|o| o.id == "a").unwrap();
        assert!(assigned.assigned);
        assert!(!assigned.inert);

        let unassigned = options.iter().find(|o| o.id == "b").unwrap();
        assert!(!unassigned.assigned);

        // Slot 9 has no placeholder; the option can never be placed.
        let ghost = options.iter().find(|o| o.id == "ghost").unwrap();
        assert!(ghost.inert);
    }

    #[tokio::test]
    async fn test_unknown_session_view_is_not_found() {
        let repo = MemoryEventRepository::new();

        let result = get_session_by_id(Uuid::new_v4(), &repo).await;

        assert!(matches!(result, Err(DomainError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_session_config_round_trips_for_restart() {
        let repo = MemoryEventRepository::new();
        let session_id = seeded_session(&repo).await;

        let config = get_session_config(session_id, &repo).await.unwrap();

        assert_eq!(config, crate::domain::config::SessionConfig::classic());
    }
}
