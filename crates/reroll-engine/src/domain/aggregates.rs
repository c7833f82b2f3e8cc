//! Aggregate roots for the Turn Engine context.

use reroll_core::aggregate::AggregateRoot;
use reroll_core::clock::Clock;
use reroll_core::error::DomainError;
use reroll_core::event::{DomainEvent, EventMetadata};
use reroll_core::rng::DeterministicRng;
use reroll_generation::{LifeStage, Semester, TurnRequest};
use reroll_stats::{PointAllocation, StatName, StatSet};
use reroll_story::{Assignment, TurnContent, required_slots, substitute_for_history};
use serde::Serialize;
use uuid::Uuid;

use super::config::SessionConfig;
use super::events::{
    AllocationAdjusted, AllocationCommitted, FirstTurnInstalled, OptionAssigned, OptionCleared,
    ReviewAcknowledged, SessionEvent, SessionEventKind, SessionStarted, TurnOutcome, TurnResolved,
    TurnStaged, TurnTransition,
};
use super::progression::CareerPosition;

/// Closing line used when the generator ends the career without a summary.
pub const DEFAULT_GAME_OVER_SUMMARY: &str = "你的学生生涯在各种操作中落下了帷幕。";

/// The session state machine's observable phase.
///
/// `ReadyToAdvance` is derived, never stored: it holds exactly when the
/// assignment is complete and, in the budgeted variant, affordable.
/// The generation-in-flight window (`Resolving`) is tracked by the
/// resolution gate in the application layer, not persisted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session has started.
    Uninitialized,
    /// The initial point budget is being distributed.
    Allocating,
    /// A turn is installed and the assignment is still incomplete or
    /// unaffordable.
    AwaitingSelection,
    /// The assignment is complete and affordable; an advance will be
    /// accepted.
    ReadyToAdvance,
    /// A computed turn is held pending explicit acknowledgement.
    PendingReview,
    /// The career has ended; only a fresh session exits this.
    Over,
}

/// Everything computed for an advance before the generation call: the
/// request to send, plus the state the session will take on success.
#[derive(Debug, Clone)]
pub struct PreparedAdvance {
    /// The request for the next turn's content.
    pub request: TurnRequest,
    pub(crate) history_entry: String,
    pub(crate) stats: StatSet,
    pub(crate) position: CareerPosition,
    pub(crate) action_points: Option<i64>,
}

/// The aggregate root for one school career run.
#[derive(Debug)]
pub struct GameSession {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Stored phase; never `ReadyToAdvance` (see [`SessionPhase`]).
    pub(crate) phase: SessionPhase,
    /// Configuration, set by `SessionStarted`.
    pub(crate) config: Option<SessionConfig>,
    /// In-progress allocation (budgeted variant, before commit).
    pub(crate) allocation: Option<PointAllocation>,
    /// Age/semester/period.
    pub(crate) position: CareerPosition,
    /// Current stats, set at start or allocation commit.
    pub(crate) stats: Option<StatSet>,
    /// Action-point pool (budgeted variant).
    pub(crate) action_points: Option<i64>,
    /// Append-only narrative history.
    pub(crate) history: Vec<String>,
    /// The installed turn; `None` before the first turn and after `Over`.
    pub(crate) current_turn: Option<TurnContent>,
    /// Per-turn slot selections, reset on every install.
    pub(crate) assignment: Assignment,
    /// Staged transition awaiting acknowledgement (budgeted variant).
    pub(crate) pending: Option<TurnTransition>,
    /// Terminal summary, set on `Over`.
    pub(crate) summary: Option<String>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<SessionEvent>,
}

impl GameSession {
    /// Creates an unstarted session.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            phase: SessionPhase::Uninitialized,
            config: None,
            allocation: None,
            position: CareerPosition {
                age: 6,
                semester: None,
                period: 1,
            },
            stats: None,
            action_points: None,
            history: Vec::new(),
            current_turn: None,
            assignment: Assignment::new(),
            pending: None,
            summary: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn emit(&mut self, kind: SessionEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let mut event = SessionEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: String::new(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        event.metadata.event_type = event.event_type().to_owned();
        self.uncommitted_events.push(event);
    }

    /// The observable phase, with `ReadyToAdvance` derived on the fly.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.phase == SessionPhase::AwaitingSelection
            && let Some(turn) = &self.current_turn
        {
            let required = required_slots(&turn.story_template);
            let complete = self.assignment.is_complete(&required);
            let affordable = match self.action_points {
                Some(pool) => cost_as_i64(self.assignment.total_cost()) <= pool,
                None => true,
            };
            if complete && affordable {
                return SessionPhase::ReadyToAdvance;
            }
        }
        self.phase
    }

    /// The session configuration, once started.
    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// The student's age.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.position.age
    }

    /// Life stage derived from age.
    #[must_use]
    pub fn stage(&self) -> LifeStage {
        self.position.stage()
    }

    /// The current semester, when tracked.
    #[must_use]
    pub fn semester(&self) -> Option<Semester> {
        self.position.semester
    }

    /// The period within the year or semester.
    #[must_use]
    pub fn period(&self) -> u32 {
        self.position.period
    }

    /// Current stats, once set.
    #[must_use]
    pub fn stats(&self) -> Option<&StatSet> {
        self.stats.as_ref()
    }

    /// The action-point pool (budgeted variant).
    #[must_use]
    pub fn action_points(&self) -> Option<i64> {
        self.action_points
    }

    /// The narrative history so far.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The installed turn content, if any.
    #[must_use]
    pub fn current_turn(&self) -> Option<&TurnContent> {
        self.current_turn.as_ref()
    }

    /// The per-turn assignment.
    #[must_use]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// The in-progress allocation (budgeted variant, before commit).
    #[must_use]
    pub fn allocation(&self) -> Option<&PointAllocation> {
        self.allocation.as_ref()
    }

    /// The staged transition awaiting acknowledgement, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&TurnTransition> {
        self.pending.as_ref()
    }

    /// The terminal summary, once the career has ended.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Starts a budgeted session in the allocation stage.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the session has already
    /// started or the configuration carries no action-point rules.
    pub fn begin_allocation(
        &mut self,
        config: SessionConfig,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != SessionPhase::Uninitialized {
            return Err(DomainError::Validation(
                "session has already started".to_owned(),
            ));
        }
        if !config.is_budgeted() {
            return Err(DomainError::Validation(
                "allocation stage requires action-point rules".to_owned(),
            ));
        }

        self.emit(
            SessionEventKind::SessionStarted(SessionStarted {
                session_id: self.id,
                config,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Starts a non-budgeted session with its generated first turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the session has already
    /// started or the configuration expects an allocation stage.
    pub fn begin_with_first_turn(
        &mut self,
        config: SessionConfig,
        content: TurnContent,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != SessionPhase::Uninitialized {
            return Err(DomainError::Validation(
                "session has already started".to_owned(),
            ));
        }
        if config.is_budgeted() {
            return Err(DomainError::Validation(
                "budgeted sessions start in the allocation stage".to_owned(),
            ));
        }

        self.emit(
            SessionEventKind::SessionStarted(SessionStarted {
                session_id: self.id,
                config,
            }),
            correlation_id,
            clock,
        );
        self.emit(
            SessionEventKind::FirstTurnInstalled(FirstTurnInstalled { content }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Adjusts one stat during the allocation stage.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` — with no state change — when
    /// the session is not allocating or the adjustment violates the
    /// budget invariants.
    pub fn adjust_allocation(
        &mut self,
        stat: StatName,
        delta: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let Some(allocation) = &self.allocation else {
            return Err(DomainError::Validation(
                "session is not in the allocation stage".to_owned(),
            ));
        };

        // Trial on a copy; the real mutation happens in `apply`.
        allocation.clone().adjust(stat, delta)?;

        self.emit(
            SessionEventKind::AllocationAdjusted(AllocationAdjusted { stat, delta }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// The stat set the allocation stage would commit right now.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the session is not
    /// allocating or the remaining budget is not exactly zero.
    pub fn committed_stats(&self) -> Result<StatSet, DomainError> {
        let Some(allocation) = &self.allocation else {
            return Err(DomainError::Validation(
                "session is not in the allocation stage".to_owned(),
            ));
        };
        allocation.commit()
    }

    /// Finishes the allocation stage and installs the first turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` — leaving the session in the
    /// allocation stage — unless the remaining budget is exactly zero.
    pub fn commit_allocation(
        &mut self,
        content: TurnContent,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let stats = self.committed_stats()?;

        self.emit(
            SessionEventKind::AllocationCommitted(AllocationCommitted { stats }),
            correlation_id,
            clock,
        );
        self.emit(
            SessionEventKind::FirstTurnInstalled(FirstTurnInstalled { content }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Places an option from the current turn into a slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when no turn is awaiting
    /// selection, the option id is unknown, or the placement violates the
    /// slot rules (wrong declared slot, inert slot, option already used).
    pub fn assign_option(
        &mut self,
        slot: u32,
        option_id: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let Some(turn) = &self.current_turn else {
            return Err(DomainError::Validation(
                "no turn is awaiting selection".to_owned(),
            ));
        };
        if self.phase != SessionPhase::AwaitingSelection {
            return Err(DomainError::Validation(
                "no turn is awaiting selection".to_owned(),
            ));
        }
        let Some(option) = turn.find_option(option_id).cloned() else {
            return Err(DomainError::Validation(format!(
                "option {option_id} is not part of the current turn"
            )));
        };

        // Trial on a copy; the real mutation happens in `apply`.
        let required = required_slots(&turn.story_template);
        self.assignment.clone().assign(slot, option.clone(), &required)?;

        self.emit(
            SessionEventKind::OptionAssigned(OptionAssigned { slot, option }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Clears a slot's selection.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when no turn is awaiting
    /// selection or the slot has no selection.
    pub fn clear_option(
        &mut self,
        slot: u32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != SessionPhase::AwaitingSelection {
            return Err(DomainError::Validation(
                "no turn is awaiting selection".to_owned(),
            ));
        }
        if self.assignment.selected(slot).is_none() {
            return Err(DomainError::Validation(format!(
                "slot {slot} has no selection"
            )));
        }

        self.emit(
            SessionEventKind::OptionCleared(OptionCleared { slot }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Validates the current assignment and computes everything an
    /// advance needs: the next stats, history entry, career position,
    /// pool value, and the generation request. Pure with respect to the
    /// session — nothing is mutated until [`Self::complete_advance`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` — before any generation call —
    /// when no turn is installed, the assignment is incomplete, or the
    /// total cost exceeds the pool at invocation time.
    pub fn prepare_advance(
        &self,
        rng: &mut dyn DeterministicRng,
    ) -> Result<PreparedAdvance, DomainError> {
        if self.phase != SessionPhase::AwaitingSelection {
            return Err(DomainError::Validation(
                "no turn is awaiting selection".to_owned(),
            ));
        }
        let (Some(turn), Some(config), Some(stats)) =
            (&self.current_turn, &self.config, &self.stats)
        else {
            return Err(DomainError::Validation(
                "no turn is awaiting selection".to_owned(),
            ));
        };

        let required = required_slots(&turn.story_template);
        if !self.assignment.is_complete(&required) {
            return Err(DomainError::Validation(
                "assignment incomplete: every slot must be filled".to_owned(),
            ));
        }

        let cost = cost_as_i64(self.assignment.total_cost());
        let next_pool = match (self.action_points, &config.action_points) {
            (Some(pool), Some(rules)) => {
                if cost > pool {
                    return Err(DomainError::Validation(format!(
                        "insufficient action points: cost {cost} exceeds pool {pool}"
                    )));
                }
                let recovery = i64::from(rng.next_u32_range(rules.recovery_min, rules.recovery_max));
                // Hard invariant: the pool never goes negative.
                Some((pool - cost + recovery).max(0))
            }
            _ => None,
        };

        let mut next_stats = stats.clone();
        for option in self.assignment.options() {
            next_stats = next_stats.apply_effect(&option.effect);
        }

        let substituted = substitute_for_history(&turn.story_template, &self.assignment);
        let history_entry = format!("{substituted} -> {}", turn.next_story_snippet);

        let next_position = self.position.advanced();

        let mut windowed: Vec<String> = self.history.clone();
        windowed.push(history_entry.clone());
        let start = windowed.len().saturating_sub(config.history_window);
        let windowed = windowed[start..].to_vec();

        let request = TurnRequest {
            age: next_position.age,
            stage: next_position.stage(),
            semester: next_position.semester,
            period: next_position.period,
            stats: next_stats.clone(),
            history: windowed,
            budgeted: config.is_budgeted(),
        };

        Ok(PreparedAdvance {
            request,
            history_entry,
            stats: next_stats,
            position: next_position,
            action_points: next_pool,
        })
    }

    /// Records the outcome of a successful generation call: immediately
    /// applied in the plain variants, staged for acknowledgement in the
    /// budgeted variant.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the session left the
    /// selection phase since the advance was prepared.
    pub fn complete_advance(
        &mut self,
        prepared: PreparedAdvance,
        content: TurnContent,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != SessionPhase::AwaitingSelection {
            return Err(DomainError::Validation(
                "no turn is awaiting selection".to_owned(),
            ));
        }
        let staged = self.config.as_ref().is_some_and(SessionConfig::staged_review);

        let next = if content.is_game_over {
            TurnOutcome::GameOver {
                summary: content
                    .game_over_summary
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GAME_OVER_SUMMARY.to_owned()),
            }
        } else {
            TurnOutcome::Continue(content)
        };

        let transition = TurnTransition {
            history_entry: prepared.history_entry,
            stats: prepared.stats,
            age: prepared.position.age,
            semester: prepared.position.semester,
            period: prepared.position.period,
            action_points: prepared.action_points,
            next,
        };

        let kind = if staged {
            SessionEventKind::TurnStaged(TurnStaged { transition })
        } else {
            SessionEventKind::TurnResolved(TurnResolved { transition })
        };
        self.emit(kind, correlation_id, clock);
        Ok(())
    }

    /// Acknowledges a staged turn, applying it atomically.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when no turn is staged.
    pub fn acknowledge_review(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != SessionPhase::PendingReview {
            return Err(DomainError::Validation(
                "no staged turn to acknowledge".to_owned(),
            ));
        }

        self.emit(
            SessionEventKind::ReviewAcknowledged(ReviewAcknowledged {}),
            correlation_id,
            clock,
        );
        Ok(())
    }

    fn apply_transition(&mut self, transition: TurnTransition) {
        self.history.push(transition.history_entry);
        self.stats = Some(transition.stats);
        self.position = CareerPosition {
            age: transition.age,
            semester: transition.semester,
            period: transition.period,
        };
        self.action_points = transition.action_points;
        self.pending = None;
        match transition.next {
            TurnOutcome::Continue(content) => {
                self.current_turn = Some(content);
                self.assignment = Assignment::new();
                self.phase = SessionPhase::AwaitingSelection;
            }
            TurnOutcome::GameOver { summary } => {
                self.current_turn = None;
                self.assignment = Assignment::new();
                self.summary = Some(summary);
                self.phase = SessionPhase::Over;
            }
        }
    }
}

fn cost_as_i64(cost: u64) -> i64 {
    i64::try_from(cost).unwrap_or(i64::MAX)
}

impl AggregateRoot for GameSession {
    type Event = SessionEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            SessionEventKind::SessionStarted(payload) => {
                let config = payload.config;
                self.config = Some(config);
                self.position = CareerPosition::initial(config.calendar);
                if let Some(rules) = config.action_points {
                    self.allocation = Some(PointAllocation::new(config.profile, rules.allocation));
                    self.phase = SessionPhase::Allocating;
                } else {
                    self.stats = Some(StatSet::with_baseline(
                        config.profile,
                        config.default_baseline,
                    ));
                }
            }
            SessionEventKind::AllocationAdjusted(payload) => {
                if let Some(allocation) = &mut self.allocation {
                    // Validated before emission; replay cannot fail.
                    let _ = allocation.adjust(payload.stat, payload.delta);
                }
            }
            SessionEventKind::AllocationCommitted(payload) => {
                self.stats = Some(payload.stats.clone());
                self.allocation = None;
                if let Some(rules) = self.config.as_ref().and_then(|c| c.action_points) {
                    self.action_points = Some(rules.starting_pool);
                }
            }
            SessionEventKind::FirstTurnInstalled(payload) => {
                self.current_turn = Some(payload.content.clone());
                self.assignment = Assignment::new();
                self.phase = SessionPhase::AwaitingSelection;
            }
            SessionEventKind::OptionAssigned(payload) => {
                if let Some(turn) = &self.current_turn {
                    let required = required_slots(&turn.story_template);
                    // Validated before emission; replay cannot fail.
                    let _ = self
                        .assignment
                        .assign(payload.slot, payload.option.clone(), &required);
                }
            }
            SessionEventKind::OptionCleared(payload) => {
                self.assignment.clear(payload.slot);
            }
            SessionEventKind::TurnResolved(payload) => {
                self.apply_transition(payload.transition.clone());
            }
            SessionEventKind::TurnStaged(payload) => {
                self.pending = Some(payload.transition.clone());
                self.phase = SessionPhase::PendingReview;
            }
            SessionEventKind::ReviewAcknowledged(_) => {
                if let Some(transition) = self.pending.take() {
                    self.apply_transition(transition);
                }
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
