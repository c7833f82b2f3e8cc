//! Domain events for the Turn Engine context.

use reroll_core::event::{DomainEvent, EventMetadata};
use reroll_generation::Semester;
use reroll_stats::{StatName, StatSet};
use reroll_story::{TurnContent, TurnOption};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::SessionConfig;

/// Emitted when a session is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    /// The session identifier.
    pub session_id: Uuid,
    /// The configuration fixed for this run.
    pub config: SessionConfig,
}

/// Emitted when one allocation-stage adjustment is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationAdjusted {
    /// The stat adjusted.
    pub stat: StatName,
    /// The accepted delta.
    pub delta: i64,
}

/// Emitted when the allocation stage completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationCommitted {
    /// The committed initial stat set.
    pub stats: StatSet,
}

/// Emitted when the first turn's content is installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstTurnInstalled {
    /// The generated turn content.
    pub content: TurnContent,
}

/// Emitted when an option is placed into a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionAssigned {
    /// The target slot.
    pub slot: u32,
    /// The full option record, captured from the current turn.
    pub option: TurnOption,
}

/// Emitted when a slot's selection is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionCleared {
    /// The slot cleared.
    pub slot: u32,
}

/// What a resolved turn leads into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The career continues with fresh content.
    Continue(TurnContent),
    /// The career has ended.
    GameOver {
        /// Closing summary shown to the player.
        summary: String,
    },
}

/// The full computed result of one advance: everything the session looks
/// like after the turn, carried in one payload so application is atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnTransition {
    /// The permanent history entry for the resolved turn.
    pub history_entry: String,
    /// Stats after applying the selected options' effects.
    pub stats: StatSet,
    /// Age after period advancement.
    pub age: u32,
    /// Semester after period advancement, when tracked.
    pub semester: Option<Semester>,
    /// Period after advancement.
    pub period: u32,
    /// Action-point pool after cost and recovery, when tracked.
    pub action_points: Option<i64>,
    /// The next turn's content or the terminal summary.
    pub next: TurnOutcome,
}

/// Emitted when an advance is applied immediately (non-staged variants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResolved {
    /// The computed transition, applied on receipt.
    pub transition: TurnTransition,
}

/// Emitted when an advance is staged for review (budgeted variant): the
/// computed state is held and only applied on acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStaged {
    /// The computed transition, held pending acknowledgement.
    pub transition: TurnTransition,
}

/// Emitted when the player acknowledges a staged turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAcknowledged {}

/// Event type identifier for [`SessionStarted`].
pub const SESSION_STARTED_EVENT_TYPE: &str = "engine.session_started";

/// Event type identifier for [`AllocationAdjusted`].
pub const ALLOCATION_ADJUSTED_EVENT_TYPE: &str = "engine.allocation_adjusted";

/// Event type identifier for [`AllocationCommitted`].
pub const ALLOCATION_COMMITTED_EVENT_TYPE: &str = "engine.allocation_committed";

/// Event type identifier for [`FirstTurnInstalled`].
pub const FIRST_TURN_INSTALLED_EVENT_TYPE: &str = "engine.first_turn_installed";

/// Event type identifier for [`OptionAssigned`].
pub const OPTION_ASSIGNED_EVENT_TYPE: &str = "engine.option_assigned";

/// Event type identifier for [`OptionCleared`].
pub const OPTION_CLEARED_EVENT_TYPE: &str = "engine.option_cleared";

/// Event type identifier for [`TurnResolved`].
pub const TURN_RESOLVED_EVENT_TYPE: &str = "engine.turn_resolved";

/// Event type identifier for [`TurnStaged`].
pub const TURN_STAGED_EVENT_TYPE: &str = "engine.turn_staged";

/// Event type identifier for [`ReviewAcknowledged`].
pub const REVIEW_ACKNOWLEDGED_EVENT_TYPE: &str = "engine.review_acknowledged";

/// Event payload variants for the Turn Engine context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// A session has started.
    SessionStarted(SessionStarted),
    /// An allocation adjustment was accepted.
    AllocationAdjusted(AllocationAdjusted),
    /// The allocation stage completed.
    AllocationCommitted(AllocationCommitted),
    /// The first turn's content was installed.
    FirstTurnInstalled(FirstTurnInstalled),
    /// An option was placed into a slot.
    OptionAssigned(OptionAssigned),
    /// A slot's selection was removed.
    OptionCleared(OptionCleared),
    /// A turn resolved and was applied immediately.
    TurnResolved(TurnResolved),
    /// A turn resolved and is held for acknowledgement.
    TurnStaged(TurnStaged),
    /// A staged turn was acknowledged and applied.
    ReviewAcknowledged(ReviewAcknowledged),
}

/// Domain event envelope for the Turn Engine context.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SessionEventKind,
}

impl DomainEvent for SessionEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            SessionEventKind::SessionStarted(_) => SESSION_STARTED_EVENT_TYPE,
            SessionEventKind::AllocationAdjusted(_) => ALLOCATION_ADJUSTED_EVENT_TYPE,
            SessionEventKind::AllocationCommitted(_) => ALLOCATION_COMMITTED_EVENT_TYPE,
            SessionEventKind::FirstTurnInstalled(_) => FIRST_TURN_INSTALLED_EVENT_TYPE,
            SessionEventKind::OptionAssigned(_) => OPTION_ASSIGNED_EVENT_TYPE,
            SessionEventKind::OptionCleared(_) => OPTION_CLEARED_EVENT_TYPE,
            SessionEventKind::TurnResolved(_) => TURN_RESOLVED_EVENT_TYPE,
            SessionEventKind::TurnStaged(_) => TURN_STAGED_EVENT_TYPE,
            SessionEventKind::ReviewAcknowledged(_) => REVIEW_ACKNOWLEDGED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("SessionEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
