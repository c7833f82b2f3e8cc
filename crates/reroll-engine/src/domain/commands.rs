//! Commands for the Turn Engine context.

use reroll_core::command::Command;
use reroll_stats::StatName;
use uuid::Uuid;

use super::config::SessionConfig;

/// Command to start a new session.
#[derive(Debug, Clone)]
pub struct StartSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The configuration fixed for this run.
    pub config: SessionConfig,
}

impl Command for StartSession {
    fn command_type(&self) -> &'static str {
        "engine.start_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to adjust one stat during the allocation stage.
#[derive(Debug, Clone)]
pub struct AdjustAllocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The stat to adjust.
    pub stat: StatName,
    /// The delta to apply.
    pub delta: i64,
}

impl Command for AdjustAllocation {
    fn command_type(&self) -> &'static str {
        "engine.adjust_allocation"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to finish the allocation stage and generate the first turn.
#[derive(Debug, Clone)]
pub struct CommitAllocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for CommitAllocation {
    fn command_type(&self) -> &'static str {
        "engine.commit_allocation"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to place an option into a slot.
#[derive(Debug, Clone)]
pub struct AssignOption {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The target slot.
    pub slot: u32,
    /// The option to place, by id within the current turn.
    pub option_id: String,
}

impl Command for AssignOption {
    fn command_type(&self) -> &'static str {
        "engine.assign_option"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to clear a slot's selection.
#[derive(Debug, Clone)]
pub struct ClearOption {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The slot to clear.
    pub slot: u32,
}

impl Command for ClearOption {
    fn command_type(&self) -> &'static str {
        "engine.clear_option"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to resolve the current turn and fetch the next one.
#[derive(Debug, Clone)]
pub struct AdvanceTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for AdvanceTurn {
    fn command_type(&self) -> &'static str {
        "engine.advance_turn"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to acknowledge a staged turn.
#[derive(Debug, Clone)]
pub struct AcknowledgeReview {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for AcknowledgeReview {
    fn command_type(&self) -> &'static str {
        "engine.acknowledge_review"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
