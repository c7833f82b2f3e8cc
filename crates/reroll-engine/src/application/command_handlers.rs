//! Command handlers for the Turn Engine context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load the session, execute the command, call
//! the generator where the command needs fresh content, and persist the
//! resulting events. A generation failure appends nothing, so the session
//! is exactly as it was before the call.

use std::sync::Mutex;

use reroll_core::aggregate::AggregateRoot;
use reroll_core::clock::Clock;
use reroll_core::error::DomainError;
use reroll_core::event::DomainEvent;
use reroll_core::repository::{EventRepository, StoredEvent};
use reroll_core::rng::DeterministicRng;
use reroll_generation::{GenerationError, TurnGenerator, TurnRequest};
use reroll_stats::StatSet;
use reroll_story::{TurnContent, check_turn_content};
use tracing::warn;
use uuid::Uuid;

use crate::domain::aggregates::GameSession;
use crate::domain::commands::{
    AcknowledgeReview, AdjustAllocation, AdvanceTurn, AssignOption, ClearOption, CommitAllocation,
    StartSession,
};
use crate::domain::config::SessionConfig;
use crate::domain::events::{SessionEvent, SessionEventKind};
use crate::domain::progression::CareerPosition;

use super::resolution_gate::ResolutionGate;

fn to_stored_event(event: &SessionEvent) -> StoredEvent {
    let meta = event.metadata();
    StoredEvent {
        event_id: meta.event_id,
        aggregate_id: meta.aggregate_id,
        event_type: event.event_type().to_owned(),
        payload: event.to_payload(),
        sequence_number: meta.sequence_number,
        correlation_id: meta.correlation_id,
        causation_id: meta.causation_id,
        occurred_at: meta.occurred_at,
    }
}

/// Reconstitutes a `GameSession` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    session_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<GameSession, DomainError> {
    let mut session = GameSession::new(session_id);
    for stored in existing_events {
        let kind: SessionEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = SessionEvent {
            metadata: reroll_core::event::EventMetadata {
                event_id: stored.event_id,
                event_type: stored.event_type.clone(),
                aggregate_id: stored.aggregate_id,
                sequence_number: stored.sequence_number,
                correlation_id: stored.correlation_id,
                causation_id: stored.causation_id,
                occurred_at: stored.occurred_at,
            },
            kind,
        };
        session.apply(&event);
    }
    Ok(session)
}

async fn load_existing(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<GameSession, DomainError> {
    let existing_events = repo.load_events(session_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::SessionNotFound(session_id));
    }
    reconstitute(session_id, &existing_events)
}

async fn persist(
    session: &GameSession,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = session
        .uncommitted_events()
        .iter()
        .map(to_stored_event)
        .collect();

    repo.append_events(session.id, session.version(), &stored_events)
        .await?;

    Ok(stored_events)
}

fn generation_error(error: &GenerationError) -> DomainError {
    DomainError::Generation(error.to_string())
}

fn log_contract_issues(session_id: Uuid, content: &TurnContent, budgeted: bool) {
    for issue in check_turn_content(content, budgeted) {
        warn!(%session_id, %issue, "generator contract violation");
    }
}

fn first_turn_request(config: &SessionConfig, stats: StatSet) -> TurnRequest {
    let position = CareerPosition::initial(config.calendar);
    TurnRequest {
        age: position.age,
        stage: position.stage(),
        semester: position.semester,
        period: position.period,
        stats,
        history: Vec::new(),
        budgeted: config.is_budgeted(),
    }
}

/// Handles the `StartSession` command. Budgeted sessions enter the
/// allocation stage; the plain variants generate their first turn right
/// away.
///
/// # Errors
///
/// Returns `DomainError` if the session already exists, the generation
/// call fails, or appending fails.
pub async fn handle_start_session(
    command: &StartSession,
    clock: &dyn Clock,
    generator: &dyn TurnGenerator,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let existing_events = repo.load_events(command.session_id).await?;
    let mut session = reconstitute(command.session_id, &existing_events)?;

    if command.config.is_budgeted() {
        session.begin_allocation(command.config, command.correlation_id, clock)?;
    } else {
        let stats =
            StatSet::with_baseline(command.config.profile, command.config.default_baseline);
        let request = first_turn_request(&command.config, stats);
        let content = generator
            .generate_turn(&request)
            .await
            .map_err(|e| generation_error(&e))?;
        log_contract_issues(command.session_id, &content, false);
        session.begin_with_first_turn(command.config, content, command.correlation_id, clock)?;
    }

    persist(&session, repo).await
}

/// Handles the `AdjustAllocation` command.
///
/// # Errors
///
/// Returns `DomainError` if the session is unknown, resolving, not in the
/// allocation stage, or the adjustment violates the budget invariants.
pub async fn handle_adjust_allocation(
    command: &AdjustAllocation,
    clock: &dyn Clock,
    gate: &ResolutionGate,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    gate.ensure_idle(command.session_id)?;
    let mut session = load_existing(command.session_id, repo).await?;

    session.adjust_allocation(command.stat, command.delta, command.correlation_id, clock)?;

    persist(&session, repo).await
}

/// Handles the `CommitAllocation` command: validates the budget, asks the
/// generator for the first turn, and installs it.
///
/// # Errors
///
/// Returns `DomainError` if the session is unknown or resolving, the
/// budget is not exactly spent, the generation call fails, or appending
/// fails. A generation failure leaves the session in the allocation
/// stage, untouched.
pub async fn handle_commit_allocation(
    command: &CommitAllocation,
    clock: &dyn Clock,
    generator: &dyn TurnGenerator,
    gate: &ResolutionGate,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut session = load_existing(command.session_id, repo).await?;
    let _guard = gate.begin(command.session_id)?;

    let stats = session.committed_stats()?;
    let config = session
        .config()
        .copied()
        .ok_or_else(|| DomainError::Validation("session has no configuration".to_owned()))?;
    let request = first_turn_request(&config, stats);

    let content = generator
        .generate_turn(&request)
        .await
        .map_err(|e| generation_error(&e))?;
    log_contract_issues(command.session_id, &content, true);

    session.commit_allocation(content, command.correlation_id, clock)?;

    persist(&session, repo).await
}

/// Handles the `AssignOption` command.
///
/// # Errors
///
/// Returns `DomainError` if the session is unknown or resolving, or the
/// placement violates the slot rules.
pub async fn handle_assign_option(
    command: &AssignOption,
    clock: &dyn Clock,
    gate: &ResolutionGate,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    gate.ensure_idle(command.session_id)?;
    let mut session = load_existing(command.session_id, repo).await?;

    session.assign_option(command.slot, &command.option_id, command.correlation_id, clock)?;

    persist(&session, repo).await
}

/// Handles the `ClearOption` command.
///
/// # Errors
///
/// Returns `DomainError` if the session is unknown or resolving, or the
/// slot has no selection.
pub async fn handle_clear_option(
    command: &ClearOption,
    clock: &dyn Clock,
    gate: &ResolutionGate,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    gate.ensure_idle(command.session_id)?;
    let mut session = load_existing(command.session_id, repo).await?;

    session.clear_option(command.slot, command.correlation_id, clock)?;

    persist(&session, repo).await
}

/// Handles the `AdvanceTurn` command: validates the assignment and pool,
/// computes the transition, asks the generator for the next turn, and
/// records the outcome (immediately applied, or staged for review in the
/// budgeted variant).
///
/// The RNG `Mutex` is locked only around the synchronous preparation step
/// to avoid holding a `MutexGuard` across await points.
///
/// # Errors
///
/// Returns `DomainError` if the session is unknown, a resolution is
/// already in flight, validation fails, the generation call fails, or
/// appending fails. On generation failure nothing is appended: the
/// session state is exactly as it was before the call.
pub async fn handle_advance_turn(
    command: &AdvanceTurn,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    generator: &dyn TurnGenerator,
    gate: &ResolutionGate,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut session = load_existing(command.session_id, repo).await?;
    let _guard = gate.begin(command.session_id)?;

    // Lock the RNG only for the synchronous preparation — never across an
    // await.
    let prepared = {
        let mut rng_guard = rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
        session.prepare_advance(&mut *rng_guard)?
    };

    let budgeted = prepared.request.budgeted;
    let content = generator
        .generate_turn(&prepared.request)
        .await
        .map_err(|e| generation_error(&e))?;
    log_contract_issues(command.session_id, &content, budgeted);

    session.complete_advance(prepared, content, command.correlation_id, clock)?;

    persist(&session, repo).await
}

/// Handles the `AcknowledgeReview` command.
///
/// # Errors
///
/// Returns `DomainError` if the session is unknown or resolving, or no
/// turn is staged.
pub async fn handle_acknowledge_review(
    command: &AcknowledgeReview,
    clock: &dyn Clock,
    gate: &ResolutionGate,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    gate.ensure_idle(command.session_id)?;
    let mut session = load_existing(command.session_id, repo).await?;

    session.acknowledge_review(command.correlation_id, clock)?;

    persist(&session, repo).await
}
