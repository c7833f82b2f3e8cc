//! Routes for the Turn Engine bounded context.
//!
//! This is the HTTP rendition of the game's interface event contract:
//! start a run, distribute the opening budget, drop option words into
//! slots, write the turn into the career, acknowledge the staged result,
//! and restart.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use reroll_engine::application::{command_handlers, query_handlers};
use reroll_engine::application::query_handlers::SessionView;
use reroll_engine::domain::commands;
use reroll_engine::domain::config::SessionConfig;
use reroll_stats::StatName;

use crate::error::ApiError;
use crate::state::AppState;

/// The selectable session presets.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionVariant {
    /// Plain yearly progression.
    #[default]
    Classic,
    /// Semester-subdivided progression.
    Semester,
    /// Action-point-budgeted progression.
    Budgeted,
}

impl SessionVariant {
    fn config(self) -> SessionConfig {
        match self {
            Self::Classic => SessionConfig::classic(),
            Self::Semester => SessionConfig::semester(),
            Self::Budgeted => SessionConfig::budgeted(),
        }
    }
}

/// Request body for POST /.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Which preset to run; defaults to classic.
    #[serde(default)]
    pub variant: SessionVariant,
}

/// Request body for POST /{id}/allocation/adjust.
#[derive(Debug, Deserialize)]
pub struct AdjustAllocationRequest {
    /// The stat to adjust.
    pub stat: StatName,
    /// The delta to apply.
    pub delta: i64,
}

/// Request body for POST /{id}/assignments.
#[derive(Debug, Deserialize)]
pub struct AssignOptionRequest {
    /// The target slot.
    pub slot: u32,
    /// The option to place.
    pub option_id: String,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Response body for session creation and restart.
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    /// The new session's identifier.
    pub session_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// POST /
#[instrument(skip(state, request))]
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionCreatedResponse>, ApiError> {
    start_session(&state, request.variant.config()).await
}

async fn start_session(
    state: &AppState,
    config: SessionConfig,
) -> Result<Json<SessionCreatedResponse>, ApiError> {
    let command = commands::StartSession {
        correlation_id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
        config,
    };

    info!(correlation_id = %command.correlation_id, session_id = %command.session_id,
        "handling start_session command");

    let stored_events = command_handlers::handle_start_session(
        &command,
        state.clock.as_ref(),
        state.generator.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(SessionCreatedResponse {
        session_id: command.session_id,
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_by_id(session_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// POST /{id}/allocation/adjust
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn adjust_allocation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AdjustAllocationRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AdjustAllocation {
        correlation_id: Uuid::new_v4(),
        session_id,
        stat: request.stat,
        delta: request.delta,
    };

    info!(correlation_id = %command.correlation_id, "handling adjust_allocation command");

    let stored_events = command_handlers::handle_adjust_allocation(
        &command,
        state.clock.as_ref(),
        &state.gate,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /{id}/allocation/commit
#[instrument(skip(state))]
async fn commit_allocation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CommitAllocation {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling commit_allocation command");

    let stored_events = command_handlers::handle_commit_allocation(
        &command,
        state.clock.as_ref(),
        state.generator.as_ref(),
        &state.gate,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /{id}/assignments
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn assign_option(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AssignOptionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AssignOption {
        correlation_id: Uuid::new_v4(),
        session_id,
        slot: request.slot,
        option_id: request.option_id,
    };

    info!(correlation_id = %command.correlation_id, "handling assign_option command");

    let stored_events = command_handlers::handle_assign_option(
        &command,
        state.clock.as_ref(),
        &state.gate,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// DELETE /{id}/assignments/{slot}
#[instrument(skip(state))]
async fn clear_option(
    State(state): State<AppState>,
    Path((session_id, slot)): Path<(Uuid, u32)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ClearOption {
        correlation_id: Uuid::new_v4(),
        session_id,
        slot,
    };

    info!(correlation_id = %command.correlation_id, "handling clear_option command");

    let stored_events = command_handlers::handle_clear_option(
        &command,
        state.clock.as_ref(),
        &state.gate,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /{id}/advance
#[instrument(skip(state))]
async fn advance_turn(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AdvanceTurn {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling advance_turn command");

    let stored_events = command_handlers::handle_advance_turn(
        &command,
        state.clock.as_ref(),
        &*state.rng,
        state.generator.as_ref(),
        &state.gate,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /{id}/acknowledge
#[instrument(skip(state))]
async fn acknowledge_review(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AcknowledgeReview {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling acknowledge_review command");

    let stored_events = command_handlers::handle_acknowledge_review(
        &command,
        state.clock.as_ref(),
        &state.gate,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /{id}/restart
///
/// Starts a fresh run with the old session's configuration. The old
/// session is left as-is; only a new run exits the `Over` phase.
#[instrument(skip(state))]
async fn restart_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionCreatedResponse>, ApiError> {
    let config =
        query_handlers::get_session_config(session_id, &*state.event_repository).await?;
    start_session(&state, config).await
}

/// Returns the router for the session context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session))
        .route("/{id}/allocation/adjust", post(adjust_allocation))
        .route("/{id}/allocation/commit", post(commit_allocation))
        .route("/{id}/assignments", post(assign_option))
        .route("/{id}/assignments/{slot}", delete(clear_option))
        .route("/{id}/advance", post(advance_turn))
        .route("/{id}/acknowledge", post(acknowledge_review))
        .route("/{id}/restart", post(restart_session))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use reroll_core::clock::Clock;
    use reroll_core::rng::DeterministicRng;
    use reroll_event_store::MemoryEventRepository;
    use reroll_generation::TurnGenerator;
    use reroll_stats::StatName;
    use reroll_test_support::{
        FailingGenerator, FixedClock, MockRng, ScriptedGenerator, turn_content, turn_option,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(generator: Arc<dyn TurnGenerator>) -> AppState {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(Utc::now()));
        let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
        AppState::new(clock, rng, Arc::new(MemoryEventRepository::new()), generator)
    }

    fn scripted_state() -> AppState {
        app_state_with(Arc::new(ScriptedGenerator::with_contents(vec![
            turn_content(
                "你在__1__遇到了__2__",
                vec![
                    turn_option("a", 1, "操场", 0, &[(StatName::Stamina, 2)]),
                    turn_option("b", 2, "班主任", 0, &[]),
                ],
                "一次偶遇",
            ),
        ])))
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => {
                builder = builder.header("content-type", "application/json");
                builder.body(Body::from("{}")).unwrap()
            }
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_create_session_returns_id_and_events() {
        let app = router().with_state(scripted_state());

        let (status, json) = send(app, "POST", "/", Some(serde_json::json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        Uuid::parse_str(json["session_id"].as_str().unwrap()).unwrap();
        assert_eq!(json["event_ids"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_and_get_session_view() {
        let state = scripted_state();
        let app = router().with_state(state.clone());
        let (_, created) = send(app, "POST", "/", Some(serde_json::json!({}))).await;
        let session_id = created["session_id"].as_str().unwrap().to_owned();

        let app = router().with_state(state);
        let (status, view) = send(app, "GET", &format!("/{session_id}"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"], "awaiting_selection");
        assert_eq!(view["age"], 6);
        assert_eq!(view["required_slots"], serde_json::json!([1, 2]));
        assert_eq!(view["stats"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_create_with_unknown_variant_is_unprocessable() {
        let app = router().with_state(scripted_state());

        let (status, _) = send(
            app,
            "POST",
            "/",
            Some(serde_json::json!({ "variant": "speedrun" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_returns_502_when_generator_fails() {
        let app = router().with_state(app_state_with(Arc::new(FailingGenerator)));

        let (status, json) = send(app, "POST", "/", Some(serde_json::json!({}))).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "generation_error");
    }

    #[tokio::test]
    async fn test_unknown_session_returns_404() {
        let app = router().with_state(scripted_state());
        let missing = Uuid::new_v4();

        let (status, json) = send(
            app,
            "POST",
            &format!("/{missing}/advance"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "session_not_found");
    }

    #[tokio::test]
    async fn test_assign_rejects_mismatched_slot() {
        let state = scripted_state();
        let app = router().with_state(state.clone());
        let (_, created) = send(app, "POST", "/", Some(serde_json::json!({}))).await;
        let session_id = created["session_id"].as_str().unwrap().to_owned();

        let app = router().with_state(state);
        let (status, json) = send(
            app,
            "POST",
            &format!("/{session_id}/assignments"),
            Some(serde_json::json!({ "slot": 2, "option_id": "a" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }
}
