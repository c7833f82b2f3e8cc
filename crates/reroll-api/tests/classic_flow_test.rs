//! End-to-end flow through the classic (non-budgeted) variant.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use reroll_stats::StatName;
use reroll_story::TurnContent;
use reroll_test_support::{ScriptedGenerator, turn_content, turn_option};

fn meeting_turn() -> TurnContent {
    turn_content(
        "你在__1__遇到了__2__",
        vec![
            turn_option("a", 1, "操场", 0, &[(StatName::Stamina, 2)]),
            turn_option("b", 2, "班主任", 0, &[(StatName::Intelligence, 1)]),
        ],
        "一次偶遇",
    )
}

fn homework_turn() -> TurnContent {
    turn_content(
        "你决定__1__",
        vec![
            turn_option("x", 1, "认真写作业", 0, &[(StatName::Intelligence, 2)]),
            turn_option("y", 1, "抄同桌的", 0, &[(StatName::Happiness, 1)]),
        ],
        "作业风波",
    )
}

fn terminal_turn() -> TurnContent {
    TurnContent {
        story_template: String::new(),
        options: vec![],
        next_story_snippet: String::new(),
        is_game_over: true,
        game_over_summary: Some("高考结束，尘埃落定。".to_owned()),
    }
}

#[tokio::test]
async fn test_classic_session_full_cycle() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok(meeting_turn()),
        Ok(homework_turn()),
        Err("connection reset".to_owned()),
        Ok(terminal_turn()),
    ]));
    let app = common::build_test_app(generator);
    let base = "/api/v1/sessions";

    // Start a run.
    let (status, created) = common::post_json(
        app.clone(),
        base,
        &serde_json::json!({ "variant": "classic" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["session_id"].as_str().unwrap().to_owned();

    // The opening view: age 6, period 1, two empty slots.
    let (status, view) = common::get_json(app.clone(), &format!("{base}/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "awaiting_selection");
    assert_eq!(view["age"], 6);
    assert_eq!(view["period"], 1);
    assert_eq!(view["semester"], serde_json::Value::Null);
    assert_eq!(view["required_slots"], serde_json::json!([1, 2]));
    assert_eq!(view["assignment_complete"], false);

    // Advancing before the slots are filled is rejected locally.
    let (status, body) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/advance"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Fill both slots.
    for (slot, option_id) in [(1, "a"), (2, "b")] {
        let (status, _) = common::post_json(
            app.clone(),
            &format!("{base}/{id}/assignments"),
            &serde_json::json!({ "slot": slot, "option_id": option_id }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, view) = common::get_json(app.clone(), &format!("{base}/{id}")).await;
    assert_eq!(view["phase"], "ready_to_advance");
    assert_eq!(view["assignment_complete"], true);

    // Write the turn into the career.
    let (status, _) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/advance"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, view) = common::get_json(app.clone(), &format!("{base}/{id}")).await;
    assert_eq!(view["phase"], "awaiting_selection");
    assert_eq!(view["period"], 2);
    assert_eq!(view["history_len"], 1);
    let stamina = view["stats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "stamina")
        .unwrap()["value"]
        .clone();
    assert_eq!(stamina, 12);

    // A failed generation call rolls back cleanly.
    let (status, _) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/assignments"),
        &serde_json::json!({ "slot": 1, "option_id": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/advance"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "generation_error");

    let (_, view) = common::get_json(app.clone(), &format!("{base}/{id}")).await;
    assert_eq!(view["period"], 2);
    assert_eq!(view["history_len"], 1);
    // The assignment survived the failed call; re-invoking succeeds and
    // this time the career reaches its end.
    assert_eq!(view["phase"], "ready_to_advance");

    let (status, _) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/advance"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, view) = common::get_json(app.clone(), &format!("{base}/{id}")).await;
    assert_eq!(view["phase"], "over");
    assert_eq!(view["summary"], "高考结束，尘埃落定。");
    assert_eq!(view["story"], serde_json::Value::Null);
    assert_eq!(view["history_len"], 2);

    // Terminal is terminal.
    let (status, _) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/advance"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_restart_opens_a_fresh_run_with_same_config() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok(meeting_turn()),
        Ok(meeting_turn()),
    ]));
    let app = common::build_test_app(generator);
    let base = "/api/v1/sessions";

    let (_, created) = common::post_json(
        app.clone(),
        base,
        &serde_json::json!({ "variant": "classic" }),
    )
    .await;
    let id = created["session_id"].as_str().unwrap().to_owned();

    let (status, restarted) = common::post_json(
        app.clone(),
        &format!("{base}/{id}/restart"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_id = restarted["session_id"].as_str().unwrap().to_owned();
    assert_ne!(new_id, id);

    // Both sessions exist independently; the fresh one is back at the
    // opening position.
    let (_, view) = common::get_json(app.clone(), &format!("{base}/{new_id}")).await;
    assert_eq!(view["age"], 6);
    assert_eq!(view["period"], 1);
    assert_eq!(view["history_len"], 0);

    let (status, _) = common::get_json(app, &format!("{base}/{id}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_semester_variant_tracks_semesters() {
    let generator = Arc::new(ScriptedGenerator::with_contents(vec![meeting_turn()]));
    let app = common::build_test_app(generator);
    let base = "/api/v1/sessions";

    let (_, created) = common::post_json(
        app.clone(),
        base,
        &serde_json::json!({ "variant": "semester" }),
    )
    .await;
    let id = created["session_id"].as_str().unwrap();

    let (_, view) = common::get_json(app.clone(), &format!("{base}/{id}")).await;
    assert_eq!(view["semester"], "autumn");
}
