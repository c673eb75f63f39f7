//! Integration tests for interaction callback dispatch through the HTTP service

mod common;

use axum::http::StatusCode;
use common::*;
use slack_router_core::{
    interactions::{self, InteractionType},
    InteractionRouter, RouterError,
};
use tower::ServiceExt;

fn interaction_router() -> InteractionRouter {
    routers(&signed_config()).1
}

async fn send(
    interactions: InteractionRouter,
    request: axum::http::Request<axum::body::Body>,
) -> StatusCode {
    let config = signed_config();
    let (events, _) = routers(&config);
    app(config, events, interactions)
        .oneshot(request)
        .await
        .unwrap()
        .status()
}

fn block_actions(block_id: &str, action_id: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "block_actions",
        "trigger_id": "12466734323.1395872398",
        "response_url": "https://hooks.slack.com/actions/T0/1/abc",
        "team": {"id": "T0CAG", "domain": "acme-creamery"},
        "user": {"id": "U0CA5", "username": "amy.mcgee", "team_id": "T3MDE"},
        "channel": {"id": "CBR2V3XEX", "name": "review-updates"},
        "actions": [{
            "action_id": action_id,
            "block_id": block_id,
            "type": "button",
            "value": "click_me_123",
            "action_ts": "1548426417.840180"
        }]
    })
}

#[tokio::test]
async fn test_shortcut_reaches_matching_handler() {
    let journal = Journal::new();
    let mut router = interaction_router();
    router.on(
        InteractionType::SHORTCUT,
        journal.handler("create task", || Ok(())),
        [interactions::callback_id("shortcut_create_task")],
    );
    router.on(
        InteractionType::SHORTCUT,
        journal.handler("other shortcut", || Ok(())),
        [],
    );

    let status = send(
        router,
        signed_interaction(&serde_json::json!({
            "type": "shortcut",
            "callback_id": "shortcut_create_task",
            "trigger_id": "944799105734.773906753841.38b5894552bdd4a780554ee59d1f3638"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(journal.entries(), vec!["create task"]);
}

#[tokio::test]
async fn test_block_action_compound_key_selects_handler() {
    let journal = Journal::new();
    let mut router = interaction_router();
    router.on(
        InteractionType::BLOCK_ACTIONS,
        journal.handler("approve", || Ok(())),
        [interactions::block_action("approval", "approve")],
    );
    router.on(
        InteractionType::BLOCK_ACTIONS,
        journal.handler("reject", || Ok(())),
        [interactions::block_action("approval", "reject")],
    );
    router.set_fallback(journal.handler("fallback", || Ok(())));

    send(router, signed_interaction(&block_actions("approval", "reject"))).await;

    assert_eq!(journal.entries(), vec!["reject"]);
}

#[tokio::test]
async fn test_block_action_with_mismatched_block_falls_back() {
    let journal = Journal::new();
    let mut router = interaction_router();
    router.on(
        InteractionType::BLOCK_ACTIONS,
        journal.handler("approve", || Ok(())),
        [interactions::block_action("approval", "approve")],
    );
    router.set_fallback(journal.handler("fallback", || Ok(())));

    let status = send(router, signed_interaction(&block_actions("survey", "approve"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(journal.entries(), vec!["fallback"]);
}

#[tokio::test]
async fn test_channel_predicate_filters_interactions() {
    let journal = Journal::new();
    let mut router = interaction_router();
    router.on(
        InteractionType::BLOCK_ACTIONS,
        journal.handler("elsewhere", || Ok(())),
        [interactions::channel("COTHER")],
    );
    router.on(
        InteractionType::BLOCK_ACTIONS,
        journal.handler("review", || Ok(())),
        [interactions::channel("CBR2V3XEX")],
    );

    send(router, signed_interaction(&block_actions("b", "a"))).await;

    assert_eq!(journal.entries(), vec!["review"]);
}

#[tokio::test]
async fn test_handler_http_error_sets_status() {
    let mut router = interaction_router();
    router.on(
        InteractionType::VIEW_SUBMISSION,
        Journal::new().handler("submit", || {
            Err(RouterError::http(422).with_message("title is required"))
        }),
        [],
    );

    let status = send(
        router,
        signed_interaction(&serde_json::json!({"type": "view_submission"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unclaimed_interaction_is_ok() {
    let status = send(
        interaction_router(),
        signed_interaction(&serde_json::json!({"type": "message_action"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_json_content_type_is_bad_request() {
    let journal = Journal::new();
    let mut router = interaction_router();
    router.set_fallback(journal.handler("fallback", || Ok(())));
    let body = form_body(&serde_json::json!({"type": "shortcut"}));

    let status = send(
        router,
        signed_request_with(INTERACTIONS_PATH, "application/json", &body, SECRET, now()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_missing_payload_is_bad_request() {
    let status = send(
        interaction_router(),
        signed_request_with(
            INTERACTIONS_PATH,
            "application/x-www-form-urlencoded",
            "token=abc&team_id=T1",
            SECRET,
            now(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let status = send(
        interaction_router(),
        signed_request_with(
            INTERACTIONS_PATH,
            "application/x-www-form-urlencoded",
            "payload=%7Bnot-json",
            SECRET,
            now(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
