use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use slack_router_core::{
    events::message::MessageEvent, handler::handler_fn, signature::compute_signature,
    RouterOptions,
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const SECRET: &str = "test-signing-secret";

fn unsigned_state() -> AppState {
    let mut config = ServiceConfig::default();
    config.slack.insecure_skip_verification = true;
    let options = config.router_options();

    AppState::new(
        config,
        EventRouter::new(options.clone()).unwrap(),
        InteractionRouter::new(options).unwrap(),
    )
}

fn signed_state() -> AppState {
    let mut config = ServiceConfig::default();
    config.slack.signing_secret = Some(SECRET.to_string());
    let options = config.router_options();

    AppState::new(
        config,
        EventRouter::new(options.clone()).unwrap(),
        InteractionRouter::new(options).unwrap(),
    )
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check_reports_healthy() {
    let app = create_router(unsigned_state());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_url_verification_through_events_endpoint() {
    let app = create_router(unsigned_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/events")
                .body(Body::from(r#"{"type":"url_verification","challenge":"X"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_string(response).await, r#"{"challenge":"X"}"#);
}

#[tokio::test]
async fn test_events_endpoint_rejects_unsigned_request_when_signed() {
    let app = create_router(signed_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/events")
                .body(Body::from(r#"{"type":"url_verification","challenge":"X"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signed_event_reaches_handler_with_correlation_id() {
    // Arrange
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut config = ServiceConfig::default();
    config.slack.signing_secret = Some(SECRET.to_string());
    let options = config.router_options();
    let mut event_router = EventRouter::new(options.clone()).unwrap();
    let recorder = seen.clone();
    event_router.on_message(
        handler_fn(move |ctx: RequestContext, message: MessageEvent| {
            let recorder = recorder.clone();
            async move {
                recorder
                    .lock()
                    .unwrap()
                    .push((ctx.correlation_id.to_string(), message.text));
                Ok(())
            }
        }),
        [],
    );
    let app = create_router(AppState::new(
        config,
        event_router,
        InteractionRouter::new(options).unwrap(),
    ));

    let body = r#"{"type":"event_callback","event":{"type":"message","text":"hello"}}"#;
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = compute_signature(SECRET.as_bytes(), &timestamp, body.as_bytes()).unwrap();

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/events")
                .header("X-Slack-Request-Timestamp", &timestamp)
                .header("X-Slack-Signature", &signature)
                .header(CORRELATION_ID_HEADER, "corr-123")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "corr-123"
    );
    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        &[("corr-123".to_string(), "hello".to_string())]
    );
}

#[tokio::test]
async fn test_correlation_id_is_generated_when_absent() {
    let app = create_router(unsigned_state());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let correlation_id = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(uuid_like(correlation_id));
}

fn uuid_like(value: &str) -> bool {
    value.len() == 36 && value.chars().filter(|c| *c == '-').count() == 4
}

#[tokio::test]
async fn test_interactions_endpoint_requires_form_content_type() {
    let app = create_router(unsigned_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/interactions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"type":"shortcut"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_interactions_endpoint_accepts_form_payload() {
    let app = create_router(unsigned_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/interactions")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "payload=%7B%22type%22%3A%22shortcut%22%2C%22callback_id%22%3A%22x%22%7D",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_on_events_endpoint_is_method_not_allowed() {
    let app = create_router(signed_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/slack/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_custom_paths_are_mounted() {
    let mut state = unsigned_state();
    state.config.slack.events_path = "/hooks/events".to_string();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/hooks/events")
                .body(Body::from(r#"{"type":"url_verification","challenge":"c"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_start_server_rejects_invalid_configuration() {
    let options = RouterOptions::new().insecure_skip_verification();
    let mut config = ServiceConfig::default();
    config.slack.insecure_skip_verification = true;
    config.server.max_body_size = 0;

    let result = start_server(
        config,
        EventRouter::new(options.clone()).unwrap(),
        InteractionRouter::new(options).unwrap(),
    )
    .await;

    assert!(matches!(result, Err(ServiceError::Configuration(_))));
}

#[tokio::test]
async fn test_oversized_body_without_verification_has_empty_body() {
    let mut state = unsigned_state();
    state.config.server.max_body_size = 16;
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/events")
                .body(Body::from(
                    r#"{"type":"url_verification","challenge":"well-past-the-limit"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn test_oversized_body_without_verification_is_explained_when_verbose() {
    let mut state = unsigned_state();
    state.config.server.max_body_size = 16;
    let options = RouterOptions::new()
        .insecure_skip_verification()
        .verbose_response();
    state.event_router = Arc::new(EventRouter::new(options).unwrap());
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/events")
                .body(Body::from(
                    r#"{"type":"url_verification","challenge":"well-past-the-limit"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!body_string(response).await.is_empty());
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_serve_until_stops_when_idle() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let app = create_router(unsigned_state());

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        serve_until(listener, app, async {}, std::time::Duration::from_secs(30)),
    )
    .await
    .expect("server did not stop");

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_serve_until_drops_requests_still_running_after_drain_timeout() {
    use tokio::io::AsyncWriteExt;

    // Arrange: a route that never completes, with a request in flight
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
    let started_tx = Arc::new(Mutex::new(Some(started_tx)));
    let app = Router::new().route(
        "/stuck",
        get(move || {
            let started_tx = started_tx.clone();
            async move {
                let sender = started_tx.lock().unwrap().take();
                if let Some(sender) = sender {
                    let _ = sender.send(());
                }
                std::future::pending::<()>().await;
            }
        }),
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(
        listener,
        app,
        async move {
            let _ = stop_rx.await;
        },
        std::time::Duration::from_millis(200),
    ));

    let mut client = tokio::net::TcpStream::connect(address).await.unwrap();
    client
        .write_all(b"GET /stuck HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    started_rx.await.unwrap();

    // Act
    stop_tx.send(()).unwrap();

    // Assert
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("shutdown was not bounded by the drain timeout")
        .unwrap();
    assert!(result.is_ok());
    drop(client);
}
