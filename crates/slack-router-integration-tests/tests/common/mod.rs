//! Common test utilities for slack-router integration tests
//!
//! This module provides:
//! - A recording handler that journals its invocations
//! - Builders for signed event and interaction requests
//! - Helpers for assembling the application under test

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use slack_router_api::{create_router, AppState, ServiceConfig};
use slack_router_core::{
    handler::Handler, signature::compute_signature, EventRouter, HandlerResult,
    InteractionRouter, RequestContext, RouterOptions,
};
use std::sync::{Arc, Mutex};

pub const SECRET: &str = "e6b19c573432dcc6b075501d51b51bb8";

#[allow(dead_code)]
pub const EVENTS_PATH: &str = "/slack/events";

#[allow(dead_code)]
pub const INTERACTIONS_PATH: &str = "/slack/interactions";

// ============================================================================
// Recording Handler
// ============================================================================

/// Shared, ordered record of handler invocations
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == name).count()
    }

    pub fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    /// Handler named `name` that records each call and returns `outcome()`
    pub fn handler(&self, name: &'static str, outcome: fn() -> HandlerResult) -> Step {
        Step {
            name,
            journal: self.clone(),
            outcome,
        }
    }
}

/// Handler for any payload type that journals its calls
pub struct Step {
    name: &'static str,
    journal: Journal,
    outcome: fn() -> HandlerResult,
}

#[async_trait::async_trait]
impl<T: Sync> Handler<T> for Step {
    async fn handle(&self, _ctx: &RequestContext, _payload: &T) -> HandlerResult {
        self.journal.record(self.name);
        (self.outcome)()
    }
}

// ============================================================================
// Application
// ============================================================================

/// Service configuration verifying signatures with [`SECRET`]
pub fn signed_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.slack.signing_secret = Some(SECRET.to_string());
    config
}

/// Service configuration accepting unsigned requests
#[allow(dead_code)]
pub fn unsigned_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.slack.insecure_skip_verification = true;
    config
}

/// Routers with no handlers registered, built from `config`
pub fn routers(config: &ServiceConfig) -> (EventRouter, InteractionRouter) {
    let options: RouterOptions = config.router_options();
    (
        EventRouter::new(options.clone()).unwrap(),
        InteractionRouter::new(options).unwrap(),
    )
}

/// Assemble the axum application
pub fn app(
    config: ServiceConfig,
    event_router: EventRouter,
    interaction_router: InteractionRouter,
) -> Router {
    create_router(AppState::new(config, event_router, interaction_router))
}

// ============================================================================
// Requests
// ============================================================================

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// POST request signed with `secret` at `timestamp`
pub fn signed_request_with(
    path: &str,
    content_type: &str,
    body: &str,
    secret: &str,
    timestamp: i64,
) -> Request<Body> {
    let timestamp = timestamp.to_string();
    let signature = compute_signature(secret.as_bytes(), &timestamp, body.as_bytes()).unwrap();

    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", content_type)
        .header("X-Slack-Request-Timestamp", timestamp)
        .header("X-Slack-Signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Events API request signed with [`SECRET`] now
#[allow(dead_code)]
pub fn signed_event(body: &str) -> Request<Body> {
    signed_request_with(EVENTS_PATH, "application/json", body, SECRET, now())
}

/// Interaction request carrying `payload`, signed with [`SECRET`] now
#[allow(dead_code)]
pub fn signed_interaction(payload: &serde_json::Value) -> Request<Body> {
    signed_request_with(
        INTERACTIONS_PATH,
        "application/x-www-form-urlencoded",
        &form_body(payload),
        SECRET,
        now(),
    )
}

/// Form-encode `payload` the way Slack does
pub fn form_body(payload: &serde_json::Value) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("payload", &payload.to_string())
        .finish()
}

/// Callback envelope wrapping `event`
#[allow(dead_code)]
pub fn callback_envelope(event: serde_json::Value) -> String {
    serde_json::json!({
        "token": "XXYYZZ",
        "team_id": "TXXXXXXXX",
        "api_app_id": "AXXXXXXXXX",
        "event": event,
        "type": "event_callback",
        "event_id": "Ev08MFMKH6",
        "event_time": 1234567890
    })
    .to_string()
}

/// Read a response body as text
pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
