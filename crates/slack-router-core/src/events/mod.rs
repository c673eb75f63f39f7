//! Events API payload types.
//!
//! Every request to the Events API endpoint carries a JSON [`EventEnvelope`] whose `type`
//! selects how it is handled:
//!
//! - `url_verification`: endpoint ownership handshake, see [`UrlVerificationEvent`]
//! - `event_callback`: an application event, see [`CallbackEvent`]
//! - `app_rate_limited`: delivery was throttled, see [`AppRateLimitedEvent`]
//!
//! Typed shapes for the common inner events, together with their predicates, live in the
//! [`message`], [`app_mention`] and [`reaction`] modules.

use crate::error::{HandlerResult, RouterError};
use crate::handler::Handler;
use crate::RequestContext;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod app_mention;
pub mod message;
pub mod reaction;

/// Outer envelope types.
pub mod envelope_types {
    pub const URL_VERIFICATION: &str = "url_verification";
    pub const EVENT_CALLBACK: &str = "event_callback";
    pub const APP_RATE_LIMITED: &str = "app_rate_limited";
}

/// Inner event types with typed registration helpers.
pub mod event_types {
    pub const MESSAGE: &str = "message";
    pub const APP_MENTION: &str = "app_mention";
    pub const REACTION_ADDED: &str = "reaction_added";
    pub const REACTION_REMOVED: &str = "reaction_removed";
}

// ============================================================================
// Envelope
// ============================================================================

/// The outer JSON document posted to the Events API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub envelope_type: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub team_id: Option<String>,

    #[serde(default)]
    pub api_app_id: Option<String>,

    #[serde(default)]
    pub challenge: Option<String>,

    #[serde(default)]
    pub event: Option<serde_json::Value>,

    #[serde(default)]
    pub event_id: Option<String>,

    #[serde(default)]
    pub event_time: Option<i64>,
}

impl EventEnvelope {
    /// Parse an envelope from a raw request body
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

// ============================================================================
// Callback Events
// ============================================================================

/// An `event_callback` envelope with its inner event.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackEvent {
    pub team_id: Option<String>,
    pub api_app_id: Option<String>,
    pub event_id: Option<String>,
    pub event_time: Option<i64>,
    pub inner_event: InnerEvent,
}

impl CallbackEvent {
    /// Build a callback event from its envelope.
    ///
    /// Fails when the envelope has no `event` object or the event has no `type`.
    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, RouterError> {
        let data = envelope
            .event
            .ok_or_else(|| RouterError::http(400).with_message("event_callback without event"))?;
        let event_type = data
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| RouterError::http(400).with_message("inner event without type"))?
            .to_string();

        Ok(Self {
            team_id: envelope.team_id,
            api_app_id: envelope.api_app_id,
            event_id: envelope.event_id,
            event_time: envelope.event_time,
            inner_event: InnerEvent { event_type, data },
        })
    }
}

/// The application event carried by a [`CallbackEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct InnerEvent {
    /// Value of the inner `type` field, e.g. `message`
    pub event_type: String,

    /// The complete inner event
    pub data: serde_json::Value,
}

impl InnerEvent {
    /// Deserialize the inner event into a typed shape
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// Adapts a handler of a typed inner event to a [`CallbackEvent`] handler.
///
/// An inner event that does not fit the typed shape is answered with 400.
pub(crate) struct TypedEventHandler<T> {
    pub(crate) inner: crate::handler::BoxHandler<T>,
}

#[async_trait]
impl<T> Handler<CallbackEvent> for TypedEventHandler<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &RequestContext, event: &CallbackEvent) -> HandlerResult {
        let typed: T = event.inner_event.decode().map_err(|e| {
            warn!(
                correlation_id = %ctx.correlation_id,
                event_type = %event.inner_event.event_type,
                error = %e,
                "Inner event does not match its declared type"
            );
            RouterError::http(400).with_message(format!(
                "invalid {} event: {}",
                event.inner_event.event_type, e
            ))
        })?;
        self.inner.handle(ctx, &typed).await
    }
}

// ============================================================================
// URL Verification
// ============================================================================

/// The `url_verification` handshake Slack sends when an endpoint is configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlVerificationEvent {
    #[serde(default)]
    pub token: String,
    pub challenge: String,
}

/// Response body that completes the `url_verification` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// Answers `url_verification` handshakes.
#[async_trait]
pub trait UrlVerificationHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        event: &UrlVerificationEvent,
    ) -> Result<ChallengeResponse, RouterError>;
}

/// Echoes the challenge back unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoChallenge;

#[async_trait]
impl UrlVerificationHandler for EchoChallenge {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        event: &UrlVerificationEvent,
    ) -> Result<ChallengeResponse, RouterError> {
        Ok(ChallengeResponse {
            challenge: event.challenge.clone(),
        })
    }
}

// ============================================================================
// App Rate Limited
// ============================================================================

/// Notification that Slack stopped delivering events because the app exceeded
/// its per-minute event quota.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppRateLimitedEvent {
    #[serde(default)]
    pub token: String,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub team_id: String,

    /// Start of the minute, in Unix seconds, in which the app was rate limited
    pub minute_rate_limited: i64,

    #[serde(default)]
    pub api_app_id: String,
}

/// Default `app_rate_limited` handler: logs the notification and acknowledges it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAppRateLimited;

#[async_trait]
impl Handler<AppRateLimitedEvent> for LogAppRateLimited {
    async fn handle(&self, ctx: &RequestContext, event: &AppRateLimitedEvent) -> HandlerResult {
        warn!(
            correlation_id = %ctx.correlation_id,
            team_id = %event.team_id,
            api_app_id = %event.api_app_id,
            minute_rate_limited = event.minute_rate_limited,
            "Slack is rate limiting event delivery for this app"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
