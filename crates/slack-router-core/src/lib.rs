//! # Slack Router Core
//!
//! Transport-agnostic core of the Slack webhook dispatcher.
//!
//! This crate authenticates Slack requests with the `v0` signing scheme and routes
//! Events API envelopes and interaction callbacks to registered handlers.
//!
//! ## Architecture
//!
//! - [`signature`] verifies the timestamp-bound HMAC signature of a request
//! - [`handler`] defines handlers, predicates and the predicate chain that gates them
//! - [`EventRouter`] dispatches Events API envelopes by inner event type
//! - [`InteractionRouter`] dispatches form-encoded interaction callbacks by interaction type
//! - [`response`] turns dispatch outcomes and errors into transport-neutral responses
//!
//! No HTTP framework is referenced here. The `slack-router-api` crate adapts the routers
//! to axum.
//!
//! ## Usage
//!
//! ```rust
//! use slack_router_core::{
//!     events::message, handler::handler_fn, EventRouter, RequestContext, RouterOptions,
//! };
//!
//! # tokio_test::block_on(async {
//! let mut router = EventRouter::new(RouterOptions::new().insecure_skip_verification()).unwrap();
//! router.on_message(
//!     handler_fn(|_ctx, msg: message::MessageEvent| async move {
//!         println!("{}", msg.text);
//!         Ok(())
//!     }),
//!     [message::channel("C0123456")],
//! );
//!
//! let body = br#"{"type":"url_verification","challenge":"abc"}"#;
//! let response = router.dispatch(&RequestContext::new(), body).await;
//! assert_eq!(response.status(), 200);
//! # });
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod event_router;
pub mod events;
pub mod handler;
pub mod interaction_router;
pub mod interactions;
pub mod options;
pub mod response;
pub mod signature;

pub use error::{ConfigError, HandlerResult, RouterError, RouterResultExt};
pub use event_router::EventRouter;
pub use interaction_router::InteractionRouter;
pub use options::{RouterOptions, Verification};
pub use response::RouterResponse;

// ============================================================================
// Request Context
// ============================================================================

/// Identifier used to correlate log lines belonging to one inbound request.
///
/// Usually taken from the `x-correlation-id` header of the request; generated
/// as a UUID v4 when the caller did not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new random correlation ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Request-scoped context handed to every handler and predicate.
///
/// The routers never cancel handlers themselves. When the host transport gives up on a
/// request it drops the dispatch future, which drops every handler future beneath it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation identifier of the inbound request
    pub correlation_id: CorrelationId,

    /// Time at which the request was received
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context with a freshly generated correlation ID
    pub fn new() -> Self {
        Self::with_correlation_id(CorrelationId::new())
    }

    /// Create a context for a request that already carries a correlation ID
    pub fn with_correlation_id(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            received_at: Utc::now(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
