//! Dispatcher for Events API requests.
//!
//! ## Dispatch
//!
//! The envelope `type` selects the branch:
//!
//! - `url_verification`: the URL verification handler answers with a JSON
//!   [`ChallengeResponse`]
//! - `event_callback`: handlers registered for the inner event type run in registration
//!   order until one returns something other than [`RouterError::NotInterested`]. If all
//!   of them decline, or none are registered, the fallback handler runs. A final
//!   `NotInterested` is answered with an empty 200.
//! - `app_rate_limited`: the rate limit handler runs and success is acknowledged with a
//!   plain text `OK`
//! - anything else is answered with 400
//!
//! Errors other than `NotInterested` stop dispatch and are translated by
//! [`RouterResponse::from_error`].
//!
//! ## Registration
//!
//! Handlers are registered through `&mut self`. Once the router is shared (typically in
//! an `Arc`) for serving, registration is no longer possible.

use crate::error::{is_not_interested, ConfigError, HandlerResult, RouterError};
use crate::events::app_mention::AppMentionEvent;
use crate::events::message::MessageEvent;
use crate::events::reaction::ReactionEvent;
use crate::events::{
    envelope_types, event_types, AppRateLimitedEvent, CallbackEvent, ChallengeResponse,
    EchoChallenge, EventEnvelope, LogAppRateLimited, TypedEventHandler, UrlVerificationEvent,
    UrlVerificationHandler,
};
use crate::handler::{chain, BoxHandler, BoxPredicate, Handler};
use crate::options::{RouterOptions, Verification};
use crate::response::RouterResponse;
use crate::RequestContext;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Routes Events API requests to registered handlers.
pub struct EventRouter {
    verification: Verification,
    verbose_response: bool,
    callback_handlers: HashMap<String, Vec<BoxHandler<CallbackEvent>>>,
    url_verification_handler: Arc<dyn UrlVerificationHandler>,
    app_rate_limited_handler: BoxHandler<AppRateLimitedEvent>,
    fallback_handler: Option<BoxHandler<CallbackEvent>>,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<(&str, usize)> = self
            .callback_handlers
            .iter()
            .map(|(event_type, handlers)| (event_type.as_str(), handlers.len()))
            .collect();
        registered.sort_unstable();

        f.debug_struct("EventRouter")
            .field("verification", &self.verification)
            .field("verbose_response", &self.verbose_response)
            .field("callback_handlers", &registered)
            .field("has_fallback", &self.fallback_handler.is_some())
            .finish_non_exhaustive()
    }
}

impl EventRouter {
    /// Create a router with the default URL verification and rate limit handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] unless exactly one of a signing secret and
    /// `insecure_skip_verification` is configured.
    pub fn new(options: RouterOptions) -> Result<Self, ConfigError> {
        let (verification, verbose_response) = options.build()?;
        Ok(Self {
            verification,
            verbose_response,
            callback_handlers: HashMap::new(),
            url_verification_handler: Arc::new(EchoChallenge),
            app_rate_limited_handler: Arc::new(LogAppRateLimited),
            fallback_handler: None,
        })
    }

    /// How requests to this router are authenticated
    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    /// Whether error messages are included in response bodies
    pub fn verbose_response(&self) -> bool {
        self.verbose_response
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a handler for callback events whose inner event has type `event_type`.
    ///
    /// Handlers for the same type are tried in registration order.
    pub fn on(
        &mut self,
        event_type: impl Into<String>,
        handler: impl Handler<CallbackEvent> + 'static,
    ) {
        self.register(event_type.into(), Arc::new(handler));
    }

    /// Register a handler that receives the inner event decoded as `T`.
    ///
    /// The handler runs only if every predicate matches. An inner event that cannot be
    /// decoded as `T` is answered with 400.
    pub fn on_typed<T, H, P>(&mut self, event_type: impl Into<String>, handler: H, predicates: P)
    where
        T: DeserializeOwned + Send + Sync + 'static,
        H: Handler<T> + 'static,
        P: IntoIterator<Item = BoxPredicate<T>>,
    {
        let inner = chain(Arc::new(handler) as BoxHandler<T>, predicates);
        self.register(event_type.into(), Arc::new(TypedEventHandler { inner }));
    }

    /// Register a handler for `message` events
    pub fn on_message<H, P>(&mut self, handler: H, predicates: P)
    where
        H: Handler<MessageEvent> + 'static,
        P: IntoIterator<Item = BoxPredicate<MessageEvent>>,
    {
        self.on_typed(event_types::MESSAGE, handler, predicates);
    }

    /// Register a handler for `app_mention` events
    pub fn on_app_mention<H, P>(&mut self, handler: H, predicates: P)
    where
        H: Handler<AppMentionEvent> + 'static,
        P: IntoIterator<Item = BoxPredicate<AppMentionEvent>>,
    {
        self.on_typed(event_types::APP_MENTION, handler, predicates);
    }

    /// Register a handler for `reaction_added` events
    pub fn on_reaction_added<H, P>(&mut self, handler: H, predicates: P)
    where
        H: Handler<ReactionEvent> + 'static,
        P: IntoIterator<Item = BoxPredicate<ReactionEvent>>,
    {
        self.on_typed(event_types::REACTION_ADDED, handler, predicates);
    }

    /// Register a handler for `reaction_removed` events
    pub fn on_reaction_removed<H, P>(&mut self, handler: H, predicates: P)
    where
        H: Handler<ReactionEvent> + 'static,
        P: IntoIterator<Item = BoxPredicate<ReactionEvent>>,
    {
        self.on_typed(event_types::REACTION_REMOVED, handler, predicates);
    }

    /// Replace the `url_verification` handler. The default echoes the challenge.
    pub fn set_url_verification_handler(
        &mut self,
        handler: impl UrlVerificationHandler + 'static,
    ) {
        self.url_verification_handler = Arc::new(handler);
    }

    /// Replace the `app_rate_limited` handler. The default logs a warning.
    pub fn set_app_rate_limited_handler(
        &mut self,
        handler: impl Handler<AppRateLimitedEvent> + 'static,
    ) {
        self.app_rate_limited_handler = Arc::new(handler);
    }

    /// Set the handler for callback events no registered handler claimed
    pub fn set_fallback(&mut self, handler: impl Handler<CallbackEvent> + 'static) {
        self.fallback_handler = Some(Arc::new(handler));
    }

    fn register(&mut self, event_type: String, handler: BoxHandler<CallbackEvent>) {
        debug!(event_type = %event_type, "Registering event handler");
        self.callback_handlers
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Dispatch an already authenticated request body.
    ///
    /// Always produces exactly one response.
    #[instrument(skip(self, ctx, body), fields(correlation_id = %ctx.correlation_id))]
    pub async fn dispatch(&self, ctx: &RequestContext, body: &[u8]) -> RouterResponse {
        let envelope = match EventEnvelope::parse(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return self.respond_with_error(
                    &RouterError::http(400).with_message(format!("invalid event envelope: {}", e)),
                );
            }
        };

        debug!(envelope_type = %envelope.envelope_type, "Dispatching event envelope");
        match envelope.envelope_type.as_str() {
            envelope_types::URL_VERIFICATION => self.handle_url_verification(ctx, envelope).await,
            envelope_types::EVENT_CALLBACK => self.handle_callback_event(ctx, envelope).await,
            envelope_types::APP_RATE_LIMITED => self.handle_app_rate_limited(ctx, body).await,
            other => self.respond_with_error(
                &RouterError::http(400).with_message(format!("unknown event type: {}", other)),
            ),
        }
    }

    async fn handle_url_verification(
        &self,
        ctx: &RequestContext,
        envelope: EventEnvelope,
    ) -> RouterResponse {
        let Some(challenge) = envelope.challenge else {
            return self.respond_with_error(
                &RouterError::http(400).with_message("url_verification without challenge"),
            );
        };
        let event = UrlVerificationEvent {
            token: envelope.token.unwrap_or_default(),
            challenge,
        };

        info!("Answering url_verification handshake");
        let result = self
            .url_verification_handler
            .handle(ctx, &event)
            .await
            .and_then(|response: ChallengeResponse| RouterResponse::json(&response));
        match result {
            Ok(response) => response,
            Err(e) => self.respond_with_error(&e),
        }
    }

    async fn handle_callback_event(
        &self,
        ctx: &RequestContext,
        envelope: EventEnvelope,
    ) -> RouterResponse {
        let event = match CallbackEvent::from_envelope(envelope) {
            Ok(event) => event,
            Err(e) => return self.respond_with_error(&e),
        };
        let event_type = event.inner_event.event_type.as_str();

        let mut result: HandlerResult = Err(RouterError::NotInterested);
        if let Some(handlers) = self.callback_handlers.get(event_type) {
            for handler in handlers {
                result = handler.handle(ctx, &event).await;
                if !is_not_interested(&result) {
                    break;
                }
            }
        }

        if is_not_interested(&result) {
            debug!(event_type = %event_type, "No handler claimed event, trying fallback");
            result = self.handle_fallback(ctx, &event).await;
        }

        self.finish(result, RouterResponse::ok)
    }

    async fn handle_app_rate_limited(&self, ctx: &RequestContext, body: &[u8]) -> RouterResponse {
        let event: AppRateLimitedEvent = match serde_json::from_slice(body) {
            Ok(event) => event,
            Err(e) => {
                return self.respond_with_error(&RouterError::http(400).with_message(format!(
                    "failed to parse app_rate_limited event: {}",
                    e
                )));
            }
        };

        let result = self.app_rate_limited_handler.handle(ctx, &event).await;
        self.finish(result, || RouterResponse::text(200, "OK"))
    }

    async fn handle_fallback(&self, ctx: &RequestContext, event: &CallbackEvent) -> HandlerResult {
        match &self.fallback_handler {
            Some(handler) => handler.handle(ctx, event).await,
            None => Err(RouterError::NotInterested),
        }
    }

    fn finish(
        &self,
        result: HandlerResult,
        on_success: impl FnOnce() -> RouterResponse,
    ) -> RouterResponse {
        match result {
            Ok(()) => on_success(),
            Err(e) if e.is_not_interested() => {
                debug!("Event was not claimed by any handler");
                RouterResponse::ok()
            }
            Err(e) => self.respond_with_error(&e),
        }
    }

    fn respond_with_error(&self, err: &RouterError) -> RouterResponse {
        RouterResponse::from_error(err, self.verbose_response)
    }
}

#[cfg(test)]
#[path = "event_router_tests.rs"]
mod tests;
