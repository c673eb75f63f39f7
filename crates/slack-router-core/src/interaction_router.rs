//! Dispatcher for interaction callbacks.
//!
//! Works like [`EventRouter`](crate::EventRouter) but is keyed by
//! [`InteractionType`] and reads the payload from the `payload` field of a
//! form-encoded body. There is no URL verification or rate limit branch.

use crate::error::{is_not_interested, ConfigError, HandlerResult, RouterError};
use crate::handler::{chain, BoxHandler, BoxPredicate, Handler};
use crate::interactions::{InteractionCallback, InteractionType};
use crate::options::{RouterOptions, Verification};
use crate::response::RouterResponse;
use crate::RequestContext;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Media type Slack uses for interaction requests.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Name of the form field holding the JSON payload.
pub const PAYLOAD_FIELD: &str = "payload";

/// Routes interaction callbacks to registered handlers.
pub struct InteractionRouter {
    verification: Verification,
    verbose_response: bool,
    handlers: HashMap<InteractionType, Vec<BoxHandler<InteractionCallback>>>,
    fallback_handler: Option<BoxHandler<InteractionCallback>>,
}

impl fmt::Debug for InteractionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<(&str, usize)> = self
            .handlers
            .iter()
            .map(|(interaction_type, handlers)| (interaction_type.as_str(), handlers.len()))
            .collect();
        registered.sort_unstable();

        f.debug_struct("InteractionRouter")
            .field("verification", &self.verification)
            .field("verbose_response", &self.verbose_response)
            .field("handlers", &registered)
            .field("has_fallback", &self.fallback_handler.is_some())
            .finish()
    }
}

impl InteractionRouter {
    /// Create a router.
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
            handlers: HashMap::new(),
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

    /// Register a handler for interactions of the given type.
    ///
    /// The handler runs only if every predicate matches. Handlers for the same type are
    /// tried in registration order.
    pub fn on<H, P>(
        &mut self,
        interaction_type: impl Into<InteractionType>,
        handler: H,
        predicates: P,
    ) where
        H: Handler<InteractionCallback> + 'static,
        P: IntoIterator<Item = BoxPredicate<InteractionCallback>>,
    {
        let interaction_type = interaction_type.into();
        debug!(interaction_type = %interaction_type, "Registering interaction handler");

        let handler = chain(Arc::new(handler) as BoxHandler<InteractionCallback>, predicates);
        self.handlers
            .entry(interaction_type)
            .or_default()
            .push(handler);
    }

    /// Set the handler for interactions no registered handler claimed
    pub fn set_fallback(&mut self, handler: impl Handler<InteractionCallback> + 'static) {
        self.fallback_handler = Some(Arc::new(handler));
    }

    /// Dispatch an already authenticated request.
    ///
    /// `content_type` is the raw value of the request's `Content-Type` header.
    #[instrument(skip(self, ctx, content_type, body), fields(correlation_id = %ctx.correlation_id))]
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        content_type: Option<&str>,
        body: &[u8],
    ) -> RouterResponse {
        let callback = match parse_callback(content_type, body) {
            Ok(callback) => callback,
            Err(e) => return RouterResponse::from_error(&e, self.verbose_response),
        };

        debug!(
            interaction_type = %callback.interaction_type,
            callback_id = %callback.callback_id,
            "Dispatching interaction"
        );

        let mut result: HandlerResult = Err(RouterError::NotInterested);
        if let Some(handlers) = self.handlers.get(&callback.interaction_type) {
            for handler in handlers {
                result = handler.handle(ctx, &callback).await;
                if !is_not_interested(&result) {
                    break;
                }
            }
        }

        if is_not_interested(&result) {
            result = match &self.fallback_handler {
                Some(handler) => handler.handle(ctx, &callback).await,
                None => Err(RouterError::NotInterested),
            };
        }

        match result {
            Ok(()) => RouterResponse::ok(),
            Err(e) if e.is_not_interested() => {
                debug!("Interaction was not claimed by any handler");
                RouterResponse::ok()
            }
            Err(e) => RouterResponse::from_error(&e, self.verbose_response),
        }
    }
}

/// Extract the interaction payload from a form-encoded request body
fn parse_callback(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<InteractionCallback, RouterError> {
    if !is_form_content_type(content_type) {
        return Err(RouterError::http(400).with_message("unexpected Content-Type"));
    }

    let payload = url::form_urlencoded::parse(body)
        .find(|(key, _)| key == PAYLOAD_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RouterError::http(400).with_message("missing payload"))?;

    serde_json::from_str(&payload).map_err(|e| {
        RouterError::http(400).with_message(format!("invalid interaction payload: {}", e))
    })
}

/// Compare the media type, ignoring parameters such as `charset`
fn is_form_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

#[cfg(test)]
#[path = "interaction_router_tests.rs"]
mod tests;
