//! Handlers registered by the service binary.
//!
//! They only log what they receive, which is enough to check the wiring of a new Slack
//! app end to end. Applications embedding the routers register their own handlers
//! instead.

use async_trait::async_trait;
use slack_router_core::{
    events::{
        app_mention::AppMentionEvent, message, message::MessageEvent, reaction::ReactionEvent,
        CallbackEvent,
    },
    handler::{handler_fn, Handler},
    interactions::{InteractionCallback, InteractionType},
    EventRouter, HandlerResult, InteractionRouter, RequestContext,
};
use tracing::info;

/// Register the logging handlers for Events API requests
pub fn register_event_handlers(router: &mut EventRouter) {
    router.on_app_mention(handler_fn(log_app_mention), []);

    // Plain user messages only; edits, joins and bot posts carry a subtype.
    router.on_message(handler_fn(log_message), [message::subtype("")]);

    router.on_reaction_added(handler_fn(log_reaction), []);
    router.on_reaction_removed(handler_fn(log_reaction), []);
    router.set_fallback(LogUnhandledEvent);
}

/// Register the logging handlers for interaction callbacks
pub fn register_interaction_handlers(router: &mut InteractionRouter) {
    router.on(InteractionType::SHORTCUT, handler_fn(log_shortcut), []);
    router.on(
        InteractionType::BLOCK_ACTIONS,
        handler_fn(log_block_actions),
        [],
    );
    router.set_fallback(LogUnhandledInteraction);
}

async fn log_app_mention(ctx: RequestContext, event: AppMentionEvent) -> HandlerResult {
    info!(
        correlation_id = %ctx.correlation_id,
        channel = %event.channel,
        user = %event.user,
        "Bot was mentioned"
    );
    Ok(())
}

async fn log_message(ctx: RequestContext, event: MessageEvent) -> HandlerResult {
    info!(
        correlation_id = %ctx.correlation_id,
        channel = %event.channel,
        user = %event.user,
        text_length = event.text.len(),
        "Message posted"
    );
    Ok(())
}

async fn log_reaction(ctx: RequestContext, event: ReactionEvent) -> HandlerResult {
    info!(
        correlation_id = %ctx.correlation_id,
        event_type = %event.event_type,
        reaction = %event.reaction,
        channel = %event.item.channel,
        "Reaction changed"
    );
    Ok(())
}

async fn log_shortcut(ctx: RequestContext, callback: InteractionCallback) -> HandlerResult {
    info!(
        correlation_id = %ctx.correlation_id,
        callback_id = %callback.callback_id,
        "Shortcut invoked"
    );
    Ok(())
}

async fn log_block_actions(ctx: RequestContext, callback: InteractionCallback) -> HandlerResult {
    for action in &callback.actions {
        info!(
            correlation_id = %ctx.correlation_id,
            block_id = %action.block_id,
            action_id = %action.action_id,
            "Block action received"
        );
    }
    Ok(())
}

/// Fallback for callback events no other handler claimed
struct LogUnhandledEvent;

#[async_trait]
impl Handler<CallbackEvent> for LogUnhandledEvent {
    async fn handle(&self, ctx: &RequestContext, event: &CallbackEvent) -> HandlerResult {
        info!(
            correlation_id = %ctx.correlation_id,
            event_type = %event.inner_event.event_type,
            event_id = event.event_id.as_deref().unwrap_or_default(),
            "Ignoring unhandled event"
        );
        Ok(())
    }
}

/// Fallback for interactions no other handler claimed
struct LogUnhandledInteraction;

#[async_trait]
impl Handler<InteractionCallback> for LogUnhandledInteraction {
    async fn handle(&self, ctx: &RequestContext, callback: &InteractionCallback) -> HandlerResult {
        info!(
            correlation_id = %ctx.correlation_id,
            interaction_type = %callback.interaction_type,
            "Ignoring unhandled interaction"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
