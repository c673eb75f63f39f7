//! Handlers, predicates and the predicate chain.
//!
//! A [`Handler`] processes one payload. A [`Predicate`] decides whether a handler is
//! interested in a payload at all. [`chain`] composes the two: the returned handler
//! evaluates the predicates in the order they were given and only runs the wrapped
//! handler if every one of them matches. The first predicate that does not match
//! short-circuits the chain with [`RouterError::NotInterested`].

use crate::error::{HandlerResult, RouterError};
use crate::RequestContext;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Shared, type-erased handler.
pub type BoxHandler<T> = Arc<dyn Handler<T>>;

/// Shared, type-erased predicate.
pub type BoxPredicate<T> = Arc<dyn Predicate<T>>;

// ============================================================================
// Handler
// ============================================================================

/// Processes a payload of type `T`.
///
/// Returning [`RouterError::NotInterested`] declines the payload; the router then tries
/// the next handler registered for the same type, and finally the fallback handler.
/// Returning [`RouterError::Http`] answers the request with that status code.
#[async_trait]
pub trait Handler<T>: Send + Sync {
    async fn handle(&self, ctx: &RequestContext, payload: &T) -> HandlerResult;
}

#[async_trait]
impl<T, H> Handler<T> for Arc<H>
where
    T: Send + Sync,
    H: Handler<T> + ?Sized,
{
    async fn handle(&self, ctx: &RequestContext, payload: &T) -> HandlerResult {
        self.as_ref().handle(ctx, payload).await
    }
}

/// Handler backed by an async closure. Created with [`handler_fn`].
pub struct HandlerFn<F, T> {
    f: F,
    _payload: PhantomData<fn(T)>,
}

/// Turn an async closure into a [`Handler`].
///
/// The closure receives owned copies of the context and payload, so the returned future
/// does not borrow from the router.
///
/// ```rust
/// use slack_router_core::events::message::MessageEvent;
/// use slack_router_core::handler::handler_fn;
/// use slack_router_core::RouterError;
///
/// let handler = handler_fn(|_ctx, msg: MessageEvent| async move {
///     if msg.text.is_empty() {
///         return Err(RouterError::NotInterested);
///     }
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<T, F, Fut>(f: F) -> HandlerFn<F, T>
where
    F: Fn(RequestContext, T) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    HandlerFn {
        f,
        _payload: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> Handler<T> for HandlerFn<F, T>
where
    T: Clone + Send + Sync,
    F: Fn(RequestContext, T) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, ctx: &RequestContext, payload: &T) -> HandlerResult {
        (self.f)(ctx.clone(), payload.clone()).await
    }
}

// ============================================================================
// Predicate
// ============================================================================

/// Decides whether a handler should run for a payload.
///
/// Predicates only inspect the payload; they must not have side effects on it.
pub trait Predicate<T>: Send + Sync {
    fn matches(&self, ctx: &RequestContext, payload: &T) -> bool;
}

/// Predicate backed by a closure. Created with [`predicate_fn`].
pub struct PredicateFn<F>(F);

impl<T, F> Predicate<T> for PredicateFn<F>
where
    F: Fn(&RequestContext, &T) -> bool + Send + Sync,
{
    fn matches(&self, ctx: &RequestContext, payload: &T) -> bool {
        (self.0)(ctx, payload)
    }
}

/// Turn a closure into a shared [`Predicate`]
pub fn predicate_fn<T, F>(f: F) -> BoxPredicate<T>
where
    T: 'static,
    F: Fn(&RequestContext, &T) -> bool + Send + Sync + 'static,
{
    Arc::new(PredicateFn(f))
}

// ============================================================================
// Chain
// ============================================================================

/// Handler that runs `next` only when `predicate` matches.
struct Filtered<T> {
    predicate: BoxPredicate<T>,
    next: BoxHandler<T>,
}

#[async_trait]
impl<T> Handler<T> for Filtered<T>
where
    T: Send + Sync,
{
    async fn handle(&self, ctx: &RequestContext, payload: &T) -> HandlerResult {
        if !self.predicate.matches(ctx, payload) {
            trace!(correlation_id = %ctx.correlation_id, "Predicate did not match");
            return Err(RouterError::NotInterested);
        }
        self.next.handle(ctx, payload).await
    }
}

/// Wrap `handler` with `predicates`.
///
/// The first predicate becomes the outermost link, so predicates are evaluated in the
/// order given and evaluation stops at the first one that does not match. A chain with
/// no predicates is the handler itself.
pub fn chain<T, I>(handler: BoxHandler<T>, predicates: I) -> BoxHandler<T>
where
    T: Send + Sync + 'static,
    I: IntoIterator<Item = BoxPredicate<T>>,
{
    let predicates: Vec<BoxPredicate<T>> = predicates.into_iter().collect();
    predicates
        .into_iter()
        .rev()
        .fold(handler, |next, predicate| -> BoxHandler<T> {
            Arc::new(Filtered { predicate, next })
        })
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
