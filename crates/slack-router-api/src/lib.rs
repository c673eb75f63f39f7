//! # Slack Router HTTP Service
//!
//! axum adapter for the routers in `slack-router-core`.
//!
//! This crate provides:
//! - the Events API endpoint and the interactivity endpoint, each behind the signing
//!   middleware
//! - a health check endpoint
//! - request logging with correlation IDs
//! - server startup with graceful shutdown

pub mod config;
pub mod errors;
pub mod responses;
pub mod signing;

pub use config::{load_service_config, ServiceConfig};
pub use errors::{ConfigError, ServiceError};
pub use responses::{HealthResponse, SlackResponse};

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Extension, State},
    http::{header, HeaderMap},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use signing::{verify_slack_signature, SigningState};
use slack_router_core::{
    CorrelationId, EventRouter, InteractionRouter, RequestContext, RouterError,
};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Header carrying the correlation ID of a request
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
///
/// The routers are frozen once they are placed in the state; register all handlers
/// before calling [`AppState::new`].
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub event_router: Arc<EventRouter>,
    pub interaction_router: Arc<InteractionRouter>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        event_router: EventRouter,
        interaction_router: InteractionRouter,
    ) -> Self {
        Self {
            config,
            event_router: Arc::new(event_router),
            interaction_router: Arc::new(interaction_router),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the axum router.
///
/// - `POST {slack.events_path}`: Events API requests
/// - `POST {slack.interactions_path}`: interaction callbacks
/// - `GET /health`: liveness
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    let events_signing = SigningState::new(
        state.event_router.verification().clone(),
        state.event_router.verbose_response(),
        max_body_size,
    );
    let interactions_signing = SigningState::new(
        state.interaction_router.verification().clone(),
        state.interaction_router.verbose_response(),
        max_body_size,
    );

    let slack_routes = Router::new()
        .route(
            &state.config.slack.events_path,
            post(handle_events).route_layer(middleware::from_fn_with_state(
                events_signing,
                verify_slack_signature,
            )),
        )
        .route(
            &state.config.slack.interactions_path,
            post(handle_interactions).route_layer(middleware::from_fn_with_state(
                interactions_signing,
                verify_slack_signature,
            )),
        );

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(slack_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(DefaultBodyLimit::max(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start the HTTP server and serve until SIGINT or SIGTERM.
///
/// In-flight requests get `server.shutdown_timeout_seconds` to complete after the signal
/// is received.
pub async fn start_server(
    config: ServiceConfig,
    event_router: EventRouter,
    interaction_router: InteractionRouter,
) -> Result<(), ServiceError> {
    config.validate()?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_seconds);
    let state = AppState::new(config, event_router, interaction_router);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: address.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", address);

    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    serve_until(listener, app, shutdown_signal, shutdown_timeout).await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Serve `app` until `shutdown` resolves, then drain in-flight requests.
///
/// Requests still running `drain_timeout` after the shutdown signal are dropped.
async fn serve_until<F>(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: std::time::Duration,
) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        shutdown.await;
        let _ = signalled_tx.send(());
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();

    let drain_deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(drain_timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => result.map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        }),
        _ = drain_deadline => {
            warn!(
                timeout_ms = drain_timeout.as_millis() as u64,
                "Graceful shutdown timed out; dropping in-flight requests"
            );
            Ok(())
        }
    }
}

// ============================================================================
// Slack Handlers
// ============================================================================

/// Handle Events API requests
#[instrument(skip_all)]
async fn handle_events(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    body: Result<Bytes, BytesRejection>,
) -> SlackResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return body_rejected(&rejection, state.event_router.verbose_response())
        }
    };

    let ctx = request_context(context);
    state.event_router.dispatch(&ctx, &body).await.into()
}

/// Handle interaction callbacks
#[instrument(skip_all)]
async fn handle_interactions(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> SlackResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return body_rejected(&rejection, state.interaction_router.verbose_response())
        }
    };

    let ctx = request_context(context);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    state
        .interaction_router
        .dispatch(&ctx, content_type, &body)
        .await
        .into()
}

/// Answer a body the extractor refused with the router's status-only error response
fn body_rejected(rejection: &BytesRejection, verbose: bool) -> SlackResponse {
    SlackResponse::from_error(&RouterError::http(rejection.status().as_u16()), verbose)
}

fn request_context(context: Option<Extension<RequestContext>>) -> RequestContext {
    context
        .map(|Extension(ctx)| ctx)
        .unwrap_or_default()
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// - Reads the correlation ID from `x-correlation-id`, or generates one
/// - Stores a [`RequestContext`] in the request extensions for the handlers
/// - Echoes the correlation ID on the response
/// - Logs completion at a level chosen by the response status
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(CorrelationId::from)
        .unwrap_or_default();

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    request
        .extensions_mut()
        .insert(RequestContext::with_correlation_id(correlation_id.clone()));

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.as_str().parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
