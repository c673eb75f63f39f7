//! # Slack Router Service
//!
//! Binary entry point for the Slack router HTTP service.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes logging
//! - Registers the logging handlers on the event and interaction routers
//! - Starts the HTTP server from slack-router-api

mod handlers;

use slack_router_api::{
    config::CONFIG_FILE_ENV, load_service_config, start_server, ServiceConfig, ServiceError,
};
use slack_router_core::{EventRouter, InteractionRouter};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str =
    "slack_router_service=info,slack_router_api=info,slack_router_core=info,tower_http=debug";

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. /etc/slack-router/service.yaml    system-wide defaults
    //  2. ./config/service.yaml             deployment-local override
    //  3. Path given by SLACK_ROUTER_CONFIG_FILE
    //  4. Environment variables prefixed SLACK_ROUTER__ (double-underscore separator)
    //     e.g. SLACK_ROUTER__SLACK__SIGNING_SECRET=... sets slack.signing_secret
    //
    // Logging is not initialised yet, so failures here go to stderr.
    // -------------------------------------------------------------------------
    let explicit_file = std::env::var(CONFIG_FILE_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);

    let service_config = match load_service_config(explicit_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration; aborting: {}", e);
            std::process::exit(3);
        }
    };

    init_logging(&service_config);
    info!("Starting Slack router service");

    if let Some(path) = &explicit_file {
        info!(path = %path.display(), "Loaded configuration from explicit path");
    }

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Build routers
    //
    // Both routers share the signing settings. All handlers must be registered
    // before the routers are handed to the server.
    // -------------------------------------------------------------------------
    let options = service_config.router_options();
    let routers = EventRouter::new(options.clone()).and_then(|events| {
        InteractionRouter::new(options).map(|interactions| (events, interactions))
    });
    let (mut event_router, mut interaction_router) = match routers {
        Ok(routers) => routers,
        Err(e) => {
            error!(error = %e, "Failed to construct routers; aborting");
            std::process::exit(3);
        }
    };

    handlers::register_event_handlers(&mut event_router);
    handlers::register_interaction_handlers(&mut interaction_router);
    info!(?event_router, ?interaction_router, "Registered handlers");

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        events_path = %service_config.slack.events_path,
        interactions_path = %service_config.slack.interactions_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, event_router, interaction_router).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(config: &ServiceConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
