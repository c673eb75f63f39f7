//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::Deserialize;
use slack_router_core::RouterOptions;
use std::fmt;
use std::path::Path;

/// Prefix of environment variables that override configuration values.
///
/// `SLACK_ROUTER__SERVER__PORT=9090` sets `server.port`.
pub const ENV_PREFIX: &str = "SLACK_ROUTER";

/// Environment variable naming an additional configuration file.
pub const CONFIG_FILE_ENV: &str = "SLACK_ROUTER_CONFIG_FILE";

/// Service configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Slack endpoint settings
    pub slack: SlackConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check the configuration for values the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for bad endpoint paths or a zero body limit, and
    /// [`ConfigError::Router`] unless exactly one of a signing secret and
    /// `insecure_skip_verification` is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, path) in [
            ("slack.events_path", &self.slack.events_path),
            ("slack.interactions_path", &self.slack.interactions_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    message: format!("{} must start with '/', got '{}'", name, path),
                });
            }
        }

        if self.slack.events_path == self.slack.interactions_path {
            return Err(ConfigError::Invalid {
                message: "slack.events_path and slack.interactions_path must differ".to_string(),
            });
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        self.router_options().build()?;
        Ok(())
    }

    /// Router options derived from the `slack` section
    pub fn router_options(&self) -> RouterOptions {
        let mut options = RouterOptions::new();
        if let Some(secret) = &self.slack.signing_secret {
            options = options.with_signing_secret(secret.as_str());
        }
        if self.slack.insecure_skip_verification {
            options = options.insecure_skip_verification();
        }
        if self.slack.verbose_response {
            options = options.verbose_response();
        }
        options
    }
}

/// Load the service configuration.
///
/// Sources are applied in order, later sources overriding earlier ones:
///
/// 1. `/etc/slack-router/service.yaml`
/// 2. `./config/service.yaml`
/// 3. `explicit_file`, if given (must exist)
/// 4. environment variables prefixed `SLACK_ROUTER__`
///
/// Missing optional files are skipped. Every field has a default, so an entirely
/// unconfigured environment yields [`ServiceConfig::default`].
pub fn load_service_config(explicit_file: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/slack-router/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit_file {
        builder = builder.add_source(
            config::File::from(path)
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .and_then(|settings| settings.try_deserialize())
        .map_err(|e| ConfigError::Load {
            message: e.to_string(),
        })
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Slack endpoint configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Signing secret from the Slack app's credentials page
    pub signing_secret: Option<String>,

    /// Accept unsigned requests. Only for local testing.
    pub insecure_skip_verification: bool,

    /// Include error messages in response bodies
    pub verbose_response: bool,

    /// Path of the Events API endpoint
    pub events_path: String,

    /// Path of the interactivity endpoint
    pub interactions_path: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            insecure_skip_verification: false,
            verbose_response: false,
            events_path: "/slack/events".to_string(),
            interactions_path: "/slack/interactions".to_string(),
        }
    }
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field("insecure_skip_verification", &self.insecure_skip_verification)
            .field("verbose_response", &self.verbose_response)
            .field("events_path", &self.events_path)
            .field("interactions_path", &self.interactions_path)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
