//! Error types for the HTTP service

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is present but unusable
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// A configuration source could not be read or deserialized
    #[error("Failed to load configuration: {message}")]
    Load { message: String },

    /// The signing settings do not describe exactly one verification mode
    #[error("Invalid router configuration: {0}")]
    Router(#[from] slack_router_core::ConfigError),
}
