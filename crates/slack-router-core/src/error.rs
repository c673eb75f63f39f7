//! Error taxonomy shared by handlers, predicates and routers.
//!
//! Two variants are control-flow signals rather than failures:
//!
//! - [`RouterError::NotInterested`] means "this handler declines, try the next one"
//! - [`RouterError::Http`] asks the router to answer with a specific status code
//!
//! Both stay classifiable when wrapped with [`RouterError::with_message`], because the
//! classification helpers walk the chain of [`RouterError::WithMessage`] links instead of
//! looking at message text.

use std::fmt;
use thiserror::Error;

/// Result type returned by handlers.
pub type HandlerResult = Result<(), RouterError>;

/// Errors produced while dispatching a request to handlers.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The handler (or one of its predicates) declined the payload.
    #[error("not interested")]
    NotInterested,

    /// The handler requests a response with the given HTTP status code.
    #[error("{}", status_text(.0))]
    Http(u16),

    /// Another router error with additional context.
    #[error("{message}: {source}")]
    WithMessage {
        message: String,
        source: Box<RouterError>,
    },

    /// Any other failure. Always answered with 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RouterError {
    /// Create an error requesting the given HTTP status code
    pub fn http(status: u16) -> Self {
        Self::Http(status)
    }

    /// Create an unclassified error from a message
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::Internal(anyhow::anyhow!("{}", message))
    }

    /// Wrap this error with additional context, preserving its classification
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self::WithMessage {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error once all context links are removed
    pub fn root(&self) -> &RouterError {
        let mut current = self;
        while let Self::WithMessage { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Check whether this error is, or wraps, [`RouterError::NotInterested`]
    pub fn is_not_interested(&self) -> bool {
        matches!(self.root(), Self::NotInterested)
    }

    /// The status code carried by this error if it is, or wraps, [`RouterError::Http`]
    pub fn http_status(&self) -> Option<u16> {
        match self.root() {
            Self::Http(status) => Some(*status),
            _ => None,
        }
    }

    /// Status code used when this error is turned into a response.
    ///
    /// Explicit HTTP errors keep their code, everything else maps to 500.
    pub fn status_code(&self) -> u16 {
        self.http_status().unwrap_or(500)
    }
}

/// Adds context to router errors carried in a `Result`.
pub trait RouterResultExt<T> {
    /// Wrap the error, if any, with a message
    fn with_message(self, message: impl Into<String>) -> Result<T, RouterError>;
}

impl<T> RouterResultExt<T> for Result<T, RouterError> {
    fn with_message(self, message: impl Into<String>) -> Result<T, RouterError> {
        self.map_err(|e| e.with_message(message))
    }
}

/// Check whether a handler result declined the payload.
pub fn is_not_interested<T>(result: &Result<T, RouterError>) -> bool {
    matches!(result, Err(e) if e.is_not_interested())
}

fn status_text(status: &u16) -> String {
    let reason = match *status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return format!("HTTP status {}", status),
    };
    reason.to_string()
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while constructing a router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "no signing secret configured; set one or explicitly enable insecure_skip_verification"
    )]
    MissingSigningSecret,

    #[error("a signing secret and insecure_skip_verification are mutually exclusive")]
    ConflictingVerification,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
