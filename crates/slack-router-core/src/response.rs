//! Transport-neutral responses and the error-to-status translation.
//!
//! Every dispatch produces exactly one [`RouterResponse`]. Transport adapters turn it
//! into their own response type without further interpretation.

use crate::error::RouterError;
use crate::signature::VerificationError;
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, warn};

/// Content type of JSON response bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type of plain text response bodies.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Status, optional content type and body of a response to Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterResponse {
    status: u16,
    content_type: Option<&'static str>,
    body: Bytes,
}

impl RouterResponse {
    /// 200 with an empty body
    pub fn ok() -> Self {
        Self::empty(200)
    }

    /// Given status with an empty body
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Given status with a plain text body
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some(CONTENT_TYPE_TEXT),
            body: Bytes::from(body.into()),
        }
    }

    /// 200 with `value` serialized as JSON
    pub fn json<T: Serialize>(value: &T) -> Result<Self, RouterError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| RouterError::from(anyhow::Error::new(e)).with_message("encode response"))?;
        Ok(Self {
            status: 200,
            content_type: Some(CONTENT_TYPE_JSON),
            body: Bytes::from(body),
        })
    }

    /// Translate a dispatch error into a response.
    ///
    /// The status is the code of a (possibly wrapped) [`RouterError::Http`], or 500 for
    /// any other error. In verbose mode the body carries the error message.
    pub fn from_error(err: &RouterError, verbose: bool) -> Self {
        let status = err.status_code();
        if status >= 500 {
            error!(status, error = %err, "Handler failed");
        } else {
            warn!(status, error = %err, "Request rejected by handler");
        }
        Self::with_optional_message(status, err.to_string(), verbose)
    }

    /// Translate a signature verification failure into a response
    pub fn from_verification_error(err: &VerificationError, verbose: bool) -> Self {
        let status = err.status_code();
        if status >= 500 {
            error!(status, error = %err, "Signature verification failed");
        } else {
            warn!(status, error = %err, "Rejected request with invalid signature");
        }
        Self::with_optional_message(status, err.to_string(), verbose)
    }

    fn with_optional_message(status: u16, message: String, verbose: bool) -> Self {
        if verbose {
            Self::text(status, message)
        } else {
            Self::empty(status)
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Split the response into its parts
    pub fn into_parts(self) -> (u16, Option<&'static str>, Bytes) {
        (self.status, self.content_type, self.body)
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
