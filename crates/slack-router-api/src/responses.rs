//! Conversion of router responses into axum responses.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use slack_router_core::{signature::VerificationError, RouterError, RouterResponse};

/// A [`RouterResponse`] ready to be returned from an axum handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackResponse(pub RouterResponse);

impl SlackResponse {
    pub fn from_error(err: &RouterError, verbose: bool) -> Self {
        Self(RouterResponse::from_error(err, verbose))
    }

    pub fn from_verification_error(err: &VerificationError, verbose: bool) -> Self {
        Self(RouterResponse::from_verification_error(err, verbose))
    }
}

impl From<RouterResponse> for SlackResponse {
    fn from(response: RouterResponse) -> Self {
        Self(response)
    }
}

impl IntoResponse for SlackResponse {
    fn into_response(self) -> Response {
        let (status, content_type, body) = self.0.into_parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match content_type {
            Some(content_type) => {
                (status, [(header::CONTENT_TYPE, content_type)], Body::from(body)).into_response()
            }
            None => (status, Body::from(body)).into_response(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[cfg(test)]
#[path = "responses_tests.rs"]
mod tests;
