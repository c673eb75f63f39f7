//! Request signing middleware.
//!
//! Verifies the Slack `v0` signature of a request before it reaches the endpoint handler.
//! The body stream is read exactly once: every chunk is fed to the running HMAC and
//! appended to a buffer, and the buffered bytes are handed on to the handler as the new
//! request body.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use slack_router_core::{
    signature::{VerificationContext, VerificationError, HEADER_SIGNATURE, HEADER_TIMESTAMP},
    Verification,
};
use tracing::debug;

use crate::responses::SlackResponse;

/// State of the signing middleware for one endpoint.
#[derive(Debug, Clone)]
pub struct SigningState {
    verification: Verification,
    verbose_response: bool,
    max_body_size: usize,
}

impl SigningState {
    pub fn new(verification: Verification, verbose_response: bool, max_body_size: usize) -> Self {
        Self {
            verification,
            verbose_response,
            max_body_size,
        }
    }
}

/// Reject requests whose Slack signature does not verify.
///
/// When verification is skipped the request is passed on untouched. Otherwise
/// verification failures are answered directly:
///
/// - missing header or malformed timestamp: 400
/// - stale timestamp or wrong signature: 401
/// - body over the configured limit: 413
/// - body read failure: 500
pub async fn verify_slack_signature(
    State(signing): State<SigningState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(verifier) = signing.verification.verifier() else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let timestamp = header_value(&parts.headers, HEADER_TIMESTAMP);
    let signature = header_value(&parts.headers, HEADER_SIGNATURE);

    let verified = async {
        let mut context = verifier.begin(timestamp, signature, chrono::Utc::now())?;
        let bytes = read_body(body, &mut context, signing.max_body_size).await?;
        context.ensure()?;
        Ok::<_, VerificationError>(bytes)
    }
    .await;

    match verified {
        Ok(bytes) => {
            debug!(body_size = bytes.len(), "Slack signature verified");
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(e) => SlackResponse::from_verification_error(&e, signing.verbose_response)
            .into_response(),
    }
}

/// Header value as text. A value that is not valid text is treated as empty, which
/// fails verification as a malformed timestamp or a mismatched signature.
fn header_value<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .map(|value| value.to_str().unwrap_or_default())
}

/// Drain the body into memory while feeding every chunk to the verification context
async fn read_body(
    body: Body,
    context: &mut VerificationContext,
    limit: usize,
) -> Result<Bytes, VerificationError> {
    let mut stream = body.into_data_stream();
    let mut buffer = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| VerificationError::BodyRead {
            message: e.to_string(),
        })?;

        if buffer.len() + chunk.len() > limit {
            return Err(VerificationError::BodyTooLarge { limit });
        }

        context.update(&chunk);
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;
