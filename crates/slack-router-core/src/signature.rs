//! Slack request signature verification.
//!
//! Slack signs every request it sends with the app's signing secret:
//!
//! ```text
//! X-Slack-Signature = "v0=" + hex(HMAC-SHA256(secret, "v0:" + timestamp + ":" + body))
//! ```
//!
//! where `timestamp` is the raw value of the `X-Slack-Request-Timestamp` header. A request
//! is accepted only when the timestamp lies within [`MAX_TIMESTAMP_SKEW_SECONDS`] of the
//! current time and the signature matches.
//!
//! Verification is split into two steps so the body can be hashed while it streams:
//! [`SignatureVerifier::begin`] checks the headers and returns a [`VerificationContext`],
//! which is fed body chunks through [`VerificationContext::update`] and finally checked
//! with [`VerificationContext::ensure`].

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the Unix timestamp, in seconds, at which Slack signed the request.
pub const HEADER_TIMESTAMP: &str = "X-Slack-Request-Timestamp";

/// Header carrying the request signature.
pub const HEADER_SIGNATURE: &str = "X-Slack-Signature";

/// Version prefix of the signing scheme.
pub const SIGNATURE_VERSION: &str = "v0";

/// Maximum allowed distance between the request timestamp and the current time.
pub const MAX_TIMESTAMP_SKEW_SECONDS: u64 = 300;

// ============================================================================
// Signing Secret
// ============================================================================

/// The shared secret Slack uses to sign requests.
///
/// The secret bytes are wiped from memory when the value is dropped and never
/// appear in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Create a signing secret from raw bytes
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// Check whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Access the raw secret bytes
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret").field(&"<REDACTED>").finish()
    }
}

impl From<&str> for SigningSecret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for SigningSecret {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

// ============================================================================
// Verification Errors
// ============================================================================

/// Reasons a request fails signature verification.
///
/// Messages never include the secret or the values of the signing headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("missing required header {header}")]
    MissingHeader { header: &'static str },

    #[error("request timestamp is not a valid Unix timestamp")]
    MalformedTimestamp,

    #[error("request timestamp is outside the {window_seconds}s freshness window")]
    StaleTimestamp { window_seconds: u64 },

    #[error("request signature does not match")]
    SignatureMismatch,

    #[error("failed to read request body: {message}")]
    BodyRead { message: String },

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("signature verification failed: {message}")]
    Internal { message: String },
}

impl VerificationError {
    /// HTTP status code for responding to a request that failed verification.
    ///
    /// Header problems are client errors (400). An expired timestamp or a wrong
    /// signature is an authentication failure (401). Failures while reading the
    /// body or computing the digest are server errors (500).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingHeader { .. } | Self::MalformedTimestamp => 400,
            Self::StaleTimestamp { .. } | Self::SignatureMismatch => 401,
            Self::BodyTooLarge { .. } => 413,
            Self::BodyRead { .. } | Self::Internal { .. } => 500,
        }
    }
}

// ============================================================================
// Verifier
// ============================================================================

/// Verifies Slack request signatures with a shared [`SigningSecret`].
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: SigningSecret,
    max_skew_seconds: u64,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<REDACTED>")
            .field("max_skew_seconds", &self.max_skew_seconds)
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier using the standard five minute freshness window
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            max_skew_seconds: MAX_TIMESTAMP_SKEW_SECONDS,
        }
    }

    /// Start verifying a request.
    ///
    /// Checks that both signing headers are present, that the timestamp parses and that
    /// it lies inside the freshness window. The staleness check runs before any hashing,
    /// so an expired request is rejected as stale even if its signature is valid.
    ///
    /// # Errors
    ///
    /// - [`VerificationError::MissingHeader`] if either header is absent
    /// - [`VerificationError::MalformedTimestamp`] if the timestamp is not an integer
    /// - [`VerificationError::StaleTimestamp`] if the timestamp is too far from `now`
    pub fn begin(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VerificationContext, VerificationError> {
        let timestamp = timestamp.ok_or(VerificationError::MissingHeader {
            header: HEADER_TIMESTAMP,
        })?;
        let signature = signature.ok_or(VerificationError::MissingHeader {
            header: HEADER_SIGNATURE,
        })?;

        let seconds: i64 = timestamp
            .parse()
            .map_err(|_| VerificationError::MalformedTimestamp)?;

        if now.timestamp().abs_diff(seconds) > self.max_skew_seconds {
            warn!(
                age_seconds = now.timestamp().saturating_sub(seconds),
                "Rejecting request with stale timestamp"
            );
            return Err(VerificationError::StaleTimestamp {
                window_seconds: self.max_skew_seconds,
            });
        }

        let mac = signing_mac(self.secret.expose(), timestamp)?;

        Ok(VerificationContext {
            mac,
            claimed_signature: signature.to_string(),
        })
    }

    /// Verify a request whose body is already fully buffered
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let mut context = self.begin(timestamp, signature, now)?;
        context.update(body);
        context.ensure()
    }
}

/// Running verification state for a single request.
///
/// Created by [`SignatureVerifier::begin`] and consumed by [`VerificationContext::ensure`].
pub struct VerificationContext {
    mac: HmacSha256,
    claimed_signature: String,
}

impl fmt::Debug for VerificationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationContext")
            .field("claimed_signature", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

impl VerificationContext {
    /// Feed the next chunk of the request body into the digest
    pub fn update(&mut self, chunk: &[u8]) {
        self.mac.update(chunk);
    }

    /// Compare the digest of everything fed so far with the claimed signature.
    ///
    /// The claimed value is compared as a string against `v0=<lowercase hex>`, so any
    /// change to it, including the case of a hex digit, is a
    /// [`VerificationError::SignatureMismatch`].
    pub fn ensure(self) -> Result<(), VerificationError> {
        let expected = encode_signature(self.mac);
        let claimed = self.claimed_signature.as_bytes();

        if expected.len() != claimed.len() {
            debug!("Signature header is not in v0=<hex> format");
            return Err(VerificationError::SignatureMismatch);
        }

        if bool::from(expected.as_bytes().ct_eq(claimed)) {
            Ok(())
        } else {
            Err(VerificationError::SignatureMismatch)
        }
    }
}

/// HMAC keyed with `secret` that has already consumed the `v0:<timestamp>:` prefix
fn signing_mac(secret: &[u8], timestamp: &str) -> Result<HmacSha256, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| VerificationError::Internal {
        message: format!("failed to initialise HMAC: {}", e),
    })?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    Ok(mac)
}

fn encode_signature(mac: HmacSha256) -> String {
    format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Compute the `X-Slack-Signature` value for a request.
///
/// Useful for signing test requests and for replaying captured payloads.
///
/// ```rust
/// use slack_router_core::signature::compute_signature;
///
/// let signature = compute_signature(b"secret", "1531420618", b"{}").unwrap();
/// assert!(signature.starts_with("v0="));
/// assert_eq!(signature.len(), 3 + 64);
/// ```
pub fn compute_signature(
    secret: &[u8],
    timestamp: &str,
    body: &[u8],
) -> Result<String, VerificationError> {
    let mut mac = signing_mac(secret, timestamp)?;
    mac.update(body);
    Ok(encode_signature(mac))
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
