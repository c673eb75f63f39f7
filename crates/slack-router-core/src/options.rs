//! Router construction options.

use crate::error::ConfigError;
use crate::signature::{SignatureVerifier, SigningSecret};
use tracing::warn;

/// Options shared by [`EventRouter`](crate::EventRouter) and
/// [`InteractionRouter`](crate::InteractionRouter).
///
/// Exactly one of [`with_signing_secret`](Self::with_signing_secret) and
/// [`insecure_skip_verification`](Self::insecure_skip_verification) must be chosen;
/// the router constructors reject any other combination.
///
/// ```rust
/// use slack_router_core::{EventRouter, RouterOptions};
///
/// let router = EventRouter::new(
///     RouterOptions::new()
///         .with_signing_secret("8f742231b10e8888abcd99yyyzzz85a5")
///         .verbose_response(),
/// );
/// assert!(router.is_ok());
///
/// assert!(EventRouter::new(RouterOptions::new()).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    signing_secret: Option<SigningSecret>,
    skip_verification: bool,
    verbose_response: bool,
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify every request against the given signing secret
    pub fn with_signing_secret(mut self, secret: impl Into<SigningSecret>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Accept requests without checking their signature.
    ///
    /// Anyone who can reach the endpoint can then forge events. Intended for tests.
    pub fn insecure_skip_verification(mut self) -> Self {
        self.skip_verification = true;
        self
    }

    /// Put error messages in response bodies
    pub fn verbose_response(mut self) -> Self {
        self.verbose_response = true;
        self
    }

    /// Resolve the options into the verification mode and the verbose flag.
    ///
    /// An empty secret counts as no secret.
    pub fn build(self) -> Result<(Verification, bool), ConfigError> {
        let secret = self.signing_secret.filter(|s| !s.is_empty());

        let verification = match (secret, self.skip_verification) {
            (Some(secret), false) => Verification::Signed(SignatureVerifier::new(secret)),
            (None, true) => {
                warn!("Signature verification is disabled; requests will not be authenticated");
                Verification::Skipped
            }
            (Some(_), true) => return Err(ConfigError::ConflictingVerification),
            (None, false) => return Err(ConfigError::MissingSigningSecret),
        };

        Ok((verification, self.verbose_response))
    }
}

/// How a router authenticates requests.
#[derive(Debug, Clone)]
pub enum Verification {
    /// Check the Slack signature of every request
    Signed(SignatureVerifier),

    /// Accept all requests unauthenticated
    Skipped,
}

impl Verification {
    /// The verifier to run, or `None` when verification is skipped
    pub fn verifier(&self) -> Option<&SignatureVerifier> {
        match self {
            Self::Signed(verifier) => Some(verifier),
            Self::Skipped => None,
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
