//! # Slack Router CLI
//!
//! Developer tools for the Slack request signing scheme.
//!
//! - `sign` prints the two signing headers for a body, so captured requests can be
//!   replayed against a running service with any HTTP client
//! - `verify` checks a captured request against a signing secret

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use slack_router_core::signature::{
    compute_signature, SignatureVerifier, SigningSecret, VerificationError, HEADER_SIGNATURE,
    HEADER_TIMESTAMP,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

// ============================================================================
// CLI Structure
// ============================================================================

/// Slack Router CLI - Sign and verify Slack requests
#[derive(Parser)]
#[command(name = "slack-router-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sign and verify Slack webhook requests")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the signing headers for a request body
    Sign {
        /// Signing secret of the Slack app
        #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
        secret: String,

        /// Unix timestamp to sign with (defaults to now)
        #[arg(short, long)]
        timestamp: Option<i64>,

        #[command(flatten)]
        body: BodySource,
    },

    /// Check the signature of a captured request
    Verify {
        /// Signing secret of the Slack app
        #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
        secret: String,

        /// Value of the X-Slack-Request-Timestamp header
        #[arg(short, long)]
        timestamp: String,

        /// Value of the X-Slack-Signature header
        #[arg(short, long)]
        signature: String,

        /// Unix time to check freshness against (defaults to now)
        #[arg(long)]
        now: Option<i64>,

        #[command(flatten)]
        body: BodySource,
    },
}

/// Where the request body is read from. Standard input when neither is given.
#[derive(Debug, Clone, clap::Args)]
pub struct BodySource {
    /// Request body as a literal string
    #[arg(short, long, conflicts_with = "file")]
    pub body: Option<String>,

    /// File containing the request body
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl BodySource {
    /// Read the body bytes exactly as they will be signed
    pub fn read(&self) -> Result<Vec<u8>, CliError> {
        if let Some(body) = &self.body {
            return Ok(body.as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return std::fs::read(path).map_err(CliError::Io);
        }

        let mut buffer = Vec::new();
        std::io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Commands
// ============================================================================

/// Parse the command line, run the command and print its output
pub fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    initialize_logging(&cli.log_level);

    let output = execute(cli.command)?;
    println!("{}", output);
    Ok(())
}

/// Run a command and return the text it prints
pub fn execute(command: Commands) -> Result<String, CliError> {
    match command {
        Commands::Sign {
            secret,
            timestamp,
            body,
        } => {
            let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp());
            sign(&secret, timestamp, &body.read()?)
        }
        Commands::Verify {
            secret,
            timestamp,
            signature,
            now,
            body,
        } => {
            let now = match now {
                Some(seconds) => unix_time("now", seconds)?,
                None => Utc::now(),
            };
            verify(&secret, &timestamp, &signature, &body.read()?, now)
        }
    }
}

/// Format the signing headers for `body` at `timestamp`
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, CliError> {
    require_secret(secret)?;

    let timestamp = timestamp.to_string();
    let signature = compute_signature(secret.as_bytes(), &timestamp, body)?;
    debug!(body_size = body.len(), "Signed request body");

    Ok(format!(
        "{}: {}\n{}: {}",
        HEADER_TIMESTAMP, timestamp, HEADER_SIGNATURE, signature
    ))
}

/// Check a captured request the way the signing middleware would
pub fn verify(
    secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<String, CliError> {
    require_secret(secret)?;

    SignatureVerifier::new(SigningSecret::from(secret)).verify(
        Some(timestamp),
        Some(signature),
        body,
        now,
    )?;
    Ok("Signature is valid".to_string())
}

fn require_secret(secret: &str) -> Result<(), CliError> {
    if secret.is_empty() {
        return Err(CliError::InvalidArgument {
            arg: "secret".to_string(),
            message: "signing secret must not be empty".to_string(),
        });
    }
    Ok(())
}

fn unix_time(arg: &str, seconds: i64) -> Result<DateTime<Utc>, CliError> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| CliError::InvalidArgument {
        arg: arg.to_string(),
        message: format!("{} is not a representable Unix time", seconds),
    })
}

/// Log to stderr so command output stays clean on stdout
fn initialize_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
