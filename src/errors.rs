//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the DataJud search client, providing the
//! error taxonomy shared by all components and conversion utilities for
//! transport-level failures.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from validation, HTTP transport, parsing
//! - **Output**: Structured error values with machine-readable codes
//! - **Error Categories**: Configuration, Validation, Auth, Retry, Transport
//!
//! ## Key Features
//! - Machine-readable error codes for the caller boundary
//! - Recoverability classification driving the retry loop
//! - Recovery suggestions surfaced alongside every error
//! - No raw upstream payloads escape without redaction (see `privacy`)

use thiserror::Error;

/// Result type used throughout the client
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error taxonomy for the DataJud search client
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or invalid client configuration (e.g. no API key)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Bad input caught before any network call, or an upstream HTTP 400
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Upstream rejected the credentials (HTTP 401/403), never retried
    #[error("Authentication rejected by upstream (HTTP {status})")]
    Auth { status: u16 },

    /// Transient failures persisted past the retry budget
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<SearchError>,
    },

    /// The per-request deadline elapsed before a response arrived
    #[error("Request deadline exceeded: {details}")]
    Timeout { details: String },

    /// Connection-level failure (reset, refused, DNS)
    #[error("Transport error: {details}")]
    Transport { details: String },

    /// Any other non-2xx upstream response
    #[error("Upstream returned HTTP {status}: {details}")]
    Upstream { status: u16, details: String },

    /// The upstream body could not be interpreted
    #[error("Failed to parse upstream response: {details}")]
    Parse { details: String },
}

impl SearchError {
    /// Machine-readable code exposed at the caller boundary
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::Config { .. } => "CONFIG",
            SearchError::Validation { .. } => "VALIDATION",
            SearchError::Auth { .. } => "AUTH",
            SearchError::RetriesExhausted { .. } => "RATE_LIMIT",
            SearchError::Timeout { .. } => "TIMEOUT",
            SearchError::Upstream { .. } => "UPSTREAM_ERROR",
            SearchError::Transport { .. } | SearchError::Parse { .. } => "UNKNOWN",
        }
    }

    /// Check if the error is recoverable (can be retried). Upstream
    /// statuses count only when transient (429 or 5xx), matching what the
    /// retry policy is willing to retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SearchError::Timeout { .. } | SearchError::Transport { .. } => true,
            SearchError::Upstream { status, .. } => {
                *status == 429 || (500..=599).contains(status)
            }
            _ => false,
        }
    }

    /// Get suggested recovery action, shown to callers alongside the error
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SearchError::Config { .. } => "Set the DATAJUD_API_KEY environment variable",
            SearchError::Validation { .. } => "Verify the court alias and query parameters",
            SearchError::Auth { .. } => "Verify the API key and re-enter credentials",
            SearchError::RetriesExhausted { .. } => "The upstream service is degraded, retry later",
            SearchError::Timeout { .. } => "Reduce the requested page size or retry",
            SearchError::Transport { .. } => "Check network connectivity and retry",
            SearchError::Upstream { .. } => "Retry later; the upstream returned an unexpected status",
            SearchError::Parse { .. } => "The upstream response shape changed; report this query",
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Parse {
            details: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout {
                details: err.to_string(),
            }
        } else {
            SearchError::Transport {
                details: err.to_string(),
            }
        }
    }
}
