//! # Retry Policy Module
//!
//! ## Purpose
//! Pure classifier for upstream failures plus the exponential backoff
//! schedule. The retry loop in the orchestrator is a thin driver around
//! these decisions, so the whole schedule is unit-testable without any
//! network dependency.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP status codes and transport-level errors
//! - **Output**: fatal / retry-after-backoff / retry-immediately decisions
//! - **Schedule**: base delay doubling per attempt, fixed attempt ceiling
//!
//! ## Key Features
//! - 401/403 and 400 are fatal and never retried
//! - 429 and a configured set of 5xx codes back off exponentially
//! - Connect-level failures (request never sent) retry immediately once
//!   the attempt budget allows; timeouts, connection resets and other
//!   mid-flight transport failures back off like 5xx responses
//! - Per-request deadline scaled by the requested page size

use crate::config::RetryConfig;
use crate::errors::SearchError;
use tokio::time::Duration;

/// Decision for one observed failure
#[derive(Debug)]
pub enum RetryClass {
    /// Surface the error immediately, never retry
    Fatal(SearchError),
    /// Retry after the next backoff delay
    RetryAfterBackoff(SearchError),
    /// Retry without sleeping (the request never reached upstream)
    RetryImmediate(SearchError),
}

/// Failure classifier and backoff schedule
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    retryable_statuses: Vec<u16>,
    timeout_small: Duration,
    timeout_large: Duration,
    large_size_threshold: usize,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            retryable_statuses: config.retryable_statuses.clone(),
            timeout_small: Duration::from_secs(config.timeout_small_secs),
            timeout_large: Duration::from_secs(config.timeout_large_secs),
            large_size_threshold: config.large_size_threshold,
        }
    }

    /// Classify a non-2xx HTTP status. `body` is the upstream response text,
    /// used only to enrich the error message.
    pub fn classify_status(&self, status: u16, body: &str) -> RetryClass {
        match status {
            401 | 403 => RetryClass::Fatal(SearchError::Auth { status }),
            400 => RetryClass::Fatal(SearchError::Validation {
                field: "query".to_string(),
                reason: format!("upstream rejected the query: {}", snippet(body)),
            }),
            s if self.retryable_statuses.contains(&s) => {
                RetryClass::RetryAfterBackoff(SearchError::Upstream {
                    status,
                    details: snippet(body),
                })
            }
            s => RetryClass::Fatal(SearchError::Upstream {
                status: s,
                details: snippet(body),
            }),
        }
    }

    /// Classify a transport-level error from the HTTP client.
    pub fn classify_transport(&self, err: &reqwest::Error) -> RetryClass {
        if err.is_timeout() {
            RetryClass::RetryAfterBackoff(SearchError::Timeout {
                details: err.to_string(),
            })
        } else if err.is_connect() {
            // Connection never established, safe to retry right away
            RetryClass::RetryImmediate(SearchError::Transport {
                details: err.to_string(),
            })
        } else if err.is_builder() {
            // The request could not even be constructed, retrying cannot help
            RetryClass::Fatal(SearchError::Transport {
                details: err.to_string(),
            })
        } else {
            // Resets and other mid-flight failures count as transient
            RetryClass::RetryAfterBackoff(SearchError::Transport {
                details: err.to_string(),
            })
        }
    }

    /// Delay before retry number `attempt` (zero-based): base * 2^attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.min(16))
    }

    /// Maximum number of retries after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Deadline for one HTTP call. Upstream latency scales with the page
    /// size, so large requests get the longer budget.
    pub fn request_timeout(&self, size: usize) -> Duration {
        if size > self.large_size_threshold {
            self.timeout_large
        } else {
            self.timeout_small
        }
    }
}

/// First part of an upstream body, enough for diagnostics without echoing
/// whole payloads into logs.
fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".to_string();
    }
    let mut end = MAX.min(trimmed.len());
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    if end < trimmed.len() {
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}
