//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the DataJud search client, supporting a
//! TOML file with environment-variable overrides and validation with
//! detailed error messages.
//!
//! ## Input/Output Specification
//! - **Input**: configuration file (TOML), environment variables
//! - **Output**: validated configuration structs with defaults
//! - **Validation**: range checks and dependency verification
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`DATAJUD_API_KEY`, `DATAJUD_BASE_URL`)
//! 2. Configuration file
//! 3. Default values
//!
//! The API key is deliberately NOT validated at load time: its absence is a
//! configuration error surfaced at the first search attempt, so callers that
//! never touch this subsystem can still start.

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure containing all client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API endpoint and credentials
    pub upstream: UpstreamConfig,
    /// Request pacing constraints
    pub rate_limit: RateLimitConfig,
    /// Failure classification and backoff
    pub retry: RetryConfig,
    /// Response cache lifetimes
    pub cache: CacheConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API base URL
    pub base_url: String,
    /// API key; absent until the environment provides one
    pub api_key: Option<String>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests within any trailing 60-second window
    pub requests_per_minute: u32,
    /// Minimum gap between consecutive requests (ms), smooths bursts
    pub min_interval_ms: u64,
}

/// Retry and deadline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay (ms); doubles after each attempt
    pub base_delay_ms: u64,
    /// Status codes treated as transient
    pub retryable_statuses: Vec<u16>,
    /// Deadline for small-page requests (seconds)
    pub timeout_small_secs: u64,
    /// Deadline for large-page requests (seconds)
    pub timeout_large_secs: u64,
    /// Page sizes above this use the large deadline
    pub large_size_threshold: usize,
}

/// Cache TTL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for exact process-number lookups (seconds)
    pub number_ttl_secs: u64,
    /// TTL for class, party and date-range searches (seconds)
    pub default_ttl_secs: u64,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("datajud.toml")
    }

    /// Load configuration from a specific file. A missing file falls back
    /// to defaults; the environment still applies on top.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
                message: format!("Failed to read config file {:?}: {}", path, e),
            })?;
            toml::from_str(&content).map_err(|e| SearchError::Config {
                message: format!("Failed to parse config file {:?}: {}", path, e),
            })?
        } else {
            tracing::debug!("Configuration file not found: {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("DATAJUD_API_KEY") {
            if !api_key.is_empty() {
                self.upstream.api_key = Some(api_key);
            }
        }
        if let Ok(base_url) = std::env::var("DATAJUD_BASE_URL") {
            if !base_url.is_empty() {
                self.upstream.base_url = base_url;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(SearchError::Config {
                message: "upstream.base_url cannot be empty".to_string(),
            });
        }
        if self.rate_limit.requests_per_minute == 0 {
            return Err(SearchError::Config {
                message: "rate_limit.requests_per_minute must be at least 1".to_string(),
            });
        }
        if self.retry.timeout_small_secs == 0 || self.retry.timeout_large_secs == 0 {
            return Err(SearchError::Config {
                message: "retry timeouts must be greater than zero".to_string(),
            });
        }
        if self.retry.timeout_small_secs > self.retry.timeout_large_secs {
            return Err(SearchError::Config {
                message: "retry.timeout_small_secs cannot exceed retry.timeout_large_secs"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Get configuration as a TOML string, with the API key omitted
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut copy = self.clone();
        copy.upstream.api_key = None;
        toml::to_string_pretty(&copy).map_err(|e| SearchError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig {
                base_url: "https://api-publica.datajud.cnj.jus.br".to_string(),
                api_key: None,
                user_agent: "datajud-search/0.1".to_string(),
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: 60,
                min_interval_ms: 500,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 1000,
                retryable_statuses: vec![429, 500, 502, 503, 504],
                timeout_small_secs: 15,
                timeout_large_secs: 60,
                large_size_threshold: 1000,
            },
            cache: CacheConfig {
                number_ttl_secs: 300,
                default_ttl_secs: 60,
            },
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Config::default().retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn empty_base_url_fails_validation() {
        let mut config = Config::default();
        config.upstream.base_url = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG");
    }

    #[test]
    fn zero_rate_limit_fails_validation() {
        let mut config = Config::default();
        config.rate_limit.requests_per_minute = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_timeouts_fail_validation() {
        let mut config = Config::default();
        config.retry.timeout_small_secs = 120;
        config.retry.timeout_large_secs = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_a_partial_overrides_file() {
        let toml = r#"
            [upstream]
            base_url = "http://localhost:9200"
            user_agent = "test-agent"

            [rate_limit]
            requests_per_minute = 10
            min_interval_ms = 0

            [retry]
            max_retries = 1
            base_delay_ms = 10
            retryable_statuses = [503]
            timeout_small_secs = 1
            timeout_large_secs = 2
            large_size_threshold = 100

            [cache]
            number_ttl_secs = 5
            default_ttl_secs = 1
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.upstream.base_url, "http://localhost:9200");
        assert_eq!(config.rate_limit.requests_per_minute, 10);
        assert_eq!(config.retry.retryable_statuses, vec![503]);
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn redacted_toml_never_contains_the_key() {
        let mut config = Config::default();
        config.upstream.api_key = Some("abc123-def".to_string());
        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("abc123-def"));
    }
}
