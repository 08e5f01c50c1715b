//! # Search Orchestrator Module
//!
//! ## Purpose
//! The façade tying the client together. Each request flows through
//! validation, the response cache, the rate-limit gate, the HTTP call under
//! a size-scaled deadline, the retry loop, parsing, and the privacy filter
//! before the cache is populated and the result returned.
//!
//! ## Input/Output Specification
//! - **Input**: [`SearchRequest`] or one of the typed convenience operations
//! - **Output**: normalized [`SearchResult`] or a structured [`SearchError`]
//! - **Concurrency**: safe to call from any number of tasks; only the
//!   rate-limit gate serializes callers
//!
//! ## Key Features
//! - Unknown court aliases and malformed requests rejected before any
//!   cache or network activity
//! - API key read lazily at the first search, not at construction
//! - Retry exhaustion surfaces a distinct error so callers can tell
//!   "upstream is down" from "upstream rejected this query"
//! - Dropping the returned future aborts the in-flight HTTP call; a
//!   recorded rate-limit slot stays consumed

use crate::cache::{CacheKey, ResponseCache};
use crate::config::Config;
use crate::courts::{CourtCategory, CourtDescriptor, CourtRegistry};
use crate::errors::{Result, SearchError};
use crate::parser;
use crate::privacy;
use crate::query;
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryClass, RetryPolicy};
use crate::{Instance, SearchFilters, SearchRequest, SearchResult, SearchType};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::sleep;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Resilient search client for the DataJud public API
pub struct DatajudClient {
    config: Config,
    http: reqwest::Client,
    registry: CourtRegistry,
    cache: ResponseCache,
    limiter: RateLimiter,
    policy: RetryPolicy,
    requests_issued: AtomicU64,
}

/// Point-in-time snapshot of client activity
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub cache_entries: usize,
    pub requests_issued: u64,
    pub rate_window_load: usize,
}

impl DatajudClient {
    /// Build a client from validated configuration. No credential check
    /// happens here; a missing API key only fails the first search.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(config.upstream.user_agent.clone())
            .build()
            .map_err(|e| SearchError::Transport {
                details: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            cache: ResponseCache::new(&config.cache),
            limiter: RateLimiter::new(&config.rate_limit),
            policy: RetryPolicy::new(&config.retry),
            registry: CourtRegistry::new(),
            requests_issued: AtomicU64::new(0),
            http,
            config,
        })
    }

    /// Exact lookup by process number. Non-digit characters in the number
    /// are stripped before matching.
    pub async fn search_by_number(
        &self,
        court: &str,
        number: &str,
        size: usize,
    ) -> Result<SearchResult> {
        self.search(SearchRequest {
            court: court.to_string(),
            search_type: SearchType::Number,
            value: number.to_string(),
            filters: SearchFilters::default(),
            size,
        })
        .await
    }

    /// Search by procedural class (code or name), optionally narrowed by
    /// filing date and instance.
    pub async fn search_by_class(
        &self,
        court: &str,
        class: &str,
        size: usize,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        instance: Option<Instance>,
    ) -> Result<SearchResult> {
        self.search(SearchRequest {
            court: court.to_string(),
            search_type: SearchType::Class,
            value: class.to_string(),
            filters: SearchFilters {
                date_from,
                date_to,
                instance,
            },
            size,
        })
        .await
    }

    /// Search by party name. Upstream does not index party-level date
    /// ranges, so no further filters apply.
    pub async fn search_by_party(
        &self,
        court: &str,
        party_name: &str,
        size: usize,
    ) -> Result<SearchResult> {
        self.search(SearchRequest {
            court: court.to_string(),
            search_type: SearchType::Party,
            value: party_name.to_string(),
            filters: SearchFilters::default(),
            size,
        })
        .await
    }

    /// All processes filed between two dates (inclusive).
    pub async fn search_by_date_range(
        &self,
        court: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
        size: usize,
        instance: Option<Instance>,
    ) -> Result<SearchResult> {
        self.search(SearchRequest {
            court: court.to_string(),
            search_type: SearchType::DateRange,
            value: String::new(),
            filters: SearchFilters {
                date_from: Some(date_from),
                date_to: Some(date_to),
                instance,
            },
            size,
        })
        .await
    }

    /// List registered courts, optionally filtered by category.
    pub fn list_courts(&self, category: Option<CourtCategory>) -> Vec<CourtDescriptor> {
        self.registry
            .list(category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Run one search request through the full pipeline.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "search",
            %request_id,
            court = %request.court,
            search_type = %request.search_type,
        );
        self.search_inner(request).instrument(span).await
    }

    /// Activity snapshot for diagnostics.
    pub async fn stats(&self) -> ClientStats {
        ClientStats {
            cache_entries: self.cache.len(),
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            rate_window_load: self.limiter.current_load().await,
        }
    }

    async fn search_inner(&self, request: SearchRequest) -> Result<SearchResult> {
        request.validate()?;
        let court = self.registry.resolve(&request.court)?.alias;

        let key = CacheKey::new(&request);
        if let Some(hit) = self.cache.get(&key) {
            debug!(records = hit.records.len(), "served from cache");
            return Ok(hit);
        }

        let body = query::build(
            request.search_type,
            &request.value,
            request.size,
            &request.filters,
        )?;
        let size = body.size;
        let api_key = self.api_key()?;
        let url = format!(
            "{}/api_publica_{}/_search",
            self.config.upstream.base_url.trim_end_matches('/'),
            court
        );

        let raw = self
            .execute_with_retry(&url, &api_key, &body.to_json(), size)
            .await?;

        let parsed = parser::parse(&raw, court, size);
        let result = SearchResult {
            records: parsed.records.into_iter().map(privacy::apply).collect(),
            total: parsed.total,
            has_more: parsed.has_more,
        };

        self.cache.put(&key, result.clone());
        debug!(
            records = result.records.len(),
            total = result.total,
            "search completed"
        );
        Ok(result)
    }

    /// The retry loop: a thin driver around [`RetryPolicy`] decisions.
    /// Every attempt passes the rate-limit gate before touching the wire.
    async fn execute_with_retry(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
        size: usize,
    ) -> Result<Value> {
        let timeout = self.policy.request_timeout(size);
        let mut attempt: u32 = 0;

        loop {
            self.limiter.acquire().await;
            self.requests_issued.fetch_add(1, Ordering::Relaxed);

            let outcome = self
                .http
                .post(url)
                .header(
                    reqwest::header::AUTHORIZATION,
                    format!("APIKey {}", api_key),
                )
                .timeout(timeout)
                .json(body)
                .send()
                .await;

            let class = match outcome {
                Ok(response) if response.status().is_success() => {
                    return response.json().await.map_err(|e| SearchError::Parse {
                        details: e.to_string(),
                    });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    self.policy.classify_status(status, &text)
                }
                Err(err) => self.policy.classify_transport(&err),
            };

            match class {
                RetryClass::Fatal(err) => {
                    warn!(
                        code = err.code(),
                        "search failed: {}",
                        privacy::redact_api_key(&err.to_string())
                    );
                    return Err(err);
                }
                RetryClass::RetryAfterBackoff(err) | RetryClass::RetryImmediate(err)
                    if attempt >= self.policy.max_retries() =>
                {
                    let attempts = attempt + 1;
                    warn!(
                        attempts,
                        "retry budget exhausted: {}",
                        privacy::redact_api_key(&err.to_string())
                    );
                    return Err(SearchError::RetriesExhausted {
                        attempts,
                        last: Box::new(err),
                    });
                }
                RetryClass::RetryAfterBackoff(err) => {
                    let delay = self.policy.backoff_delay(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, backing off: {}",
                        privacy::redact_api_key(&err.to_string())
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                RetryClass::RetryImmediate(err) => {
                    debug!(
                        attempt,
                        "connection failed before the request was sent, retrying: {}",
                        privacy::redact_api_key(&err.to_string())
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// The key comes from configuration or the process environment; its
    /// absence is a configuration error raised here, at the first search.
    fn api_key(&self) -> Result<String> {
        if let Some(key) = &self.config.upstream.api_key {
            return Ok(key.clone());
        }
        std::env::var("DATAJUD_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SearchError::Config {
                message: "no API key configured; set DATAJUD_API_KEY".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyless_config() -> Config {
        let mut config = Config::default();
        config.upstream.api_key = None;
        config
    }

    #[test]
    fn construction_succeeds_without_an_api_key() {
        assert!(DatajudClient::new(keyless_config()).is_ok());
    }

    #[tokio::test]
    async fn validation_rejects_unknown_courts_before_any_network_call() {
        let client = DatajudClient::new(keyless_config()).unwrap();
        let err = client.search_by_number("tjxx", "123", 10).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        // Nothing was issued against the wire
        assert_eq!(client.stats().await.requests_issued, 0);
    }

    #[tokio::test]
    async fn missing_api_key_surfaces_at_the_first_search() {
        // Guard against ambient credentials leaking into the test
        if std::env::var("DATAJUD_API_KEY").is_ok() {
            return;
        }
        let client = DatajudClient::new(keyless_config()).unwrap();
        let err = client.search_by_number("tjsp", "123", 10).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG");
    }

    #[test]
    fn list_courts_filters_by_category() {
        let client = DatajudClient::new(keyless_config()).unwrap();
        let superior = client.list_courts(Some(CourtCategory::Superior));
        assert_eq!(superior.len(), 4);
        assert!(client.list_courts(None).len() > superior.len());
    }
}
