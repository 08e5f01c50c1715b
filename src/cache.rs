//! # Response Cache Module
//!
//! ## Purpose
//! Caches computed search results keyed by the canonical serialization of
//! the query parameters, so repeated lookups inside the TTL window are
//! served without touching the rate limiter or the network.
//!
//! ## Input/Output Specification
//! - **Input**: cache keys derived from validated requests, search results
//! - **Output**: cloned results on hit, misses on expiry or absence
//! - **Eviction**: purely on-read; expired entries are removed when seen
//!
//! ## Key Features
//! - TTL derived from the explicit search-type tag at read time: exact
//!   number lookups cache longer than open-ended class/party/date searches
//! - Concurrent map; entries are immutable once written, concurrent writes
//!   for the same key are last-write-wins
//! - No background sweep; memory is bounded by distinct queries issued

use crate::config::CacheConfig;
use crate::query;
use crate::{SearchRequest, SearchResult, SearchType};
use dashmap::DashMap;
use tokio::time::{Duration, Instant};

/// Canonical cache key for one query.
///
/// Carries the search type explicitly so TTL selection never depends on
/// the serialized key format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    search_type: SearchType,
    canonical: String,
}

impl CacheKey {
    /// Build the canonical key from a validated request. The clamped size
    /// is part of the key, so an over-sized request shares the entry of
    /// its clamped equivalent.
    pub fn new(request: &SearchRequest) -> Self {
        let value = match request.search_type {
            SearchType::Number => query::normalize_process_number(&request.value),
            _ => request.value.trim().to_string(),
        };
        let fmt_date = |d: Option<chrono::NaiveDate>| {
            d.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
        };
        let canonical = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            request.court.trim().to_ascii_lowercase(),
            request.search_type.tag(),
            value,
            query::clamp_size(request.size),
            fmt_date(request.filters.date_from),
            fmt_date(request.filters.date_to),
            request
                .filters
                .instance
                .map_or("-", |instance| instance.code()),
        );
        Self {
            search_type: request.search_type,
            canonical,
        }
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

struct CacheEntry {
    result: SearchResult,
    created: Instant,
}

/// Concurrent response cache with per-search-type TTL
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    number_ttl: Duration,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            number_ttl: Duration::from_secs(config.number_ttl_secs),
            default_ttl: Duration::from_secs(config.default_ttl_secs),
        }
    }

    /// TTL for a key, chosen from its explicit search-type tag. A specific
    /// filed process changes rarely; open-ended result sets are volatile.
    fn ttl_for(&self, search_type: SearchType) -> Duration {
        match search_type {
            SearchType::Number => self.number_ttl,
            SearchType::Class | SearchType::Party | SearchType::DateRange => self.default_ttl,
        }
    }

    /// Look up a fresh entry; expired entries are treated as a miss and
    /// evicted on the spot.
    pub fn get(&self, key: &CacheKey) -> Option<SearchResult> {
        let ttl = self.ttl_for(key.search_type);
        {
            let entry = self.entries.get(key.canonical())?;
            if entry.created.elapsed() < ttl {
                return Some(entry.result.clone());
            }
        }
        // Guard dropped above; safe to evict
        self.entries.remove(key.canonical());
        None
    }

    /// Store a result. A write simply replaces any prior entry for the key.
    pub fn put(&self, key: &CacheKey, result: SearchResult) {
        self.entries.insert(
            key.canonical().to_string(),
            CacheEntry {
                result,
                created: Instant::now(),
            },
        );
    }

    /// Number of entries currently held (including not-yet-evicted expired ones)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchFilters;

    fn request(search_type: SearchType, value: &str, size: usize) -> SearchRequest {
        SearchRequest {
            court: "tjsp".to_string(),
            search_type,
            value: value.to_string(),
            filters: SearchFilters::default(),
            size,
        }
    }

    fn empty_result() -> SearchResult {
        SearchResult {
            records: Vec::new(),
            total: 0,
            has_more: false,
        }
    }

    fn config(number_ttl_secs: u64, default_ttl_secs: u64) -> CacheConfig {
        CacheConfig {
            number_ttl_secs,
            default_ttl_secs,
        }
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache = ResponseCache::new(&config(300, 60));
        let key = CacheKey::new(&request(SearchType::Number, "123", 10));
        cache.put(&key, empty_result());
        assert_eq!(cache.get(&key), Some(empty_result()));
    }

    #[test]
    fn expired_entries_miss_and_are_evicted_on_read() {
        // Zero TTL: every entry is expired as soon as it is read
        let cache = ResponseCache::new(&config(0, 0));
        let key = CacheKey::new(&request(SearchType::Party, "Maria", 10));
        cache.put(&key, empty_result());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clamped_size_appears_in_the_key() {
        let over = CacheKey::new(&request(SearchType::Number, "123", 50_000));
        let capped = CacheKey::new(&request(SearchType::Number, "123", 10_000));
        assert_eq!(over, capped);
        assert!(over.canonical().contains("|10000|"));
    }

    #[test]
    fn number_values_normalize_into_the_key() {
        let punctuated = CacheKey::new(&request(
            SearchType::Number,
            "0001234-56.2020.8.26.0100",
            10,
        ));
        let plain = CacheKey::new(&request(SearchType::Number, "00012345620208260100", 10));
        assert_eq!(punctuated, plain);
    }

    #[test]
    fn distinct_search_types_use_distinct_keys() {
        let number = CacheKey::new(&request(SearchType::Number, "123", 10));
        let class = CacheKey::new(&request(SearchType::Class, "123", 10));
        assert_ne!(number.canonical(), class.canonical());
    }
}
