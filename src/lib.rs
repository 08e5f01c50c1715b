//! # DataJud Search Client
//!
//! ## Overview
//! This library implements a resilient query client for the DataJud public
//! judicial-process search API: given a court alias and a search criterion
//! (process number, procedural class, party name, or date range) it returns
//! normalized process records while respecting upstream rate limits,
//! transient-failure behavior, and confidentiality rules.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `courts`: static registry of valid court aliases and metadata
//! - `query`: typed query-expression DSL and per-search-type query building
//! - `rate_limit`: sliding-window rate accounting shared by all callers
//! - `cache`: response cache with per-search-type time-to-live
//! - `retry`: failure classification and exponential backoff schedule
//! - `parser`: upstream envelope probing and record normalization
//! - `privacy`: confidentiality downgrades and API-key log redaction
//! - `client`: the search orchestrator tying the above together
//! - `config`: configuration management and settings
//! - `errors`: centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: court alias + search criterion + optional filters
//! - **Output**: normalized [`SearchResult`] with pagination metadata
//! - **Guarantees**: bounded worst-case latency, no credential leakage in logs
//!
//! ## Usage
//! ```rust,no_run
//! use datajud_search::{Config, DatajudClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let client = DatajudClient::new(config)?;
//!     let result = client.search_by_number("tjsp", "0001234-56.2020.8.26.0100", 10).await?;
//!     println!("Found {} of {} matching processes", result.records.len(), result.total);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod cache;
pub mod client;
pub mod config;
pub mod courts;
pub mod errors;
pub mod parser;
pub mod privacy;
pub mod query;
pub mod rate_limit;
pub mod retry;

// Re-exports for convenience
pub use client::{ClientStats, DatajudClient};
pub use config::Config;
pub use courts::{CourtCategory, CourtDescriptor, CourtRegistry};
pub use errors::{Result, SearchError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four supported query shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Exact lookup by normalized process number (NPU)
    Number,
    /// Procedural class, optionally filtered by filing date and instance
    Class,
    /// Party name match
    Party,
    /// All processes filed between two dates
    DateRange,
}

impl SearchType {
    /// Stable tag used in cache keys and logs
    pub fn tag(&self) -> &'static str {
        match self {
            SearchType::Number => "number",
            SearchType::Class => "class",
            SearchType::Party => "party",
            SearchType::DateRange => "date_range",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Court tier handling a case (grau)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instance {
    /// First-instance court (G1)
    First,
    /// Appellate instance (G2)
    Second,
    /// Special / small-claims track (JE)
    Special,
}

impl Instance {
    /// Upstream code for this instance level
    pub fn code(&self) -> &'static str {
        match self {
            Instance::First => "G1",
            Instance::Second => "G2",
            Instance::Special => "JE",
        }
    }
}

impl FromStr for Instance {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "g1" | "first" => Ok(Instance::First),
            "2" | "g2" | "second" => Ok(Instance::Second),
            "je" | "special" => Ok(Instance::Special),
            other => Err(SearchError::Validation {
                field: "instance".to_string(),
                reason: format!("unknown instance '{}', expected G1, G2 or JE", other),
            }),
        }
    }
}

/// Optional narrowing filters attached to a search request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Inclusive lower bound on filing date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on filing date
    pub date_to: Option<NaiveDate>,
    /// Restrict to a single instance level
    pub instance: Option<Instance>,
}

/// A single search request against one court
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Court alias, must resolve in the [`CourtRegistry`]
    pub court: String,
    /// Which of the four query shapes to build
    pub search_type: SearchType,
    /// Primary search value (process number, class, or party name)
    pub value: String,
    /// Optional narrowing filters
    #[serde(default)]
    pub filters: SearchFilters,
    /// Requested result count, clamped to the upstream maximum
    pub size: usize,
}

impl SearchRequest {
    /// Check request invariants before any cache or network activity.
    ///
    /// `date_range` requires both bounds; every other type requires a
    /// non-empty primary value.
    pub fn validate(&self) -> Result<()> {
        match self.search_type {
            SearchType::DateRange => {
                if self.filters.date_from.is_none() || self.filters.date_to.is_none() {
                    return Err(SearchError::Validation {
                        field: "filters".to_string(),
                        reason: "date_range searches require both date_from and date_to"
                            .to_string(),
                    });
                }
            }
            _ => {
                if self.value.trim().is_empty() {
                    return Err(SearchError::Validation {
                        field: "value".to_string(),
                        reason: format!("{} searches require a non-empty value", self.search_type),
                    });
                }
            }
        }
        if self.size == 0 {
            return Err(SearchError::Validation {
                field: "size".to_string(),
                reason: "requested size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Procedural class of a process (code plus display name)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessClass {
    pub code: u32,
    pub name: String,
}

/// A party to a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    /// Pole of the party (active/passive) as reported by upstream
    pub role: String,
}

/// A procedural movement recorded on a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub code: u32,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
}

/// A normalized judicial process record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Normalized numeric process number (digits only)
    pub process_number: String,
    /// Procedural class
    pub class: ProcessClass,
    /// Court alias this record belongs to
    pub court: String,
    /// Instance code as reported by upstream (G1, G2, JE)
    pub instance: String,
    /// Filing date (dataAjuizamento)
    pub filing_date: Option<NaiveDate>,
    /// Confidentiality level (nivelSigilo); 0 = public
    pub confidentiality_level: u32,
    /// Last update timestamp reported by upstream
    pub last_update: Option<DateTime<Utc>>,
    /// Parties to the process; always empty for restricted records
    pub parties: Vec<Party>,
    /// Procedural movements; always empty for restricted records
    pub movements: Vec<Movement>,
    /// Set when confidentiality rules withheld detail fields
    pub restriction_notice: Option<String>,
}

/// Result of one search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Records in upstream order (stable for a given query)
    pub records: Vec<ProcessRecord>,
    /// Upstream-reported total match count, may exceed `records.len()`
    pub total: u64,
    /// Whether more results exist beyond what was returned
    pub has_more: bool,
}

/// Format a normalized process number in the punctuated CNJ form
/// (NNNNNNN-DD.AAAA.J.TR.OOOO). Inputs that are not 20 digits long are
/// returned unchanged.
pub fn format_process_number(digits: &str) -> String {
    if digits.len() != 20 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }
    format!(
        "{}-{}.{}.{}.{}.{}",
        &digits[0..7],
        &digits[7..9],
        &digits[9..13],
        &digits[13..14],
        &digits[14..16],
        &digits[16..20]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_requires_both_bounds() {
        let request = SearchRequest {
            court: "tjsp".to_string(),
            search_type: SearchType::DateRange,
            value: String::new(),
            filters: SearchFilters {
                date_from: Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
                date_to: None,
                instance: None,
            },
            size: 10,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn non_range_types_require_a_value() {
        let request = SearchRequest {
            court: "tjsp".to_string(),
            search_type: SearchType::Party,
            value: "   ".to_string(),
            filters: SearchFilters::default(),
            size: 10,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn instance_parses_common_spellings() {
        assert_eq!("G1".parse::<Instance>().unwrap(), Instance::First);
        assert_eq!("2".parse::<Instance>().unwrap(), Instance::Second);
        assert_eq!("je".parse::<Instance>().unwrap(), Instance::Special);
        assert!("G3".parse::<Instance>().is_err());
    }

    #[test]
    fn process_number_formatting() {
        assert_eq!(
            format_process_number("00012345620208260100"),
            "0001234-56.2020.8.26.0100"
        );
        // Non-standard inputs pass through untouched
        assert_eq!(format_process_number("12345"), "12345");
    }
}
