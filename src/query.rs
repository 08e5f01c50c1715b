//! # Query Builder Module
//!
//! ## Purpose
//! Translates a (search type, value, filters) tuple into the upstream query
//! DSL. Queries are built from a small closed set of typed expression
//! variants and serialized exactly once at the HTTP boundary, so every
//! search type is guaranteed to produce a well-formed nested structure.
//!
//! ## Input/Output Specification
//! - **Input**: search type, primary value, requested size, optional filters
//! - **Output**: [`SearchBody`] ready for JSON serialization
//! - **Edge cases**: absent filter bounds omit the clause entirely; values
//!   that are already digit-only normalize to themselves
//!
//! ## Key Features
//! - Typed `Match` / `Range` / `Bool` / `MatchAll` expression variants
//! - Size clamped to the upstream maximum before inclusion
//! - Deterministic sort key appended to every query for stable pagination

use crate::errors::{Result, SearchError};
use crate::{SearchFilters, SearchType};
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Upstream-imposed maximum page size
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Closed set of query expressions understood by the upstream DSL
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    /// Match a single field against a value
    Match { field: String, value: Value },
    /// Match every document
    MatchAll,
    /// Inclusive range on a field; at least one bound is always present
    Range {
        field: String,
        gte: Option<String>,
        lte: Option<String>,
    },
    /// Boolean combination of sub-expressions
    Bool {
        must: Vec<QueryExpression>,
        filter: Vec<QueryExpression>,
    },
}

impl QueryExpression {
    /// Serialize into the upstream JSON shape. Absent range bounds are
    /// omitted rather than emitted as null, and empty bool sections are
    /// dropped entirely.
    pub fn to_json(&self) -> Value {
        match self {
            QueryExpression::Match { field, value } => json!({ "match": { field: value } }),
            QueryExpression::MatchAll => json!({ "match_all": {} }),
            QueryExpression::Range { field, gte, lte } => {
                let mut bounds = serde_json::Map::new();
                if let Some(gte) = gte {
                    bounds.insert("gte".to_string(), Value::String(gte.clone()));
                }
                if let Some(lte) = lte {
                    bounds.insert("lte".to_string(), Value::String(lte.clone()));
                }
                json!({ "range": { field: bounds } })
            }
            QueryExpression::Bool { must, filter } => {
                let mut sections = serde_json::Map::new();
                if !must.is_empty() {
                    sections.insert(
                        "must".to_string(),
                        Value::Array(must.iter().map(QueryExpression::to_json).collect()),
                    );
                }
                if !filter.is_empty() {
                    sections.insert(
                        "filter".to_string(),
                        Value::Array(filter.iter().map(QueryExpression::to_json).collect()),
                    );
                }
                json!({ "bool": sections })
            }
        }
    }
}

/// Complete request body for the upstream `_search` endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBody {
    pub query: QueryExpression,
    pub size: usize,
}

impl SearchBody {
    /// Serialize once at the HTTP boundary. The sort key on the internal
    /// document id makes pagination repeatable for a given query.
    pub fn to_json(&self) -> Value {
        json!({
            "query": self.query.to_json(),
            "size": self.size,
            "sort": [ { "_id": { "order": "asc" } } ],
        })
    }
}

/// Strip everything but digits from a process number. Digit-only inputs
/// come back unchanged.
pub fn normalize_process_number(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Clamp a requested size to the upstream maximum
pub fn clamp_size(size: usize) -> usize {
    size.clamp(1, MAX_PAGE_SIZE)
}

/// Build the upstream query for one search request.
///
/// The size is clamped before inclusion; the same clamped value must be used
/// for the cache key so that over-sized requests share cache entries.
pub fn build(
    search_type: SearchType,
    value: &str,
    size: usize,
    filters: &SearchFilters,
) -> Result<SearchBody> {
    let query = match search_type {
        SearchType::Number => {
            let digits = normalize_process_number(value);
            if digits.is_empty() {
                return Err(SearchError::Validation {
                    field: "value".to_string(),
                    reason: format!("'{}' contains no digits to match a process number", value),
                });
            }
            QueryExpression::Match {
                field: "numeroProcesso".to_string(),
                value: Value::String(digits),
            }
        }
        SearchType::Class => {
            let mut must = vec![class_clause(value)];
            let mut filter = Vec::new();
            if let Some(range) = filing_date_range(filters.date_from, filters.date_to) {
                filter.push(range);
            }
            if let Some(instance) = filters.instance {
                must.push(QueryExpression::Match {
                    field: "grau".to_string(),
                    value: Value::String(instance.code().to_string()),
                });
            }
            QueryExpression::Bool { must, filter }
        }
        SearchType::Party => QueryExpression::Match {
            field: "partes.nome".to_string(),
            value: Value::String(value.to_string()),
        },
        SearchType::DateRange => {
            // Request validation guarantees both bounds are present here
            let range = filing_date_range(filters.date_from, filters.date_to).ok_or_else(|| {
                SearchError::Validation {
                    field: "filters".to_string(),
                    reason: "date_range searches require both date_from and date_to".to_string(),
                }
            })?;
            let mut must = vec![QueryExpression::MatchAll];
            if let Some(instance) = filters.instance {
                must.push(QueryExpression::Match {
                    field: "grau".to_string(),
                    value: Value::String(instance.code().to_string()),
                });
            }
            QueryExpression::Bool {
                must,
                filter: vec![range],
            }
        }
    };

    Ok(SearchBody {
        query,
        size: clamp_size(size),
    })
}

/// Numeric class values match the class code; anything else matches the
/// class display name.
fn class_clause(value: &str) -> QueryExpression {
    match value.trim().parse::<u64>() {
        Ok(code) => QueryExpression::Match {
            field: "classe.codigo".to_string(),
            value: json!(code),
        },
        Err(_) => QueryExpression::Match {
            field: "classe.nome".to_string(),
            value: Value::String(value.to_string()),
        },
    }
}

/// Inclusive range clause on the filing date, omitted entirely when neither
/// bound is set.
fn filing_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<QueryExpression> {
    if from.is_none() && to.is_none() {
        return None;
    }
    Some(QueryExpression::Range {
        field: "dataAjuizamento".to_string(),
        gte: from.map(|d| d.format("%Y-%m-%d").to_string()),
        lte: to.map(|d| d.format("%Y-%m-%d").to_string()),
    })
}
