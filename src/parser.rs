//! # Response Parser Module
//!
//! ## Purpose
//! Normalizes the upstream JSON envelope into domain [`ProcessRecord`]s and
//! pagination metadata. The upstream contract is loose: deployments differ
//! in where they nest fields, and individual hits routinely omit fields, so
//! parsing probes an ordered list of known shapes and defaults instead of
//! failing.
//!
//! ## Input/Output Specification
//! - **Input**: raw response body as `serde_json::Value`, requested size
//! - **Output**: [`SearchResult`] with records in upstream order
//! - **Tolerance**: absent fields default to empty string / zero; partial
//!   records are still surfaced
//!
//! ## Key Features
//! - Total-count extraction probes the object form (`hits.total.value`)
//!   before the bare numeric form (`hits.total`)
//! - Per-hit fields probed at the `_source` top level and under the
//!   `dadosBasicos` namespace
//! - `has_more` derived as returned count < upstream total

use crate::{Movement, Party, ProcessClass, ProcessRecord, SearchResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Normalize one upstream response body into a search result.
///
/// `court` stamps the originating court alias onto each record; upstream
/// payloads carry it inconsistently. Records beyond `requested_size` are
/// dropped defensively.
pub fn parse(raw: &Value, court: &str, requested_size: usize) -> SearchResult {
    let hits = raw.get("hits");
    let total = hits.map_or(0, extract_total);
    let mut records: Vec<ProcessRecord> = hits
        .and_then(|h| h.get("hits"))
        .and_then(Value::as_array)
        .map(|array| array.iter().map(|hit| parse_hit(hit, court)).collect())
        .unwrap_or_default();
    records.truncate(requested_size);

    let has_more = (records.len() as u64) < total;
    SearchResult {
        records,
        total,
        has_more,
    }
}

/// Ordered extraction strategies for the total match count: newer
/// deployments report `total` as an object with a `value` field, older
/// ones as a bare number.
fn extract_total(hits: &Value) -> u64 {
    let Some(total) = hits.get("total") else {
        return 0;
    };
    total
        .get("value")
        .and_then(Value::as_u64)
        .or_else(|| total.as_u64())
        .unwrap_or(0)
}

fn parse_hit(hit: &Value, court: &str) -> ProcessRecord {
    // Some deployments return bare documents without the _source wrapper
    let source = hit.get("_source").unwrap_or(hit);

    ProcessRecord {
        process_number: str_field(source, "numeroProcesso"),
        class: parse_class(source),
        court: field(source, "tribunal")
            .and_then(Value::as_str)
            .unwrap_or(court)
            .to_ascii_lowercase(),
        instance: str_field(source, "grau"),
        filing_date: field(source, "dataAjuizamento")
            .and_then(Value::as_str)
            .and_then(parse_date),
        confidentiality_level: field(source, "nivelSigilo")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
        last_update: field(source, "dataHoraUltimaAtualizacao")
            .and_then(Value::as_str)
            .and_then(parse_datetime),
        parties: parse_parties(source),
        movements: parse_movements(source),
        restriction_notice: None,
    }
}

/// Probe a field at the source top level, then under the `dadosBasicos`
/// namespace used by some deployments.
fn field<'a>(source: &'a Value, name: &str) -> Option<&'a Value> {
    source
        .get(name)
        .or_else(|| source.get("dadosBasicos").and_then(|nested| nested.get(name)))
}

fn str_field(source: &Value, name: &str) -> String {
    field(source, name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_class(source: &Value) -> ProcessClass {
    let Some(class) = field(source, "classe") else {
        return ProcessClass::default();
    };
    ProcessClass {
        code: class.get("codigo").and_then(Value::as_u64).unwrap_or(0) as u32,
        name: class
            .get("nome")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn parse_parties(source: &Value) -> Vec<Party> {
    field(source, "partes")
        .and_then(Value::as_array)
        .map(|parties| {
            parties
                .iter()
                .map(|p| Party {
                    name: p
                        .get("nome")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    role: p
                        .get("polo")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_movements(source: &Value) -> Vec<Movement> {
    field(source, "movimentos")
        .and_then(Value::as_array)
        .map(|movements| {
            movements
                .iter()
                .map(|m| Movement {
                    code: m.get("codigo").and_then(Value::as_u64).unwrap_or(0) as u32,
                    name: m
                        .get("nome")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    date: m
                        .get("dataHora")
                        .and_then(Value::as_str)
                        .and_then(parse_datetime),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Dates arrive either as plain `YYYY-MM-DD` or as a full timestamp; take
/// the date prefix and tolerate everything else as absent.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
