//! # Privacy Module
//!
//! ## Purpose
//! Enforces the two privacy guarantees of the client: records carrying a
//! non-zero confidentiality level never expose party or movement detail,
//! and no logged representation of a request or error ever contains the
//! API key.
//!
//! ## Input/Output Specification
//! - **Input**: parsed process records, log-bound strings
//! - **Output**: downgraded records, redacted strings
//!
//! ## Key Features
//! - Structural fields (number, class, court, dates) survive the downgrade
//! - Detail fields are withheld entirely, with an explicit notice, rather
//!   than masked field by field
//! - Redaction happens before any string reaches a log sink

use crate::ProcessRecord;
use regex::Regex;
use std::sync::OnceLock;

/// Notice attached to records whose detail fields were withheld
pub const RESTRICTION_NOTICE: &str =
    "Processo sob sigilo: partes e movimentações não são exibidas.";

static API_KEY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn api_key_pattern() -> &'static Regex {
    API_KEY_PATTERN.get_or_init(|| Regex::new(r"APIKey\s+[\w-]+").unwrap())
}

/// Downgrade a record according to its confidentiality level.
///
/// Level 0 passes through unchanged. Any higher level keeps the structural
/// fields but drops parties and movements and sets the restriction notice,
/// so callers asking for detail receive an explicit refusal instead of raw
/// data.
pub fn apply(mut record: ProcessRecord) -> ProcessRecord {
    if record.confidentiality_level == 0 {
        return record;
    }
    record.parties.clear();
    record.movements.clear();
    record.restriction_notice = Some(RESTRICTION_NOTICE.to_string());
    record
}

/// Redact the API key from any string headed for a log sink or an error
/// message surfaced to callers.
pub fn redact_api_key(input: &str) -> String {
    api_key_pattern()
        .replace_all(input, "APIKey [REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Movement, Party, ProcessClass};

    fn record(confidentiality_level: u32) -> ProcessRecord {
        ProcessRecord {
            process_number: "00012345620208260100".to_string(),
            class: ProcessClass {
                code: 1116,
                name: "Monitória".to_string(),
            },
            court: "tjsp".to_string(),
            instance: "G1".to_string(),
            filing_date: None,
            confidentiality_level,
            last_update: None,
            parties: vec![Party {
                name: "Maria da Silva".to_string(),
                role: "AT".to_string(),
            }],
            movements: vec![Movement {
                code: 26,
                name: "Distribuição".to_string(),
                date: None,
            }],
            restriction_notice: None,
        }
    }

    #[test]
    fn public_records_pass_through_unchanged() {
        let filtered = apply(record(0));
        assert_eq!(filtered.parties.len(), 1);
        assert_eq!(filtered.movements.len(), 1);
        assert!(filtered.restriction_notice.is_none());
    }

    #[test]
    fn restricted_records_never_expose_detail() {
        let filtered = apply(record(2));
        assert!(filtered.parties.is_empty());
        assert!(filtered.movements.is_empty());
        assert_eq!(filtered.restriction_notice.as_deref(), Some(RESTRICTION_NOTICE));
        // Structural fields survive the downgrade
        assert_eq!(filtered.process_number, "00012345620208260100");
        assert_eq!(filtered.class.code, 1116);
    }

    #[test]
    fn api_keys_are_redacted_from_log_strings() {
        let redacted = redact_api_key("Authorization: APIKey abc123-def");
        assert!(!redacted.contains("abc123-def"));
        assert_eq!(redacted, "Authorization: APIKey [REDACTED]");
    }

    #[test]
    fn redaction_leaves_unrelated_text_alone() {
        let input = "upstream returned HTTP 503: try again";
        assert_eq!(redact_api_key(input), input);
    }
}
