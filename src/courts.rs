//! # Court Registry Module
//!
//! ## Purpose
//! Static lookup table of valid DataJud court aliases and their metadata.
//! Every search request is validated against this registry before any cache
//! or network activity.
//!
//! ## Input/Output Specification
//! - **Input**: court alias strings, optional category filter
//! - **Output**: immutable [`CourtDescriptor`] entries
//! - **Failure**: unknown aliases surface as `ValidationError`
//!
//! ## Key Features
//! - Closed set of aliases defined at process start, never mutated
//! - Category filtering with a wildcard (no filter = all courts)
//! - Jurisdiction codes matching the J.TR segment of the CNJ process number

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Branch of the judiciary a court belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtCategory {
    Superior,
    Federal,
    State,
    Labor,
    Electoral,
    Military,
}

impl fmt::Display for CourtCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CourtCategory::Superior => "superior",
            CourtCategory::Federal => "federal",
            CourtCategory::State => "state",
            CourtCategory::Labor => "labor",
            CourtCategory::Electoral => "electoral",
            CourtCategory::Military => "military",
        };
        f.write_str(name)
    }
}

impl FromStr for CourtCategory {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "superior" => Ok(CourtCategory::Superior),
            "federal" => Ok(CourtCategory::Federal),
            "state" | "estadual" => Ok(CourtCategory::State),
            "labor" | "trabalho" => Ok(CourtCategory::Labor),
            "electoral" | "eleitoral" => Ok(CourtCategory::Electoral),
            "military" | "militar" => Ok(CourtCategory::Military),
            other => Err(SearchError::Validation {
                field: "category".to_string(),
                reason: format!("unknown court category '{}'", other),
            }),
        }
    }
}

/// Immutable metadata for one court
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtDescriptor {
    /// Unique alias, also the endpoint segment (`api_publica_{alias}`)
    pub alias: &'static str,
    /// Display name
    pub name: &'static str,
    pub category: CourtCategory,
    /// J.TR segment of the CNJ process number, when defined
    pub jurisdiction: Option<&'static str>,
}

/// Static registry of all queryable courts
pub struct CourtRegistry {
    courts: Vec<CourtDescriptor>,
}

impl CourtRegistry {
    /// Build the registry with the full DataJud court table
    pub fn new() -> Self {
        use CourtCategory::*;
        let rows: &[(&'static str, &'static str, CourtCategory, Option<&'static str>)] = &[
            // Superior courts
            ("stj", "Superior Tribunal de Justiça", Superior, Some("3.00")),
            ("tst", "Tribunal Superior do Trabalho", Superior, Some("5.00")),
            ("tse", "Tribunal Superior Eleitoral", Superior, Some("6.00")),
            ("stm", "Superior Tribunal Militar", Superior, Some("7.00")),
            // Federal regional courts
            ("trf1", "Tribunal Regional Federal da 1ª Região", Federal, Some("4.01")),
            ("trf2", "Tribunal Regional Federal da 2ª Região", Federal, Some("4.02")),
            ("trf3", "Tribunal Regional Federal da 3ª Região", Federal, Some("4.03")),
            ("trf4", "Tribunal Regional Federal da 4ª Região", Federal, Some("4.04")),
            ("trf5", "Tribunal Regional Federal da 5ª Região", Federal, Some("4.05")),
            ("trf6", "Tribunal Regional Federal da 6ª Região", Federal, Some("4.06")),
            // State courts
            ("tjac", "Tribunal de Justiça do Acre", State, Some("8.01")),
            ("tjal", "Tribunal de Justiça de Alagoas", State, Some("8.02")),
            ("tjap", "Tribunal de Justiça do Amapá", State, Some("8.03")),
            ("tjam", "Tribunal de Justiça do Amazonas", State, Some("8.04")),
            ("tjba", "Tribunal de Justiça da Bahia", State, Some("8.05")),
            ("tjce", "Tribunal de Justiça do Ceará", State, Some("8.06")),
            ("tjdft", "Tribunal de Justiça do Distrito Federal e Territórios", State, Some("8.07")),
            ("tjes", "Tribunal de Justiça do Espírito Santo", State, Some("8.08")),
            ("tjgo", "Tribunal de Justiça de Goiás", State, Some("8.09")),
            ("tjma", "Tribunal de Justiça do Maranhão", State, Some("8.10")),
            ("tjmt", "Tribunal de Justiça do Mato Grosso", State, Some("8.11")),
            ("tjms", "Tribunal de Justiça do Mato Grosso do Sul", State, Some("8.12")),
            ("tjmg", "Tribunal de Justiça de Minas Gerais", State, Some("8.13")),
            ("tjpa", "Tribunal de Justiça do Pará", State, Some("8.14")),
            ("tjpb", "Tribunal de Justiça da Paraíba", State, Some("8.15")),
            ("tjpr", "Tribunal de Justiça do Paraná", State, Some("8.16")),
            ("tjpe", "Tribunal de Justiça de Pernambuco", State, Some("8.17")),
            ("tjpi", "Tribunal de Justiça do Piauí", State, Some("8.18")),
            ("tjrj", "Tribunal de Justiça do Rio de Janeiro", State, Some("8.19")),
            ("tjrn", "Tribunal de Justiça do Rio Grande do Norte", State, Some("8.20")),
            ("tjrs", "Tribunal de Justiça do Rio Grande do Sul", State, Some("8.21")),
            ("tjro", "Tribunal de Justiça de Rondônia", State, Some("8.22")),
            ("tjrr", "Tribunal de Justiça de Roraima", State, Some("8.23")),
            ("tjsc", "Tribunal de Justiça de Santa Catarina", State, Some("8.24")),
            ("tjse", "Tribunal de Justiça de Sergipe", State, Some("8.25")),
            ("tjsp", "Tribunal de Justiça de São Paulo", State, Some("8.26")),
            ("tjto", "Tribunal de Justiça do Tocantins", State, Some("8.27")),
            // Labor regional courts
            ("trt1", "Tribunal Regional do Trabalho da 1ª Região", Labor, Some("5.01")),
            ("trt2", "Tribunal Regional do Trabalho da 2ª Região", Labor, Some("5.02")),
            ("trt3", "Tribunal Regional do Trabalho da 3ª Região", Labor, Some("5.03")),
            ("trt4", "Tribunal Regional do Trabalho da 4ª Região", Labor, Some("5.04")),
            ("trt5", "Tribunal Regional do Trabalho da 5ª Região", Labor, Some("5.05")),
            ("trt6", "Tribunal Regional do Trabalho da 6ª Região", Labor, Some("5.06")),
            ("trt7", "Tribunal Regional do Trabalho da 7ª Região", Labor, Some("5.07")),
            ("trt8", "Tribunal Regional do Trabalho da 8ª Região", Labor, Some("5.08")),
            ("trt9", "Tribunal Regional do Trabalho da 9ª Região", Labor, Some("5.09")),
            ("trt10", "Tribunal Regional do Trabalho da 10ª Região", Labor, Some("5.10")),
            ("trt11", "Tribunal Regional do Trabalho da 11ª Região", Labor, Some("5.11")),
            ("trt12", "Tribunal Regional do Trabalho da 12ª Região", Labor, Some("5.12")),
            ("trt13", "Tribunal Regional do Trabalho da 13ª Região", Labor, Some("5.13")),
            ("trt14", "Tribunal Regional do Trabalho da 14ª Região", Labor, Some("5.14")),
            ("trt15", "Tribunal Regional do Trabalho da 15ª Região", Labor, Some("5.15")),
            ("trt16", "Tribunal Regional do Trabalho da 16ª Região", Labor, Some("5.16")),
            ("trt17", "Tribunal Regional do Trabalho da 17ª Região", Labor, Some("5.17")),
            ("trt18", "Tribunal Regional do Trabalho da 18ª Região", Labor, Some("5.18")),
            ("trt19", "Tribunal Regional do Trabalho da 19ª Região", Labor, Some("5.19")),
            ("trt20", "Tribunal Regional do Trabalho da 20ª Região", Labor, Some("5.20")),
            ("trt21", "Tribunal Regional do Trabalho da 21ª Região", Labor, Some("5.21")),
            ("trt22", "Tribunal Regional do Trabalho da 22ª Região", Labor, Some("5.22")),
            ("trt23", "Tribunal Regional do Trabalho da 23ª Região", Labor, Some("5.23")),
            ("trt24", "Tribunal Regional do Trabalho da 24ª Região", Labor, Some("5.24")),
            // Electoral regional courts
            ("tre-ac", "Tribunal Regional Eleitoral do Acre", Electoral, Some("6.01")),
            ("tre-al", "Tribunal Regional Eleitoral de Alagoas", Electoral, Some("6.02")),
            ("tre-ap", "Tribunal Regional Eleitoral do Amapá", Electoral, Some("6.03")),
            ("tre-am", "Tribunal Regional Eleitoral do Amazonas", Electoral, Some("6.04")),
            ("tre-ba", "Tribunal Regional Eleitoral da Bahia", Electoral, Some("6.05")),
            ("tre-ce", "Tribunal Regional Eleitoral do Ceará", Electoral, Some("6.06")),
            ("tre-dft", "Tribunal Regional Eleitoral do Distrito Federal", Electoral, Some("6.07")),
            ("tre-es", "Tribunal Regional Eleitoral do Espírito Santo", Electoral, Some("6.08")),
            ("tre-go", "Tribunal Regional Eleitoral de Goiás", Electoral, Some("6.09")),
            ("tre-ma", "Tribunal Regional Eleitoral do Maranhão", Electoral, Some("6.10")),
            ("tre-mt", "Tribunal Regional Eleitoral do Mato Grosso", Electoral, Some("6.11")),
            ("tre-ms", "Tribunal Regional Eleitoral do Mato Grosso do Sul", Electoral, Some("6.12")),
            ("tre-mg", "Tribunal Regional Eleitoral de Minas Gerais", Electoral, Some("6.13")),
            ("tre-pa", "Tribunal Regional Eleitoral do Pará", Electoral, Some("6.14")),
            ("tre-pb", "Tribunal Regional Eleitoral da Paraíba", Electoral, Some("6.15")),
            ("tre-pr", "Tribunal Regional Eleitoral do Paraná", Electoral, Some("6.16")),
            ("tre-pe", "Tribunal Regional Eleitoral de Pernambuco", Electoral, Some("6.17")),
            ("tre-pi", "Tribunal Regional Eleitoral do Piauí", Electoral, Some("6.18")),
            ("tre-rj", "Tribunal Regional Eleitoral do Rio de Janeiro", Electoral, Some("6.19")),
            ("tre-rn", "Tribunal Regional Eleitoral do Rio Grande do Norte", Electoral, Some("6.20")),
            ("tre-rs", "Tribunal Regional Eleitoral do Rio Grande do Sul", Electoral, Some("6.21")),
            ("tre-ro", "Tribunal Regional Eleitoral de Rondônia", Electoral, Some("6.22")),
            ("tre-rr", "Tribunal Regional Eleitoral de Roraima", Electoral, Some("6.23")),
            ("tre-sc", "Tribunal Regional Eleitoral de Santa Catarina", Electoral, Some("6.24")),
            ("tre-se", "Tribunal Regional Eleitoral de Sergipe", Electoral, Some("6.25")),
            ("tre-sp", "Tribunal Regional Eleitoral de São Paulo", Electoral, Some("6.26")),
            ("tre-to", "Tribunal Regional Eleitoral do Tocantins", Electoral, Some("6.27")),
            // State military courts
            ("tjmmg", "Tribunal de Justiça Militar de Minas Gerais", Military, Some("9.13")),
            ("tjmrs", "Tribunal de Justiça Militar do Rio Grande do Sul", Military, Some("9.21")),
            ("tjmsp", "Tribunal de Justiça Militar de São Paulo", Military, Some("9.26")),
        ];

        let courts = rows
            .iter()
            .map(|&(alias, name, category, jurisdiction)| CourtDescriptor {
                alias,
                name,
                category,
                jurisdiction,
            })
            .collect();

        Self { courts }
    }

    /// Resolve an alias to its descriptor.
    ///
    /// Lookup is case-insensitive; unknown aliases fail with a validation
    /// error before any network activity happens.
    pub fn resolve(&self, alias: &str) -> Result<&CourtDescriptor> {
        let needle = alias.trim().to_ascii_lowercase();
        self.courts
            .iter()
            .find(|c| c.alias == needle)
            .ok_or_else(|| SearchError::Validation {
                field: "court".to_string(),
                reason: format!("unknown court alias '{}'", alias),
            })
    }

    /// List courts, optionally filtered by category. `None` is the wildcard.
    pub fn list(&self, category: Option<CourtCategory>) -> Vec<&CourtDescriptor> {
        self.courts
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .collect()
    }

    /// Number of registered courts
    pub fn len(&self) -> usize {
        self.courts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }
}

impl Default for CourtRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_aliases_case_insensitively() {
        let registry = CourtRegistry::new();
        let court = registry.resolve("TJSP").unwrap();
        assert_eq!(court.alias, "tjsp");
        assert_eq!(court.category, CourtCategory::State);
        assert_eq!(court.jurisdiction, Some("8.26"));
    }

    #[test]
    fn unknown_alias_is_a_validation_error() {
        let registry = CourtRegistry::new();
        let err = registry.resolve("tjxx").unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[test]
    fn list_filters_by_category() {
        let registry = CourtRegistry::new();
        let federal = registry.list(Some(CourtCategory::Federal));
        assert_eq!(federal.len(), 6);
        assert!(federal.iter().all(|c| c.category == CourtCategory::Federal));

        // Wildcard returns the whole table
        assert_eq!(registry.list(None).len(), registry.len());
    }

    #[test]
    fn aliases_are_unique() {
        let registry = CourtRegistry::new();
        let mut aliases: Vec<_> = registry.list(None).iter().map(|c| c.alias).collect();
        aliases.sort_unstable();
        aliases.dedup();
        assert_eq!(aliases.len(), registry.len());
    }
}
