//! Relevance Rule Types
//!
//! Synonym and override rules as stored in the remote search engine.
//! Decoding is deliberately tolerant: rules written by other tools may omit
//! optional fields, and a malformed rule must degrade to "matches nothing"
//! rather than fail the whole fetch.

use serde::{Deserialize, Serialize};

// ============================================================================
// Synonym Rules
// ============================================================================

/// A synonym rule declaring query terms interchangeable for search matching.
///
/// When `root` is present the rule is directional (`root` → `synonyms`);
/// otherwise every term in `synonyms` is mutually interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymRule {
    pub id: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl SynonymRule {
    /// All terms that can trigger this rule: the synonym list plus the root
    /// for directional rules.
    pub fn candidate_terms(&self) -> impl Iterator<Item = &str> {
        self.synonyms
            .iter()
            .map(String::as_str)
            .chain(self.root.as_deref())
    }

    /// True when the rule maps a root term onto its synonyms rather than
    /// declaring all terms mutually interchangeable.
    pub fn is_directional(&self) -> bool {
        self.root.is_some()
    }
}

// ============================================================================
// Override Rules
// ============================================================================

/// How an override's configured query pattern is compared to a user query.
///
/// Values other than `exact` / `contains` deserialize as [`MatchKind::Unknown`]
/// and never match any query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchKind {
    Exact,
    Contains,
    #[default]
    Unknown,
}

impl From<String> for MatchKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "exact" => MatchKind::Exact,
            "contains" => MatchKind::Contains,
            _ => MatchKind::Unknown,
        }
    }
}

impl From<MatchKind> for String {
    fn from(kind: MatchKind) -> Self {
        match kind {
            MatchKind::Exact => "exact".to_string(),
            MatchKind::Contains => "contains".to_string(),
            MatchKind::Unknown => "unknown".to_string(),
        }
    }
}

/// The trigger condition of an override rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideSpec {
    #[serde(default)]
    pub query: String,
    #[serde(default, rename = "match")]
    pub match_kind: MatchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
}

/// A document pinned to a fixed position in the result list.
///
/// Positions are 1-based and need not be unique or contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedInclude {
    pub id: String,
    pub position: u32,
}

/// A document hidden from the result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedExclude {
    pub id: String,
}

/// A curated-result override: pinned and hidden documents applied when a
/// query matches the configured pattern.
///
/// `includes` and `excludes` may name the same document; precedence between
/// them is defined by the engine and not re-implemented here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub id: String,
    #[serde(default)]
    pub rule: OverrideSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<CuratedInclude>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<CuratedExclude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_curated_hits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_matched_tokens: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_processing: Option<bool>,
}
