//! API Request and Response Schemas
//!
//! Typed bodies for the console endpoints, with local validation applied
//! before any engine call. Validation failures never reach the network.

use serde::{Deserialize, Serialize};

use crate::core::cache::ProfileCache;
use crate::core::preview::{PreviewPanel, PreviewPhase, RuleMatches};
use crate::core::rules::{
    CuratedExclude, CuratedInclude, MatchKind, OverrideRule, OverrideSpec, SynonymRule,
};
use crate::engine::{CollectionSummary, EngineProfile, Protocol};
use crate::server::error::{ApiError, Result};

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub full_name: String,
}

/// Session restore payload: who is logged in, whether an engine connection is
/// live, and the persisted last-used profile state if any.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<ProfileCache>,
}

// ============================================================================
// Engine Connection
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub api_key: String,
}

impl ConnectRequest {
    /// Validate and convert into a connection profile.
    pub fn into_profile(self) -> Result<EngineProfile> {
        let profile = EngineProfile {
            protocol: self.protocol,
            host: self.host,
            port: self.port,
            api_key: self.api_key,
        };
        profile.validate()?;
        Ok(profile)
    }
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub collections: Vec<CollectionSummary>,
}

// ============================================================================
// Synonym Rules
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SynonymUpsertRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub root: Option<String>,
}

impl SynonymUpsertRequest {
    /// Validate and build the rule with the resolved id. Directional rules
    /// need a root plus at least one synonym; mutual rules need at least two
    /// terms to be interchangeable.
    pub fn into_rule(self, id: String) -> Result<SynonymRule> {
        let synonyms: Vec<String> = self
            .synonyms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let root = self
            .root
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        match &root {
            Some(_) if synonyms.is_empty() => Err(ApiError::validation(
                "synonyms",
                "a one-way rule needs at least one synonym for its root",
            )),
            None if synonyms.len() < 2 => Err(ApiError::validation(
                "synonyms",
                "a multi-way rule needs at least two terms",
            )),
            _ => Ok(SynonymRule { id, synonyms, root }),
        }
    }
}

// ============================================================================
// Override Rules
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OverrideUpsertRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default, rename = "match")]
    pub match_kind: MatchKind,
    #[serde(default)]
    pub filter_by: Option<String>,
    #[serde(default)]
    pub includes: Vec<CuratedInclude>,
    #[serde(default)]
    pub excludes: Vec<CuratedExclude>,
    #[serde(default)]
    pub filter_curated_hits: Option<bool>,
    #[serde(default)]
    pub remove_matched_tokens: Option<bool>,
    #[serde(default)]
    pub stop_processing: Option<bool>,
}

impl OverrideUpsertRequest {
    pub fn into_rule(self, id: String) -> Result<OverrideRule> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(ApiError::validation("query", "query must not be empty"));
        }
        if self.match_kind == MatchKind::Unknown {
            return Err(ApiError::validation(
                "match",
                "match must be \"exact\" or \"contains\"",
            ));
        }
        for include in &self.includes {
            if include.id.trim().is_empty() {
                return Err(ApiError::validation(
                    "includes",
                    "pinned document ids must not be empty",
                ));
            }
            if include.position < 1 {
                return Err(ApiError::validation(
                    "includes",
                    "pinned positions are 1-based",
                ));
            }
        }
        if self.excludes.iter().any(|e| e.id.trim().is_empty()) {
            return Err(ApiError::validation(
                "excludes",
                "hidden document ids must not be empty",
            ));
        }

        Ok(OverrideRule {
            id,
            rule: OverrideSpec {
                query,
                match_kind: self.match_kind,
                filter_by: self.filter_by.filter(|f| !f.trim().is_empty()),
            },
            includes: self.includes,
            excludes: self.excludes,
            filter_curated_hits: self.filter_curated_hits,
            remove_matched_tokens: self.remove_matched_tokens,
            stop_processing: self.stop_processing,
        })
    }
}

// ============================================================================
// Search Preview
// ============================================================================

/// Query string for keystroke-time rule matching (`GET /api/preview/matches`).
#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct PreviewSearchRequest {
    pub query: String,
    #[serde(default)]
    pub query_by: Option<String>,
}

/// Snapshot of the preview panel after an operation.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub query: String,
    pub matches: RuleMatches,
    pub state: PreviewPhase,
}

impl PreviewResponse {
    pub fn from_panel(panel: &PreviewPanel) -> Self {
        Self {
            query: panel.query().to_string(),
            matches: panel.matches().clone(),
            state: panel.phase().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutual_synonym_rule_needs_two_terms() {
        let req = SynonymUpsertRequest {
            id: None,
            synonyms: vec!["soda".to_string(), "  ".to_string()],
            root: None,
        };
        assert!(matches!(
            req.into_rule("syn-1".to_string()),
            Err(ApiError::Validation { field: "synonyms", .. })
        ));
    }

    #[test]
    fn directional_rule_accepts_single_synonym() {
        let req = SynonymUpsertRequest {
            id: None,
            synonyms: vec!["submarine".to_string()],
            root: Some("sub".to_string()),
        };
        let rule = req.into_rule("syn-1".to_string()).unwrap();
        assert!(rule.is_directional());
        assert_eq!(rule.synonyms, vec!["submarine"]);
    }

    #[test]
    fn blank_root_is_treated_as_absent() {
        let req = SynonymUpsertRequest {
            id: None,
            synonyms: vec!["soda".to_string(), "pop".to_string()],
            root: Some("   ".to_string()),
        };
        let rule = req.into_rule("syn-1".to_string()).unwrap();
        assert!(!rule.is_directional());
    }

    #[test]
    fn override_rejects_unknown_match_kind() {
        let req: OverrideUpsertRequest =
            serde_json::from_str(r#"{"query": "laptop", "match": "fuzzy"}"#).unwrap();
        assert!(matches!(
            req.into_rule("ovr-1".to_string()),
            Err(ApiError::Validation { field: "match", .. })
        ));
    }

    #[test]
    fn override_rejects_empty_query() {
        let req: OverrideUpsertRequest =
            serde_json::from_str(r#"{"query": "  ", "match": "exact"}"#).unwrap();
        assert!(matches!(
            req.into_rule("ovr-1".to_string()),
            Err(ApiError::Validation { field: "query", .. })
        ));
    }

    #[test]
    fn override_rejects_zero_based_positions() {
        let req: OverrideUpsertRequest = serde_json::from_str(
            r#"{"query": "laptop", "match": "exact", "includes": [{"id": "doc-1", "position": 0}]}"#,
        )
        .unwrap();
        assert!(matches!(
            req.into_rule("ovr-1".to_string()),
            Err(ApiError::Validation { field: "includes", .. })
        ));
    }

    #[test]
    fn connect_request_validates_profile() {
        let req = ConnectRequest {
            protocol: Protocol::Http,
            host: String::new(),
            port: 8108,
            api_key: "xyz".to_string(),
        };
        assert!(req.into_profile().is_err());
    }
}
