//! Engine Wire Types
//!
//! Typed views of the remote search engine's responses. Unknown fields are
//! ignored so that engine upgrades do not break decoding.

use serde::{Deserialize, Serialize};

// ============================================================================
// Collections
// ============================================================================

/// Trimmed collection listing entry. This is also the shape persisted in the
/// profile cache, so it stays deliberately small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    #[serde(default)]
    pub num_documents: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// One field of a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
}

/// Essential schema information for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDetails {
    pub name: String,
    #[serde(default)]
    pub num_documents: u64,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sorting_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_nested_fields: Option<bool>,
}

// ============================================================================
// Document Search
// ============================================================================

/// Raw search response as the engine sends it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireSearchResponse {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub search_time_ms: u64,
    #[serde(default)]
    pub request_params: Option<WireRequestParams>,
    #[serde(default)]
    pub hits: Vec<WireHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireRequestParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireHit {
    #[serde(default)]
    pub document: serde_json::Value,
    #[serde(default)]
    pub text_match: Option<u64>,
    #[serde(default)]
    pub highlights: Option<Vec<serde_json::Value>>,
}

/// One document returned by a search, annotated with its relevance score and
/// highlight spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub document: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<serde_json::Value>,
}

/// Processed result of one search submission, as shown in the preview panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub found: u64,
    pub search_time_ms: u64,
    /// The query string as the engine echoed it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echoed_query: Option<String>,
    pub hits: Vec<Hit>,
}

impl From<WireSearchResponse> for SearchOutcome {
    fn from(wire: WireSearchResponse) -> Self {
        SearchOutcome {
            found: wire.found,
            search_time_ms: wire.search_time_ms,
            echoed_query: wire.request_params.and_then(|p| p.q),
            hits: wire
                .hits
                .into_iter()
                .map(|h| Hit {
                    document: h.document,
                    score: h.text_match,
                    highlights: h.highlights.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Parameters of one document-search request.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub query_by: String,
    pub page: u32,
    pub per_page: u32,
}
