//! Search Engine Client
//!
//! Typed HTTP client for the remote search engine's admin API (Typesense
//! wire format): collection listing, synonym and override CRUD, and document
//! search. One client is built per connection profile and shared by every
//! request of that session.
//!
//! Writes use the engine's PUT-for-create convention: creating and updating
//! a rule are both a PUT to the rule's id endpoint. Failures never leave
//! partial state behind on the caller's side — the rule cache is only
//! replaced after a successful fetch.

pub mod error;
pub mod types;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::core::rules::{OverrideRule, SynonymRule};

pub use error::{EngineError, Result};
pub use types::{
    CollectionDetails, CollectionSummary, Hit, SearchOutcome, SearchParams,
};

/// Header carrying the engine API key.
const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Extra tokens of context returned around each highlighted term.
const HIGHLIGHT_AFFIX_TOKENS: u32 = 4;

// ============================================================================
// Connection Profile
// ============================================================================

/// Transport scheme for the engine connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// A validated engine connection profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineProfile {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub api_key: String,
}

impl EngineProfile {
    /// Check the profile locally before any network call is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(EngineError::Config("host must not be empty".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(EngineError::Config("API key must not be empty".to_string()));
        }
        // A parseable base URL is the last local gate.
        self.base_url()?;
        Ok(())
    }

    /// Base URL of the engine, e.g. `http://localhost:8108/`.
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("{}://{}:{}", self.protocol.as_str(), self.host, self.port);
        Url::parse(&raw).map_err(|e| EngineError::Config(format!("invalid engine address {raw}: {e}")))
    }
}

// ============================================================================
// Engine Client
// ============================================================================

/// Client for one engine connection profile.
#[derive(Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl EngineClient {
    /// Build a client for the given profile. The timeout applies to every
    /// request; a timed-out request is a retryable failure, never retried
    /// automatically.
    pub fn new(profile: &EngineProfile, timeout: Duration) -> Result<Self> {
        profile.validate()?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base: profile.base_url()?,
            api_key: profile.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| EngineError::Config(format!("invalid request path {path}: {e}")))
    }

    /// Turn a non-success response into [`EngineError::Upstream`], surfacing
    /// the engine's body verbatim.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(EngineError::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET engine");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn put_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        debug!(%url, "PUT engine");
        let response = self
            .http
            .put(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn delete(&self, url: Url) -> Result<()> {
        debug!(%url, "DELETE engine");
        let response = self
            .http
            .delete(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        // The engine echoes the deleted object; the content is not needed.
        Self::check(response).await?;
        Ok(())
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// List all collections, trimmed to summaries.
    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        self.get_json(self.url("/collections")?).await
    }

    /// Fetch essential schema information for one collection.
    pub async fn collection_details(&self, name: &str) -> Result<CollectionDetails> {
        self.get_json(self.url(&format!("/collections/{name}"))?).await
    }

    // ========================================================================
    // Synonyms
    // ========================================================================

    pub async fn list_synonyms(&self, collection: &str) -> Result<Vec<SynonymRule>> {
        #[derive(Deserialize)]
        struct Listing {
            #[serde(default)]
            synonyms: Vec<SynonymRule>,
        }
        let listing: Listing = self
            .get_json(self.url(&format!("/collections/{collection}/synonyms"))?)
            .await?;
        Ok(listing.synonyms)
    }

    /// Create or update a synonym rule (PUT to the rule's id endpoint).
    pub async fn upsert_synonym(
        &self,
        collection: &str,
        rule: &SynonymRule,
    ) -> Result<SynonymRule> {
        let url = self.url(&format!("/collections/{collection}/synonyms/{}", rule.id))?;
        self.put_json(url, rule).await
    }

    pub async fn delete_synonym(&self, collection: &str, id: &str) -> Result<()> {
        self.delete(self.url(&format!("/collections/{collection}/synonyms/{id}"))?)
            .await
    }

    // ========================================================================
    // Overrides
    // ========================================================================

    pub async fn list_overrides(&self, collection: &str) -> Result<Vec<OverrideRule>> {
        #[derive(Deserialize)]
        struct Listing {
            #[serde(default)]
            overrides: Vec<OverrideRule>,
        }
        let listing: Listing = self
            .get_json(self.url(&format!("/collections/{collection}/overrides"))?)
            .await?;
        Ok(listing.overrides)
    }

    /// Create or update an override rule (PUT to the rule's id endpoint).
    pub async fn upsert_override(
        &self,
        collection: &str,
        rule: &OverrideRule,
    ) -> Result<OverrideRule> {
        let url = self.url(&format!("/collections/{collection}/overrides/{}", rule.id))?;
        self.put_json(url, rule).await
    }

    pub async fn delete_override(&self, collection: &str, id: &str) -> Result<()> {
        self.delete(self.url(&format!("/collections/{collection}/overrides/{id}"))?)
            .await
    }

    // ========================================================================
    // Document Search
    // ========================================================================

    /// Run one ranked document search. Highlight parameters mirror what the
    /// admin console has always requested so synonym effects stay visible in
    /// the preview.
    pub async fn search(&self, collection: &str, params: &SearchParams) -> Result<SearchOutcome> {
        let url = self.url(&format!("/collections/{collection}/documents/search"))?;
        debug!(%url, query = %params.query, "search engine");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("q", params.query.as_str()),
                ("query_by", params.query_by.as_str()),
                ("per_page", &params.per_page.to_string()),
                ("page", &params.page.to_string()),
                ("highlight_full_fields", params.query_by.as_str()),
                ("highlight_affix_num_tokens", &HIGHLIGHT_AFFIX_TOKENS.to_string()),
                ("enable_highlight_v1", "true"),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;
        let wire: types::WireSearchResponse = response.json().await?;
        Ok(SearchOutcome::from(wire))
    }
}
