//! Rule and Profile Caches
//!
//! [`RuleSnapshot`] is the in-memory rule cache for the currently selected
//! collection. It is always replaced wholesale — never patched field by
//! field — so the matcher only ever sees a consistent view of one
//! collection's rules. No snapshot survives a collection switch.
//!
//! [`ProfileCache`] is the persisted, non-authoritative convenience cache:
//! the last-used connection profile, last-selected collection, and a trimmed
//! collections list, restored on the next login and invalidated on explicit
//! disconnect. It is capped: over the cap the cached collection list is
//! dropped while the profile itself survives.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::rules::{OverrideRule, SynonymRule};
use crate::database::settings::SettingsOps;
use crate::database::Database;
use crate::engine::{CollectionSummary, EngineProfile};

/// Cached collection summaries beyond this count are dropped rather than
/// persisted.
pub const MAX_CACHED_COLLECTIONS: usize = 64;

// ============================================================================
// Rule Snapshot
// ============================================================================

/// Consistent snapshot of one collection's synonym and override rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    pub collection: String,
    pub synonyms: Vec<SynonymRule>,
    pub overrides: Vec<OverrideRule>,
}

impl RuleSnapshot {
    pub fn new(
        collection: impl Into<String>,
        synonyms: Vec<SynonymRule>,
        overrides: Vec<OverrideRule>,
    ) -> Self {
        Self {
            collection: collection.into(),
            synonyms,
            overrides,
        }
    }
}

// ============================================================================
// Persisted Profile Cache
// ============================================================================

/// Last-used connection state, persisted per admin account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCache {
    pub profile: EngineProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_collection: Option<String>,
    #[serde(default)]
    pub collections: Vec<CollectionSummary>,
}

impl ProfileCache {
    /// Apply the cap policy: an oversized collection list is dropped in its
    /// entirety, the profile stays. The list is refetched on reconnect, so
    /// losing it costs one round trip, not the session.
    pub fn capped(mut self) -> Self {
        if self.collections.len() > MAX_CACHED_COLLECTIONS {
            debug!(
                count = self.collections.len(),
                cap = MAX_CACHED_COLLECTIONS,
                "dropping cached collection list over cap"
            );
            self.collections.clear();
        }
        self
    }

    fn settings_key(username: &str) -> String {
        format!("profile_cache:{username}")
    }

    /// Persist for the given account, applying the cap policy first.
    pub async fn store(&self, db: &Database, username: &str) -> Result<(), sqlx::Error> {
        let capped = self.clone().capped();
        let value = serde_json::to_string(&capped).map_err(|e| sqlx::Error::Encode(e.into()))?;
        db.set_setting(&Self::settings_key(username), &value).await
    }

    /// Load the cached state for an account. A corrupt entry is treated as
    /// absent and removed.
    pub async fn load(db: &Database, username: &str) -> Result<Option<Self>, sqlx::Error> {
        let key = Self::settings_key(username);
        let Some(raw) = db.get_setting(&key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(cache) => Ok(Some(cache)),
            Err(e) => {
                debug!(username, error = %e, "discarding corrupt profile cache entry");
                db.delete_setting(&key).await?;
                Ok(None)
            }
        }
    }

    /// Drop the cached state for an account (explicit disconnect).
    pub async fn clear(db: &Database, username: &str) -> Result<(), sqlx::Error> {
        db.delete_setting(&Self::settings_key(username)).await
    }
}
