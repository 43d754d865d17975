//! Session and Connection State
//!
//! Replaces the ad hoc global "connection provider" of earlier console
//! generations with explicit context objects. A [`UserSession`] exists per
//! opaque bearer token from login to logout; its [`EngineConnection`] is
//! constructed on connect and torn down on disconnect, and is never shared
//! across tokens.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::core::cache::RuleSnapshot;
use crate::core::preview::PreviewPanel;
use crate::database::accounts::AdminRecord;
use crate::engine::{EngineClient, EngineProfile};

// ============================================================================
// Engine Connection
// ============================================================================

/// Live connection context for one engine profile: the client, the selected
/// collection's rule snapshot, and the preview panel state.
pub struct EngineConnection {
    pub profile: EngineProfile,
    pub client: EngineClient,
    rules: Option<RuleSnapshot>,
    pub preview: PreviewPanel,
}

impl EngineConnection {
    pub fn new(profile: EngineProfile, client: EngineClient) -> Self {
        Self {
            profile,
            client,
            rules: None,
            preview: PreviewPanel::new(),
        }
    }

    pub fn selected_collection(&self) -> Option<&str> {
        self.rules.as_ref().map(|s| s.collection.as_str())
    }

    pub fn rules(&self) -> Option<&RuleSnapshot> {
        self.rules.as_ref()
    }

    /// Switch to a collection: the preview resets before the new snapshot is
    /// installed, so stale cross-collection state can never be displayed.
    pub fn select_collection(&mut self, snapshot: RuleSnapshot) {
        self.preview.reset();
        self.rules = Some(snapshot);
    }

    /// Drop the selection (used before fetching a new collection's rules so
    /// a failed fetch leaves no stale snapshot behind).
    pub fn clear_selection(&mut self) {
        self.preview.reset();
        self.rules = None;
    }

    /// Replace the rule cache wholesale after a fetch. Ignored when the
    /// snapshot belongs to a collection that is no longer selected.
    pub fn replace_rules(&mut self, snapshot: RuleSnapshot) {
        if self.selected_collection() == Some(snapshot.collection.as_str()) {
            self.rules = Some(snapshot);
        }
    }

    /// Feed a draft query into the preview panel, recomputing rule matches
    /// against the current snapshot.
    pub fn update_preview_query(&mut self, query: &str) -> &crate::core::preview::RuleMatches {
        self.preview.update_query(query, self.rules.as_ref())
    }
}

// ============================================================================
// User Session
// ============================================================================

/// Authenticated state for one bearer token.
pub struct UserSession {
    pub user: AdminRecord,
    pub connection: Option<EngineConnection>,
}

impl UserSession {
    pub fn new(user: AdminRecord) -> Self {
        Self {
            user,
            connection: None,
        }
    }

    /// Install a fresh connection context, replacing any previous one.
    pub fn connect(
        &mut self,
        profile: EngineProfile,
        client: EngineClient,
    ) -> &mut EngineConnection {
        info!(username = %self.user.username, host = %profile.host, "engine connection established");
        self.connection = Some(EngineConnection::new(profile, client));
        self.connection.as_mut().unwrap()
    }

    /// Tear the connection context down entirely.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            info!(username = %self.user.username, "engine connection torn down");
        }
    }
}

// ============================================================================
// Session Manager
// ============================================================================

/// Registry of live sessions keyed by opaque bearer token.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Mutex<UserSession>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for an authenticated account and return its token.
    pub async fn create(&self, user: AdminRecord) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), Arc::new(Mutex::new(UserSession::new(user))));
        token
    }

    pub async fn get(&self, token: &str) -> Option<Arc<Mutex<UserSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(token).cloned()
    }

    /// Remove a session (logout). Returns whether the token was known.
    pub async fn remove(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token).is_some()
    }
}
