//! API Handlers
//!
//! One handler per console endpoint. Every engine-touching handler follows
//! the same locking discipline: clone the client out of the session lock,
//! run the network call unlocked, then re-lock to apply the result. A
//! session is therefore never held across an upstream round trip.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::core::cache::{ProfileCache, RuleSnapshot};
use crate::core::session::UserSession;
use crate::database::accounts::AccountOps;
use crate::engine::{
    CollectionDetails, CollectionSummary, EngineClient, SearchParams,
};
use crate::core::rules::{OverrideRule, SynonymRule};
use crate::server::error::{ApiError, Result};
use crate::server::schemas::*;
use crate::server::AppState;

// ============================================================================
// Session Resolution
// ============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn require_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Arc<Mutex<UserSession>>> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    state.sessions.get(token).await.ok_or(ApiError::Unauthorized)
}

fn not_connected() -> ApiError {
    ApiError::Config("not connected to a search engine".to_string())
}

fn no_selection() -> ApiError {
    ApiError::Config("no collection selected".to_string())
}

/// Client plus selected collection, or the relevant configuration error.
async fn engine_target(session: &Arc<Mutex<UserSession>>) -> Result<(EngineClient, String)> {
    let guard = session.lock().await;
    let conn = guard.connection.as_ref().ok_or_else(not_connected)?;
    let collection = conn
        .selected_collection()
        .ok_or_else(no_selection)?
        .to_string();
    Ok((conn.client.clone(), collection))
}

/// Refetch both rule lists and swap the cache in wholesale. The snapshot is
/// silently dropped when the collection is no longer the selected one.
async fn refresh_rules(
    session: &Arc<Mutex<UserSession>>,
    client: &EngineClient,
    collection: &str,
) -> Result<RuleSnapshot> {
    let synonyms = client.list_synonyms(collection).await?;
    let overrides = client.list_overrides(collection).await?;
    let snapshot = RuleSnapshot::new(collection, synonyms, overrides);
    let mut guard = session.lock().await;
    if let Some(conn) = guard.connection.as_mut() {
        conn.replace_rules(snapshot.clone());
    }
    Ok(snapshot)
}

// ============================================================================
// Health and Authentication
// ============================================================================

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let record = state
        .db
        .verify_credentials(&body.username, &body.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    info!(username = %record.username, "admin logged in");
    let full_name = record.full_name();
    let username = record.username.clone();
    let token = state.sessions.create(record).await;

    Ok(Json(LoginResponse {
        token,
        username,
        full_name,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    if !state.sessions.remove(token).await {
        return Err(ApiError::Unauthorized);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Restore state after a page reload: live connection status plus the
/// persisted last-used profile, if one survives.
pub async fn session_state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>> {
    let session = require_session(&state, &headers).await?;
    let (username, connected, selected_collection) = {
        let guard = session.lock().await;
        let selected = guard
            .connection
            .as_ref()
            .and_then(|c| c.selected_collection().map(String::from));
        (
            guard.user.username.clone(),
            guard.connection.is_some(),
            selected,
        )
    };
    let cache = ProfileCache::load(&state.db, &username).await?;

    Ok(Json(SessionResponse {
        username,
        connected,
        selected_collection,
        cache,
    }))
}

// ============================================================================
// Engine Connection
// ============================================================================

pub async fn connect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>> {
    let session = require_session(&state, &headers).await?;
    let profile = body.into_profile()?;
    let client = EngineClient::new(
        &profile,
        std::time::Duration::from_secs(state.config.engine.request_timeout_secs),
    )?;

    // The listing doubles as the reachability and API-key check; a failure
    // here leaves no connection behind.
    let collections = client.list_collections().await?;

    let username = {
        let mut guard = session.lock().await;
        guard.connect(profile.clone(), client);
        guard.user.username.clone()
    };

    let cache = ProfileCache {
        profile,
        selected_collection: None,
        collections: collections.clone(),
    };
    cache.store(&state.db, &username).await?;

    Ok(Json(ConnectResponse { collections }))
}

pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let session = require_session(&state, &headers).await?;
    let username = {
        let mut guard = session.lock().await;
        guard.disconnect();
        guard.user.username.clone()
    };
    ProfileCache::clear(&state.db, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Collections
// ============================================================================

pub async fn list_collections(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CollectionSummary>>> {
    let session = require_session(&state, &headers).await?;
    let client = {
        let guard = session.lock().await;
        guard
            .connection
            .as_ref()
            .ok_or_else(not_connected)?
            .client
            .clone()
    };
    Ok(Json(client.list_collections().await?))
}

pub async fn collection_details(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<CollectionDetails>> {
    let session = require_session(&state, &headers).await?;
    let client = {
        let guard = session.lock().await;
        guard
            .connection
            .as_ref()
            .ok_or_else(not_connected)?
            .client
            .clone()
    };
    Ok(Json(client.collection_details(&name).await?))
}

/// Switch the working collection: the old selection (snapshot and preview
/// state) is dropped before the new rules are fetched, so a failed fetch
/// leaves no stale state behind.
pub async fn select_collection(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<RuleSnapshot>> {
    let session = require_session(&state, &headers).await?;
    let (client, username) = {
        let mut guard = session.lock().await;
        let username = guard.user.username.clone();
        let conn = guard.connection.as_mut().ok_or_else(not_connected)?;
        conn.clear_selection();
        (conn.client.clone(), username)
    };

    let synonyms = client.list_synonyms(&name).await?;
    let overrides = client.list_overrides(&name).await?;
    let snapshot = RuleSnapshot::new(name.clone(), synonyms, overrides);

    {
        let mut guard = session.lock().await;
        let conn = guard.connection.as_mut().ok_or_else(not_connected)?;
        conn.select_collection(snapshot.clone());
    }
    info!(collection = %name, "collection selected");

    if let Some(mut cache) = ProfileCache::load(&state.db, &username).await? {
        cache.selected_collection = Some(name);
        cache.store(&state.db, &username).await?;
    }

    Ok(Json(snapshot))
}

// ============================================================================
// Synonym Rules
// ============================================================================

pub async fn list_synonyms(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SynonymRule>>> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    let snapshot = refresh_rules(&session, &client, &collection).await?;
    Ok(Json(snapshot.synonyms))
}

pub async fn create_synonym(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SynonymUpsertRequest>,
) -> Result<(StatusCode, Json<SynonymRule>)> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    let id = body
        .id
        .clone()
        .unwrap_or_else(|| format!("synonym-{}", Uuid::new_v4()));
    let rule = body.into_rule(id)?;

    let created = client.upsert_synonym(&collection, &rule).await?;
    refresh_rules(&session, &client, &collection).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_synonym(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SynonymUpsertRequest>,
) -> Result<Json<SynonymRule>> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    let rule = body.into_rule(id)?;

    let updated = client.upsert_synonym(&collection, &rule).await?;
    refresh_rules(&session, &client, &collection).await?;
    Ok(Json(updated))
}

pub async fn delete_synonym(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    client.delete_synonym(&collection, &id).await?;
    refresh_rules(&session, &client, &collection).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Override Rules
// ============================================================================

pub async fn list_overrides(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OverrideRule>>> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    let snapshot = refresh_rules(&session, &client, &collection).await?;
    Ok(Json(snapshot.overrides))
}

pub async fn create_override(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<OverrideUpsertRequest>,
) -> Result<(StatusCode, Json<OverrideRule>)> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    let id = body
        .id
        .clone()
        .unwrap_or_else(|| format!("override-{}", Uuid::new_v4()));
    let rule = body.into_rule(id)?;

    let created = client.upsert_override(&collection, &rule).await?;
    refresh_rules(&session, &client, &collection).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_override(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<OverrideUpsertRequest>,
) -> Result<Json<OverrideRule>> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    let rule = body.into_rule(id)?;

    let updated = client.upsert_override(&collection, &rule).await?;
    refresh_rules(&session, &client, &collection).await?;
    Ok(Json(updated))
}

pub async fn delete_override(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session = require_session(&state, &headers).await?;
    let (client, collection) = engine_target(&session).await?;
    client.delete_override(&collection, &id).await?;
    refresh_rules(&session, &client, &collection).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Search Preview
// ============================================================================

/// Keystroke-time rule matching. Pure computation against the rule cache;
/// never touches the network.
pub async fn preview_matches(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MatchesQuery>,
) -> Result<Json<PreviewResponse>> {
    let session = require_session(&state, &headers).await?;
    let mut guard = session.lock().await;
    let conn = guard.connection.as_mut().ok_or_else(not_connected)?;
    conn.update_preview_query(&params.q);
    Ok(Json(PreviewResponse::from_panel(&conn.preview)))
}

/// Explicit preview search submission. The response carries the panel state
/// after the outcome is applied; an engine failure is surfaced in the panel,
/// not as an HTTP error, because the panel is the display state.
pub async fn preview_search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PreviewSearchRequest>,
) -> Result<Json<PreviewResponse>> {
    let session = require_session(&state, &headers).await?;

    let (ticket, client, collection, params) = {
        let mut guard = session.lock().await;
        let conn = guard.connection.as_mut().ok_or_else(not_connected)?;
        let collection = conn
            .selected_collection()
            .ok_or_else(no_selection)?
            .to_string();
        conn.update_preview_query(&body.query);
        let ticket = conn
            .preview
            .begin_search()
            .ok_or_else(|| ApiError::validation("query", "query must not be empty"))?;
        let params = SearchParams {
            query: body.query.clone(),
            query_by: body
                .query_by
                .clone()
                .unwrap_or_else(|| state.config.engine.default_query_by.clone()),
            page: 1,
            per_page: state.config.engine.search_page_size,
        };
        (ticket, conn.client.clone(), collection, params)
    };

    // Run the search with the session unlocked so a resubmission or a
    // collection switch is never blocked behind a slow engine.
    let result = client.search(&collection, &params).await;

    let mut guard = session.lock().await;
    let conn = guard.connection.as_mut().ok_or_else(not_connected)?;
    match result {
        Ok(outcome) => {
            conn.preview.apply_success(ticket, outcome);
        }
        Err(e) => {
            conn.preview.apply_failure(ticket, e.to_string());
        }
    }
    Ok(Json(PreviewResponse::from_panel(&conn.preview)))
}
