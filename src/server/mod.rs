//! HTTP API Server
//!
//! The console's HTTP surface: authentication, engine connection management,
//! collection browsing, rule CRUD, and the search preview. Everything under
//! `/api` except `/api/login` expects a `Bearer` session token; `/health` is
//! open.

pub mod error;
pub mod handlers;
pub mod schemas;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::core::session::SessionManager;
use crate::database::Database;

pub use error::{ApiError, Result};

/// Shared state for all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            sessions: SessionManager::new(),
        })
    }
}

/// Build the console router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // The console UI is served from a different origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/session", get(handlers::session_state))
        .route("/api/connect", post(handlers::connect))
        .route("/api/disconnect", post(handlers::disconnect))
        .route("/api/collections", get(handlers::list_collections))
        .route("/api/collections/:name", get(handlers::collection_details))
        .route(
            "/api/collections/:name/select",
            post(handlers::select_collection),
        )
        .route(
            "/api/synonyms",
            get(handlers::list_synonyms).post(handlers::create_synonym),
        )
        .route(
            "/api/synonyms/:id",
            put(handlers::update_synonym).delete(handlers::delete_synonym),
        )
        .route(
            "/api/overrides",
            get(handlers::list_overrides).post(handlers::create_override),
        )
        .route(
            "/api/overrides/:id",
            put(handlers::update_override).delete(handlers::delete_override),
        )
        .route("/api/preview/matches", get(handlers::preview_matches))
        .route("/api/preview/search", post(handlers::preview_search))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.server.bind, state.config.server.port
    )
    .parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "console API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
