//! End-to-end console API flow against a mock search engine: login, connect,
//! collection selection, rule CRUD validation, and the search preview.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use searchdeck::config::AppConfig;
use searchdeck::database::accounts::{AccountOps, AdminRecord};
use searchdeck::database::Database;
use searchdeck::server::{build_router, AppState};

// ============================================================================
// Fixture
// ============================================================================

async fn mock_engine() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "products", "num_documents": 120},
            {"name": "brands", "num_documents": 8}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/products/synonyms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "synonyms": [{"id": "syn-soda", "synonyms": ["soda", "pop", "cola"]}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/products/overrides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "overrides": [{
                "id": "ovr-laptop",
                "rule": {"query": "laptop", "match": "exact"},
                "includes": [{"id": "doc-1", "position": 1}]
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/brands/synonyms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"synonyms": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/brands/overrides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"overrides": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/products/documents/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": 2,
            "search_time_ms": 5,
            "request_params": {"q": "cola"},
            "hits": [
                {"document": {"id": "p1", "name": "Cola"}, "text_match": 9000},
                {"document": {"id": "p2", "name": "Cherry Cola"}, "text_match": 7000}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/brands/documents/search"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string(r#"{"message": "Not ready."}"#),
        )
        .mount(&server)
        .await;

    server
}

async fn app() -> Router {
    let db = Database::open_in_memory().await.unwrap();
    db.insert_admin(
        &AdminRecord {
            id: "a1".to_string(),
            username: "admin".to_string(),
            firstname: Some("Ada".to_string()),
            lastname: None,
            active: true,
        },
        "secret",
    )
    .await
    .unwrap();
    build_router(AppState::new(AppConfig::default(), db))
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn login(router: &Router) -> String {
    let (status, body) = send(
        router,
        post_json(
            "/api/login",
            None,
            json!({"username": "admin", "password": "secret"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn connect_body(engine: &MockServer) -> Value {
    let uri = url::Url::parse(&engine.uri()).unwrap();
    json!({
        "protocol": "http",
        "host": uri.host_str().unwrap(),
        "port": uri.port().unwrap(),
        "api_key": "test-key"
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let router = app().await;
    let (status, body) = send(
        &router,
        post_json(
            "/api/login",
            None,
            json!({"username": "admin", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("Invalid"));
}

#[tokio::test]
async fn endpoints_require_a_session_token() {
    let router = app().await;
    let (status, _) = send(&router, get("/api/collections", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, get("/api/collections", Some("bogus"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Health stays open.
    let (status, body) = send(&router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn actions_before_connect_are_rejected_locally() {
    let router = app().await;
    let token = login(&router).await;

    let (status, body) = send(
        &router,
        post_json("/api/preview/search", Some(&token), json!({"query": "cola"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not connected"));
}

#[tokio::test]
async fn connect_select_and_preview_flow() {
    let engine = mock_engine().await;
    let router = app().await;
    let token = login(&router).await;

    // Connect validates reachability by listing collections.
    let (status, body) = send(
        &router,
        post_json("/api/connect", Some(&token), connect_body(&engine)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collections"].as_array().unwrap().len(), 2);

    // Session restore now reports the connection and the persisted profile.
    let (status, body) = send(&router, get("/api/session", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["cache"]["profile"]["api_key"], "test-key");

    // Selecting a collection installs its rule snapshot.
    let (status, body) = send(
        &router,
        post_json("/api/collections/products/select", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collection"], "products");
    assert_eq!(body["synonyms"].as_array().unwrap().len(), 1);
    assert_eq!(body["overrides"].as_array().unwrap().len(), 1);

    // Keystroke matching is case-insensitive and local.
    let (status, body) = send(
        &router,
        get("/api/preview/matches?q=Cola", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"]["synonyms"][0]["id"], "syn-soda");
    assert_eq!(body["state"]["phase"], "idle");

    // Explicit submit runs the engine search and lands in results.
    let (status, body) = send(
        &router,
        post_json("/api/preview/search", Some(&token), json!({"query": "cola"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["phase"], "results");
    assert_eq!(body["state"]["found"], 2);
    assert_eq!(body["matches"]["synonyms"][0]["id"], "syn-soda");
}

#[tokio::test]
async fn collection_switch_drops_preview_and_snapshot() {
    let engine = mock_engine().await;
    let router = app().await;
    let token = login(&router).await;

    send(
        &router,
        post_json("/api/connect", Some(&token), connect_body(&engine)),
    )
    .await;
    send(
        &router,
        post_json("/api/collections/products/select", Some(&token), json!({})),
    )
    .await;
    send(
        &router,
        post_json("/api/preview/search", Some(&token), json!({"query": "cola"})),
    )
    .await;

    // Switch: the new snapshot has no rules, the preview is back to idle.
    let (status, body) = send(
        &router,
        post_json("/api/collections/brands/select", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synonyms"].as_array().unwrap().len(), 0);

    let (_, body) = send(&router, get("/api/preview/matches?q=cola", Some(&token))).await;
    assert_eq!(body["state"]["phase"], "idle");
    assert_eq!(body["matches"]["synonyms"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn failed_search_is_surfaced_in_panel_state() {
    let engine = mock_engine().await;
    let router = app().await;
    let token = login(&router).await;

    send(
        &router,
        post_json("/api/connect", Some(&token), connect_body(&engine)),
    )
    .await;
    send(
        &router,
        post_json("/api/collections/brands/select", Some(&token), json!({})),
    )
    .await;

    let (status, body) = send(
        &router,
        post_json("/api/preview/search", Some(&token), json!({"query": "acme"})),
    )
    .await;
    // The panel is the display state; the request itself succeeds.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["phase"], "failed");
    assert!(body["state"]["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn rule_validation_happens_before_any_engine_call() {
    let engine = mock_engine().await;
    let router = app().await;
    let token = login(&router).await;

    send(
        &router,
        post_json("/api/connect", Some(&token), connect_body(&engine)),
    )
    .await;
    send(
        &router,
        post_json("/api/collections/products/select", Some(&token), json!({})),
    )
    .await;

    let (status, body) = send(
        &router,
        post_json("/api/synonyms", Some(&token), json!({"synonyms": ["solo"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "synonyms");

    let (status, body) = send(
        &router,
        post_json(
            "/api/overrides",
            Some(&token),
            json!({"query": "laptop", "match": "fuzzy"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "match");
}

#[tokio::test]
async fn synonym_create_generates_an_id_and_refreshes_rules() {
    let engine = mock_engine().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/collections/products/synonyms/synonym-[0-9a-f-]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "synonym-generated",
            "synonyms": ["soda", "fizz"]
        })))
        .expect(1)
        .mount(&engine)
        .await;

    let router = app().await;
    let token = login(&router).await;
    send(
        &router,
        post_json("/api/connect", Some(&token), connect_body(&engine)),
    )
    .await;
    send(
        &router,
        post_json("/api/collections/products/select", Some(&token), json!({})),
    )
    .await;

    let (status, body) = send(
        &router,
        post_json(
            "/api/synonyms",
            Some(&token),
            json!({"synonyms": ["soda", "fizz"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "synonym-generated");
}

#[tokio::test]
async fn disconnect_clears_session_and_profile_cache() {
    let engine = mock_engine().await;
    let router = app().await;
    let token = login(&router).await;

    send(
        &router,
        post_json("/api/connect", Some(&token), connect_body(&engine)),
    )
    .await;

    let (status, _) = send(&router, post_json("/api/disconnect", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&router, get("/api/session", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);
    assert!(body.get("cache").is_none());
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let router = app().await;
    let token = login(&router).await;

    let (status, _) = send(&router, post_json("/api/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, get("/api/session", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
