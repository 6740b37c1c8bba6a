//! API Integration Tests for Hearth Server
//!
//! Tests the REST API endpoints using axum-test with in-memory SQLite
//! and a saved cookie jar standing in for the browser session.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::Router;
use axum_test::{TestServer, TestServerConfig};
use hearth::api;
use hearth::db::{self, DbPool};
use hearth::services::WeatherService;
use hearth::AppState;
use serde_json::{json, Value};

// ============================================================================
// Test Setup Helpers
// ============================================================================

/// Create a test database with the schema applied
async fn setup_test_db() -> DbPool {
    let pool = db::init_pool(":memory:")
        .await
        .expect("Failed to create test database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

/// Build a test server with cookie persistence enabled
async fn build_test_app() -> (TestServer, DbPool) {
    let pool = setup_test_db().await;

    let state = AppState {
        db: pool.clone(),
        // Never contacted by these tests
        weather: Arc::new(WeatherService::new("http://127.0.0.1:9/forecast")),
    };

    let app = Router::new()
        .nest("/api", api::routes(state.clone()))
        .with_state(state);

    let config = TestServerConfig {
        save_cookies: true,
        default_content_type: Some("application/json".to_string()),
        ..TestServerConfig::default()
    };
    let server = TestServer::new_with_config(app, config).expect("Failed to create test server");

    (server, pool)
}

/// Register an account (also logging the cookie jar in) and return the
/// profile from the response envelope.
async fn register(server: &TestServer, username: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({"username": username, "password": "correct horse"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// Create a record in a collection and return it.
async fn create_record(server: &TestServer, collection: &str, body: Value) -> Value {
    let response = server
        .post(&format!("/api/{}", collection))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_returns_enveloped_status() {
    let (server, _pool) = build_test_app().await;

    let response = server.get("/api/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["error"].is_null());
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["uptime"].is_number());
    assert!(body["data"]["version"].is_string());
    assert!(body["data"]["timestamp"].as_str().unwrap().contains('T'));
}

// ============================================================================
// Auth Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_register_creates_account_and_session() {
    let (server, _pool) = build_test_app().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({"username": "  alice  ", "password": "pw123456"}))
        .await;

    response.assert_status(StatusCode::CREATED);

    let cookie = response.cookie("sid");
    assert!(!cookie.value().is_empty());

    let body: Value = response.json();
    assert!(body["error"].is_null());
    let profile = &body["data"];
    assert_eq!(profile["username"], "alice");
    assert!(profile["id"].is_string());
    assert!(profile["createdAt"].is_string());
    assert!(profile["updatedAt"].is_string());
    // The hash never leaves the server
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("password_hash").is_none());

    // The fresh session works immediately
    let me: Value = server.get("/api/me").await.json();
    assert_eq!(me["data"]["username"], "alice");
}

#[tokio::test]
async fn test_register_requires_username_and_password() {
    let (server, _pool) = build_test_app().await;

    for body in [
        json!({}),
        json!({"username": "alice"}),
        json!({"username": "   ", "password": "pw"}),
        json!({"username": "alice", "password": ""}),
    ] {
        let response = server.post("/api/auth/register").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["data"].is_null());
        assert_eq!(body["error"], "Username and password required");
    }
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let (server, _pool) = build_test_app().await;

    register(&server, "alice").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({"username": "alice", "password": "another"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Username already exists");
}

#[tokio::test]
async fn test_login_round_trip() {
    let (server, _pool) = build_test_app().await;

    register(&server, "alice").await;
    server.post("/api/auth/logout").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "alice", "password": "correct horse"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "alice");
    assert!(!response.cookie("sid").value().is_empty());

    let me: Value = server.get("/api/me").await.json();
    assert_eq!(me["data"]["username"], "alice");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_uniformly() {
    let (server, _pool) = build_test_app().await;

    register(&server, "alice").await;
    server.post("/api/auth/logout").await;

    // Wrong password and unknown user answer identically
    for body in [
        json!({"username": "alice", "password": "wrong"}),
        json!({"username": "nobody", "password": "correct horse"}),
    ] {
        let response = server.post("/api/auth/login").json(&body).await;
        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert!(body["data"].is_null());
        assert_eq!(body["error"], "Invalid username or password");
    }
}

#[tokio::test]
async fn test_me_requires_session() {
    let (server, _pool) = build_test_app().await;

    let response = server.get("/api/me").await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let (server, _pool) = build_test_app().await;

    register(&server, "alice").await;

    let response = server.post("/api/auth/logout").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["success"], true);

    // The session row is gone server-side
    server.get("/api/me").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let (server, _pool) = build_test_app().await;

    let response = server.post("/api/auth/logout").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["success"], true);
}

// ============================================================================
// Envelope and Fallback Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_api_route_is_enveloped_404() {
    let (server, _pool) = build_test_app().await;

    let response = server.get("/api/definitely-not-a-route").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn test_malformed_json_is_enveloped_400() {
    let (server, _pool) = build_test_app().await;
    register(&server, "alice").await;

    let response = server
        .post("/api/todos")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{ not json"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_collections_require_a_session() {
    let (server, _pool) = build_test_app().await;

    for collection in ["links", "todos", "notes", "events"] {
        let response = server.get(&format!("/api/{}", collection)).await;
        response.assert_status_unauthorized();
        assert_eq!(
            response.json::<Value>()["error"],
            "Authentication required"
        );
    }
}

// ============================================================================
// Todos Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_todo_crud_flow() {
    let (server, _pool) = build_test_app().await;
    register(&server, "alice").await;

    // Create
    let todo = create_record(&server, "todos", json!({"text": "  buy milk  "})).await;
    assert_eq!(todo["text"], "buy milk");
    assert_eq!(todo["done"], false);
    assert!(todo["id"].is_string());
    assert_eq!(todo["createdAt"], todo["updatedAt"]);

    let id = todo["id"].as_str().unwrap();

    // List preserves insertion order
    create_record(&server, "todos", json!({"text": "water plants"})).await;
    let list: Value = server.get("/api/todos").await.json();
    let items = list["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["text"], "buy milk");
    assert_eq!(items[1]["text"], "water plants");

    // Update
    let response = server
        .put(&format!("/api/todos/{}", id))
        .json(&json!({"done": true}))
        .await;
    response.assert_status_ok();
    let updated = response.json::<Value>()["data"].clone();
    assert_eq!(updated["done"], true);
    assert_eq!(updated["text"], "buy milk");
    assert_eq!(updated["createdAt"], todo["createdAt"]);

    // Delete returns the removed record
    let response = server.delete(&format!("/api/todos/{}", id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["id"], id);

    // Gone now
    let response = server.delete(&format!("/api/todos/{}", id)).await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"], "Record not found");
}

#[tokio::test]
async fn test_todo_validation_messages() {
    let (server, _pool) = build_test_app().await;
    register(&server, "alice").await;

    let response = server.post("/api/todos").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Todo text is required");

    let response = server
        .post("/api/todos")
        .json(&json!({"text": "x", "done": "yep"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "done must be a boolean");

    let todo = create_record(&server, "todos", json!({"text": "x"})).await;
    let id = todo["id"].as_str().unwrap();

    let response = server
        .put(&format!("/api/todos/{}", id))
        .json(&json!({"text": "   "}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Todo text cannot be empty"
    );

    // An update that normalizes to nothing is rejected
    let response = server
        .put(&format!("/api/todos/{}", id))
        .json(&json!({"unknown": "field"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No fields to update");

    let response = server
        .put("/api/todos/no-such-id")
        .json(&json!({"done": true}))
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"], "Record not found");
}

#[tokio::test]
async fn test_records_are_isolated_per_user() {
    let (server, _pool) = build_test_app().await;

    register(&server, "alice").await;
    let todo = create_record(&server, "todos", json!({"text": "alice's secret"})).await;
    let id = todo["id"].as_str().unwrap();

    // Registering bob switches the saved cookie to his session
    register(&server, "bob").await;

    let list: Value = server.get("/api/todos").await.json();
    assert_eq!(list["data"].as_array().unwrap().len(), 0);

    let response = server
        .put(&format!("/api/todos/{}", id))
        .json(&json!({"done": true}))
        .await;
    response.assert_status_not_found();

    let response = server.delete(&format!("/api/todos/{}", id)).await;
    response.assert_status_not_found();
}

// ============================================================================
// Links Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_link_normalization_over_http() {
    let (server, _pool) = build_test_app().await;
    register(&server, "alice").await;

    // `title` works as an alias and the scheme defaults to https
    let link = create_record(
        &server,
        "links",
        json!({"title": "  Docs  ", "url": "docs.rs", "pinned": true}),
    )
    .await;
    assert_eq!(link["label"], "Docs");
    assert_eq!(link["url"], "https://docs.rs");
    assert_eq!(link["pinned"], true);

    let response = server.post("/api/links").json(&json!({"url": "x.com"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Label is required");

    let response = server.post("/api/links").json(&json!({"label": "x"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "URL is required");

    // Updates renormalize the URL too
    let id = link["id"].as_str().unwrap();
    let response = server
        .put(&format!("/api/links/{}", id))
        .json(&json!({"url": "new.example.com"}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["data"]["url"],
        "https://new.example.com"
    );
}

// ============================================================================
// Notes Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_note_body_rules_over_http() {
    let (server, _pool) = build_test_app().await;
    register(&server, "alice").await;

    let response = server
        .post("/api/notes")
        .json(&json!({"title": "no body"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Note body is required");

    let note = create_record(
        &server,
        "notes",
        json!({"body": "  remember the cables  ", "title": "packing"}),
    )
    .await;
    assert_eq!(note["body"], "remember the cables");
    assert_eq!(note["title"], "packing");

    let id = note["id"].as_str().unwrap();
    let response = server
        .put(&format!("/api/notes/{}", id))
        .json(&json!({"body": ""}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Note body cannot be empty"
    );
}

// ============================================================================
// Events Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_event_listing_filters_and_sorts() {
    let (server, _pool) = build_test_app().await;
    register(&server, "planner").await;

    create_record(
        &server,
        "events",
        json!({"title": "Retro", "startISO": "2026-03-03T10:00:00Z"}),
    )
    .await;
    // Offsets normalize to UTC: this one starts 2026-03-01T08:00Z
    create_record(
        &server,
        "events",
        json!({"title": "Standup", "startISO": "2026-03-01T09:00:00+01:00"}),
    )
    .await;
    create_record(
        &server,
        "events",
        json!({
            "title": "Planning",
            "startISO": "2026-03-02T09:00:00Z",
            "endISO": "2026-03-02T10:00:00Z",
        }),
    )
    .await;

    // Full list sorts ascending by start regardless of insertion order
    let list: Value = server.get("/api/events").await.json();
    let titles: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Standup", "Planning", "Retro"]);
    assert_eq!(list["data"][0]["startISO"], "2026-03-01T08:00:00.000Z");

    // Inclusive from/to bounds on the start instant
    let response = server
        .get("/api/events")
        .add_query_param("from", "2026-03-02")
        .add_query_param("to", "2026-03-02T23:59:59Z")
        .await;
    response.assert_status_ok();
    let bounded: Value = response.json();
    let titles: Vec<&str> = bounded["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Planning"]);
}

#[tokio::test]
async fn test_event_update_validations() {
    let (server, _pool) = build_test_app().await;
    register(&server, "planner").await;

    let event = create_record(
        &server,
        "events",
        json!({
            "title": "Planning",
            "startISO": "2026-03-02T09:00:00Z",
            "endISO": "2026-03-02T10:00:00Z",
        }),
    )
    .await;
    let id = event["id"].as_str().unwrap();

    // Moving only the end before the stored start is caught
    let response = server
        .put(&format!("/api/events/{}", id))
        .json(&json!({"endISO": "2026-03-01T00:00:00Z"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "endISO must be after startISO"
    );

    // Clearing the end removes the field entirely
    let response = server
        .put(&format!("/api/events/{}", id))
        .json(&json!({"endISO": null}))
        .await;
    response.assert_status_ok();
    let updated = response.json::<Value>()["data"].clone();
    assert!(updated.get("endISO").is_none());
    assert_eq!(updated["title"], "Planning");

    let response = server
        .put(&format!("/api/events/{}", id))
        .json(&json!({"startISO": "soon"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "startISO must be a valid ISO string"
    );

    let response = server
        .put(&format!("/api/events/{}", id))
        .json(&json!({"title": ""}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Event title cannot be empty"
    );
}

#[tokio::test]
async fn test_event_create_validations() {
    let (server, _pool) = build_test_app().await;
    register(&server, "planner").await;

    let response = server
        .post("/api/events")
        .json(&json!({"startISO": "2026-03-01"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Event title is required");

    let response = server
        .post("/api/events")
        .json(&json!({"title": "x", "startISO": "soonish"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Valid startISO is required"
    );

    let response = server
        .post("/api/events")
        .json(&json!({
            "title": "x",
            "startISO": "2026-03-02T00:00:00Z",
            "endISO": "2026-03-01T00:00:00Z",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "endISO must be after startISO"
    );
}

// ============================================================================
// Weather Endpoint Tests (validation only; the upstream is mocked in
// tests/weather_integration.rs)
// ============================================================================

#[tokio::test]
async fn test_weather_requires_coordinates() {
    let (server, _pool) = build_test_app().await;

    for query in [
        vec![],
        vec![("lat", "40.7")],
        vec![("lat", "abc"), ("lon", "10")],
    ] {
        let mut request = server.get("/api/weather");
        for (key, value) in query {
            request = request.add_query_param(key, value);
        }
        let response = request.await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "Query parameters lat and lon are required"
        );
    }
}

#[tokio::test]
async fn test_weather_range_checks() {
    let (server, _pool) = build_test_app().await;

    let response = server
        .get("/api/weather")
        .add_query_param("lat", "91")
        .add_query_param("lon", "0")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Latitude must be between -90 and 90"
    );

    let response = server
        .get("/api/weather")
        .add_query_param("lat", "45")
        .add_query_param("lon", "-181")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Longitude must be between -180 and 180"
    );
}
