//! Integration tests for CypherSafe backend API endpoints.
//!
//! Tests the full HTTP API: share create/open semantics, note operations,
//! identity handling, and error codes. Time-dependent tests drive a
//! manual store clock.

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, TimeZone, Utc};
use cyphersafe_backend::{build_router, config::Config, handlers::AppState};
use cyphersafe_core::{Clock, ManualClock};
use serde_json::{json, Value};
use std::sync::Arc;

const NONCE_B64: &str = "AAECAwQFBgcICQoL"; // 12 bytes

/// Build test server on the system clock
fn build_test_server() -> TestServer {
    let state = AppState::new(Config::default());
    TestServer::new(build_router(state)).unwrap()
}

/// Build test server on a manual clock
fn build_test_server_with_clock() -> (TestServer, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap());
    let state = AppState::with_clock(Config::default(), Arc::new(clock.clone()));
    (TestServer::new(build_router(state)).unwrap(), clock)
}

/// Create authorization header value
fn auth_header(identity: &str) -> String {
    format!("Bearer {}", identity)
}

fn ciphertext_b64() -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, [0x42u8; 37])
}

async fn create_share(server: &TestServer, body: Value) -> String {
    let response = server
        .post("/v1/shares")
        .add_header(header::AUTHORIZATION, auth_header("creator"))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["share_id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = build_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["shares"], 0);
}

// =============================================================================
// Share Tests
// =============================================================================

#[tokio::test]
async fn test_view_once_share_opens_once() {
    let server = build_test_server();
    let share_id = create_share(
        &server,
        json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64, "view_once": true }),
    )
    .await;
    assert_eq!(share_id.len(), 43);

    let response = server.post(&format!("/v1/shares/{share_id}/open")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ciphertext"], ciphertext_b64());
    assert_eq!(body["nonce"], NONCE_B64);

    let response = server.post(&format!("/v1/shares/{share_id}/open")).await;
    response.assert_status(StatusCode::GONE);
    let body: Value = response.json();
    assert_eq!(body["code"], "LINK_CONSUMED");
}

#[tokio::test]
async fn test_timed_share_expires_on_store_clock() {
    let (server, clock) = build_test_server_with_clock();
    let expires_at = clock.now() + Duration::hours(1);
    let share_id = create_share(
        &server,
        json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64, "expires_at": expires_at }),
    )
    .await;

    clock.advance(Duration::minutes(30));
    for _ in 0..2 {
        server
            .post(&format!("/v1/shares/{share_id}/open"))
            .await
            .assert_status_ok();
    }

    clock.advance(Duration::minutes(31));
    let response = server.post(&format!("/v1/shares/{share_id}/open")).await;
    response.assert_status(StatusCode::GONE);
    let body: Value = response.json();
    assert_eq!(body["code"], "LINK_EXPIRED");
}

#[tokio::test]
async fn test_open_unknown_share() {
    let server = build_test_server();

    let response = server.post("/v1/shares/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA/open").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "LINK_NOT_FOUND");

    // Malformed ids look the same as unknown ones
    let response = server.post("/v1/shares/not%20an%20id/open").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_open_is_post_only() {
    let server = build_test_server();
    let share_id = create_share(
        &server,
        json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64, "view_once": true }),
    )
    .await;

    let response = server.get(&format!("/v1/shares/{share_id}/open")).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

    // Still unconsumed
    server
        .post(&format!("/v1/shares/{share_id}/open"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_create_share_rejects_invalid_modes() {
    let server = build_test_server();
    let in_an_hour = Utc::now() + Duration::hours(1);

    for body in [
        json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64 }),
        json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64, "view_once": true, "expires_at": in_an_hour }),
        json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64, "expires_at": Utc::now() - Duration::hours(1) }),
        json!({ "ciphertext": "!!not base64!!", "nonce": NONCE_B64, "view_once": true }),
        json!({ "ciphertext": ciphertext_b64(), "nonce": "AAEC", "view_once": true }),
    ] {
        let response = server
            .post("/v1/shares")
            .add_header(header::AUTHORIZATION, auth_header("creator"))
            .json(&body)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_INPUT");
    }
}

#[tokio::test]
async fn test_create_share_requires_identity() {
    let server = build_test_server();

    let response = server
        .post("/v1/shares")
        .json(&json!({ "ciphertext": ciphertext_b64(), "nonce": NONCE_B64, "view_once": true }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_AUTH");
}

#[tokio::test]
async fn test_share_cleanup_endpoint() {
    let (server, clock) = build_test_server_with_clock();
    create_share(
        &server,
        json!({
            "ciphertext": ciphertext_b64(),
            "nonce": NONCE_B64,
            "expires_at": clock.now() + Duration::minutes(5)
        }),
    )
    .await;

    clock.advance(Duration::minutes(10));
    let response = server.post("/v1/shares/cleanup").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["expired"], 1);
    assert_eq!(body["forgotten"], 0);

    // Idempotent
    let body: Value = server.post("/v1/shares/cleanup").await.json();
    assert_eq!(body["expired"], 0);
}

// =============================================================================
// Note Tests
// =============================================================================

#[tokio::test]
async fn test_escaped_note_at_size_limit() {
    let mut config = Config::default();
    config.max_ciphertext_size = 1024;
    config.max_note_size = 1024;
    let server = TestServer::new(build_router(AppState::new(config))).unwrap();

    // Each control character is six bytes once JSON-escaped
    let response = server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth_header("alice"))
        .json(&json!({ "title": "escaped", "content": "\u{1}".repeat(1024) }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth_header("alice"))
        .json(&json!({ "title": "too big", "content": "\u{1}".repeat(1025) }))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_note_crud_flow() {
    let server = build_test_server();
    let auth = auth_header("alice");

    let response = server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Shopping list", "content": "eggs" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["note"]["title"], "Shopping list");
    assert!(body["server_time"].is_string());

    let response = server
        .put("/v1/notes/Shopping%20list")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "content": "eggs, milk" }))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/v1/notes/Shopping%20list")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["note"]["content"], "eggs, milk");

    server
        .delete("/v1/notes/Shopping%20list")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = server
        .get("/v1/notes/Shopping%20list")
        .add_header(header::AUTHORIZATION, auth)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOTE_NOT_FOUND");
}

#[tokio::test]
async fn test_note_duplicate_and_validation() {
    let server = build_test_server();
    let auth = auth_header("alice");

    server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Plan", "content": "a" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Plan", "content": "b" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOTE_EXISTS");

    let response = server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "title": "", "content": "b" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_notes_are_scoped_to_caller() {
    let server = build_test_server();

    server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth_header("alice"))
        .json(&json!({ "title": "Diary", "content": "private" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/v1/notes")
        .add_header(header::AUTHORIZATION, auth_header("bob"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["notes"].as_array().unwrap().len(), 0);

    server
        .get("/v1/notes/Diary")
        .add_header(header::AUTHORIZATION, auth_header("bob"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_search() {
    let server = build_test_server();
    let auth = auth_header("alice");

    for (title, content) in [("Recipes", "Pancakes"), ("Work", "quarterly pancake review"), ("Misc", "none")] {
        server
            .post("/v1/notes")
            .add_header(header::AUTHORIZATION, auth.clone())
            .json(&json!({ "title": title, "content": content }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get("/v1/notes/search")
        .add_query_param("q", "PANCAKE")
        .add_header(header::AUTHORIZATION, auth)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let titles: Vec<&str> = body["notes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Recipes", "Work"]);
}

#[tokio::test]
async fn test_self_destruct_hides_then_sweeps() {
    let (server, clock) = build_test_server_with_clock();
    let auth = auth_header("alice");

    server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Ephemeral", "content": "gone soon" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/v1/notes/Ephemeral/self-destruct")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "duration_seconds": 5 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let deadline = clock.now() + Duration::seconds(5);
    assert_eq!(
        body["self_destruct_at"].as_str().unwrap().parse::<chrono::DateTime<Utc>>().unwrap(),
        deadline
    );

    clock.advance(Duration::seconds(5));

    // Hidden before any sweep
    let body: Value = server
        .get("/v1/notes")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    assert!(body["notes"].as_array().unwrap().is_empty());

    let body: Value = server
        .post("/v1/notes/cleanup")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(body["deleted"], 1);

    let body: Value = server
        .delete("/v1/notes/expired")
        .add_header(header::AUTHORIZATION, auth)
        .await
        .json();
    assert_eq!(body["deleted"], 0);
}

#[tokio::test]
async fn test_self_destruct_rejects_bad_duration() {
    let server = build_test_server();
    let auth = auth_header("alice");

    server
        .post("/v1/notes")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "n", "content": "c" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/v1/notes/n/self-destruct")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "duration_seconds": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/notes/missing/self-destruct")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "duration_seconds": 60 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// Identity Tests
// =============================================================================

#[tokio::test]
async fn test_notes_require_identity() {
    let server = build_test_server();

    let response = server.get("/v1/notes").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_AUTH");

    let response = server
        .get("/v1/notes")
        .add_header(header::AUTHORIZATION, "Token abc".to_string())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_AUTH");
}
