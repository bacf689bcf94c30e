//! PIN login, lockout and session checks over HTTP.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use sav_integration_tests::{TestServer, send_json};
use serde_json::Value;

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_with_correct_pin_opens_session() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let resp = server.login(&client, "ADMIN", "1988").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["magasin"], "ADMIN");
    assert_eq!(body["name"], "Direction");
    assert!(body["expires_at"].is_string());

    let (status, body) = send_json(client.get(server.url("/api/auth/status"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["magasin"], "ADMIN");
}

#[tokio::test]
async fn test_store_code_is_case_insensitive() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let resp = server.login(&client, " dij ", "5310").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_pin_reports_remaining_attempts() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let resp = server.login(&client, "BEA", "0000").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["remaining_attempts"], 2);
}

#[tokio::test]
async fn test_malformed_pin_is_bad_request_and_not_counted() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let resp = server.login(&client, "BEA", "12a4").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (_, body) = send_json(client.get(server.url("/api/auth/status"))).await;
    assert_eq!(body["remaining_attempts"], 3);
}

// ============================================================================
// Lockout
// ============================================================================

#[tokio::test]
async fn test_third_failure_locks_out_even_correct_pin() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    assert_eq!(
        server.login(&client, "DIJ", "0000").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        server.login(&client, "DIJ", "1111").await.status(),
        StatusCode::UNAUTHORIZED
    );

    let resp = server.login(&client, "DIJ", "2222").await;
    assert_eq!(resp.status(), StatusCode::LOCKED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["remaining_seconds"], 300);

    let resp = server.login(&client, "DIJ", "5310").await;
    assert_eq!(resp.status(), StatusCode::LOCKED);

    let (_, body) = send_json(client.get(server.url("/api/auth/status"))).await;
    assert_eq!(body["authenticated"], false);
    assert!(body["remaining_seconds"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_new_browser_cannot_escape_lockout() {
    let server = TestServer::spawn().await;
    for pin in ["0000", "1111", "2222"] {
        server.login(&server.browser(), "AUX", pin).await;
    }

    let fresh = server.browser();
    let resp = server.login(&fresh, "AUX", "4602").await;
    assert_eq!(resp.status(), StatusCode::LOCKED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["remaining_seconds"].as_i64().unwrap() > 0);

    let (_, body) = send_json(fresh.get(server.url("/api/auth/status"))).await;
    assert_eq!(body["remaining_attempts"], 0);

    let other_store = server.browser();
    assert_eq!(
        server.login(&other_store, "BEA", "2741").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_unknown_store_codes_share_one_counter() {
    let server = TestServer::spawn().await;
    for code in ["ZZA", "ZZB"] {
        assert_eq!(
            server.login(&server.browser(), code, "0000").await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
    assert_eq!(
        server.login(&server.browser(), "ZZC", "0000").await.status(),
        StatusCode::LOCKED
    );
}

#[tokio::test]
async fn test_lockout_expires_after_configured_duration() {
    let server = TestServer::spawn_with(|config| {
        config.auth.lockout = chrono::Duration::seconds(1);
    })
    .await;
    let client = server.browser();
    for pin in ["0000", "1111", "2222"] {
        server.login(&client, "MAC", pin).await;
    }
    assert_eq!(
        server.login(&client, "MAC", "3958").await.status(),
        StatusCode::LOCKED
    );

    tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;
    assert_eq!(
        server.login(&client, "MAC", "3958").await.status(),
        StatusCode::OK
    );
}

// ============================================================================
// Session guard
// ============================================================================

#[tokio::test]
async fn test_api_requires_session() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let (status, body) = send_json(client.get(server.url("/api/orders"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_pages_redirect_to_login() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let resp = client.get(server.url("/")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "/auth/login");

    let resp = client.get(server.url("/auth/login")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Dijon (DIJ)"));
    assert!(!html.contains("5310"), "PINs must never be rendered");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = TestServer::spawn().await;
    let client = server.signed_in("CHA", "8127").await;

    let resp = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Chalon-sur-Saône"));

    let resp = client.post(server.url("/auth/logout")).send().await.unwrap();
    assert!(resp.status().is_redirection());

    let (status, _) = send_json(client.get(server.url("/api/orders"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::spawn().await;
    let client = server.browser();

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "ok");

    let (status, body) = send_json(client.get(server.url("/health/ready"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");
}
