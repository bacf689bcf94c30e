//! Integration tests for the SAV Audition back office.
//!
//! Each test spawns the full router (sessions, tracing, Sentry layers) on
//! an ephemeral port over an in-memory document store, then drives it
//! with a cookie-keeping HTTP client, like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sav-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use sav_admin::config::AdminConfig;
use sav_admin::state::AppState;
use sav_admin::store::MemoryStore;
use serde_json::{Value, json};

/// A running back office bound to `127.0.0.1`.
pub struct TestServer {
    addr: SocketAddr,
    store: MemoryStore,
}

impl TestServer {
    /// Start a server with the built-in store table and default policy.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Start a server after adjusting the local configuration.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn_with(configure: impl FnOnce(&mut AdminConfig)) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let mut config = AdminConfig::local(&format!("http://{addr}"));
        configure(&mut config);

        let store = MemoryStore::new();
        let state = AppState::with_store(config, Arc::new(store.clone()));
        let app = sav_admin::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, store }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Backing store, for assertions on what was persisted.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// A fresh browser: own cookie jar, no redirects followed.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn browser(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Post a PIN login and return the raw response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login(&self, client: &Client, magasin: &str, pin: &str) -> Response {
        client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "magasin": magasin, "pin": pin }))
            .send()
            .await
            .expect("Failed to send login request")
    }

    /// A browser already signed in as `magasin`.
    ///
    /// # Panics
    ///
    /// Panics if the login is refused.
    pub async fn signed_in(&self, magasin: &str, pin: &str) -> Client {
        let client = self.browser();
        let resp = self.login(&client, magasin, pin).await;
        assert_eq!(resp.status(), StatusCode::OK, "login as {magasin} failed");
        client
    }
}

/// Send a JSON request and return status and parsed body (`Null` when empty).
///
/// # Panics
///
/// Panics if the request cannot be sent.
pub async fn send_json(request: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let resp = request.send().await.expect("Failed to send request");
    let status = resp.status();
    let text = resp.text().await.expect("Failed to read response");
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, body)
}
