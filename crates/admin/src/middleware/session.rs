//! Session middleware configuration.
//!
//! Sessions are held in process memory with SameSite=Strict cookies. The
//! cookie outlives inactivity for as long as a "remember me" login lasts;
//! the login's own expiry is checked separately on every request.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sav_session";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    let inactivity = tower_sessions::cookie::time::Duration::seconds(
        config.auth.remember_ttl.num_seconds(),
    );

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(inactivity))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
