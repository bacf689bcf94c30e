//! The signed-in store, as seen by handlers.

use chrono::{DateTime, Utc};
use sav_core::{AuthSession, MagasinCode};
use serde::Serialize;

/// Store identity extracted from a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentStore {
    /// Signed-in store.
    pub magasin: MagasinCode,
    /// When the session stops being valid.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether "remember me" was ticked.
    pub remember: bool,
}

impl CurrentStore {
    /// Whether this is the head office.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.magasin.is_admin()
    }
}

impl From<&AuthSession> for CurrentStore {
    fn from(session: &AuthSession) -> Self {
        Self {
            magasin: session.magasin.clone(),
            expires_at: session.expires_at(),
            remember: session.remember,
        }
    }
}
