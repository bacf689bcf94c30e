//! Server-side failed-login counters, one per store.

use std::collections::HashMap;

use sav_core::LoginAttempts;
use tokio::sync::{Mutex, MutexGuard};

/// Failed-attempt counters keyed by [`PinAuthenticator::attempt_key`].
///
/// Lives in application state so the lockout holds whichever browser,
/// cookie or client the attempts come from.
///
/// [`PinAuthenticator::attempt_key`]: sav_core::PinAuthenticator::attempt_key
#[derive(Debug, Default)]
pub struct LoginLedger {
    counters: Mutex<HashMap<String, LoginAttempts>>,
}

impl LoginLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the counters for one read-modify-write.
    pub(super) async fn lock(&self) -> MutexGuard<'_, HashMap<String, LoginAttempts>> {
        self.counters.lock().await
    }

    /// Current counter for `key`, a fresh one when nothing failed yet.
    pub async fn get(&self, key: &str) -> LoginAttempts {
        self.counters.lock().await.get(key).cloned().unwrap_or_default()
    }
}
