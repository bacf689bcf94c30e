//! Store authentication service.
//!
//! PIN login against the store directory. Failed attempts are counted per
//! store in the shared [`LoginLedger`]. The browser session holds the
//! signed-in state under [`keys::AUTH`] and a copy of the last counter it
//! ran into under [`keys::LOGIN_ATTEMPTS`], which feeds the login page
//! countdown.

mod error;
mod ledger;

pub use error::StoreAuthError;
pub use ledger::LoginLedger;

use chrono::{DateTime, Utc};
use sav_core::auth::keys;
use sav_core::{AuthError, AuthSession, LoginAttempts, PinAuthenticator, SessionCheck};
use tower_sessions::Session;

/// Read the signed-in session, purging it when expired.
///
/// Storage failures are logged and treated as "not signed in".
pub async fn current_session(session: &Session, now: DateTime<Utc>) -> Option<AuthSession> {
    let stored = match session.get::<AuthSession>(keys::AUTH).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read auth session, treating as signed out");
            return None;
        }
    };

    let check = SessionCheck::evaluate(stored, now);
    if check.needs_purge() {
        tracing::info!("Auth session expired, removing it");
        if let Err(e) = session.remove::<AuthSession>(keys::AUTH).await {
            tracing::warn!(error = %e, "Failed to purge expired auth session");
        }
    }
    check.into_session()
}

/// Store authentication service.
///
/// Borrows the authenticator and ledger from application state and the
/// request's session.
pub struct StoreAuthService<'a> {
    auth: &'a PinAuthenticator,
    ledger: &'a LoginLedger,
    session: &'a Session,
}

impl<'a> StoreAuthService<'a> {
    /// Create a new store authentication service.
    #[must_use]
    pub const fn new(
        auth: &'a PinAuthenticator,
        ledger: &'a LoginLedger,
        session: &'a Session,
    ) -> Self {
        Self {
            auth,
            ledger,
            session,
        }
    }

    /// Try to log in and, on success, store the new session.
    ///
    /// The store's counter is updated whatever the outcome and copied into
    /// the browser session.
    ///
    /// # Errors
    ///
    /// Returns `StoreAuthError::Auth` when the PIN check refuses the login,
    /// `StoreAuthError::Session` when the session cannot be written.
    pub async fn login(
        &self,
        magasin: &str,
        pin: &str,
        remember: bool,
        now: DateTime<Utc>,
    ) -> Result<AuthSession, StoreAuthError> {
        let key = self.auth.attempt_key(magasin);
        let (result, attempts) = {
            let mut counters = self.ledger.lock().await;
            let mut scratch = LoginAttempts::default();
            let attempts = match &key {
                Some(key) => counters.entry(key.clone()).or_default(),
                None => &mut scratch,
            };
            let result = self.auth.attempt(attempts, magasin, pin, remember, now);
            let snapshot = attempts.clone();
            if let Some(key) = key.as_ref().filter(|_| snapshot == LoginAttempts::default()) {
                counters.remove(key);
            }
            (result, snapshot)
        };
        if key.is_some() {
            self.session
                .insert(keys::LOGIN_ATTEMPTS, &attempts)
                .await?;
        }

        match result {
            Ok(auth) => {
                // New id on privilege change.
                self.session.cycle_id().await?;
                self.session.insert(keys::AUTH, &auth).await?;
                tracing::info!(magasin = %auth.magasin, remember, "Store signed in");
                Ok(auth)
            }
            Err(err) => {
                match &err {
                    AuthError::LockedOut { until, .. } => {
                        tracing::warn!(magasin, %until, "PIN login locked out");
                    }
                    AuthError::Rejected { remaining_attempts } => {
                        tracing::warn!(magasin, remaining_attempts, "PIN login rejected");
                    }
                    AuthError::InvalidStoreCode(_) | AuthError::InvalidPinFormat(_) => {
                        tracing::debug!(magasin, error = %err, "Malformed login attempt");
                    }
                }
                Err(err.into())
            }
        }
    }

    /// The running lockout, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LockedOut` with the countdown while locked.
    pub async fn ensure_unlocked(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        let attempts = self.attempts().await;
        self.auth.ensure_unlocked(&attempts, now)
    }

    /// Attempts left before lockout.
    pub async fn remaining_attempts(&self, now: DateTime<Utc>) -> u32 {
        let attempts = self.attempts().await;
        self.auth.remaining_attempts(&attempts, now)
    }

    /// Sign out. The attempt counter survives.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn logout(&self) -> Result<(), StoreAuthError> {
        let previous = self.session.remove::<AuthSession>(keys::AUTH).await?;
        self.session
            .remove::<serde_json::Value>(keys::INTERVENTION_DRAFT)
            .await?;
        if let Some(previous) = previous {
            tracing::info!(magasin = %previous.magasin, "Store signed out");
        }
        Ok(())
    }

    /// Counter copy held by this browser; unreadable state counts as a
    /// fresh start.
    async fn attempts(&self) -> LoginAttempts {
        match self.session.get::<LoginAttempts>(keys::LOGIN_ATTEMPTS).await {
            Ok(attempts) => attempts.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read login attempts");
                LoginAttempts::default()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use sav_core::{AuthPolicy, MagasinCode, StoreDirectory};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn authenticator() -> PinAuthenticator {
        PinAuthenticator::new(StoreDirectory::builtin(), AuthPolicy::default())
    }

    fn ledger() -> LoginLedger {
        LoginLedger::new()
    }

    #[tokio::test]
    async fn test_login_stores_session_and_expires_after_25h() {
        let session = session();
        let auth = authenticator();
        let ledger = ledger();
        let now = Utc::now();

        StoreAuthService::new(&auth, &ledger, &session)
            .login("ADMIN", "1988", false, now)
            .await
            .unwrap();

        let current = current_session(&session, now).await.unwrap();
        assert_eq!(current.magasin, MagasinCode::admin());
        assert_eq!(current.expiry, Duration::hours(24).num_milliseconds());

        assert!(current_session(&session, now + Duration::hours(25)).await.is_none());
        let raw: Option<AuthSession> = session.get(keys::AUTH).await.unwrap();
        assert!(raw.is_none(), "expired session must be purged");
    }

    #[tokio::test]
    async fn test_failures_persist_across_requests() {
        let session = session();
        let auth = authenticator();
        let ledger = ledger();
        let now = Utc::now();
        let service = StoreAuthService::new(&auth, &ledger, &session);

        for pin in ["0000", "1111"] {
            let _ = service.login("DIJ", pin, false, now).await;
        }
        assert_eq!(service.remaining_attempts(now).await, 1);

        let err = service.login("DIJ", "2222", false, now).await.unwrap_err();
        assert!(matches!(
            err,
            StoreAuthError::Auth(AuthError::LockedOut { .. })
        ));
        assert!(service.ensure_unlocked(now).await.is_err());
        assert!(service.login("DIJ", "5310", false, now).await.is_err());
        assert!(current_session(&session, now).await.is_none());
    }

    #[tokio::test]
    async fn test_lockout_survives_a_new_session() {
        let auth = authenticator();
        let ledger = ledger();
        let now = Utc::now();

        for pin in ["0000", "1111", "2222"] {
            let fresh = session();
            let _ = StoreAuthService::new(&auth, &ledger, &fresh)
                .login("DIJ", pin, false, now)
                .await;
        }
        assert!(ledger.get("DIJ").await.is_locked(now));

        let fresh = session();
        let err = StoreAuthService::new(&auth, &ledger, &fresh)
            .login("DIJ", "5310", false, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreAuthError::Auth(AuthError::LockedOut { .. })
        ));

        let other = session();
        StoreAuthService::new(&auth, &ledger, &other)
            .login("BEA", "2741", false, now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_success_resets_store_counter() {
        let auth = authenticator();
        let ledger = ledger();
        let session = session();
        let now = Utc::now();
        let service = StoreAuthService::new(&auth, &ledger, &session);

        let _ = service.login("AUX", "0000", false, now).await;
        assert_eq!(ledger.get("AUX").await.failures, 1);
        service.login("AUX", "4602", false, now).await.unwrap();
        assert_eq!(ledger.get("AUX").await, LoginAttempts::default());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let session = session();
        let auth = authenticator();
        let ledger = ledger();
        let now = Utc::now();
        let service = StoreAuthService::new(&auth, &ledger, &session);

        service.login("BEA", "2741", true, now).await.unwrap();
        service.logout().await.unwrap();
        assert!(current_session(&session, now).await.is_none());
    }
}
