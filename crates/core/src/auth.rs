//! PIN login, lockout and session expiry.
//!
//! Everything here is pure: callers pass the current time and hand back
//! whatever state they keep between requests ([`LoginAttempts`] and the
//! stored [`AuthSession`]).

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{MagasinCode, MagasinCodeError, Pin, PinError, StoreDirectory};

/// Session storage keys.
pub mod keys {
    /// Authenticated session.
    pub const AUTH: &str = "sav_auth";
    /// Failed attempt counter and lockout deadline.
    pub const LOGIN_ATTEMPTS: &str = "sav_login_attempts";
    /// Half-filled intervention form.
    pub const INTERVENTION_DRAFT: &str = "sav_intervention_data";
}

/// Failure counter shared by every code missing from the directory.
pub const UNKNOWN_STORE_KEY: &str = "*";

/// Lockout and session lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// Consecutive failures that trigger a lockout.
    pub max_attempts: u32,
    /// How long a lockout lasts.
    pub lockout: Duration,
    /// Session lifetime without "remember me".
    pub session_ttl: Duration,
    /// Session lifetime with "remember me".
    pub remember_ttl: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            lockout: Duration::minutes(5),
            session_ttl: Duration::hours(24),
            remember_ttl: Duration::days(30),
        }
    }
}

impl AuthPolicy {
    /// Lifetime of a session started with the given `remember` flag.
    #[must_use]
    pub const fn ttl(&self, remember: bool) -> Duration {
        if remember {
            self.remember_ttl
        } else {
            self.session_ttl
        }
    }
}

/// A logged-in store session, as stored under [`keys::AUTH`].
///
/// `timestamp` is the login instant and `expiry` the lifetime, both in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub authenticated: bool,
    pub magasin: MagasinCode,
    pub timestamp: i64,
    pub expiry: i64,
    #[serde(default)]
    pub remember: bool,
}

impl AuthSession {
    /// Start a session for `magasin` at `now`.
    #[must_use]
    pub fn start(
        magasin: MagasinCode,
        remember: bool,
        now: DateTime<Utc>,
        policy: &AuthPolicy,
    ) -> Self {
        Self {
            authenticated: true,
            magasin,
            timestamp: now.timestamp_millis(),
            expiry: policy.ttl(remember).num_milliseconds(),
            remember,
        }
    }

    /// Whether the session has outlived its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis().saturating_sub(self.timestamp) > self.expiry
    }

    /// Whether the session grants access at `now`.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.authenticated && !self.is_expired(now)
    }

    /// When the session stops being valid.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp.saturating_add(self.expiry))
            .single()
    }
}

/// Outcome of checking a stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    /// Nothing stored.
    Missing,
    /// Stored but expired or not authenticated; the caller must remove it.
    Expired,
    /// Usable session.
    Valid(AuthSession),
}

impl SessionCheck {
    /// Classify whatever was read from session storage.
    #[must_use]
    pub fn evaluate(stored: Option<AuthSession>, now: DateTime<Utc>) -> Self {
        match stored {
            None => Self::Missing,
            Some(session) if session.is_valid(now) => Self::Valid(session),
            Some(_) => Self::Expired,
        }
    }

    /// Whether the stored entry must be purged.
    #[must_use]
    pub const fn needs_purge(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// The valid session, if any.
    #[must_use]
    pub fn into_session(self) -> Option<AuthSession> {
        match self {
            Self::Valid(session) => Some(session),
            Self::Missing | Self::Expired => None,
        }
    }
}

/// Failed login bookkeeping, as stored under [`keys::LOGIN_ATTEMPTS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempts {
    #[serde(default)]
    pub failures: u32,
    /// End of the current lockout, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<i64>,
}

impl LoginAttempts {
    /// End of the lockout if it is still running at `now`.
    #[must_use]
    pub fn lockout_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let until = self.locked_until?;
        if until > now.timestamp_millis() {
            Utc.timestamp_millis_opt(until).single()
        } else {
            None
        }
    }

    /// Whether a lockout is running at `now`.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end(now).is_some()
    }

    /// Drop an elapsed lockout so counting starts afresh.
    fn expire(&mut self, now: DateTime<Utc>) {
        if self.locked_until.is_some() && !self.is_locked(now) {
            *self = Self::default();
        }
    }

    /// Count one failure and lock when the limit is reached.
    fn record_failure(&mut self, now: DateTime<Utc>, policy: &AuthPolicy) {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= policy.max_attempts {
            self.locked_until = Some((now + policy.lockout).timestamp_millis());
        }
    }
}

/// Why a login was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Store code is not well-formed. Not counted as an attempt.
    #[error("invalid store code: {0}")]
    InvalidStoreCode(#[from] MagasinCodeError),
    /// PIN is not four digits. Not counted as an attempt.
    #[error("invalid PIN: {0}")]
    InvalidPinFormat(#[from] PinError),
    /// Wrong PIN or unknown store.
    #[error("incorrect store or PIN, {remaining_attempts} attempt(s) left")]
    Rejected {
        /// Attempts left before lockout.
        remaining_attempts: u32,
    },
    /// Too many failures; every attempt is refused until `until`.
    #[error("too many attempts, retry in {remaining_seconds}s")]
    LockedOut {
        /// End of the lockout.
        until: DateTime<Utc>,
        /// Whole seconds left, rounded up.
        remaining_seconds: i64,
    },
}

impl AuthError {
    /// Whether the error comes from malformed input rather than a wrong PIN.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::InvalidStoreCode(_) | Self::InvalidPinFormat(_))
    }
}

/// Checks PINs against a directory and enforces the lockout.
#[derive(Debug, Clone)]
pub struct PinAuthenticator {
    directory: StoreDirectory,
    policy: AuthPolicy,
}

impl PinAuthenticator {
    #[must_use]
    pub const fn new(directory: StoreDirectory, policy: AuthPolicy) -> Self {
        Self { directory, policy }
    }

    #[must_use]
    pub const fn directory(&self) -> &StoreDirectory {
        &self.directory
    }

    #[must_use]
    pub const fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Counter a login attempt on `magasin` is charged to.
    ///
    /// Known stores each have their own counter and every unknown code
    /// shares [`UNKNOWN_STORE_KEY`]. Malformed codes are never counted and
    /// get `None`.
    #[must_use]
    pub fn attempt_key(&self, magasin: &str) -> Option<String> {
        let code = MagasinCode::parse(magasin).ok()?;
        if self.directory.get(&code).is_some() {
            Some(code.to_string())
        } else {
            Some(UNKNOWN_STORE_KEY.to_owned())
        }
    }

    /// Try to log in to `magasin` with `pin`.
    ///
    /// `attempts` is updated in place and must be stored back by the
    /// caller whatever the outcome.
    ///
    /// ```
    /// use chrono::Utc;
    /// use sav_core::{AuthPolicy, LoginAttempts, PinAuthenticator, StoreDirectory};
    ///
    /// let auth = PinAuthenticator::new(StoreDirectory::builtin(), AuthPolicy::default());
    /// let mut attempts = LoginAttempts::default();
    /// let session = auth.attempt(&mut attempts, "ADMIN", "1988", false, Utc::now()).unwrap();
    /// assert!(session.magasin.is_admin());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the login is refused.
    pub fn attempt(
        &self,
        attempts: &mut LoginAttempts,
        magasin: &str,
        pin: &str,
        remember: bool,
        now: DateTime<Utc>,
    ) -> Result<AuthSession, AuthError> {
        attempts.expire(now);
        self.ensure_unlocked(attempts, now)?;

        let code = MagasinCode::parse(magasin)?;
        let pin = Pin::parse(pin.trim())?;

        if self.directory.verify(&code, &pin) {
            *attempts = LoginAttempts::default();
            return Ok(AuthSession::start(code, remember, now, &self.policy));
        }

        attempts.record_failure(now, &self.policy);
        self.ensure_unlocked(attempts, now)?;
        Err(AuthError::Rejected {
            remaining_attempts: self.policy.max_attempts.saturating_sub(attempts.failures),
        })
    }

    /// Fail with [`AuthError::LockedOut`] while a lockout runs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LockedOut`] with the countdown.
    pub fn ensure_unlocked(
        &self,
        attempts: &LoginAttempts,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        match attempts.lockout_end(now) {
            Some(until) => Err(AuthError::LockedOut {
                until,
                remaining_seconds: remaining_seconds(until, now),
            }),
            None => Ok(()),
        }
    }

    /// Attempts left before lockout.
    #[must_use]
    pub fn remaining_attempts(&self, attempts: &LoginAttempts, now: DateTime<Utc>) -> u32 {
        if attempts.is_locked(now) {
            0
        } else if attempts.locked_until.is_some() {
            self.policy.max_attempts
        } else {
            self.policy.max_attempts.saturating_sub(attempts.failures)
        }
    }
}

/// Seconds until `until`, rounded up so a countdown never shows 0 while locked.
fn remaining_seconds(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (until - now).num_milliseconds().max(0);
    (ms + 999) / 1000
}
