//! Store login error types.

use sav_core::AuthError;
use thiserror::Error;

/// Errors that can occur while logging a store in.
#[derive(Debug, Error)]
pub enum StoreAuthError {
    /// The PIN check refused the login.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Session storage failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
