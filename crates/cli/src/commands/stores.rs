//! Store directory commands.

use chrono::Utc;
use sav_core::{AuthPolicy, LoginAttempts, PinAuthenticator};
use tracing::info;

use super::{CliError, directory_from_env};

/// List store codes and names.
///
/// # Errors
///
/// Returns an error if `SAV_STORE_PINS` is malformed.
pub fn list() -> Result<(), CliError> {
    let directory = directory_from_env()?;
    info!("{} store(s) configured", directory.len());
    for entry in directory.iter() {
        info!("  {:<8} {}", entry.code.as_str(), entry.name);
    }
    Ok(())
}

/// Check a store code and PIN against the directory.
///
/// # Errors
///
/// Returns [`CliError::Auth`] when the PIN is refused or malformed.
pub fn verify_pin(store: &str, pin: &str) -> Result<(), CliError> {
    let directory = directory_from_env()?;
    let auth = PinAuthenticator::new(directory, AuthPolicy::default());
    let mut attempts = LoginAttempts::default();

    let session = auth.attempt(&mut attempts, store, pin, false, Utc::now())?;
    info!(magasin = %session.magasin, "PIN accepted");
    Ok(())
}
