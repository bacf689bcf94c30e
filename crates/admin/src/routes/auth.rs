//! Authentication page handlers.
//!
//! The login page renders the store picker and PIN pad; the PIN itself is
//! posted to `/api/auth/login`.

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use sav_core::AuthError;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::clear_sentry_store;
use crate::filters;
use crate::middleware::OptionalStoreAuth;
use crate::services::StoreAuthService;
use crate::state::AppState;

/// Store choice in the picker.
#[derive(Debug, Clone)]
pub struct StoreOption {
    pub code: String,
    pub name: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub stores: Vec<StoreOption>,
    pub max_attempts: u32,
    pub remaining_attempts: u32,
    /// Seconds left on a running lockout, zero when unlocked.
    pub locked_seconds: i64,
}

/// Build the auth page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page))
        .route("/auth/logout", post(logout))
}

/// Render the login page, or go home when already signed in.
///
/// GET /auth/login
#[instrument(skip_all)]
async fn login_page(
    OptionalStoreAuth(current): OptionalStoreAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    if current.is_some() {
        return Redirect::to("/").into_response();
    }

    let now = Utc::now();
    let service = StoreAuthService::new(state.auth(), state.login_ledger(), &session);
    let locked_seconds = match service.ensure_unlocked(now).await {
        Err(AuthError::LockedOut {
            remaining_seconds, ..
        }) => remaining_seconds,
        _ => 0,
    };

    let template = LoginPageTemplate {
        stores: state
            .auth()
            .directory()
            .iter()
            .map(|entry| StoreOption {
                code: entry.code.to_string(),
                name: entry.name.clone(),
            })
            .collect(),
        max_attempts: state.auth().policy().max_attempts,
        remaining_attempts: service.remaining_attempts(now).await,
        locked_seconds,
    };

    Html(
        template
            .render()
            .unwrap_or_else(|_| String::from("Error rendering template")),
    )
    .into_response()
}

/// Sign out and go back to the login page.
///
/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    if let Err(e) = StoreAuthService::new(state.auth(), state.login_ledger(), &session).logout().await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_store();
    Redirect::to("/auth/login")
}
