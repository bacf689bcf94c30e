//! PIN login API handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use sav_core::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::OptionalStoreAuth;
use crate::services::{StoreAuthError, StoreAuthService};
use crate::state::AppState;

/// Build the auth API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/status", get(status))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub magasin: String,
    pub pin: String,
    #[serde(default)]
    pub remember: bool,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub magasin: String,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session state for the login page and the header badge.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magasin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
}

/// Check a PIN and open a session.
///
/// POST /api/auth/login
#[instrument(skip_all, fields(magasin = %body.magasin))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Response {
    let service = StoreAuthService::new(state.auth(), state.login_ledger(), &session);
    match service
        .login(&body.magasin, &body.pin, body.remember, Utc::now())
        .await
    {
        Ok(auth) => {
            let name = state
                .auth()
                .directory()
                .get(&auth.magasin)
                .map_or_else(|| auth.magasin.to_string(), |entry| entry.name.clone());
            Json(LoginResponse {
                magasin: auth.magasin.to_string(),
                name,
                expires_at: auth.expires_at(),
            })
            .into_response()
        }
        Err(StoreAuthError::Auth(err)) => auth_error_response(&err),
        Err(StoreAuthError::Session(err)) => AppError::from(err).into_response(),
    }
}

/// Map a refused login to its HTTP answer.
fn auth_error_response(err: &AuthError) -> Response {
    match err {
        AuthError::Rejected { remaining_attempts } => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Code PIN incorrect",
                "remaining_attempts": remaining_attempts,
            })),
        )
            .into_response(),
        AuthError::LockedOut {
            until,
            remaining_seconds,
        } => (
            StatusCode::LOCKED,
            Json(json!({
                "error": "Trop de tentatives, réessayez plus tard",
                "locked_until": until,
                "remaining_seconds": remaining_seconds,
            })),
        )
            .into_response(),
        AuthError::InvalidStoreCode(_) | AuthError::InvalidPinFormat(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// Current session, or the lockout countdown when signed out.
///
/// GET /api/auth/status
#[instrument(skip_all)]
async fn status(
    OptionalStoreAuth(current): OptionalStoreAuth,
    State(state): State<AppState>,
    session: Session,
) -> Json<StatusResponse> {
    let now = Utc::now();
    let service = StoreAuthService::new(state.auth(), state.login_ledger(), &session);
    let remaining_attempts = service.remaining_attempts(now).await;
    let (locked_until, remaining_seconds) = match service.ensure_unlocked(now).await {
        Err(AuthError::LockedOut {
            until,
            remaining_seconds,
        }) => (Some(until), Some(remaining_seconds)),
        _ => (None, None),
    };

    Json(StatusResponse {
        authenticated: current.is_some(),
        magasin: current.as_ref().map(|c| c.magasin.to_string()),
        expires_at: current.and_then(|c| c.expires_at),
        remaining_attempts,
        locked_until,
        remaining_seconds,
    })
}
