//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Document store reachable
//!
//! # Pages
//! GET  /                       - Dashboard (auto-refresh)
//! GET  /auth/login             - Store picker, PIN pad, lockout countdown
//! POST /auth/logout            - Sign out
//!
//! # JSON API (see `api`)
//! POST /api/auth/login         - PIN login
//! GET  /api/auth/status        - Session or lockout countdown
//! ...                          - Store-scoped CRUD per collection
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use sav_core::{MagasinCode, Record};
use serde_json::json;

use crate::error::AppError;
use crate::models::CurrentStore;
use crate::state::AppState;
use crate::store::Repository;

/// Build the complete router (pages, API, health).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(api::router())
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(State(state): State<AppState>) -> Response {
    match state.store().ping().await {
        Ok(()) => Json(json!({ "status": "ready", "backend": state.store().backend() }))
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "backend": state.store().backend() })),
            )
                .into_response()
        }
    }
}

/// Load a record the signed-in store may see, or 404.
pub(crate) async fn load_scoped<T: Record>(
    repo: &Repository<T>,
    store: &CurrentStore,
    kind: &str,
    id: &str,
) -> Result<T, AppError> {
    repo.find_for(&store.magasin, id)
        .await?
        .ok_or_else(|| AppError::not_found(kind, id))
}

/// Store owning a new record.
///
/// Shops always create for themselves; the head office may target any
/// store and defaults to itself.
pub(crate) fn owner_for(
    store: &CurrentStore,
    requested: Option<MagasinCode>,
) -> Result<MagasinCode, AppError> {
    match requested {
        Some(code) if store.magasin.can_access(&code) => Ok(code),
        Some(code) => Err(AppError::Forbidden(format!(
            "{} cannot create records for {code}",
            store.magasin
        ))),
        None => Ok(store.magasin.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signed_in(code: &str) -> CurrentStore {
        CurrentStore {
            magasin: MagasinCode::parse(code).unwrap(),
            expires_at: None,
            remember: false,
        }
    }

    #[test]
    fn test_owner_defaults_to_session_store() {
        let dij = signed_in("DIJ");
        assert_eq!(owner_for(&dij, None).unwrap().as_str(), "DIJ");
    }

    #[test]
    fn test_shop_cannot_create_for_another_store() {
        let dij = signed_in("DIJ");
        let bea = MagasinCode::parse("BEA").unwrap();
        assert!(matches!(
            owner_for(&dij, Some(bea)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_may_target_any_store() {
        let admin = signed_in("ADMIN");
        let bea = MagasinCode::parse("BEA").unwrap();
        assert_eq!(owner_for(&admin, Some(bea)).unwrap().as_str(), "BEA");
    }
}
