//! Authentication extractors for store sessions.
//!
//! Every protected request re-checks the session expiry. Expired sessions
//! are removed before the request is rejected.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde_json::json;
use tower_sessions::Session;

use crate::error::set_sentry_store;
use crate::models::CurrentStore;
use crate::services::current_session;

/// Extractor that requires a signed-in store.
///
/// Page requests are redirected to the login page, API requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireStoreAuth(store): RequireStoreAuth,
/// ) -> impl IntoResponse {
///     format!("Bonjour {}", store.magasin)
/// }
/// ```
pub struct RequireStoreAuth(pub CurrentStore);

/// Error returned when a store session is required but missing or expired.
pub enum StoreAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for StoreAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Session absente ou expirée" })),
            )
                .into_response(),
        }
    }
}

fn rejection_for(parts: &Parts) -> StoreAuthRejection {
    if parts.uri.path().starts_with("/api/") {
        StoreAuthRejection::Unauthorized
    } else {
        StoreAuthRejection::RedirectToLogin
    }
}

async fn load_store(parts: &Parts) -> Option<CurrentStore> {
    let session = parts.extensions.get::<Session>()?;
    let auth = current_session(session, Utc::now()).await?;
    set_sentry_store(auth.magasin.as_str());
    Some(CurrentStore::from(&auth))
}

impl<S> FromRequestParts<S> for RequireStoreAuth
where
    S: Send + Sync,
{
    type Rejection = StoreAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        load_store(parts)
            .await
            .map(Self)
            .ok_or_else(|| rejection_for(parts))
    }
}

/// Extractor that optionally gets the signed-in store.
pub struct OptionalStoreAuth(pub Option<CurrentStore>);

impl<S> FromRequestParts<S> for OptionalStoreAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(load_store(parts).await))
    }
}

/// Extractor that requires the head-office session.
///
/// Shops get 403 Forbidden.
pub struct RequireAdminStore(pub CurrentStore);

/// Error returned when the head-office session is required.
pub enum AdminStoreRejection {
    /// Not signed in.
    Auth(StoreAuthRejection),
    /// Signed in as a shop.
    Forbidden,
}

impl IntoResponse for AdminStoreRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Réservé au siège (ADMIN)" })),
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminStore
where
    S: Send + Sync,
{
    type Rejection = AdminStoreRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let store = load_store(parts)
            .await
            .ok_or_else(|| AdminStoreRejection::Auth(rejection_for(parts)))?;

        if !store.is_admin() {
            return Err(AdminStoreRejection::Forbidden);
        }
        Ok(Self(store))
    }
}
