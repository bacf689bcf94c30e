//! Store directory and store profile API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use sav_core::{Email, MagasinCode};
use sav_core::models::StoreProfile;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::{RequireAdminStore, RequireStoreAuth};
use crate::state::AppState;

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", get(list_stores))
        .route(
            "/api/stores/{code}/profile",
            get(get_profile).put(update_profile),
        )
}

/// Directory entry as exposed over the API. PINs never leave the server.
#[derive(Debug, Serialize)]
pub struct StoreSummary {
    pub code: String,
    pub name: String,
}

/// Editable profile fields.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub opening_hours: Option<String>,
}

/// GET /api/stores
#[instrument(skip_all)]
async fn list_stores(
    RequireStoreAuth(_store): RequireStoreAuth,
    State(state): State<AppState>,
) -> Json<Vec<StoreSummary>> {
    Json(
        state
            .auth()
            .directory()
            .iter()
            .map(|entry| StoreSummary {
                code: entry.code.to_string(),
                name: entry.name.clone(),
            })
            .collect(),
    )
}

/// Parse a path store code that must exist in the directory.
fn known_store(state: &AppState, code: &str) -> Result<MagasinCode, AppError> {
    MagasinCode::parse(code)
        .ok()
        .filter(|code| state.auth().directory().get(code).is_some())
        .ok_or_else(|| AppError::not_found("store", code))
}

/// Profile of a store, empty when never edited.
///
/// GET /api/stores/{code}/profile
#[instrument(skip_all, fields(code = %code))]
async fn get_profile(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StoreProfile>, AppError> {
    let code = known_store(&state, &code)?;
    if !store.magasin.can_access(&code) {
        return Err(AppError::not_found("store", code.as_str()));
    }
    let profile = state
        .profiles()
        .find(code.as_str())
        .await?
        .unwrap_or_else(|| StoreProfile::empty(code));
    Ok(Json(profile))
}

/// Replace a store profile. Head office only.
///
/// PUT /api/stores/{code}/profile
#[instrument(skip_all, fields(code = %code))]
async fn update_profile(
    RequireAdminStore(_admin): RequireAdminStore,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<StoreProfile>, AppError> {
    let code = known_store(&state, &code)?;
    let profile = StoreProfile {
        code,
        address: body.address.trim().to_string(),
        phone: body.phone,
        email: body.email,
        opening_hours: body.opening_hours,
    };
    state.profiles().save(&profile).await?;
    tracing::info!(code = %profile.code, "Store profile updated");
    Ok(Json(profile))
}
