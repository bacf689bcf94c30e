//! Reimbursement statement (decompte) API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use sav_core::DecompteStatus;
use sav_core::models::{Decompte, DecompteInput};
use serde::Deserialize;
use tracing::instrument;

use super::NewRecord;
use crate::error::AppError;
use crate::middleware::RequireStoreAuth;
use crate::routes::{load_scoped, owner_for};
use crate::state::AppState;

/// Build the decomptes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/decomptes", get(list_decomptes).post(create_decompte))
        .route(
            "/api/decomptes/{id}",
            get(get_decompte).put(update_decompte).delete(delete_decompte),
        )
        .route("/api/decomptes/{id}/status", post(change_status))
}

/// List filter.
#[derive(Debug, Deserialize)]
pub struct DecompteQuery {
    pub status: Option<DecompteStatus>,
}

/// Status change body. The reason is kept for rejections only.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: DecompteStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Newest first.
///
/// GET /api/decomptes?status=
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn list_decomptes(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Query(query): Query<DecompteQuery>,
) -> Result<Json<Vec<Decompte>>, AppError> {
    let mut decomptes = state.decomptes().list_for(&store.magasin).await?;
    if let Some(status) = query.status {
        decomptes.retain(|d| d.status == status);
    }
    decomptes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(decomptes))
}

/// POST /api/decomptes
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn create_decompte(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Json(body): Json<NewRecord<DecompteInput>>,
) -> Result<(StatusCode, Json<Decompte>), AppError> {
    let owner = owner_for(&store, body.magasin)?;
    let decompte = Decompte::new(body.input, owner, Utc::now())?;
    state.decomptes().insert(&decompte).await?;
    tracing::info!(id = %decompte.id, kind = %decompte.kind, "Decompte registered");
    Ok((StatusCode::CREATED, Json(decompte)))
}

/// GET /api/decomptes/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn get_decompte(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Decompte>, AppError> {
    Ok(Json(
        load_scoped(&state.decomptes(), &store, "decompte", &id).await?,
    ))
}

/// PUT /api/decomptes/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn update_decompte(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<DecompteInput>,
) -> Result<Json<Decompte>, AppError> {
    let repo = state.decomptes();
    let mut decompte = load_scoped(&repo, &store, "decompte", &id).await?;
    decompte.apply(input, Utc::now())?;
    repo.save(&decompte).await?;
    Ok(Json(decompte))
}

/// DELETE /api/decomptes/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn delete_decompte(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let repo = state.decomptes();
    load_scoped(&repo, &store, "decompte", &id).await?;
    repo.remove(&id).await?;
    tracing::info!("Decompte deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/decomptes/{id}/status
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id, status = %body.status))]
async fn change_status(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Decompte>, AppError> {
    let repo = state.decomptes();
    let mut decompte = load_scoped(&repo, &store, "decompte", &id).await?;
    let reason = body
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    decompte.set_status(body.status, reason, Utc::now())?;
    repo.save(&decompte).await?;
    tracing::info!(to = %decompte.status, "Decompte status changed");
    Ok(Json(decompte))
}
