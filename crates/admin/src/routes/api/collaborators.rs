//! Collaborator API handlers.
//!
//! Staff without a home store are only visible to the head office.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use sav_core::models::{Collaborator, CollaboratorInput};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireStoreAuth;
use crate::models::CurrentStore;
use crate::routes::{load_scoped, owner_for};
use crate::state::AppState;

/// Build the collaborators router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/collaborators",
            get(list_collaborators).post(create_collaborator),
        )
        .route(
            "/api/collaborators/{id}",
            get(get_collaborator)
                .put(update_collaborator)
                .delete(delete_collaborator),
        )
}

/// Shops may only assign staff to themselves.
fn scope_input(store: &CurrentStore, mut input: CollaboratorInput) -> Result<CollaboratorInput, AppError> {
    if !store.is_admin() {
        input.magasin = Some(owner_for(store, input.magasin.take())?);
    }
    Ok(input)
}

/// GET /api/collaborators
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn list_collaborators(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Collaborator>>, AppError> {
    let mut collaborators = state.collaborators().list_for(&store.magasin).await?;
    collaborators.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(collaborators))
}

/// POST /api/collaborators
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn create_collaborator(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Json(input): Json<CollaboratorInput>,
) -> Result<(StatusCode, Json<Collaborator>), AppError> {
    let collaborator = Collaborator::new(scope_input(&store, input)?)?;
    state.collaborators().insert(&collaborator).await?;
    tracing::info!(id = %collaborator.id, "Collaborator created");
    Ok((StatusCode::CREATED, Json(collaborator)))
}

/// GET /api/collaborators/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn get_collaborator(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Collaborator>, AppError> {
    let collaborator = load_scoped(&state.collaborators(), &store, "collaborator", &id).await?;
    Ok(Json(collaborator))
}

/// PUT /api/collaborators/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn update_collaborator(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CollaboratorInput>,
) -> Result<Json<Collaborator>, AppError> {
    let repo = state.collaborators();
    let mut collaborator = load_scoped(&repo, &store, "collaborator", &id).await?;
    collaborator.apply(scope_input(&store, input)?)?;
    repo.save(&collaborator).await?;
    Ok(Json(collaborator))
}

/// DELETE /api/collaborators/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn delete_collaborator(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let repo = state.collaborators();
    load_scoped(&repo, &store, "collaborator", &id).await?;
    repo.remove(&id).await?;
    tracing::info!("Collaborator deleted");
    Ok(StatusCode::NO_CONTENT)
}
