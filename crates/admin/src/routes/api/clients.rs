//! Client file API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use sav_core::models::{Client, ClientInput};
use serde::Deserialize;
use tracing::instrument;

use super::NewRecord;
use crate::error::AppError;
use crate::middleware::RequireStoreAuth;
use crate::routes::{load_scoped, owner_for};
use crate::state::AppState;

/// Build the clients router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Clients of the signed-in store, filtered by name or phone.
///
/// GET /api/clients?q=
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn list_clients(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    let mut clients = state.clients().list_for(&store.magasin).await?;
    if let Some(q) = query.q.as_deref() {
        clients.retain(|c| c.matches(q));
    }
    clients.sort_by(|a, b| {
        a.last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase())
            .then_with(|| a.first_name.cmp(&b.first_name))
    });
    Ok(Json(clients))
}

/// POST /api/clients
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn create_client(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Json(body): Json<NewRecord<ClientInput>>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    body.input.validate()?;
    let owner = owner_for(&store, body.magasin)?;
    let client = Client::new(body.input, owner, Utc::now());
    state.clients().insert(&client).await?;
    tracing::info!(id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /api/clients/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn get_client(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(load_scoped(&state.clients(), &store, "client", &id).await?))
}

/// PUT /api/clients/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn update_client(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ClientInput>,
) -> Result<Json<Client>, AppError> {
    input.validate()?;
    let repo = state.clients();
    let mut client = load_scoped(&repo, &store, "client", &id).await?;
    client.apply(input, Utc::now());
    repo.save(&client).await?;
    Ok(Json(client))
}

/// DELETE /api/clients/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn delete_client(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let repo = state.clients();
    load_scoped(&repo, &store, "client", &id).await?;
    repo.remove(&id).await?;
    tracing::info!("Client deleted");
    Ok(StatusCode::NO_CONTENT)
}
