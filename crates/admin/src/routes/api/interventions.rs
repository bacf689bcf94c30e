//! Repair ticket (intervention) API handlers, signature capture and the
//! per-session form draft.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use sav_core::models::{Intervention, InterventionDraft, InterventionInput};
use sav_core::{InterventionStatus, PointerEvent, SignaturePad, Surface};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use super::NewRecord;
use crate::error::AppError;
use crate::middleware::RequireStoreAuth;
use crate::routes::{load_scoped, owner_for};
use crate::services::draft;
use crate::state::AppState;
use crate::store::Fields;

/// Build the interventions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/interventions",
            get(list_interventions).post(create_intervention),
        )
        .route(
            "/api/interventions/draft",
            get(get_draft).put(save_draft).delete(clear_draft),
        )
        .route(
            "/api/interventions/{id}",
            get(get_intervention)
                .put(update_intervention)
                .delete(delete_intervention),
        )
        .route("/api/interventions/{id}/status", post(change_status))
        .route("/api/interventions/{id}/signature", post(sign))
}

/// List filter.
#[derive(Debug, Deserialize)]
pub struct InterventionQuery {
    pub status: Option<InterventionStatus>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: InterventionStatus,
}

/// Pointer events captured on the signature canvas.
#[derive(Debug, Deserialize)]
pub struct SignatureRequest {
    /// Canvas size; a missing canvas is refused.
    pub surface: Option<Surface>,
    pub events: Vec<PointerEvent>,
}

/// Most urgent first, then newest.
///
/// GET /api/interventions?status=
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn list_interventions(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Query(query): Query<InterventionQuery>,
) -> Result<Json<Vec<Intervention>>, AppError> {
    let mut interventions = state.interventions().list_for(&store.magasin).await?;
    if let Some(status) = query.status {
        interventions.retain(|i| i.status == status);
    }
    interventions.sort_by(|a, b| {
        a.urgency
            .rank()
            .cmp(&b.urgency.rank())
            .then(b.created_at.cmp(&a.created_at))
    });
    Ok(Json(interventions))
}

/// Open a ticket. The session's draft is dropped once it is saved.
///
/// POST /api/interventions
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn create_intervention(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<NewRecord<InterventionInput>>,
) -> Result<(StatusCode, Json<Intervention>), AppError> {
    let owner = owner_for(&store, body.magasin)?;
    let intervention = Intervention::new(body.input, owner, Utc::now())?;
    state.interventions().insert(&intervention).await?;
    draft::discard(&session).await;
    tracing::info!(id = %intervention.id, urgency = %intervention.urgency, "Intervention opened");
    Ok((StatusCode::CREATED, Json(intervention)))
}

/// GET /api/interventions/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn get_intervention(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Intervention>, AppError> {
    Ok(Json(
        load_scoped(&state.interventions(), &store, "intervention", &id).await?,
    ))
}

/// PUT /api/interventions/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn update_intervention(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<InterventionInput>,
) -> Result<Json<Intervention>, AppError> {
    let repo = state.interventions();
    let mut intervention = load_scoped(&repo, &store, "intervention", &id).await?;
    intervention.apply(input, Utc::now())?;
    repo.save(&intervention).await?;
    Ok(Json(intervention))
}

/// DELETE /api/interventions/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn delete_intervention(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let repo = state.interventions();
    load_scoped(&repo, &store, "intervention", &id).await?;
    repo.remove(&id).await?;
    tracing::info!("Intervention deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/interventions/{id}/status
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id, status = %body.status))]
async fn change_status(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Intervention>, AppError> {
    let repo = state.interventions();
    let mut intervention = load_scoped(&repo, &store, "intervention", &id).await?;
    intervention.set_status(body.status, Utc::now())?;
    repo.save(&intervention).await?;
    tracing::info!(to = %intervention.status, "Intervention status changed");
    Ok(Json(intervention))
}

/// Replay the captured strokes and attach the rendered signature.
///
/// POST /api/interventions/{id}/signature
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn sign(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SignatureRequest>,
) -> Result<Json<Intervention>, AppError> {
    let repo = state.interventions();
    let mut intervention = load_scoped(&repo, &store, "intervention", &id).await?;
    if intervention.status == InterventionStatus::Restituee {
        return Err(AppError::Conflict(
            "device already returned, signature is final".to_string(),
        ));
    }

    let mut pad = SignaturePad::attach(body.surface)?;
    pad.replay(body.events)?;
    let data_url = pad.to_data_url()?;

    intervention.sign(data_url, Utc::now());
    let mut fields = Fields::new();
    fields.insert("signature".to_string(), json!(intervention.signature));
    fields.insert("signed_at".to_string(), json!(intervention.signed_at));
    fields.insert("updated_at".to_string(), json!(intervention.updated_at));
    let signed = repo.patch(&id, fields).await?;

    tracing::info!(strokes = pad.strokes().len(), "Intervention signed");
    Ok(Json(signed))
}

/// GET /api/interventions/draft
#[instrument(skip_all)]
async fn get_draft(
    RequireStoreAuth(_store): RequireStoreAuth,
    session: Session,
) -> Json<InterventionDraft> {
    Json(draft::load(&session).await)
}

/// PUT /api/interventions/draft
#[instrument(skip_all)]
async fn save_draft(
    RequireStoreAuth(_store): RequireStoreAuth,
    session: Session,
    Json(body): Json<InterventionDraft>,
) -> Result<Json<InterventionDraft>, AppError> {
    Ok(Json(draft::save(&session, body, Utc::now()).await?))
}

/// DELETE /api/interventions/draft
#[instrument(skip_all)]
async fn clear_draft(
    RequireStoreAuth(_store): RequireStoreAuth,
    session: Session,
) -> Result<StatusCode, AppError> {
    draft::clear(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
