//! Dashboard route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::Utc;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireStoreAuth;
use crate::models::CurrentStore;
use crate::services::DashboardSummary;
use crate::state::AppState;

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub magasin: String,
    pub store_name: String,
    pub is_admin: bool,
    pub refresh_seconds: u32,
    pub updated_at: String,
    pub summary: DashboardSummary,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/dashboard", get(summary))
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn dashboard(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let summary = DashboardSummary::load(&state, &store.magasin, now.date_naive()).await?;

    let template = DashboardTemplate {
        magasin: store.magasin.to_string(),
        store_name: store_name(&state, &store),
        is_admin: store.is_admin(),
        refresh_seconds: state.config().refresh_seconds,
        updated_at: now.format("%d/%m/%Y %H:%M").to_string(),
        summary,
    };

    Ok(Html(
        template
            .render()
            .unwrap_or_else(|_| String::from("Error rendering template")),
    ))
}

/// Dashboard counters as JSON, polled by the page between refreshes.
///
/// GET /api/dashboard
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn summary(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = DashboardSummary::load(&state, &store.magasin, Utc::now().date_naive()).await?;
    Ok(Json(summary))
}

fn store_name(state: &AppState, store: &CurrentStore) -> String {
    state
        .auth()
        .directory()
        .get(&store.magasin)
        .map_or_else(|| store.magasin.to_string(), |entry| entry.name.clone())
}
