//! Order API handlers.
//!
//! Listings come back in work-list order: most urgent first, then oldest.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use sav_core::OrderStatus;
use sav_core::models::{Order, OrderInput};
use serde::Deserialize;
use tracing::instrument;

use super::NewRecord;
use crate::error::AppError;
use crate::middleware::RequireStoreAuth;
use crate::routes::{load_scoped, owner_for};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route(
            "/api/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/api/orders/{id}/status", post(change_status))
}

/// List filter.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// GET /api/orders?status=
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn list_orders(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let mut orders = state.orders().list_for(&store.magasin).await?;
    if let Some(status) = query.status {
        orders.retain(|o| o.status == status);
    }
    orders.sort_by(Order::priority_cmp);
    Ok(Json(orders))
}

/// POST /api/orders
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn create_order(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Json(body): Json<NewRecord<OrderInput>>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let owner = owner_for(&store, body.magasin)?;
    let order = Order::new(body.input, owner, Utc::now())?;
    state.orders().insert(&order).await?;
    tracing::info!(id = %order.id, urgency = %order.urgency, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn get_order(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(load_scoped(&state.orders(), &store, "order", &id).await?))
}

/// PUT /api/orders/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn update_order(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<OrderInput>,
) -> Result<Json<Order>, AppError> {
    let repo = state.orders();
    let mut order = load_scoped(&repo, &store, "order", &id).await?;
    order.apply(input, Utc::now())?;
    repo.save(&order).await?;
    Ok(Json(order))
}

/// DELETE /api/orders/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn delete_order(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let repo = state.orders();
    load_scoped(&repo, &store, "order", &id).await?;
    repo.remove(&id).await?;
    tracing::info!("Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Move an order along its lifecycle.
///
/// POST /api/orders/{id}/status
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id, status = %body.status))]
async fn change_status(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Order>, AppError> {
    let repo = state.orders();
    let mut order = load_scoped(&repo, &store, "order", &id).await?;
    let from = order.status;
    order.set_status(body.status, Utc::now())?;
    repo.save(&order).await?;
    tracing::info!(%from, to = %order.status, "Order status changed");
    Ok(Json(order))
}
