//! Invoice API handlers: CRUD, payments and cancellation.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sav_core::InvoiceStatus;
use sav_core::models::{Invoice, InvoiceInput, Payment, PaymentMethod};
use serde::Deserialize;
use tracing::instrument;

use super::NewRecord;
use crate::error::AppError;
use crate::middleware::RequireStoreAuth;
use crate::routes::{load_scoped, owner_for};
use crate::state::AppState;

/// Build the invoices router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/api/invoices/{id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/api/invoices/{id}/payments", post(register_payment))
        .route("/api/invoices/{id}/cancel", post(cancel_invoice))
}

/// List filters.
#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub overdue: bool,
}

/// Payment body; `received_at` defaults to now.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

/// Newest first.
///
/// GET /api/invoices?status=&overdue=
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn list_invoices(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let today = Utc::now().date_naive();
    let mut invoices = state.invoices().list_for(&store.magasin).await?;
    invoices.retain(|i| {
        query.status.is_none_or(|status| i.status == status) && (!query.overdue || i.is_overdue(today))
    });
    invoices.sort_by(|a, b| {
        b.issued_at
            .cmp(&a.issued_at)
            .then_with(|| b.number.cmp(&a.number))
    });
    Ok(Json(invoices))
}

/// POST /api/invoices
#[instrument(skip_all, fields(magasin = %store.magasin))]
async fn create_invoice(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Json(body): Json<NewRecord<InvoiceInput>>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let owner = owner_for(&store, body.magasin)?;
    let invoice = Invoice::new(body.input, owner, Utc::now())?;
    state.invoices().insert(&invoice).await?;
    tracing::info!(id = %invoice.id, number = %invoice.number, "Invoice issued");
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/invoices/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn get_invoice(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(
        load_scoped(&state.invoices(), &store, "invoice", &id).await?,
    ))
}

/// PUT /api/invoices/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn update_invoice(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<InvoiceInput>,
) -> Result<Json<Invoice>, AppError> {
    let repo = state.invoices();
    let mut invoice = load_scoped(&repo, &store, "invoice", &id).await?;
    invoice.apply(input, Utc::now())?;
    repo.save(&invoice).await?;
    Ok(Json(invoice))
}

/// DELETE /api/invoices/{id}
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn delete_invoice(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let repo = state.invoices();
    load_scoped(&repo, &store, "invoice", &id).await?;
    repo.remove(&id).await?;
    tracing::info!("Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Record a payment against the balance.
///
/// POST /api/invoices/{id}/payments
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn register_payment(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<Invoice>, AppError> {
    let repo = state.invoices();
    let mut invoice = load_scoped(&repo, &store, "invoice", &id).await?;
    invoice.register_payment(Payment {
        amount: body.amount,
        method: body.method,
        received_at: body.received_at.unwrap_or_else(Utc::now),
        note: body.note.filter(|n| !n.trim().is_empty()),
    })?;
    repo.save(&invoice).await?;
    tracing::info!(
        amount = %body.amount,
        status = %invoice.status,
        "Payment registered"
    );
    Ok(Json(invoice))
}

/// POST /api/invoices/{id}/cancel
#[instrument(skip_all, fields(magasin = %store.magasin, id = %id))]
async fn cancel_invoice(
    RequireStoreAuth(store): RequireStoreAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    let repo = state.invoices();
    let mut invoice = load_scoped(&repo, &store, "invoice", &id).await?;
    invoice.cancel(Utc::now())?;
    repo.save(&invoice).await?;
    tracing::info!("Invoice cancelled");
    Ok(Json(invoice))
}
