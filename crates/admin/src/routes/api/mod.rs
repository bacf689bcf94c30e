//! JSON API route handlers.
//!
//! Everything except login and status requires a valid store session;
//! records owned by another store answer 404 unless the session is ADMIN.

pub mod auth;
pub mod clients;
pub mod collaborators;
pub mod decomptes;
pub mod interventions;
pub mod invoices;
pub mod orders;
pub mod stores;

use axum::Router;
use sav_core::MagasinCode;
use serde::Deserialize;

use crate::state::AppState;

/// Creation body: the record's fields plus an optional owning store,
/// honoured for the head office only.
#[derive(Debug, Deserialize)]
pub struct NewRecord<T> {
    #[serde(default)]
    pub magasin: Option<MagasinCode>,
    #[serde(flatten)]
    pub input: T,
}

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(stores::router())
        .merge(collaborators::router())
        .merge(clients::router())
        .merge(orders::router())
        .merge(decomptes::router())
        .merge(invoices::router())
        .merge(interventions::router())
}
