//! Remote document storage.
//!
//! Records live as documents in named collections. [`DocumentStore`] is the
//! seam between the routes and the backend: [`FirestoreStore`] speaks the
//! Firestore REST protocol, [`MemoryStore`] keeps everything in process.
//! [`Repository`] adds typed access and store scoping on top.

pub mod codec;
mod firestore;
mod memory;
mod repository;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use repository::Repository;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Plain JSON fields of a document (without its id).
pub type Fields = Map<String, Value>;

/// A document read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No such document.
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// A document with this id already exists.
    #[error("document {collection}/{id} already exists")]
    Conflict { collection: String, id: String },

    /// Credentials refused.
    #[error("Unauthorized: access to the document store was refused")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A document could not be converted to or from a record.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Invalid request URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The id cannot name a document.
    #[error("invalid document id {0:?}")]
    InvalidId(String),
}

impl StoreError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict(collection: &str, id: &str) -> Self {
        Self::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Check `id` names a single document of a collection.
///
/// Ids may not be empty, contain `/`, be `.` or `..`, or use the reserved
/// `__name__` form.
///
/// # Errors
///
/// Returns [`StoreError::InvalidId`] when the id is refused.
pub fn check_document_id(id: &str) -> Result<(), StoreError> {
    let reserved = id.len() > 4 && id.starts_with("__") && id.ends_with("__");
    if id.is_empty() || id == "." || id == ".." || id.contains('/') || reserved {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Collection-oriented document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Every document of a collection.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents whose top-level `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// One document, `None` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create a document. Without an id the store picks one.
    ///
    /// Fails with [`StoreError::Conflict`] when the id is taken.
    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Fields,
    ) -> Result<Document, StoreError>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, fields: Fields)
    -> Result<Document, StoreError>;

    /// Overwrite the given fields of an existing document, keeping the rest.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_stay_in_their_collection() {
        for id in ["", ".", "..", "../clients/abc", "a/b", "__name__"] {
            assert!(
                matches!(check_document_id(id), Err(StoreError::InvalidId(_))),
                "{id:?} should be refused"
            );
        }
        for id in ["abc", "3f2a9c", "a.b", "__x", "DIJ-2024"] {
            assert!(check_document_id(id).is_ok(), "{id:?} should be accepted");
        }
    }
}
