//! Typed access to one collection.

use std::marker::PhantomData;
use std::sync::Arc;

use sav_core::{MagasinCode, Record};
use serde_json::Value;

use super::{Document, DocumentStore, Fields, StoreError};

/// Field every store-scoped record carries.
const MAGASIN_FIELD: &str = "magasin";

/// Reads and writes records of type `T`.
///
/// The record id becomes the document id and is never stored as a field.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Every record in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a document does not decode.
    pub async fn list_all(&self) -> Result<Vec<T>, StoreError> {
        let docs = self.store.list(T::COLLECTION).await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Records visible to a session of `viewer`.
    ///
    /// The head office sees everything; a shop only sees its own records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a document does not decode.
    pub async fn list_for(&self, viewer: &MagasinCode) -> Result<Vec<T>, StoreError> {
        if viewer.is_admin() {
            return self.list_all().await;
        }
        let docs = self
            .store
            .query_eq(
                T::COLLECTION,
                MAGASIN_FIELD,
                &Value::String(viewer.to_string()),
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    /// One record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the document does not decode.
    pub async fn find(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(from_document)
            .transpose()
    }

    /// One record by id, hidden when `viewer` may not see it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the document does not decode.
    pub async fn find_for(&self, viewer: &MagasinCode, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self
            .find(id)
            .await?
            .filter(|record| visible_to(record, viewer)))
    }

    /// Store a new record under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the id is taken, or any store error.
    pub async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let (id, fields) = to_fields(record)?;
        self.store
            .create(T::COLLECTION, Some(&id), fields)
            .await?;
        Ok(())
    }

    /// Create or replace a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn save(&self, record: &T) -> Result<(), StoreError> {
        let (id, fields) = to_fields(record)?;
        self.store.set(T::COLLECTION, &id, fields).await?;
        Ok(())
    }

    /// Overwrite some fields of an existing record and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record is absent, or any store error.
    pub async fn patch(&self, id: &str, fields: Fields) -> Result<T, StoreError> {
        let doc = self.store.update(T::COLLECTION, id, fields).await?;
        from_document(doc)
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }
}

/// Whether a session of `viewer` may see `record`.
///
/// Records without a store belong to the head office.
pub fn visible_to<T: Record>(record: &T, viewer: &MagasinCode) -> bool {
    viewer.is_admin() || record.magasin().is_some_and(|owner| viewer.can_access(owner))
}

/// Split a record into its id and the remaining fields.
fn to_fields<T: Record>(record: &T) -> Result<(String, Fields), StoreError> {
    let Value::Object(mut fields) =
        serde_json::to_value(record).map_err(|e| StoreError::Codec(e.to_string()))?
    else {
        return Err(StoreError::Codec(format!(
            "{} record does not serialize to an object",
            T::COLLECTION
        )));
    };
    fields.remove("id");
    Ok((record.id().to_string(), fields))
}

/// Rebuild a record from a document, restoring the id field.
fn from_document<T: Record>(doc: Document) -> Result<T, StoreError> {
    let Document { id, mut fields } = doc;
    fields.insert("id".to_string(), Value::String(id.clone()));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| StoreError::Codec(format!("{}/{id}: {e}", T::COLLECTION)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use sav_core::models::{Client, ClientInput, StoreProfile};

    use super::*;
    use crate::store::MemoryStore;

    fn client(magasin: &str, last_name: &str) -> Client {
        Client::new(
            ClientInput {
                last_name: last_name.to_string(),
                first_name: "Anne".to_string(),
                phone: None,
                email: None,
                social_security_number: None,
                mutuelle: None,
                notes: String::new(),
            },
            MagasinCode::parse(magasin).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_id_lives_in_document_name() {
        let store = Arc::new(MemoryStore::new());
        let repo: Repository<Client> = Repository::new(store.clone());
        let c = client("DIJ", "DUPONT");
        repo.insert(&c).await.unwrap();

        let raw = store
            .get("clients", c.id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert!(!raw.fields.contains_key("id"));
        assert_eq!(repo.find(c.id.as_str()).await.unwrap(), Some(c));
    }

    #[tokio::test]
    async fn test_listing_is_scoped_by_store() {
        let repo: Repository<Client> = Repository::new(Arc::new(MemoryStore::new()));
        repo.insert(&client("DIJ", "DUPONT")).await.unwrap();
        repo.insert(&client("BEA", "MARTIN")).await.unwrap();

        let dij = MagasinCode::parse("DIJ").unwrap();
        let mine = repo.list_for(&dij).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].last_name, "DUPONT");

        let all = repo.list_for(&MagasinCode::admin()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_find_for_hides_other_stores() {
        let repo: Repository<Client> = Repository::new(Arc::new(MemoryStore::new()));
        let c = client("BEA", "MARTIN");
        repo.insert(&c).await.unwrap();

        let dij = MagasinCode::parse("DIJ").unwrap();
        assert!(repo.find_for(&dij, c.id.as_str()).await.unwrap().is_none());
        assert!(
            repo.find_for(&MagasinCode::admin(), c.id.as_str())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_store_profile_keyed_by_code() {
        let store = Arc::new(MemoryStore::new());
        let repo: Repository<StoreProfile> = Repository::new(store.clone());
        let mut profile = StoreProfile::empty(MagasinCode::parse("MAC").unwrap());
        profile.address = "12 rue Carnot, Mâcon".to_string();
        repo.save(&profile).await.unwrap();

        assert!(store.get("stores", "MAC").await.unwrap().is_some());
        assert_eq!(repo.find("MAC").await.unwrap(), Some(profile));
    }
}
