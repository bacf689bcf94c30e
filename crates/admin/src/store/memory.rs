//! In-process document store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, Fields, StoreError, check_document_id};

type Collection = BTreeMap<String, Fields>;

/// Document store held in memory. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

fn to_document(id: &str, fields: &Fields) -> Document {
    Document {
        id: id.to_string(),
        fields: fields.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|docs| docs.iter().map(|(id, f)| to_document(id, f)).collect())
            .unwrap_or_default())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, f)| f.get(field) == Some(value))
                    .map(|(id, f)| to_document(id, f))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        check_document_id(id)?;
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|f| to_document(id, f)))
    }

    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        if let Some(id) = id {
            check_document_id(id)?;
        }
        let id = id.map_or_else(|| uuid::Uuid::new_v4().simple().to_string(), str::to_string);
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::conflict(collection, &id));
        }
        docs.insert(id.clone(), fields.clone());
        Ok(Document { id, fields })
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        check_document_id(id)?;
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields.clone());
        Ok(to_document(id, &fields))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        check_document_id(id)?;
        let mut guard = self.collections.write().await;
        let existing = guard
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        existing.extend(fields);
        Ok(to_document(id, existing))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        check_document_id(id)?;
        let mut guard = self.collections.write().await;
        if let Some(docs) = guard.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
