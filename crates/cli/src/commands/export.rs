//! Dump a collection to a JSON file.

use std::path::Path;

use sav_admin::store::{Document, DocumentStore};
use sav_core::models::{
    Client, Collaborator, Decompte, Intervention, Invoice, Order, Record, StoreProfile,
};
use sav_core::MagasinCode;
use serde_json::Value;
use tracing::info;

use super::{CliError, open_state};

/// Collections that can be exported.
pub const COLLECTIONS: [&str; 7] = [
    Client::COLLECTION,
    Collaborator::COLLECTION,
    Order::COLLECTION,
    Decompte::COLLECTION,
    Invoice::COLLECTION,
    Intervention::COLLECTION,
    StoreProfile::COLLECTION,
];

/// Check a collection name against [`COLLECTIONS`].
///
/// # Errors
///
/// Returns [`CliError::UnknownCollection`] for anything else.
pub fn resolve(collection: &str) -> Result<&'static str, CliError> {
    COLLECTIONS
        .iter()
        .find(|c| c.eq_ignore_ascii_case(collection.trim()))
        .copied()
        .ok_or_else(|| CliError::UnknownCollection(collection.to_string()))
}

/// Documents of `collection`, optionally restricted to one store.
///
/// The `stores` collection is keyed by store code, so it filters on the
/// document id.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn fetch(
    store: &dyn DocumentStore,
    collection: &'static str,
    magasin: Option<&MagasinCode>,
) -> Result<Vec<Value>, CliError> {
    let docs = match magasin {
        None => store.list(collection).await?,
        Some(code) if collection == StoreProfile::COLLECTION => store
            .get(collection, code.as_str())
            .await?
            .into_iter()
            .collect(),
        Some(code) => {
            store
                .query_eq(collection, "magasin", &Value::from(code.as_str()))
                .await?
        }
    };
    Ok(docs.into_iter().map(to_json).collect())
}

fn to_json(doc: Document) -> Value {
    let mut fields = doc.fields;
    fields.insert("id".to_string(), Value::String(doc.id));
    Value::Object(fields)
}

/// Export a collection to `output` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error for an unknown collection or store code, a store
/// failure, or a write failure.
pub async fn run(collection: &str, output: &Path, magasin: Option<&str>) -> Result<usize, CliError> {
    let collection = resolve(collection)?;
    let magasin = magasin.map(MagasinCode::parse).transpose()?;

    let state = open_state(false)?;
    let records = fetch(state.store().as_ref(), collection, magasin.as_ref()).await?;

    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(output, json).await?;

    info!(
        collection,
        magasin = magasin.as_ref().map(MagasinCode::as_str),
        path = %output.display(),
        "Exported {} document(s)",
        records.len()
    );
    Ok(records.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sav_admin::store::MemoryStore;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resolve_collection_names() {
        assert_eq!(resolve("Orders").unwrap(), "orders");
        assert_eq!(resolve("users").unwrap(), "users");
        assert!(matches!(
            resolve("products"),
            Err(CliError::UnknownCollection(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_filters_by_store_and_keeps_ids() {
        let store = MemoryStore::new();
        for (id, magasin) in [("a", "DIJ"), ("b", "BEA"), ("c", "DIJ")] {
            let fields = json!({ "magasin": magasin, "notes": "" });
            let Value::Object(fields) = fields else {
                unreachable!()
            };
            store.create("orders", Some(id), fields).await.unwrap();
        }

        let dij = MagasinCode::parse("DIJ").unwrap();
        let docs = fetch(&store, "orders", Some(&dij)).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d["magasin"] == "DIJ"));
        assert!(docs.iter().any(|d| d["id"] == "a"));

        let all = fetch(&store, "orders", None).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
