//! Firestore REST v1 client.
//!
//! # API Reference
//!
//! - Base URL: `https://firestore.googleapis.com/v1/projects/{project}/databases/(default)/documents`
//! - Authentication: web API key via the `key` query parameter
//! - Emulator: `http://{FIRESTORE_EMULATOR_HOST}/v1/...`, no key required

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use super::codec::{decode_document, encode_fields, encode_value};
use super::{Document, DocumentStore, Fields, StoreError, check_document_id};
use crate::config::FirestoreConfig;

/// Page size for collection listings.
const PAGE_SIZE: &str = "300";

/// Firestore REST client.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<FirestoreStoreInner>,
}

struct FirestoreStoreInner {
    client: reqwest::Client,
    documents_url: String,
    api_key: Option<SecretString>,
    emulator: bool,
}

/// One page of `documents.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    documents: Vec<Value>,
    next_page_token: Option<String>,
}

/// One element of the `:runQuery` response stream.
#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<Value>,
}

impl FirestoreStore {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(FirestoreStoreInner {
                client,
                documents_url: config.documents_url(),
                api_key: config.api_key.clone(),
                emulator: config.emulator_host.is_some(),
            }),
        })
    }

    /// Build a request URL below the documents root.
    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.documents_url))?;
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in params {
                query.append_pair(k, v);
            }
            if let Some(key) = &self.inner.api_key {
                query.append_pair("key", key.expose_secret());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.inner.client.request(method, url);
        if self.inner.emulator {
            // The emulator treats "owner" as an admin token and skips rules.
            builder.bearer_auth("owner")
        } else {
            builder
        }
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| StoreError::Codec(format!("Failed to parse response: {e}")));
        }
        Err(self.parse_error(response, collection, id).await)
    }

    /// Parse error response from Firestore.
    async fn parse_error(
        &self,
        response: reqwest::Response,
        collection: &str,
        id: &str,
    ) -> StoreError {
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30);
                StoreError::RateLimited(retry_after)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
            StatusCode::NOT_FOUND => StoreError::not_found(collection, id),
            StatusCode::CONFLICT => StoreError::conflict(collection, id),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                    .unwrap_or(body);
                StoreError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// URL of one document, with `id` as a single escaped path segment.
    fn document_url(
        &self,
        collection: &str,
        id: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, StoreError> {
        check_document_id(id)?;
        let mut url = self.url(&format!("/{collection}"), params)?;
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidId(id.to_string()))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = self.url(&format!("/{collection}"), &params)?;
            let response = self.request(reqwest::Method::GET, url).send().await?;
            let page: ListPage = self.handle_response(response, collection, "").await?;

            for doc in &page.documents {
                documents.push(decode_document(doc)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": encode_value(value),
                    }
                }
            }
        });
        // runQuery hangs off the documents root: `.../documents:runQuery`.
        let url = self.url(":runQuery", &[])?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let results: Vec<QueryResult> = self.handle_response(response, collection, "").await?;

        results
            .iter()
            .filter_map(|r| r.document.as_ref())
            .map(decode_document)
            .collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, id, &[])?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: Value = self.handle_response(response, collection, id).await?;
        decode_document(&doc).map(Some)
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
        let params: Vec<(&str, &str)> = id.map(|id| ("documentId", id)).into_iter().collect();
        let url = self.url(&format!("/{collection}"), &params)?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;
        let doc: Value = self
            .handle_response(response, collection, id.unwrap_or_default())
            .await?;
        let created = decode_document(&doc)?;
        tracing::info!(collection, id = %created.id, "Created document");
        Ok(created)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        let url = self.document_url(collection, id, &[])?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;
        let doc: Value = self.handle_response(response, collection, id).await?;
        decode_document(&doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let url = self.document_url(collection, id, &params)?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;
        let doc: Value = self.handle_response(response, collection, id).await?;
        decode_document(&doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, id, &[])?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::info!(collection, id, "Deleted document");
            return Ok(());
        }
        Err(self.parse_error(response, collection, id).await)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let url = self.url("/stores", &[("pageSize", "1")])?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.parse_error(response, "stores", "").await)
        }
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("documents_url", &self.inner.documents_url)
            .field("emulator", &self.inner.emulator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(api_key: Option<&str>) -> FirestoreStore {
        FirestoreStore::new(&FirestoreConfig {
            project_id: "sav-audition".to_string(),
            api_key: api_key.map(SecretString::from),
            emulator_host: None,
        })
        .unwrap()
    }

    #[test]
    fn test_url_appends_key_last() {
        let url = store(Some("AIzaKey"))
            .url("/orders", &[("pageSize", "300")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/sav-audition/databases/(default)/documents/orders?pageSize=300&key=AIzaKey"
        );
    }

    #[test]
    fn test_url_without_params_has_no_query() {
        let url = store(None).url("/orders/abc", &[]).unwrap();
        assert!(url.query().is_none());
        assert!(url.path().ends_with("/documents/orders/abc"));
    }

    #[test]
    fn test_document_url_escapes_id() {
        let store = store(None);
        let url = store.document_url("orders", "a b", &[]).unwrap();
        assert!(url.path().ends_with("/documents/orders/a%20b"));

        assert!(matches!(
            store.document_url("orders", "../clients/abc", &[]),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn test_run_query_url() {
        let url = store(None).url(":runQuery", &[]).unwrap();
        assert!(url.path().ends_with("/documents:runQuery"));
    }

    #[test]
    fn test_update_mask_is_repeated() {
        let url = store(None)
            .url(
                "/orders/abc",
                &[
                    ("updateMask.fieldPaths", "status"),
                    ("updateMask.fieldPaths", "updated_at"),
                    ("currentDocument.exists", "true"),
                ],
            )
            .unwrap();
        assert_eq!(
            url.query(),
            Some(
                "updateMask.fieldPaths=status&updateMask.fieldPaths=updated_at&currentDocument.exists=true"
            )
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let output = format!("{:?}", store(Some("AIzaHiddenKey")));
        assert!(!output.contains("AIzaHiddenKey"));
    }

    #[test]
    fn test_list_page_parses_token() {
        let page: ListPage = serde_json::from_value(json!({
            "documents": [{ "name": "x/orders/1", "fields": {} }],
            "nextPageToken": "abc"
        }))
        .unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let empty: ListPage = serde_json::from_value(json!({})).unwrap();
        assert!(empty.documents.is_empty());
    }
}
