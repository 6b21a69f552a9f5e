//! Content storage clients.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{MintError, Result};

/// Uploads content and returns a stable URI for it.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload raw bytes.
    async fn upload(&self, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Upload a JSON document.
    async fn upload_json(&self, document: &serde_json::Value) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    uri: String,
}

/// Content store backed by an HTTP upload service.
pub struct HttpContentStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpContentStore {
    /// Create a store for the given service URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Attach an API key sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    async fn post(&self, path: &str, body: reqwest::Body, content_type: &str) -> Result<String> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(header::CONTENT_TYPE, content_type)
            .body(body);

        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| MintError::Transient(format!("upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                MintError::Transient(format!("upload HTTP {}: {}", status, body))
            } else {
                MintError::Storage(format!("upload HTTP {}: {}", status, body))
            });
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| MintError::Storage(format!("malformed upload response: {}", e)))?;
        Ok(upload.uri)
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        self.post("/upload", bytes.to_vec().into(), content_type).await
    }

    async fn upload_json(&self, document: &serde_json::Value) -> Result<String> {
        let body = serde_json::to_vec(document)?;
        self.post("/upload/json", body.into(), "application/json").await
    }
}

/// In-memory store for tests and offline development.
///
/// URIs are content-addressed, so identical bytes upload to the same
/// location.
#[derive(Default)]
pub struct MemoryContentStore {
    objects: DashMap<String, Vec<u8>>,
    uploads: AtomicU32,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes previously uploaded under `uri`.
    pub fn get(&self, uri: &str) -> Option<Vec<u8>> {
        self.objects.get(uri).map(|v| v.clone())
    }

    /// Number of uploads performed.
    pub fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    fn store(&self, bytes: Vec<u8>) -> String {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let digest = hex::encode(Sha256::digest(&bytes));
        let uri = format!("memory://{}", &digest[..32]);
        self.objects.insert(uri.clone(), bytes);
        uri
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn upload(&self, bytes: &[u8], _content_type: &str) -> Result<String> {
        Ok(self.store(bytes.to_vec()))
    }

    async fn upload_json(&self, document: &serde_json::Value) -> Result<String> {
        Ok(self.store(serde_json::to_vec(document)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_upload_returns_uri() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "store://abc123",
            })))
            .mount(&server)
            .await;

        let store = HttpContentStore::new(server.uri());
        let uri = store.upload(b"png bytes", "image/png").await.unwrap();
        assert_eq!(uri, "store://abc123");
    }

    #[tokio::test]
    async fn test_http_server_error_is_transient() {
        use genome::Transient;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = HttpContentStore::new(server.uri());
        let err = store
            .upload_json(&serde_json::json!({"a": 1}))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_memory_store_is_content_addressed() {
        let store = MemoryContentStore::new();
        let a = store.upload(b"same bytes", "image/png").await.unwrap();
        let b = store.upload(b"same bytes", "image/png").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.get(&a).unwrap(), b"same bytes");
        assert_eq!(store.upload_count(), 2);
    }
}
