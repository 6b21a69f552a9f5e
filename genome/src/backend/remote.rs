//! HTTP client for a remote sequence generation service.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use super::traits::{GenerationBackend, SuffixRequest, SuffixResponse};
use crate::error::{GenomeError, Result};

/// Backend calling a generation service over HTTP.
pub struct RemoteGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteGenerator {
    /// Create a backend for the given service URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Attach an API key sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url)
    }
}

#[async_trait]
impl GenerationBackend for RemoteGenerator {
    fn id(&self) -> &str {
        &self.base_url
    }

    async fn generate_suffix(&self, request: &SuffixRequest) -> Result<SuffixResponse> {
        let mut http_request = self.client.post(self.generate_url()).json(request);

        if let Some(key) = &self.api_key {
            http_request = http_request.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                GenomeError::Unavailable(e.to_string())
            } else {
                GenomeError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let body = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GenomeError::RateLimited { retry_after_ms },
                s if s.is_server_error() => {
                    GenomeError::Unavailable(format!("HTTP {}: {}", s, body))
                }
                s => GenomeError::RequestFailed(format!("HTTP {}: {}", s, body)),
            });
        }

        let suffix: SuffixResponse = response
            .json()
            .await
            .map_err(|e| GenomeError::Parse(e.to_string()))?;

        Ok(suffix)
    }
}
