//! Mock generation backend for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

use super::traits::{GenerationBackend, SuffixRequest, SuffixResponse};
use crate::error::{GenomeError, Result};

/// Mock backend with configurable responses and failure behavior.
pub struct MockGenerator {
    suffix: Option<String>,
    probabilities: Vec<f32>,
    fail_times: AtomicU32,
    fail_fatally: bool,
    call_count: AtomicU32,
}

impl MockGenerator {
    /// Create a mock that echoes a fallback-style suffix of the requested
    /// length (all `A`).
    pub fn new() -> Self {
        Self {
            suffix: None,
            probabilities: Vec::new(),
            fail_times: AtomicU32::new(0),
            fail_fatally: false,
            call_count: AtomicU32::new(0),
        }
    }

    /// Always return this suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Report these probabilities alongside the suffix.
    pub fn with_probabilities(mut self, probabilities: Vec<f32>) -> Self {
        self.probabilities = probabilities;
        self
    }

    /// Fail transiently this many times before succeeding.
    pub fn with_transient_failures(self, times: u32) -> Self {
        self.fail_times.store(times, Ordering::SeqCst);
        self
    }

    /// Fail every call with a non-transient error.
    pub fn with_fatal_failure(mut self) -> Self {
        self.fail_fatally = true;
        self
    }

    /// Number of times `generate_suffix` was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerator {
    fn id(&self) -> &str {
        "mock-generator"
    }

    async fn generate_suffix(&self, request: &SuffixRequest) -> Result<SuffixResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_fatally {
            return Err(GenomeError::RequestFailed("mock fatal failure".to_string()));
        }

        let remaining = self.fail_times.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_times.store(remaining - 1, Ordering::SeqCst);
            return Err(GenomeError::Network("mock transient failure".to_string()));
        }

        let generated_suffix = self
            .suffix
            .clone()
            .unwrap_or_else(|| "A".repeat(request.length));

        Ok(SuffixResponse {
            generated_suffix,
            per_symbol_probabilities: self.probabilities.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let backend = MockGenerator::new().with_suffix("ACGT");

        let response = backend
            .generate_suffix(&SuffixRequest::new("", 4, 1.0))
            .await
            .unwrap();

        assert_eq!(response.generated_suffix, "ACGT");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_transient_failures_then_success() {
        let backend = MockGenerator::new().with_transient_failures(2);

        assert!(backend
            .generate_suffix(&SuffixRequest::new("", 1, 1.0))
            .await
            .is_err());
        assert!(backend
            .generate_suffix(&SuffixRequest::new("", 1, 1.0))
            .await
            .is_err());
        assert!(backend
            .generate_suffix(&SuffixRequest::new("", 1, 1.0))
            .await
            .is_ok());
    }
}
