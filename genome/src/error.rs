//! Error types for sequence generation.

use crate::retry::Transient;

/// Error types for generation operations.
#[derive(Debug, thiserror::Error)]
pub enum GenomeError {
    /// Generation service is not reachable
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    /// Request was rejected by the service
    #[error("Generation request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Transient for GenomeError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            GenomeError::Unavailable(_) | GenomeError::RateLimited { .. } | GenomeError::Network(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GenomeError>;
