//! Error taxonomy for mint operations.

use genome::{GenomeError, Transient};
use genome_art::RenderError;

/// Error types for mint operations.
///
/// The retry executor consults [`Transient::is_transient`]; validation,
/// not-found and unsupported-capability errors are never retried.
#[derive(Debug, thiserror::Error)]
pub enum MintError {
    /// Malformed input, rejected before any ledger call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown asset or wallet
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout, rate limit or network failure; safe to retry
    #[error("Transient error: {0}")]
    Transient(String),

    /// Capability absent on the target platform
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Submission rejected by the ledger
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Content store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid service configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sequence generation failure
    #[error(transparent)]
    Generation(#[from] GenomeError),

    /// Artifact rendering failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Filesystem failure in the local registry
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure for a persisted or uploaded document
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Transient for MintError {
    fn is_transient(&self) -> bool {
        match self {
            MintError::Transient(_) => true,
            MintError::Generation(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(MintError::Transient("timeout".into()).is_transient());
        assert!(MintError::Generation(GenomeError::Network("down".into())).is_transient());

        assert!(!MintError::Validation("bad symbol".into()).is_transient());
        assert!(!MintError::NotFound("wallet".into()).is_transient());
        assert!(!MintError::Unsupported("update".into()).is_transient());
        assert!(!MintError::Ledger("rejected".into()).is_transient());
    }
}
