//! Opaque signing capability.
//!
//! Key custody lives outside this crate; ledger backends only need a
//! stable wallet reference and a way to sign submission payloads.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Signing capability for ledger submissions.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Stable reference to the signing wallet (address or key handle).
    fn reference(&self) -> &str;

    /// Sign a submission payload.
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Digest-based signer for development and tests.
///
/// Not a real signature scheme; stands in where no external custody
/// service is wired up.
pub struct DevSigner {
    reference: String,
}

impl DevSigner {
    /// Create a signer with the given wallet reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

#[async_trait]
impl Signer for DevSigner {
    fn reference(&self) -> &str {
        &self.reference
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut hasher = Sha256::new();
        hasher.update(self.reference.as_bytes());
        hasher.update(payload);
        Ok(hasher.finalize().to_vec())
    }
}
