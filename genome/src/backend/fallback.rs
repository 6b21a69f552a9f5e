//! Deterministic local generation for service outages.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::traits::{GenerationBackend, SuffixRequest, SuffixResponse};
use crate::error::Result;
use crate::sequence::Nucleotide;

/// Generator keyed by a digest of the seed.
///
/// Walks a SHA-256 chain starting from the seed digest and maps each byte
/// to a nucleotide, so the same seed and length always produce the same
/// suffix. No ambient randomness is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    /// Generate `length` bases for the given seed.
    pub fn generate(seed: &str, length: usize) -> String {
        let mut block = Sha256::digest(seed.as_bytes());
        let mut suffix = String::with_capacity(length);

        'chain: loop {
            for byte in block.iter() {
                if suffix.len() == length {
                    break 'chain;
                }
                suffix.push(Nucleotide::from_index(*byte as usize).to_char());
            }
            block = Sha256::digest(block);
        }

        suffix
    }
}

#[async_trait]
impl GenerationBackend for FallbackGenerator {
    fn id(&self) -> &str {
        "deterministic-fallback"
    }

    async fn generate_suffix(&self, request: &SuffixRequest) -> Result<SuffixResponse> {
        Ok(SuffixResponse {
            generated_suffix: Self::generate(&request.seed, request.length),
            per_symbol_probabilities: Vec::new(),
        })
    }
}
