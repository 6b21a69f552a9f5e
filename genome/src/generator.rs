//! SequenceGenerator - retry-wrapped generation with deterministic fallback.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::fallback::FallbackGenerator;
use crate::backend::traits::{GenerationBackend, SuffixRequest};
use crate::error::{GenomeError, Result};
use crate::retry::{RetryExecutor, RetryPolicy, Transient};
use crate::sequence::Sequence;

/// A generated sequence with optional per-position sampling probabilities.
///
/// Probabilities cover the generated suffix only and are `None` when the
/// deterministic fallback produced the sequence.
#[derive(Debug, Clone)]
pub struct GeneratedSequence {
    /// The full sequence, seed prefix included
    pub sequence: Sequence,
    /// Sampling probability per generated position
    pub probabilities: Option<Vec<f32>>,
}

/// Produces sequences from a generation backend.
///
/// Transient backend failures are retried with exponential backoff; if the
/// backend stays unreachable, generation falls back to the deterministic
/// digest-chain generator so the same seed always resolves to the same
/// sequence. Non-transient failures propagate to the caller.
pub struct SequenceGenerator {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryExecutor,
}

impl SequenceGenerator {
    /// Create a generator over the given backend with the default retry
    /// policy.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            retry: RetryExecutor::default(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryExecutor::new(policy);
        self
    }

    /// Generate a sequence of `len(seed) + length` positions.
    pub async fn generate(
        &self,
        seed: Option<&str>,
        length: usize,
        temperature: f32,
    ) -> Result<GeneratedSequence> {
        let seed = seed.unwrap_or("").to_string();
        let request = SuffixRequest::new(seed.clone(), length, temperature);

        let backend = Arc::clone(&self.backend);
        let outcome = self
            .retry
            .execute("sequence-generation", || {
                let backend = Arc::clone(&backend);
                let request = request.clone();
                async move { backend.generate_suffix(&request).await }
            })
            .await;

        match outcome {
            Ok(response) => {
                let suffix_len = response.generated_suffix.chars().count();
                if suffix_len != length {
                    return Err(GenomeError::Parse(format!(
                        "backend returned {} bases, expected {}",
                        suffix_len, length
                    )));
                }

                debug!(
                    backend = %self.backend.id(),
                    length,
                    "Generated sequence suffix"
                );

                let probabilities = if response.per_symbol_probabilities.is_empty() {
                    None
                } else {
                    Some(response.per_symbol_probabilities)
                };

                Ok(GeneratedSequence {
                    sequence: Sequence::new(seed, &response.generated_suffix),
                    probabilities,
                })
            }
            Err(exhausted) if exhausted.last.is_transient() => {
                warn!(
                    backend = %self.backend.id(),
                    attempts = exhausted.attempts,
                    error = %exhausted.last,
                    "Generation service unreachable, using deterministic fallback"
                );
                let suffix = FallbackGenerator::generate(&seed, length);
                Ok(GeneratedSequence {
                    sequence: Sequence::new(seed, &suffix),
                    probabilities: None,
                })
            }
            Err(exhausted) => Err(exhausted.last),
        }
    }
}
