//! Core trait for sequence generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Request for a generated suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixRequest {
    /// Caller-supplied prefix, kept verbatim in the final sequence
    pub seed: String,
    /// Number of bases to generate after the seed
    pub length: usize,
    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,
    /// Sampling parameters forwarded to the service
    pub sampling_params: SamplingParams,
}

impl SuffixRequest {
    /// Create a request with default sampling parameters.
    pub fn new(seed: impl Into<String>, length: usize, temperature: f32) -> Self {
        Self {
            seed: seed.into(),
            length,
            temperature: temperature.clamp(0.0, 2.0),
            sampling_params: SamplingParams::default(),
        }
    }
}

/// Sampling parameters for the generation service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    /// Candidate symbols considered at each position
    pub top_k: u32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            top_k: 4,
            top_p: 1.0,
        }
    }
}

/// Response from a generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixResponse {
    /// Generated bases, seed excluded
    pub generated_suffix: String,
    /// Sampling probability per generated position, when the backend
    /// reports them
    #[serde(default)]
    pub per_symbol_probabilities: Vec<f32>,
}

/// Core trait for sequence generation backends.
///
/// Abstracts over the remote generation service and the deterministic
/// local fallback so the generator and its tests share one seam.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend identifier for logging.
    fn id(&self) -> &str;

    /// Generate a suffix for the given request.
    async fn generate_suffix(&self, request: &SuffixRequest) -> Result<SuffixResponse>;
}
