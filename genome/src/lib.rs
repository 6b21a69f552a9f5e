//! Genome - Nucleotide Sequence Generation
//!
//! Provides the sequence domain for HelixMint:
//! - [`Sequence`]: an immutable nucleotide string with a content hash
//! - Trait-based generation backends (remote service, deterministic fallback)
//! - [`SequenceGenerator`]: retry-wrapped generation with fallback
//! - [`analyze`]: per-nucleotide composition and GC content
//! - [`RetryExecutor`]: bounded exponential backoff shared by the workspace
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          SequenceGenerator              │
//! │   (retry → remote, fallback on outage)  │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌──────────────┐
//! │ Remote      │       │ Fallback     │
//! │ Generator   │       │ (digest      │
//! │ (HTTP)      │       │  chain)      │
//! └─────────────┘       └──────────────┘
//! ```

pub mod analyzer;
pub mod backend;
pub mod error;
pub mod generator;
pub mod retry;
pub mod sequence;

// Re-export main types for convenience
pub use analyzer::{analyze, CompositionReport};
pub use backend::fallback::FallbackGenerator;
pub use backend::remote::RemoteGenerator;
pub use backend::traits::{GenerationBackend, SamplingParams, SuffixRequest, SuffixResponse};
pub use error::{GenomeError, Result};
pub use generator::{GeneratedSequence, SequenceGenerator};
pub use retry::{RetryExecutor, RetryExhausted, RetryPolicy, Transient};
pub use sequence::{Nucleotide, Sequence};
