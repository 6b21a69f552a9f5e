//! Mint Agent - Asset Issuance Orchestration
//!
//! Provides the core infrastructure for issuing sequence-backed assets:
//! - Trait-based ledger backends (account, inscription, contract models)
//! - Metadata assembly with keyed-union attribute merges
//! - A file-backed local registry with an issuance reservation table
//! - The [`MintPipeline`] orchestrator with structured stage outcomes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               MintPipeline                  │
//! │  generate → render → assemble → check →     │
//! │            issue → persist                  │
//! └──────┬───────────────┬───────────────┬──────┘
//!        │               │               │
//!        ▼               ▼               ▼
//! ┌────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ genome /   │  │ LedgerBackend│  │ LocalRegistry│
//! │ genome-art │  │ (per         │  │ (wallets,    │
//! │            │  │  platform)   │  │  assets)     │
//! └────────────┘  └──────────────┘  └──────────────┘
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod pipeline;
pub mod registry;
pub mod signer;
pub mod storage;

// Re-export main types for convenience
pub use config::MintConfig;
pub use error::{MintError, Result};
pub use ledger::{
    backend_for, IssuanceReceipt, IssueOptions, LedgerAsset, LedgerBackend, Platform, TradeReceipt,
};
pub use metadata::{AssetDetails, AssetMetadata, Attribute, MetadataAssembler, MetadataUpdate};
pub use pipeline::{
    IssueRequest, MintPipeline, PipelineOutcome, PipelineStage, TradeOutcome, TradeStage,
};
pub use registry::{AssetRecord, LocalRegistry, Reservation, ReserveOutcome, WalletRecord};
pub use signer::{DevSigner, Signer};
pub use storage::{ContentStore, HttpContentStore, MemoryContentStore};
