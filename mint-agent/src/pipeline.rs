//! MintPipeline - the issue/update/trade orchestrator.
//!
//! One sequential pipeline per request:
//!
//! ```text
//! IDLE → GENERATING → RENDERING → ASSEMBLING → CHECKING_EXISTING
//!      → ISSUING → PERSISTING → COMPLETED
//! ```
//!
//! Every stage failure is returned as a structured outcome carrying the
//! originating stage; errors never propagate past this boundary. Before
//! `ISSUING` the pipeline has no side effects beyond a local artifact
//! file, so failed runs are safely re-runnable. A broadcast is never
//! blindly retried: each retry re-checks the ledger for an existing
//! asset first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use genome::{RetryExecutor, RetryPolicy, SequenceGenerator};
use genome_art::{RenderOptions, RenderStyle, Renderer};

use crate::config::MintConfig;
use crate::error::{MintError, Result};
use crate::ledger::{
    backend_for, validate_percentage, IssuanceReceipt, IssueOptions, LedgerAsset, LedgerBackend,
    Platform, TradeReceipt,
};
use crate::metadata::{AssetDetails, Attribute, AssetMetadata, MetadataAssembler, MetadataUpdate};
use crate::registry::{AssetRecord, LocalRegistry, ReserveOutcome};
use crate::signer::Signer;
use crate::storage::{ContentStore, HttpContentStore};

/// Stages of the issuance pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Generating,
    Rendering,
    Assembling,
    CheckingExisting,
    Issuing,
    Persisting,
    Completed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Generating => "generating",
            PipelineStage::Rendering => "rendering",
            PipelineStage::Assembling => "assembling",
            PipelineStage::CheckingExisting => "checking_existing",
            PipelineStage::Issuing => "issuing",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

/// Stages of the trade sub-pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStage {
    Idle,
    QueryBalance,
    SubmitTrade,
    Completed,
}

/// Request to issue an asset.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub wallet: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub platform: Platform,
    pub seed: Option<String>,
    pub length: usize,
    pub temperature: f32,
    pub style: RenderStyle,
    pub width: u32,
    pub height: u32,
    pub render_seed: u64,
    pub attributes: Vec<Attribute>,
    pub external_url: Option<String>,
    pub royalty_basis_points: u16,
}

impl IssueRequest {
    /// Create a request with default generation and render settings.
    pub fn new(
        wallet: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            wallet: wallet.into(),
            name: name.into(),
            symbol: symbol.into(),
            description: String::new(),
            platform,
            seed: None,
            length: 32,
            temperature: 0.8,
            style: RenderStyle::Grid,
            width: 800,
            height: 800,
            render_seed: 0,
            attributes: Vec::new(),
            external_url: None,
            royalty_basis_points: 500,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the generation seed prefix.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Set the generated suffix length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the render style.
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the artifact dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the cosmetic noise seed.
    pub fn with_render_seed(mut self, render_seed: u64) -> Self {
        self.render_seed = render_seed;
        self
    }

    /// Set caller attributes.
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the external URL.
    pub fn with_external_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = Some(url.into());
        self
    }

    /// Set the royalty in basis points.
    pub fn with_royalty_basis_points(mut self, royalty: u16) -> Self {
        self.royalty_basis_points = royalty;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.wallet.is_empty() {
            return Err(MintError::Validation("wallet name is required".into()));
        }
        if self.name.is_empty() {
            return Err(MintError::Validation("asset name is required".into()));
        }
        if self.symbol.is_empty() || self.symbol.len() > 12 {
            return Err(MintError::Validation(format!(
                "malformed symbol {:?}: must be 1-12 characters",
                self.symbol
            )));
        }
        if !self.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MintError::Validation(format!(
                "malformed symbol {:?}: only ASCII alphanumerics allowed",
                self.symbol
            )));
        }
        Ok(())
    }

    fn details(&self) -> AssetDetails {
        AssetDetails {
            name: self.name.clone(),
            symbol: self.symbol.to_ascii_uppercase(),
            description: self.description.clone(),
            royalty_basis_points: self.royalty_basis_points,
            external_url: self.external_url.clone(),
            platform: self.platform,
        }
    }
}

/// Structured result of an issuance or update pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub success: bool,
    /// Completed, or the stage where the pipeline stopped
    pub stage: PipelineStage,
    pub record: Option<AssetRecord>,
    /// False when an existing record satisfied the request
    pub newly_issued: bool,
    pub error: Option<String>,
}

impl PipelineOutcome {
    fn completed(record: AssetRecord, newly_issued: bool) -> Self {
        Self {
            success: true,
            stage: PipelineStage::Completed,
            record: Some(record),
            newly_issued,
            error: None,
        }
    }

    fn failed(stage: PipelineStage, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            stage,
            record: None,
            newly_issued: false,
            error: Some(error.to_string()),
        }
    }
}

/// Structured result of a trade sub-pipeline run.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub success: bool,
    pub stage: TradeStage,
    pub balance_before: Option<u64>,
    pub balance_after: Option<u64>,
    pub receipt: Option<TradeReceipt>,
    pub error: Option<String>,
}

impl TradeOutcome {
    fn completed(balance_before: u64, balance_after: u64, receipt: TradeReceipt) -> Self {
        Self {
            success: true,
            stage: TradeStage::Completed,
            balance_before: Some(balance_before),
            balance_after: Some(balance_after),
            receipt: Some(receipt),
            error: None,
        }
    }

    fn failed(stage: TradeStage, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            stage,
            balance_before: None,
            balance_after: None,
            receipt: None,
            error: Some(error.to_string()),
        }
    }
}

enum IssueAttempt {
    Issued(IssuanceReceipt),
    Recovered(LedgerAsset),
}

/// The issue/update/trade orchestrator.
///
/// All collaborators are injected at construction; the pipeline holds no
/// global state.
pub struct MintPipeline {
    generator: SequenceGenerator,
    renderer: Renderer,
    backends: HashMap<Platform, Arc<dyn LedgerBackend>>,
    registry: Arc<LocalRegistry>,
    retry: RetryExecutor,
}

impl MintPipeline {
    /// Create a pipeline; add ledger backends with
    /// [`MintPipeline::with_backend`].
    pub fn new(
        generator: SequenceGenerator,
        renderer: Renderer,
        registry: Arc<LocalRegistry>,
    ) -> Self {
        Self {
            generator,
            renderer,
            backends: HashMap::new(),
            registry,
            retry: RetryExecutor::default(),
        }
    }

    /// Register a ledger backend, keyed by its platform.
    pub fn with_backend(mut self, backend: Arc<dyn LedgerBackend>) -> Self {
        self.backends.insert(backend.platform(), backend);
        self
    }

    /// Set the retry policy for issuance and trades.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryExecutor::new(policy);
        self
    }

    /// Assemble a full pipeline from config: remote generator, HTTP
    /// content store and one backend per platform.
    pub fn from_config(config: &MintConfig, signer: Arc<dyn Signer>) -> Self {
        let mut remote = genome::RemoteGenerator::new(&config.generation.endpoint);
        if let Some(key) = &config.generation.api_key {
            remote = remote.with_api_key(key);
        }
        let generator =
            SequenceGenerator::new(Arc::new(remote)).with_retry_policy(config.retry);

        let mut store = HttpContentStore::new(&config.storage.endpoint);
        if let Some(key) = &config.storage.api_key {
            store = store.with_api_key(key);
        }
        let store: Arc<dyn ContentStore> = Arc::new(store);

        let mut pipeline = Self::new(
            generator,
            Renderer::new(&config.artifact_dir),
            Arc::new(LocalRegistry::new(&config.registry_dir)),
        )
        .with_retry_policy(config.retry);

        for platform in [Platform::Account, Platform::Inscription, Platform::Contract] {
            pipeline = pipeline.with_backend(backend_for(
                platform,
                &config.ledger,
                Arc::clone(&signer),
                Arc::clone(&store),
            ));
        }
        pipeline
    }

    /// The pipeline's registry.
    pub fn registry(&self) -> &Arc<LocalRegistry> {
        &self.registry
    }

    fn backend(&self, platform: Platform) -> Result<Arc<dyn LedgerBackend>> {
        self.backends
            .get(&platform)
            .cloned()
            .ok_or_else(|| MintError::Config(format!("no backend registered for {platform}")))
    }

    /// Run the full issuance pipeline.
    ///
    /// Idempotent per `(wallet, symbol)`: an existing record, local or on
    /// the ledger, is returned as-is with zero new submissions.
    pub async fn issue(&self, request: IssueRequest) -> PipelineOutcome {
        if let Err(e) = request.validate() {
            return PipelineOutcome::failed(PipelineStage::Idle, e);
        }
        let backend = match self.backend(request.platform) {
            Ok(backend) => backend,
            Err(e) => return PipelineOutcome::failed(PipelineStage::Idle, e),
        };
        let symbol = request.symbol.to_ascii_uppercase();

        // GENERATING
        let generated = match self
            .generator
            .generate(request.seed.as_deref(), request.length, request.temperature)
            .await
        {
            Ok(generated) => generated,
            Err(e) => return PipelineOutcome::failed(PipelineStage::Generating, e),
        };

        // RENDERING
        let mut options =
            RenderOptions::new(request.width, request.height).with_seed(request.render_seed);
        if let Some(probabilities) = &generated.probabilities {
            // Probabilities cover the generated suffix; seed positions
            // render at full weight.
            let seed_len = generated.sequence.start_seed().chars().count();
            let mut weights = vec![1.0; seed_len];
            weights.extend(probabilities);
            options = options.with_weights(weights);
        }
        let artifact = match self
            .renderer
            .render(&generated.sequence, request.style, &options)
        {
            Ok(artifact) => artifact,
            Err(e) => return PipelineOutcome::failed(PipelineStage::Rendering, e),
        };

        // ASSEMBLING
        let metadata = MetadataAssembler::build(
            &generated.sequence,
            &artifact.path.display().to_string(),
            &request.attributes,
            &request.details(),
        );

        // CHECKING_EXISTING: local record, then ledger, then reservation.
        match self.registry.find_asset(&request.wallet, &symbol).await {
            Ok(Some(existing)) => {
                info!(wallet = %request.wallet, symbol = %symbol, "Asset already recorded");
                return PipelineOutcome::completed(existing, false);
            }
            Ok(None) => {}
            Err(e) => return PipelineOutcome::failed(PipelineStage::CheckingExisting, e),
        }
        match backend.find_asset(&symbol).await {
            Ok(Some(asset)) => {
                // Issued in an earlier run whose local record was lost;
                // repair the registry instead of re-submitting.
                warn!(symbol = %symbol, identity = %asset.identity, "Recovered asset from ledger");
                let record = record_from_asset(&asset, request.platform, Some(metadata));
                if let Err(e) = self.registry.record_asset(&request.wallet, &record).await {
                    return PipelineOutcome::failed(PipelineStage::Persisting, e);
                }
                return PipelineOutcome::completed(record, false);
            }
            Ok(None) => {}
            Err(e) => return PipelineOutcome::failed(PipelineStage::CheckingExisting, e),
        }
        let reservation = match self.registry.try_reserve(&request.wallet, &symbol).await {
            Ok(ReserveOutcome::Reserved(reservation)) => reservation,
            Ok(ReserveOutcome::Existing(existing)) => {
                return PipelineOutcome::completed(existing, false)
            }
            Err(e) => return PipelineOutcome::failed(PipelineStage::CheckingExisting, e),
        };

        // ISSUING: retries re-run the existence check before submitting
        // again, so an already-broadcast transaction is never duplicated.
        let issue_options = IssueOptions::default();
        let attempt_counter = AtomicU32::new(0);
        let issued = self
            .retry
            .execute("ledger-issue", || {
                let attempt = attempt_counter.fetch_add(1, Ordering::SeqCst);
                let backend = Arc::clone(&backend);
                let metadata = &metadata;
                let artifact_bytes = &artifact.bytes;
                let issue_options = &issue_options;
                let symbol = &symbol;
                async move {
                    if attempt > 0 {
                        if let Some(asset) = backend.find_asset(symbol).await? {
                            return Ok(IssueAttempt::Recovered(asset));
                        }
                    }
                    backend
                        .issue(metadata, artifact_bytes, issue_options)
                        .await
                        .map(IssueAttempt::Issued)
                }
            })
            .await;
        let attempt = match issued {
            Ok(attempt) => attempt,
            // Reservation drops here, freeing the pair for a later run.
            Err(exhausted) => return PipelineOutcome::failed(PipelineStage::Issuing, exhausted),
        };

        // PERSISTING
        let (record, newly_issued) = match attempt {
            IssueAttempt::Issued(receipt) => {
                let record = AssetRecord {
                    symbol: symbol.clone(),
                    identity: receipt.identity,
                    platform: request.platform,
                    issued_at: chrono::Utc::now(),
                    explorer_url: receipt.explorer_url,
                    metadata: Some(metadata),
                };
                (record, true)
            }
            IssueAttempt::Recovered(asset) => {
                (record_from_asset(&asset, request.platform, Some(metadata)), false)
            }
        };
        if let Err(e) = self.registry.record_asset(&request.wallet, &record).await {
            return PipelineOutcome::failed(PipelineStage::Persisting, e);
        }
        drop(reservation);

        info!(
            wallet = %request.wallet,
            symbol = %record.symbol,
            identity = %record.identity,
            platform = %record.platform,
            "Issuance pipeline completed"
        );
        PipelineOutcome::completed(record, newly_issued)
    }

    /// Update the metadata of an issued asset.
    ///
    /// Fails without touching the stored record on platforms whose asset
    /// representation is immutable.
    pub async fn update(
        &self,
        wallet: &str,
        symbol: &str,
        new_fields: MetadataUpdate,
    ) -> PipelineOutcome {
        let record = match self.registry.find_asset(wallet, symbol).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return PipelineOutcome::failed(
                    PipelineStage::CheckingExisting,
                    MintError::NotFound(format!("asset {symbol} under wallet {wallet}")),
                )
            }
            Err(e) => return PipelineOutcome::failed(PipelineStage::CheckingExisting, e),
        };
        let backend = match self.backend(record.platform) {
            Ok(backend) => backend,
            Err(e) => return PipelineOutcome::failed(PipelineStage::Idle, e),
        };

        let existing = record
            .metadata
            .clone()
            .unwrap_or_else(|| minimal_metadata(&record));
        let updated = MetadataAssembler::update(&existing, &new_fields);

        let submission = self
            .retry
            .execute("ledger-update", || {
                let backend = Arc::clone(&backend);
                let identity = record.identity.clone();
                let updated = &updated;
                async move { backend.update(&identity, updated).await }
            })
            .await;
        if let Err(exhausted) = submission {
            return PipelineOutcome::failed(PipelineStage::Issuing, exhausted);
        }

        let mut record = record;
        record.metadata = Some(updated);
        if let Err(e) = self.registry.record_asset(wallet, &record).await {
            return PipelineOutcome::failed(PipelineStage::Persisting, e);
        }
        PipelineOutcome::completed(record, false)
    }

    /// Buy into an issued asset with native currency units.
    pub async fn buy(&self, wallet: &str, symbol: &str, amount_in: u64) -> TradeOutcome {
        if amount_in == 0 {
            return TradeOutcome::failed(
                TradeStage::Idle,
                MintError::Validation("buy amount must be positive".into()),
            );
        }
        self.trade(wallet, symbol, TradeSide::Buy { amount_in }).await
    }

    /// Sell a percentage (0, 100] of the held position.
    pub async fn sell(&self, wallet: &str, symbol: &str, percentage: f32) -> TradeOutcome {
        if let Err(e) = validate_percentage(percentage) {
            return TradeOutcome::failed(TradeStage::Idle, e);
        }
        self.trade(wallet, symbol, TradeSide::Sell { percentage }).await
    }

    async fn trade(&self, wallet: &str, symbol: &str, side: TradeSide) -> TradeOutcome {
        let record = match self.registry.find_asset(wallet, symbol).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return TradeOutcome::failed(
                    TradeStage::Idle,
                    MintError::NotFound(format!("asset {symbol} under wallet {wallet}")),
                )
            }
            Err(e) => return TradeOutcome::failed(TradeStage::Idle, e),
        };
        let backend = match self.backend(record.platform) {
            Ok(backend) => backend,
            Err(e) => return TradeOutcome::failed(TradeStage::Idle, e),
        };
        if !backend.supports_trading() {
            return TradeOutcome::failed(
                TradeStage::Idle,
                MintError::Unsupported(format!(
                    "{} platform does not support trading",
                    record.platform
                )),
            );
        }

        // QUERY_BALANCE
        let balance_before = match backend.balance(&record.identity).await {
            Ok(balance) => balance,
            Err(e) => return TradeOutcome::failed(TradeStage::QueryBalance, e),
        };

        // SUBMIT_TRADE
        let submitted = self
            .retry
            .execute("ledger-trade", || {
                let backend = Arc::clone(&backend);
                let identity = record.identity.clone();
                let side = side.clone();
                async move {
                    match side {
                        TradeSide::Buy { amount_in } => backend.buy(&identity, amount_in).await,
                        TradeSide::Sell { percentage } => {
                            backend.sell(&identity, percentage).await
                        }
                    }
                }
            })
            .await;
        let receipt = match submitted {
            Ok(receipt) => receipt,
            Err(exhausted) => return TradeOutcome::failed(TradeStage::SubmitTrade, exhausted),
        };

        // QUERY_BALANCE
        let balance_after = match backend.balance(&record.identity).await {
            Ok(balance) => balance,
            Err(e) => return TradeOutcome::failed(TradeStage::QueryBalance, e),
        };

        info!(
            symbol = %record.symbol,
            balance_before,
            balance_after,
            units = receipt.units,
            "Trade pipeline completed"
        );
        TradeOutcome::completed(balance_before, balance_after, receipt)
    }

    /// All assets issued under a wallet.
    pub async fn list(&self, wallet: &str) -> Result<Vec<AssetRecord>> {
        self.registry.list_assets(wallet).await
    }
}

#[derive(Debug, Clone)]
enum TradeSide {
    Buy { amount_in: u64 },
    Sell { percentage: f32 },
}

fn record_from_asset(
    asset: &LedgerAsset,
    platform: Platform,
    metadata: Option<AssetMetadata>,
) -> AssetRecord {
    AssetRecord {
        symbol: asset.symbol.to_ascii_uppercase(),
        identity: asset.identity.clone(),
        platform,
        issued_at: chrono::Utc::now(),
        explorer_url: asset.explorer_url.clone(),
        metadata,
    }
}

fn minimal_metadata(record: &AssetRecord) -> AssetMetadata {
    AssetMetadata {
        name: record.symbol.clone(),
        symbol: record.symbol.clone(),
        description: String::new(),
        attributes: Vec::new(),
        sequence_ref: String::new(),
        visualization_ref: String::new(),
        royalty_basis_points: 0,
        external_url: None,
        platform: record.platform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MockLedger;
    use genome::FallbackGenerator;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    /// Pipeline over the deterministic generator and a mock ledger; no
    /// network anywhere.
    fn pipeline(dir: &TempDir, ledger: Arc<MockLedger>) -> MintPipeline {
        let generator = SequenceGenerator::new(Arc::new(FallbackGenerator));
        let renderer = Renderer::new(dir.path().join("artifacts"));
        let registry = Arc::new(LocalRegistry::new(dir.path().join("registry")));
        MintPipeline::new(generator, renderer, registry)
            .with_backend(ledger)
            .with_retry_policy(fast_policy())
    }

    fn request() -> IssueRequest {
        IssueRequest::new("alpha", "Specimen One", "SPEC1", Platform::Account)
            .with_seed("ELIZA")
            .with_length(32)
            .with_dimensions(160, 160)
            .with_attributes(vec![Attribute::new("Type", "Agent")])
    }

    #[tokio::test]
    async fn test_issue_pipeline_end_to_end() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let outcome = pipeline.issue(request()).await;

        assert!(outcome.success, "pipeline failed: {:?}", outcome.error);
        assert_eq!(outcome.stage, PipelineStage::Completed);
        assert!(outcome.newly_issued);

        let record = outcome.record.unwrap();
        assert_eq!(record.symbol, "SPEC1");
        assert_eq!(record.platform, Platform::Account);
        assert!(!record.identity.is_empty());

        // 37-position sequence flowed into the metadata.
        let metadata = record.metadata.as_ref().unwrap();
        assert!(metadata
            .attributes
            .iter()
            .any(|a| a.trait_type == "Sequence Length" && a.value == "37"));
        assert!(metadata
            .attributes
            .iter()
            .any(|a| a.trait_type == "Type" && a.value == "Agent"));

        // Artifact was written, record persisted.
        assert!(std::path::Path::new(&metadata.visualization_ref).exists());
        let persisted = pipeline
            .registry()
            .find_asset("alpha", "SPEC1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.identity, record.identity);
    }

    #[tokio::test]
    async fn test_issue_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let first = pipeline.issue(request()).await;
        let second = pipeline.issue(request()).await;

        assert!(first.success && second.success);
        assert!(!second.newly_issued);
        assert_eq!(
            first.record.unwrap().identity,
            second.record.unwrap().identity
        );
        // Exactly one ledger submission across both runs.
        assert_eq!(ledger.issue_calls(), 1);
    }

    #[tokio::test]
    async fn test_issue_recovers_record_from_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account).with_existing_asset(
            LedgerAsset {
                symbol: "SPEC1".into(),
                identity: "mock-account-spec1".into(),
                metadata_uri: None,
                explorer_url: "https://explorer.mock.example/mock-account-spec1".into(),
            },
        ));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let outcome = pipeline.issue(request()).await;

        assert!(outcome.success);
        assert!(!outcome.newly_issued);
        assert_eq!(ledger.issue_calls(), 0);
        // Registry was repaired from the ledger.
        assert!(pipeline
            .registry()
            .find_asset("alpha", "SPEC1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_transient_broadcast_failure_is_retried_to_success() {
        let dir = TempDir::new().unwrap();
        let ledger =
            Arc::new(MockLedger::new(Platform::Account).with_transient_issue_failures(1));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let outcome = pipeline.issue(request()).await;

        assert!(outcome.success);
        // First broadcast failed, the retry re-checked and resubmitted.
        assert_eq!(ledger.issue_calls(), 2);
    }

    #[tokio::test]
    async fn test_fatal_broadcast_failure_leaves_no_record() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account).with_fatal_issue_failure());
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let outcome = pipeline.issue(request()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.stage, PipelineStage::Issuing);
        assert!(pipeline
            .registry()
            .find_asset("alpha", "SPEC1")
            .await
            .unwrap()
            .is_none());

        // The reservation was released, so the pair can be issued later.
        assert!(matches!(
            pipeline
                .registry()
                .try_reserve("alpha", "SPEC1")
                .await
                .unwrap(),
            ReserveOutcome::Reserved(_)
        ));
    }

    #[tokio::test]
    async fn test_render_failure_stops_before_any_side_effect() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let outcome = pipeline.issue(request().with_dimensions(0, 100)).await;

        assert!(!outcome.success);
        assert_eq!(outcome.stage, PipelineStage::Rendering);
        assert_eq!(ledger.issue_calls(), 0);
        assert!(pipeline
            .registry()
            .find_asset("alpha", "SPEC1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_malformed_symbol_is_rejected_at_idle() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        let mut bad = request();
        bad.symbol = "not a symbol!".into();
        let outcome = pipeline.issue(bad).await;

        assert!(!outcome.success);
        assert_eq!(outcome.stage, PipelineStage::Idle);
        assert_eq!(ledger.issue_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_merges_metadata() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));
        pipeline.issue(request()).await;

        let outcome = pipeline
            .update(
                "alpha",
                "SPEC1",
                MetadataUpdate {
                    description: Some("Updated description".into()),
                    attributes: vec![Attribute::new("Type", "Evolved Agent")],
                    ..Default::default()
                },
            )
            .await;

        assert!(outcome.success, "update failed: {:?}", outcome.error);
        assert_eq!(ledger.update_calls(), 1);

        let metadata = outcome.record.unwrap().metadata.unwrap();
        assert_eq!(metadata.description, "Updated description");
        assert!(metadata
            .attributes
            .iter()
            .any(|a| a.trait_type == "Type" && a.value == "Evolved Agent"));
    }

    #[tokio::test]
    async fn test_update_on_immutable_platform_leaves_record_unchanged() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(
            MockLedger::new(Platform::Inscription)
                .without_updates()
                .without_trading(),
        );
        let pipeline = pipeline(&dir, Arc::clone(&ledger));
        let issued = pipeline
            .issue(IssueRequest::new(
                "alpha",
                "Specimen One",
                "SPEC1",
                Platform::Inscription,
            ).with_dimensions(64, 64))
            .await;
        assert!(issued.success);
        let before = pipeline
            .registry()
            .find_asset("alpha", "SPEC1")
            .await
            .unwrap()
            .unwrap();

        let outcome = pipeline
            .update(
                "alpha",
                "SPEC1",
                MetadataUpdate {
                    description: Some("new".into()),
                    ..Default::default()
                },
            )
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Unsupported"));

        let after = pipeline
            .registry()
            .find_asset("alpha", "SPEC1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_update_of_unknown_asset_is_not_found() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Arc::new(MockLedger::new(Platform::Account)));

        let outcome = pipeline
            .update("alpha", "GHOST", MetadataUpdate::default())
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.stage, PipelineStage::CheckingExisting);
        assert!(outcome.error.unwrap().contains("Not found"));
    }

    #[tokio::test]
    async fn test_trade_pipeline_reports_balances() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account).with_holdings(1_000));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));
        pipeline.issue(request()).await;

        let outcome = pipeline.buy("alpha", "SPEC1", 500).await;

        assert!(outcome.success);
        assert_eq!(outcome.stage, TradeStage::Completed);
        assert_eq!(outcome.balance_before, Some(1_000));
        assert_eq!(outcome.balance_after, Some(1_500));

        let outcome = pipeline.sell("alpha", "SPEC1", 50.0).await;
        assert!(outcome.success);
        assert_eq!(outcome.balance_after, Some(750));
    }

    #[tokio::test]
    async fn test_sell_percentage_out_of_range_makes_no_ledger_call() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account).with_holdings(1_000));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));
        pipeline.issue(request()).await;

        let outcome = pipeline.sell("alpha", "SPEC1", 150.0).await;

        assert!(!outcome.success);
        assert_eq!(outcome.stage, TradeStage::Idle);
        assert!(outcome.error.unwrap().contains("Validation"));
        assert_eq!(ledger.trade_calls(), 0);
    }

    #[tokio::test]
    async fn test_trade_on_non_trading_platform_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(
            MockLedger::new(Platform::Contract).without_trading(),
        );
        let pipeline = pipeline(&dir, Arc::clone(&ledger));
        pipeline
            .issue(IssueRequest::new("alpha", "Specimen", "SPEC1", Platform::Contract)
                .with_dimensions(64, 64))
            .await;

        let outcome = pipeline.buy("alpha", "SPEC1", 100).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Unsupported"));
    }

    #[tokio::test]
    async fn test_unregistered_platform_is_a_config_failure() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Arc::new(MockLedger::new(Platform::Account)));

        let outcome = pipeline
            .issue(IssueRequest::new("alpha", "Specimen", "SPEC1", Platform::Contract))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.stage, PipelineStage::Idle);
    }

    #[tokio::test]
    async fn test_list_returns_issued_assets() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = pipeline(&dir, Arc::clone(&ledger));

        pipeline.issue(request()).await;
        pipeline
            .issue(
                IssueRequest::new("alpha", "Specimen Two", "SPEC2", Platform::Account)
                    .with_dimensions(64, 64),
            )
            .await;

        let listed = pipeline.list("alpha").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].symbol, "SPEC1");
        assert_eq!(listed[1].symbol, "SPEC2");
    }

    #[tokio::test]
    async fn test_concurrent_issues_submit_once() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MockLedger::new(Platform::Account));
        let pipeline = Arc::new(pipeline(&dir, Arc::clone(&ledger)));

        let runs = futures::future::join_all(
            (0..4).map(|_| {
                let pipeline = Arc::clone(&pipeline);
                async move { pipeline.issue(request()).await }
            }),
        )
        .await;

        // Whatever interleaving happened, exactly one broadcast went out
        // and at least one run completed with the record.
        assert_eq!(ledger.issue_calls(), 1);
        assert!(runs.iter().any(|o| o.success));
        let identities: std::collections::HashSet<_> = runs
            .iter()
            .filter_map(|o| o.record.as_ref().map(|r| r.identity.clone()))
            .collect();
        assert!(identities.len() <= 1);
    }
}
