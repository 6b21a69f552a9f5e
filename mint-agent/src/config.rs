//! Configuration for the mint pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use genome::RetryPolicy;

/// Default registry location.
pub fn default_registry_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helixmint")
        .join("registry")
}

/// Default location for rendered artifacts.
pub fn default_artifact_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helixmint")
        .join("artifacts")
}

/// Configuration for the mint pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    /// Generation service settings
    pub generation: GenerationConfig,
    /// Content store settings
    pub storage: StorageConfig,
    /// Per-platform ledger settings
    pub ledger: LedgerConfig,
    /// Registry directory
    #[serde(default = "default_registry_dir")]
    pub registry_dir: PathBuf,
    /// Artifact output directory
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Retry bounds for generation, issuance and trades
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            storage: StorageConfig::default(),
            ledger: LedgerConfig::default(),
            registry_dir: default_registry_dir(),
            artifact_dir: default_artifact_dir(),
            retry: RetryPolicy::default(),
        }
    }
}

impl MintConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation service
    pub endpoint: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Temperature used when the caller does not supply one
    pub default_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8331".to_string(),
            api_key: None,
            default_temperature: 0.8,
        }
    }
}

/// Content store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the upload service
    pub endpoint: String,
    /// Optional bearer token
    pub api_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8332".to_string(),
            api_key: None,
        }
    }
}

/// Per-platform ledger settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub inscription: InscriptionConfig,
    #[serde(default)]
    pub contract: ContractConfig,
}

/// Account-model ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Explorer URL prefix for assets and transactions
    pub explorer_base: String,
    /// Token decimal convention for trade unit conversion
    pub decimals: u32,
    /// Slippage tolerance for curve trades, in basis points
    pub slippage_bps: u16,
    /// Delay between confirmation polls, in milliseconds
    pub confirm_delay_ms: u64,
    /// Confirmation polls before giving up
    pub confirm_attempts: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8899".to_string(),
            explorer_base: "https://explorer.account.example".to_string(),
            decimals: 6,
            slippage_bps: 100,
            confirm_delay_ms: 500,
            confirm_attempts: 5,
        }
    }
}

/// Inscription-model ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InscriptionConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Explorer URL prefix for inscriptions
    pub explorer_base: String,
    /// Fee rate in native units per byte
    pub fee_rate: u64,
}

impl Default for InscriptionConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8333".to_string(),
            explorer_base: "https://explorer.inscription.example".to_string(),
            fee_rate: 12,
        }
    }
}

/// Contract-model ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Metadata registry upload endpoint
    pub registry_url: String,
    /// Explorer URL prefix for tokens
    pub explorer_base: String,
    /// Collection contract address
    pub contract_address: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            registry_url: "http://localhost:8334/registry".to_string(),
            explorer_base: "https://explorer.contract.example".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}
