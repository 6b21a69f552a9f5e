//! Ledger backends.
//!
//! One trait, one implementation per platform family:
//! - [`AccountLedger`]: account-model ledger, content-addressed uploads,
//!   mutable metadata, bonding-curve trading
//! - [`InscriptionLedger`]: inscription-model ledger, content embedded
//!   inline and immutable
//! - [`ContractLedger`]: contract-model ledger, metadata in an external
//!   registry, mutable token URI

pub mod account;
pub mod contract;
pub mod inscription;
pub mod mock;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::error::{MintError, Result};
use crate::metadata::AssetMetadata;
use crate::signer::Signer;
use crate::storage::ContentStore;

pub use account::AccountLedger;
pub use contract::ContractLedger;
pub use inscription::InscriptionLedger;
pub use mock::MockLedger;

/// Target ledger platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Account-model ledger
    Account,
    /// Inscription-model ledger
    Inscription,
    /// Contract-model ledger
    Contract,
}

impl FromStr for Platform {
    type Err = MintError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "account" => Ok(Platform::Account),
            "inscription" => Ok(Platform::Inscription),
            "contract" => Ok(Platform::Contract),
            other => Err(MintError::Validation(format!("unknown platform: {other}"))),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Platform::Account => "account",
            Platform::Inscription => "inscription",
            Platform::Contract => "contract",
        };
        write!(f, "{name}")
    }
}

/// Options for an issuance submission.
#[derive(Debug, Clone)]
pub struct IssueOptions {
    /// MIME type of the artifact bytes
    pub content_type: String,
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            content_type: "image/png".to_string(),
        }
    }
}

/// Typed result of a successful issuance or metadata update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceReceipt {
    /// Platform-native asset identity
    pub identity: String,
    /// Transaction reference of the submission
    pub tx_ref: String,
    /// Human-facing explorer link
    pub explorer_url: String,
}

/// Typed result of a trade submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    /// Transaction reference of the trade
    pub tx_ref: String,
    /// Native units bought or sold
    pub units: u64,
    /// Human-facing explorer link
    pub explorer_url: String,
}

/// An asset as the ledger reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAsset {
    pub symbol: String,
    pub identity: String,
    pub metadata_uri: Option<String>,
    pub explorer_url: String,
}

/// Core trait for ledger backends.
///
/// The interface contract is identical across platforms; upload
/// mechanism, identity format and fee handling are confined to each
/// implementation.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// The platform this backend submits to.
    fn platform(&self) -> Platform;

    /// Whether issued metadata can change after issuance.
    fn supports_updates(&self) -> bool;

    /// Whether the platform exposes bonding-curve trading.
    fn supports_trading(&self) -> bool {
        false
    }

    /// Submit a new asset. The caller is responsible for the idempotency
    /// check; this method always broadcasts.
    async fn issue(
        &self,
        metadata: &AssetMetadata,
        artifact: &[u8],
        options: &IssueOptions,
    ) -> Result<IssuanceReceipt>;

    /// Replace the metadata of an issued asset.
    async fn update(&self, identity: &str, metadata: &AssetMetadata) -> Result<IssuanceReceipt>;

    /// Look up an asset of this backend's wallet by symbol.
    async fn find_asset(&self, symbol: &str) -> Result<Option<LedgerAsset>>;

    /// Native units of `identity` held by this backend's wallet.
    async fn balance(&self, identity: &str) -> Result<u64>;

    /// Buy into an asset with `amount_in` native currency units.
    async fn buy(&self, _identity: &str, _amount_in: u64) -> Result<TradeReceipt> {
        Err(MintError::Unsupported(format!(
            "{} platform does not support trading",
            self.platform()
        )))
    }

    /// Sell a percentage (0, 100] of the held position.
    async fn sell(&self, _identity: &str, _percentage: f32) -> Result<TradeReceipt> {
        Err(MintError::Unsupported(format!(
            "{} platform does not support trading",
            self.platform()
        )))
    }
}

/// Select a backend for a platform.
pub fn backend_for(
    platform: Platform,
    config: &LedgerConfig,
    signer: Arc<dyn Signer>,
    store: Arc<dyn ContentStore>,
) -> Arc<dyn LedgerBackend> {
    match platform {
        Platform::Account => Arc::new(AccountLedger::new(&config.account, signer, store)),
        Platform::Inscription => Arc::new(InscriptionLedger::new(&config.inscription, signer)),
        Platform::Contract => Arc::new(ContractLedger::new(&config.contract, signer)),
    }
}

/// Reject percentages outside (0, 100] before any ledger call.
pub fn validate_percentage(percentage: f32) -> Result<()> {
    if percentage > 0.0 && percentage <= 100.0 {
        Ok(())
    } else {
        Err(MintError::Validation(format!(
            "sell percentage must be in (0, 100], got {percentage}"
        )))
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: String,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// `null` is a meaningful result for lookup methods, so the field
    /// defaults rather than wrapping in Option.
    #[serde(default)]
    result: serde_json::Value,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// One JSON-RPC round trip with the shared error mapping: connectivity
/// problems and throttling are transient, ledger rejections are not.
pub(crate) async fn rpc_call(
    client: &Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value> {
    let request = RpcRequest {
        jsonrpc: "2.0",
        id: uuid::Uuid::new_v4().to_string(),
        method,
        params,
    };

    let response = client
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| MintError::Transient(format!("{method}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(if status.as_u16() == 429 || status.is_server_error() {
            MintError::Transient(format!("{method}: HTTP {status}: {body}"))
        } else {
            MintError::Ledger(format!("{method}: HTTP {status}: {body}"))
        });
    }

    let rpc: RpcResponse = response
        .json()
        .await
        .map_err(|e| MintError::Ledger(format!("{method}: malformed response: {e}")))?;

    if let Some(error) = rpc.error {
        return Err(MintError::Ledger(format!(
            "{method}: rejected ({}): {}",
            error.code, error.message
        )));
    }

    Ok(rpc.result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parsing_roundtrip() {
        for platform in [Platform::Account, Platform::Inscription, Platform::Contract] {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
        assert!("orderbook".parse::<Platform>().is_err());
    }

    #[test]
    fn test_percentage_validation() {
        assert!(validate_percentage(0.1).is_ok());
        assert!(validate_percentage(100.0).is_ok());

        assert!(validate_percentage(0.0).is_err());
        assert!(validate_percentage(-5.0).is_err());
        assert!(validate_percentage(150.0).is_err());
        assert!(validate_percentage(f32::NAN).is_err());
    }
}
