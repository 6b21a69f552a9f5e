//! Account-model ledger backend.
//!
//! Content goes to a content-addressed store, the asset itself is an
//! account created by RPC. Metadata stays mutable and the platform
//! exposes bonding-curve trading.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AccountConfig;
use crate::error::{MintError, Result};
use crate::ledger::{
    rpc_call, validate_percentage, IssuanceReceipt, IssueOptions, LedgerAsset, LedgerBackend,
    Platform, TradeReceipt,
};
use crate::metadata::AssetMetadata;
use crate::signer::Signer;
use crate::storage::ContentStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResult {
    asset_id: String,
    tx_signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxStatus {
    confirmed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeResult {
    tx_signature: String,
    units: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResult {
    units: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetLookup {
    asset_id: String,
    metadata_uri: Option<String>,
}

/// Backend for an account-model ledger.
pub struct AccountLedger {
    client: Client,
    rpc_url: String,
    explorer_base: String,
    decimals: u32,
    slippage_bps: u16,
    confirm_delay: Duration,
    confirm_attempts: u32,
    signer: Arc<dyn Signer>,
    store: Arc<dyn ContentStore>,
}

impl AccountLedger {
    /// Create a backend from config, a signer and a content store.
    pub fn new(
        config: &AccountConfig,
        signer: Arc<dyn Signer>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            client: Client::new(),
            rpc_url: config.rpc_url.clone(),
            explorer_base: config.explorer_base.clone(),
            decimals: config.decimals,
            slippage_bps: config.slippage_bps,
            confirm_delay: Duration::from_millis(config.confirm_delay_ms),
            confirm_attempts: config.confirm_attempts,
            signer,
            store,
        }
    }

    fn explorer_url(&self, asset_id: &str) -> String {
        format!("{}/asset/{}", self.explorer_base, asset_id)
    }

    async fn signature_for(&self, payload: &serde_json::Value) -> Result<String> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(hex::encode(self.signer.sign(&bytes).await?))
    }

    /// Poll until the transaction confirms or attempts run out.
    async fn confirm(&self, tx: &str) -> Result<()> {
        for attempt in 0..self.confirm_attempts {
            let status: TxStatus = serde_json::from_value(
                rpc_call(
                    &self.client,
                    &self.rpc_url,
                    "tx_status",
                    serde_json::json!({ "signature": tx }),
                )
                .await?,
            )?;
            if status.confirmed {
                return Ok(());
            }
            debug!(tx = %tx, attempt, "Transaction not yet confirmed");
            tokio::time::sleep(self.confirm_delay).await;
        }
        Err(MintError::Transient(format!(
            "transaction {tx} unconfirmed after {} polls",
            self.confirm_attempts
        )))
    }

    /// Convert a sell percentage to native units of the held position.
    fn units_for_percentage(held: u64, percentage: f32) -> u64 {
        let basis_points = (percentage as f64 * 100.0).round() as u128;
        (held as u128 * basis_points / 10_000) as u64
    }
}

#[async_trait]
impl LedgerBackend for AccountLedger {
    fn platform(&self) -> Platform {
        Platform::Account
    }

    fn supports_updates(&self) -> bool {
        true
    }

    fn supports_trading(&self) -> bool {
        true
    }

    async fn issue(
        &self,
        metadata: &AssetMetadata,
        artifact: &[u8],
        options: &IssueOptions,
    ) -> Result<IssuanceReceipt> {
        let image_uri = self.store.upload(artifact, &options.content_type).await?;

        let mut document = serde_json::to_value(metadata)?;
        document["image"] = serde_json::Value::String(image_uri);
        let metadata_uri = self.store.upload_json(&document).await?;

        let params = serde_json::json!({
            "symbol": metadata.symbol,
            "name": metadata.name,
            "uri": metadata_uri,
            "royaltyBps": metadata.royalty_basis_points,
            "owner": self.signer.reference(),
        });
        let signature = self.signature_for(&params).await?;
        let mut params = params;
        params["signature"] = serde_json::Value::String(signature);

        let created: CreateResult = serde_json::from_value(
            rpc_call(&self.client, &self.rpc_url, "asset_create", params).await?,
        )?;
        self.confirm(&created.tx_signature).await?;

        info!(
            symbol = %metadata.symbol,
            asset_id = %created.asset_id,
            "Issued account-model asset"
        );

        Ok(IssuanceReceipt {
            explorer_url: self.explorer_url(&created.asset_id),
            identity: created.asset_id,
            tx_ref: created.tx_signature,
        })
    }

    async fn update(&self, identity: &str, metadata: &AssetMetadata) -> Result<IssuanceReceipt> {
        let document = serde_json::to_value(metadata)?;
        let metadata_uri = self.store.upload_json(&document).await?;

        let params = serde_json::json!({
            "assetId": identity,
            "uri": metadata_uri,
            "owner": self.signer.reference(),
        });
        let signature = self.signature_for(&params).await?;
        let mut params = params;
        params["signature"] = serde_json::Value::String(signature);

        let updated: CreateResult = serde_json::from_value(
            rpc_call(&self.client, &self.rpc_url, "asset_update", params).await?,
        )?;
        self.confirm(&updated.tx_signature).await?;

        Ok(IssuanceReceipt {
            explorer_url: self.explorer_url(identity),
            identity: identity.to_string(),
            tx_ref: updated.tx_signature,
        })
    }

    async fn find_asset(&self, symbol: &str) -> Result<Option<LedgerAsset>> {
        let result = rpc_call(
            &self.client,
            &self.rpc_url,
            "asset_by_symbol",
            serde_json::json!({
                "symbol": symbol,
                "owner": self.signer.reference(),
            }),
        )
        .await?;

        if result.is_null() {
            return Ok(None);
        }
        let lookup: AssetLookup = serde_json::from_value(result)?;
        Ok(Some(LedgerAsset {
            symbol: symbol.to_string(),
            explorer_url: self.explorer_url(&lookup.asset_id),
            identity: lookup.asset_id,
            metadata_uri: lookup.metadata_uri,
        }))
    }

    async fn balance(&self, identity: &str) -> Result<u64> {
        let balance: BalanceResult = serde_json::from_value(
            rpc_call(
                &self.client,
                &self.rpc_url,
                "token_balance",
                serde_json::json!({
                    "assetId": identity,
                    "owner": self.signer.reference(),
                }),
            )
            .await?,
        )?;
        Ok(balance.units)
    }

    async fn buy(&self, identity: &str, amount_in: u64) -> Result<TradeReceipt> {
        let params = serde_json::json!({
            "assetId": identity,
            "amountIn": amount_in,
            "slippageBps": self.slippage_bps,
            "owner": self.signer.reference(),
        });
        let signature = self.signature_for(&params).await?;
        let mut params = params;
        params["signature"] = serde_json::Value::String(signature);

        let trade: TradeResult = serde_json::from_value(
            rpc_call(&self.client, &self.rpc_url, "curve_buy", params).await?,
        )?;

        Ok(TradeReceipt {
            explorer_url: format!("{}/tx/{}", self.explorer_base, trade.tx_signature),
            tx_ref: trade.tx_signature,
            units: trade.units,
        })
    }

    async fn sell(&self, identity: &str, percentage: f32) -> Result<TradeReceipt> {
        validate_percentage(percentage)?;

        let held = self.balance(identity).await?;
        let units = Self::units_for_percentage(held, percentage);
        if units == 0 {
            return Err(MintError::Ledger(format!(
                "selling {percentage}% of {held} units rounds to zero"
            )));
        }

        let params = serde_json::json!({
            "assetId": identity,
            "units": units,
            "decimals": self.decimals,
            "slippageBps": self.slippage_bps,
            "owner": self.signer.reference(),
        });
        let signature = self.signature_for(&params).await?;
        let mut params = params;
        params["signature"] = serde_json::Value::String(signature);

        let trade: TradeResult = serde_json::from_value(
            rpc_call(&self.client, &self.rpc_url, "curve_sell", params).await?,
        )?;

        Ok(TradeReceipt {
            explorer_url: format!("{}/tx/{}", self.explorer_base, trade.tx_signature),
            tx_ref: trade.tx_signature,
            units: trade.units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::DevSigner;
    use crate::storage::MemoryContentStore;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rpc_result(value: serde_json::Value) -> serde_json::Value {
        serde_json::json!({ "jsonrpc": "2.0", "id": "1", "result": value })
    }

    fn backend(server: &MockServer, store: Arc<MemoryContentStore>) -> AccountLedger {
        let config = AccountConfig {
            rpc_url: server.uri(),
            confirm_delay_ms: 1,
            ..Default::default()
        };
        AccountLedger::new(&config, Arc::new(DevSigner::new("wallet-1")), store)
    }

    fn metadata() -> AssetMetadata {
        use crate::metadata::{AssetDetails, MetadataAssembler};
        use genome::Sequence;

        MetadataAssembler::build(
            &Sequence::from_bases("ACGTACGT"),
            "art.png",
            &[],
            &AssetDetails {
                name: "Specimen".into(),
                symbol: "SPEC".into(),
                description: "desc".into(),
                royalty_basis_points: 250,
                external_url: None,
                platform: Platform::Account,
            },
        )
    }

    #[tokio::test]
    async fn test_issue_uploads_then_creates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"method": "asset_create"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(
                serde_json::json!({"assetId": "asset-77", "txSignature": "sig-1"}),
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"method": "tx_status"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(
                serde_json::json!({"confirmed": true}),
            )))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryContentStore::new());
        let ledger = backend(&server, Arc::clone(&store));

        let receipt = ledger
            .issue(&metadata(), b"png bytes", &IssueOptions::default())
            .await
            .unwrap();

        assert_eq!(receipt.identity, "asset-77");
        assert!(receipt.explorer_url.contains("asset-77"));
        // Artifact and metadata document both went to the store.
        assert_eq!(store.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_sell_converts_percentage_to_units() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"method": "token_balance"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(
                serde_json::json!({"units": 4_000_000u64}),
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "method": "curve_sell",
                "params": {"units": 1_000_000u64},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(
                serde_json::json!({"txSignature": "sig-9", "units": 1_000_000u64}),
            )))
            .mount(&server)
            .await;

        let ledger = backend(&server, Arc::new(MemoryContentStore::new()));
        let receipt = ledger.sell("asset-77", 25.0).await.unwrap();
        assert_eq!(receipt.units, 1_000_000);
    }

    #[tokio::test]
    async fn test_sell_rejects_out_of_range_percentage_before_any_call() {
        // No mocks mounted: a ledger call would fail loudly.
        let server = MockServer::start().await;
        let ledger = backend(&server, Arc::new(MemoryContentStore::new()));

        let err = ledger.sell("asset-77", 150.0).await.unwrap_err();
        assert!(matches!(err, MintError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_units_for_percentage() {
        assert_eq!(AccountLedger::units_for_percentage(1_000_000, 100.0), 1_000_000);
        assert_eq!(AccountLedger::units_for_percentage(1_000_000, 50.0), 500_000);
        assert_eq!(AccountLedger::units_for_percentage(3, 50.0), 1);
        assert_eq!(AccountLedger::units_for_percentage(0, 50.0), 0);
    }

    #[tokio::test]
    async fn test_ledger_rejection_maps_to_ledger_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": "1",
                "error": {"code": -32000, "message": "insufficient balance"},
            })))
            .mount(&server)
            .await;

        let ledger = backend(&server, Arc::new(MemoryContentStore::new()));
        let err = ledger.balance("asset-77").await.unwrap_err();
        assert!(matches!(err, MintError::Ledger(_)));
        assert!(err.to_string().contains("insufficient balance"));
    }
}
