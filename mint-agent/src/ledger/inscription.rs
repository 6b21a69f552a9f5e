//! Inscription-model ledger backend.
//!
//! Artifact and metadata are embedded directly in the transaction
//! envelope. Inscriptions are immutable, so updates and trading are
//! unsupported.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::config::InscriptionConfig;
use crate::error::{MintError, Result};
use crate::ledger::{
    rpc_call, IssuanceReceipt, IssueOptions, LedgerAsset, LedgerBackend, Platform, TradeReceipt,
};
use crate::metadata::AssetMetadata;
use crate::signer::Signer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InscribeResult {
    inscription_id: String,
    txid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InscriptionLookup {
    inscription_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressBalance {
    sats: u64,
}

/// Backend for an inscription-model ledger.
pub struct InscriptionLedger {
    client: Client,
    rpc_url: String,
    explorer_base: String,
    fee_rate: u64,
    signer: Arc<dyn Signer>,
}

impl InscriptionLedger {
    /// Create a backend from config and a signer.
    pub fn new(config: &InscriptionConfig, signer: Arc<dyn Signer>) -> Self {
        Self {
            client: Client::new(),
            rpc_url: config.rpc_url.clone(),
            explorer_base: config.explorer_base.clone(),
            fee_rate: config.fee_rate,
            signer,
        }
    }

    fn explorer_url(&self, inscription_id: &str) -> String {
        format!("{}/inscription/{}", self.explorer_base, inscription_id)
    }
}

#[async_trait]
impl LedgerBackend for InscriptionLedger {
    fn platform(&self) -> Platform {
        Platform::Inscription
    }

    fn supports_updates(&self) -> bool {
        false
    }

    async fn issue(
        &self,
        metadata: &AssetMetadata,
        artifact: &[u8],
        options: &IssueOptions,
    ) -> Result<IssuanceReceipt> {
        // The whole asset travels inline: artifact bytes plus the
        // metadata document in one envelope.
        let envelope = serde_json::json!({
            "contentType": options.content_type,
            "payload": base64::engine::general_purpose::STANDARD.encode(artifact),
            "metadata": serde_json::to_value(metadata)?,
        });

        let params = serde_json::json!({
            "envelope": envelope,
            "feeRate": self.fee_rate,
            "address": self.signer.reference(),
        });
        let signature = hex::encode(self.signer.sign(&serde_json::to_vec(&params)?).await?);
        let mut params = params;
        params["signature"] = serde_json::Value::String(signature);

        let inscribed: InscribeResult = serde_json::from_value(
            rpc_call(&self.client, &self.rpc_url, "inscribe", params).await?,
        )?;

        info!(
            symbol = %metadata.symbol,
            inscription_id = %inscribed.inscription_id,
            "Inscribed asset"
        );

        Ok(IssuanceReceipt {
            explorer_url: self.explorer_url(&inscribed.inscription_id),
            identity: inscribed.inscription_id,
            tx_ref: inscribed.txid,
        })
    }

    async fn update(&self, identity: &str, _metadata: &AssetMetadata) -> Result<IssuanceReceipt> {
        Err(MintError::Unsupported(format!(
            "inscription {identity} is immutable once broadcast"
        )))
    }

    async fn find_asset(&self, symbol: &str) -> Result<Option<LedgerAsset>> {
        let result = rpc_call(
            &self.client,
            &self.rpc_url,
            "inscription_by_symbol",
            serde_json::json!({
                "symbol": symbol,
                "address": self.signer.reference(),
            }),
        )
        .await?;

        if result.is_null() {
            return Ok(None);
        }
        let lookup: InscriptionLookup = serde_json::from_value(result)?;
        Ok(Some(LedgerAsset {
            symbol: symbol.to_string(),
            explorer_url: self.explorer_url(&lookup.inscription_id),
            identity: lookup.inscription_id,
            metadata_uri: None,
        }))
    }

    async fn balance(&self, _identity: &str) -> Result<u64> {
        let balance: AddressBalance = serde_json::from_value(
            rpc_call(
                &self.client,
                &self.rpc_url,
                "address_balance",
                serde_json::json!({ "address": self.signer.reference() }),
            )
            .await?,
        )?;
        Ok(balance.sats)
    }

    async fn buy(&self, _identity: &str, _amount_in: u64) -> Result<TradeReceipt> {
        Err(MintError::Unsupported(
            "inscription platform does not support trading".to_string(),
        ))
    }
}
