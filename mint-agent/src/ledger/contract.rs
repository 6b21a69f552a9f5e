//! Contract-model ledger backend.
//!
//! Metadata lives in an external registry; the ledger holds a token
//! whose URI points at it. The token URI can be repointed, so metadata
//! updates are supported.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::config::ContractConfig;
use crate::error::{MintError, Result};
use crate::ledger::{
    rpc_call, IssuanceReceipt, IssueOptions, LedgerAsset, LedgerBackend, Platform,
};
use crate::metadata::AssetMetadata;
use crate::signer::Signer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryResponse {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintResult {
    token_id: u64,
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallResult {
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenLookup {
    token_id: u64,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountBalance {
    wei: u64,
}

/// Backend for a contract-model ledger.
pub struct ContractLedger {
    client: Client,
    rpc_url: String,
    registry_url: String,
    explorer_base: String,
    contract_address: String,
    signer: Arc<dyn Signer>,
}

impl ContractLedger {
    /// Create a backend from config and a signer.
    pub fn new(config: &ContractConfig, signer: Arc<dyn Signer>) -> Self {
        Self {
            client: Client::new(),
            rpc_url: config.rpc_url.clone(),
            registry_url: config.registry_url.clone(),
            explorer_base: config.explorer_base.clone(),
            contract_address: config.contract_address.clone(),
            signer,
        }
    }

    fn identity(&self, token_id: u64) -> String {
        format!("{}:{}", self.contract_address, token_id)
    }

    fn explorer_url(&self, token_id: u64) -> String {
        format!(
            "{}/token/{}/{}",
            self.explorer_base, self.contract_address, token_id
        )
    }

    /// Split a `contract:tokenId` identity back into its parts.
    fn token_id_of(&self, identity: &str) -> Result<u64> {
        identity
            .rsplit_once(':')
            .and_then(|(_, id)| id.parse().ok())
            .ok_or_else(|| MintError::Validation(format!("malformed token identity: {identity}")))
    }

    /// Publish a metadata document to the external registry.
    async fn register_metadata(&self, metadata: &AssetMetadata) -> Result<String> {
        let response = self
            .client
            .post(&self.registry_url)
            .json(metadata)
            .send()
            .await
            .map_err(|e| MintError::Transient(format!("registry upload: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                MintError::Transient(format!("registry HTTP {status}: {body}"))
            } else {
                MintError::Storage(format!("registry HTTP {status}: {body}"))
            });
        }

        let registered: RegistryResponse = response
            .json()
            .await
            .map_err(|e| MintError::Storage(format!("malformed registry response: {e}")))?;
        Ok(registered.uri)
    }

    async fn signed_call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let signature = hex::encode(self.signer.sign(&serde_json::to_vec(&params)?).await?);
        let mut params = params;
        params["signature"] = serde_json::Value::String(signature);
        rpc_call(&self.client, &self.rpc_url, method, params).await
    }
}

#[async_trait]
impl LedgerBackend for ContractLedger {
    fn platform(&self) -> Platform {
        Platform::Contract
    }

    fn supports_updates(&self) -> bool {
        true
    }

    async fn issue(
        &self,
        metadata: &AssetMetadata,
        _artifact: &[u8],
        _options: &IssueOptions,
    ) -> Result<IssuanceReceipt> {
        let token_uri = self.register_metadata(metadata).await?;

        let minted: MintResult = serde_json::from_value(
            self.signed_call(
                "contract_mint",
                serde_json::json!({
                    "contract": self.contract_address,
                    "to": self.signer.reference(),
                    "tokenUri": token_uri,
                    "symbol": metadata.symbol,
                }),
            )
            .await?,
        )?;

        info!(
            symbol = %metadata.symbol,
            token_id = minted.token_id,
            "Minted contract-model token"
        );

        Ok(IssuanceReceipt {
            identity: self.identity(minted.token_id),
            tx_ref: minted.tx_hash,
            explorer_url: self.explorer_url(minted.token_id),
        })
    }

    async fn update(&self, identity: &str, metadata: &AssetMetadata) -> Result<IssuanceReceipt> {
        let token_id = self.token_id_of(identity)?;
        let token_uri = self.register_metadata(metadata).await?;

        let called: CallResult = serde_json::from_value(
            self.signed_call(
                "contract_set_token_uri",
                serde_json::json!({
                    "contract": self.contract_address,
                    "tokenId": token_id,
                    "tokenUri": token_uri,
                }),
            )
            .await?,
        )?;

        Ok(IssuanceReceipt {
            identity: identity.to_string(),
            tx_ref: called.tx_hash,
            explorer_url: self.explorer_url(token_id),
        })
    }

    async fn find_asset(&self, symbol: &str) -> Result<Option<LedgerAsset>> {
        let result = rpc_call(
            &self.client,
            &self.rpc_url,
            "token_by_symbol",
            serde_json::json!({
                "contract": self.contract_address,
                "owner": self.signer.reference(),
                "symbol": symbol,
            }),
        )
        .await?;

        if result.is_null() {
            return Ok(None);
        }
        let lookup: TokenLookup = serde_json::from_value(result)?;
        Ok(Some(LedgerAsset {
            symbol: symbol.to_string(),
            identity: self.identity(lookup.token_id),
            metadata_uri: lookup.token_uri,
            explorer_url: self.explorer_url(lookup.token_id),
        }))
    }

    async fn balance(&self, _identity: &str) -> Result<u64> {
        let balance: AccountBalance = serde_json::from_value(
            rpc_call(
                &self.client,
                &self.rpc_url,
                "account_balance",
                serde_json::json!({ "address": self.signer.reference() }),
            )
            .await?,
        )?;
        Ok(balance.wei)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AssetDetails, MetadataAssembler};
    use crate::signer::DevSigner;
    use genome::Sequence;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(rpc: &MockServer, registry: &MockServer) -> ContractLedger {
        let config = ContractConfig {
            rpc_url: rpc.uri(),
            registry_url: format!("{}/registry", registry.uri()),
            contract_address: "0xabc".into(),
            ..Default::default()
        };
        ContractLedger::new(&config, Arc::new(DevSigner::new("0xwallet")))
    }

    fn metadata() -> AssetMetadata {
        MetadataAssembler::build(
            &Sequence::from_bases("ACGT"),
            "art.png",
            &[],
            &AssetDetails {
                name: "Specimen".into(),
                symbol: "SPEC".into(),
                description: "desc".into(),
                royalty_basis_points: 0,
                external_url: None,
                platform: Platform::Contract,
            },
        )
    }

    #[tokio::test]
    async fn test_issue_registers_then_mints() {
        let registry = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/registry"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "registry://doc-1",
            })))
            .mount(&registry)
            .await;

        let rpc = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "method": "contract_mint",
                "params": {"tokenUri": "registry://doc-1"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": "1",
                "result": {"tokenId": 42u64, "txHash": "0xdead"},
            })))
            .mount(&rpc)
            .await;

        let receipt = backend(&rpc, &registry)
            .issue(&metadata(), b"png", &IssueOptions::default())
            .await
            .unwrap();

        assert_eq!(receipt.identity, "0xabc:42");
        assert!(receipt.explorer_url.contains("token/0xabc/42"));
    }

    #[tokio::test]
    async fn test_update_repoints_token_uri() {
        let registry = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "registry://doc-2",
            })))
            .mount(&registry)
            .await;

        let rpc = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "method": "contract_set_token_uri",
                "params": {"tokenId": 42u64},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": "1",
                "result": {"txHash": "0xbeef"},
            })))
            .mount(&rpc)
            .await;

        let receipt = backend(&rpc, &registry)
            .update("0xabc:42", &metadata())
            .await
            .unwrap();
        assert_eq!(receipt.tx_ref, "0xbeef");
    }

    #[tokio::test]
    async fn test_malformed_identity_is_a_validation_error() {
        let registry = MockServer::start().await;
        let rpc = MockServer::start().await;

        let err = backend(&rpc, &registry)
            .update("not-an-identity", &metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, MintError::Validation(_)));
    }
}
