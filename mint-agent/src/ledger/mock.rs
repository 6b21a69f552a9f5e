//! Mock ledger backend for testing.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::error::{MintError, Result};
use crate::ledger::{
    validate_percentage, IssuanceReceipt, IssueOptions, LedgerAsset, LedgerBackend, Platform,
    TradeReceipt,
};
use crate::metadata::AssetMetadata;

/// Mock backend with configurable behavior and atomic call counters.
pub struct MockLedger {
    platform: Platform,
    supports_updates: bool,
    supports_trading: bool,
    fail_issues: AtomicU32,
    fail_fatally: bool,
    assets: DashMap<String, LedgerAsset>,
    holdings: AtomicU64,
    issue_calls: AtomicU32,
    update_calls: AtomicU32,
    trade_calls: AtomicU32,
}

impl MockLedger {
    /// Create a mock for the given platform with updates and trading
    /// enabled.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            supports_updates: true,
            supports_trading: true,
            fail_issues: AtomicU32::new(0),
            fail_fatally: false,
            assets: DashMap::new(),
            holdings: AtomicU64::new(0),
            issue_calls: AtomicU32::new(0),
            update_calls: AtomicU32::new(0),
            trade_calls: AtomicU32::new(0),
        }
    }

    /// Disable metadata updates, as on an immutable platform.
    pub fn without_updates(mut self) -> Self {
        self.supports_updates = false;
        self
    }

    /// Disable trading.
    pub fn without_trading(mut self) -> Self {
        self.supports_trading = false;
        self
    }

    /// Fail this many issue calls transiently before succeeding.
    pub fn with_transient_issue_failures(self, times: u32) -> Self {
        self.fail_issues.store(times, Ordering::SeqCst);
        self
    }

    /// Fail every issue call with a non-transient ledger error.
    pub fn with_fatal_issue_failure(mut self) -> Self {
        self.fail_fatally = true;
        self
    }

    /// Pre-populate an asset, as if issued in an earlier run.
    pub fn with_existing_asset(self, asset: LedgerAsset) -> Self {
        self.assets.insert(asset.symbol.clone(), asset);
        self
    }

    /// Starting token holdings for trade tests.
    pub fn with_holdings(self, units: u64) -> Self {
        self.holdings.store(units, Ordering::SeqCst);
        self
    }

    /// Number of issue submissions performed.
    pub fn issue_calls(&self) -> u32 {
        self.issue_calls.load(Ordering::SeqCst)
    }

    /// Number of update submissions performed.
    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Number of trade submissions performed.
    pub fn trade_calls(&self) -> u32 {
        self.trade_calls.load(Ordering::SeqCst)
    }

    fn identity_for(&self, symbol: &str) -> String {
        format!("mock-{}-{}", self.platform, symbol.to_ascii_lowercase())
    }

    fn explorer_for(&self, identity: &str) -> String {
        format!("https://explorer.mock.example/{identity}")
    }
}

#[async_trait]
impl LedgerBackend for MockLedger {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn supports_updates(&self) -> bool {
        self.supports_updates
    }

    fn supports_trading(&self) -> bool {
        self.supports_trading
    }

    async fn issue(
        &self,
        metadata: &AssetMetadata,
        _artifact: &[u8],
        _options: &IssueOptions,
    ) -> Result<IssuanceReceipt> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_fatally {
            return Err(MintError::Ledger("mock submission rejected".to_string()));
        }
        let remaining = self.fail_issues.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_issues.store(remaining - 1, Ordering::SeqCst);
            return Err(MintError::Transient("mock broadcast timeout".to_string()));
        }

        let identity = self.identity_for(&metadata.symbol);
        let asset = LedgerAsset {
            symbol: metadata.symbol.clone(),
            identity: identity.clone(),
            metadata_uri: Some(format!("mock://{}", metadata.sequence_ref)),
            explorer_url: self.explorer_for(&identity),
        };
        self.assets.insert(metadata.symbol.clone(), asset);

        Ok(IssuanceReceipt {
            explorer_url: self.explorer_for(&identity),
            tx_ref: format!("mock-tx-{}", self.issue_calls()),
            identity,
        })
    }

    async fn update(&self, identity: &str, _metadata: &AssetMetadata) -> Result<IssuanceReceipt> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if !self.supports_updates {
            return Err(MintError::Unsupported(format!(
                "{} platform has immutable metadata",
                self.platform
            )));
        }

        Ok(IssuanceReceipt {
            identity: identity.to_string(),
            tx_ref: format!("mock-update-{}", self.update_calls()),
            explorer_url: self.explorer_for(identity),
        })
    }

    async fn find_asset(&self, symbol: &str) -> Result<Option<LedgerAsset>> {
        Ok(self.assets.get(symbol).map(|a| a.clone()))
    }

    async fn balance(&self, _identity: &str) -> Result<u64> {
        Ok(self.holdings.load(Ordering::SeqCst))
    }

    async fn buy(&self, identity: &str, amount_in: u64) -> Result<TradeReceipt> {
        if !self.supports_trading {
            return Err(MintError::Unsupported(format!(
                "{} platform does not support trading",
                self.platform
            )));
        }
        self.trade_calls.fetch_add(1, Ordering::SeqCst);

        // Flat curve: one native unit in, one token unit out.
        self.holdings.fetch_add(amount_in, Ordering::SeqCst);
        Ok(TradeReceipt {
            tx_ref: format!("mock-buy-{}", self.trade_calls()),
            units: amount_in,
            explorer_url: self.explorer_for(identity),
        })
    }

    async fn sell(&self, identity: &str, percentage: f32) -> Result<TradeReceipt> {
        if !self.supports_trading {
            return Err(MintError::Unsupported(format!(
                "{} platform does not support trading",
                self.platform
            )));
        }
        validate_percentage(percentage)?;
        self.trade_calls.fetch_add(1, Ordering::SeqCst);

        let held = self.holdings.load(Ordering::SeqCst);
        let units = (held as u128 * (percentage as f64 * 100.0).round() as u128 / 10_000) as u64;
        self.holdings.fetch_sub(units, Ordering::SeqCst);

        Ok(TradeReceipt {
            tx_ref: format!("mock-sell-{}", self.trade_calls()),
            units,
            explorer_url: self.explorer_for(identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AssetDetails, MetadataAssembler};
    use genome::Sequence;

    fn metadata(symbol: &str) -> AssetMetadata {
        MetadataAssembler::build(
            &Sequence::from_bases("ACGT"),
            "art.png",
            &[],
            &AssetDetails {
                name: "Specimen".into(),
                symbol: symbol.into(),
                description: "desc".into(),
                royalty_basis_points: 0,
                external_url: None,
                platform: Platform::Account,
            },
        )
    }

    #[tokio::test]
    async fn test_issue_then_find() {
        let ledger = MockLedger::new(Platform::Account);
        let receipt = ledger
            .issue(&metadata("SPEC"), b"png", &IssueOptions::default())
            .await
            .unwrap();

        let found = ledger.find_asset("SPEC").await.unwrap().unwrap();
        assert_eq!(found.identity, receipt.identity);
        assert_eq!(ledger.issue_calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_count_attempts() {
        let ledger = MockLedger::new(Platform::Account).with_transient_issue_failures(1);

        assert!(ledger
            .issue(&metadata("SPEC"), b"png", &IssueOptions::default())
            .await
            .is_err());
        assert!(ledger
            .issue(&metadata("SPEC"), b"png", &IssueOptions::default())
            .await
            .is_ok());
        assert_eq!(ledger.issue_calls(), 2);
    }

    #[tokio::test]
    async fn test_trade_moves_holdings() {
        let ledger = MockLedger::new(Platform::Account).with_holdings(1_000);

        ledger.buy("mock-id", 500).await.unwrap();
        assert_eq!(ledger.balance("mock-id").await.unwrap(), 1_500);

        let receipt = ledger.sell("mock-id", 50.0).await.unwrap();
        assert_eq!(receipt.units, 750);
        assert_eq!(ledger.balance("mock-id").await.unwrap(), 750);
    }
}
