//! Local registry of wallets and issued assets.
//!
//! Layout under the registry root:
//!
//! ```text
//! registry/
//! ├── index.json            {activeWallet, wallets}
//! ├── wallets/<name>.json
//! └── assets/<wallet>/<symbol>.json
//! ```
//!
//! One file per record, so concurrent writes to different assets never
//! contend on the same file. An in-process reservation table closes the
//! window between the existence check and the persisted record.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{MintError, Result};
use crate::ledger::Platform;
use crate::metadata::AssetMetadata;

/// A wallet reference. Persists indefinitely once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub name: String,
    /// Opaque reference into the external signing capability
    pub signer_ref: String,
    pub created_at: DateTime<Utc>,
}

impl WalletRecord {
    /// Create a record stamped now.
    pub fn new(name: impl Into<String>, signer_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signer_ref: signer_ref.into(),
            created_at: Utc::now(),
        }
    }
}

/// An issued asset. Unique per `(wallet, symbol)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub symbol: String,
    pub identity: String,
    pub platform: Platform,
    pub issued_at: DateTime<Utc>,
    pub explorer_url: String,
    /// Metadata as last submitted, kept for update merges
    pub metadata: Option<AssetMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryIndex {
    active_wallet: Option<String>,
    wallets: Vec<String>,
}

/// The outcome of a reservation attempt.
#[derive(Debug)]
pub enum ReserveOutcome {
    /// The pair is claimed; issue, persist, then drop the guard
    Reserved(Reservation),
    /// A record already exists; no new submission must happen
    Existing(AssetRecord),
}

/// Claim on a `(wallet, symbol)` pair, released on drop.
///
/// Held across the broadcast so a concurrent orchestration of the same
/// pair cannot pass its own existence check first.
#[derive(Debug)]
pub struct Reservation {
    key: String,
    table: Arc<DashMap<String, ()>>,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.table.remove(&self.key);
    }
}

/// File-backed registry of wallets and issued assets.
pub struct LocalRegistry {
    root: PathBuf,
    reservations: Arc<DashMap<String, ()>>,
}

impl LocalRegistry {
    /// Open a registry rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reservations: Arc::new(DashMap::new()),
        }
    }

    /// Open the registry at the default platform location.
    pub fn open_default() -> Self {
        Self::new(crate::config::default_registry_dir())
    }

    /// The registry root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn wallet_path(&self, name: &str) -> PathBuf {
        self.root.join("wallets").join(format!("{name}.json"))
    }

    fn asset_path(&self, wallet: &str, symbol: &str) -> PathBuf {
        self.root
            .join("assets")
            .join(wallet)
            .join(format!("{}.json", symbol.to_ascii_uppercase()))
    }

    async fn read_index(&self) -> Result<RegistryIndex> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RegistryIndex::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, index: &RegistryIndex) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.index_path(), serde_json::to_vec_pretty(index)?).await?;
        Ok(())
    }

    /// Persist a wallet. The first wallet recorded becomes active.
    pub async fn record_wallet(&self, record: &WalletRecord) -> Result<()> {
        let path = self.wallet_path(&record.name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec_pretty(record)?).await?;

        let mut index = self.read_index().await?;
        if !index.wallets.contains(&record.name) {
            index.wallets.push(record.name.clone());
        }
        if index.active_wallet.is_none() {
            index.active_wallet = Some(record.name.clone());
        }
        self.write_index(&index).await?;

        debug!(wallet = %record.name, "Recorded wallet");
        Ok(())
    }

    /// The currently active wallet, if any is recorded.
    pub async fn get_active_wallet(&self) -> Result<Option<WalletRecord>> {
        let index = self.read_index().await?;
        match index.active_wallet {
            Some(name) => Ok(Some(self.get_wallet(&name).await?)),
            None => Ok(None),
        }
    }

    /// Look up a wallet by name.
    pub async fn get_wallet(&self, name: &str) -> Result<WalletRecord> {
        match tokio::fs::read(self.wallet_path(name)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MintError::NotFound(format!("wallet {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make a recorded wallet the active one.
    pub async fn set_active_wallet(&self, name: &str) -> Result<()> {
        self.get_wallet(name).await?;
        let mut index = self.read_index().await?;
        index.active_wallet = Some(name.to_string());
        self.write_index(&index).await
    }

    /// Names of all recorded wallets.
    pub async fn list_wallets(&self) -> Result<Vec<String>> {
        Ok(self.read_index().await?.wallets)
    }

    /// Persist an issued asset.
    pub async fn record_asset(&self, wallet: &str, record: &AssetRecord) -> Result<()> {
        let path = self.asset_path(wallet, &record.symbol);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec_pretty(record)?).await?;
        debug!(wallet = %wallet, symbol = %record.symbol, "Recorded asset");
        Ok(())
    }

    /// The read side of the idempotency check.
    pub async fn find_asset(&self, wallet: &str, symbol: &str) -> Result<Option<AssetRecord>> {
        match tokio::fs::read(self.asset_path(wallet, symbol)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All assets issued under a wallet.
    pub async fn list_assets(&self, wallet: &str) -> Result<Vec<AssetRecord>> {
        let dir = self.root.join("assets").join(wallet);
        let mut records = Vec::new();

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                let bytes = tokio::fs::read(entry.path()).await?;
                records.push(serde_json::from_slice(&bytes)?);
            }
        }
        records.sort_by(|a: &AssetRecord, b: &AssetRecord| a.symbol.cmp(&b.symbol));
        Ok(records)
    }

    /// Remove an asset record.
    pub async fn remove_asset(&self, wallet: &str, symbol: &str) -> Result<()> {
        match tokio::fs::remove_file(self.asset_path(wallet, symbol)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MintError::NotFound(
                format!("asset {symbol} under wallet {wallet}"),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically claim `(wallet, symbol)` for issuance.
    ///
    /// The claim is taken before the disk check, so two concurrent
    /// orchestrations of the same pair cannot both pass: the second one
    /// fails with a transient error and can be retried once the first
    /// outcome is on disk.
    pub async fn try_reserve(&self, wallet: &str, symbol: &str) -> Result<ReserveOutcome> {
        let key = format!("{wallet}/{}", symbol.to_ascii_uppercase());

        {
            use dashmap::mapref::entry::Entry;
            match self.reservations.entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(MintError::Transient(format!(
                        "issuance already in flight for {key}"
                    )));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(());
                }
            }
        }

        let reservation = Reservation {
            key,
            table: Arc::clone(&self.reservations),
        };

        // Disk check runs after the claim; a record written by an earlier
        // run wins and the claim is released on drop.
        match self.find_asset(wallet, symbol).await {
            Ok(Some(record)) => Ok(ReserveOutcome::Existing(record)),
            Ok(None) => Ok(ReserveOutcome::Reserved(reservation)),
            Err(e) => Err(e),
        }
    }
}
