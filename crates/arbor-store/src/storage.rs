use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::durable::{FileLedger, FileRootStore};
use crate::error::StoreResult;
use crate::memory::{InMemoryLedger, InMemoryRootStore};
use crate::traits::{LedgerReader, LedgerWriter, RootReader, RootWriter};
use crate::wal::{SyncMode, WalConfig};

const LEDGER_FILE: &str = "commitments.wal";
const ROOTS_FILE: &str = "roots.wal";

/// `[storage]` configuration section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the ledger and root logs.
    pub data_dir: PathBuf,
    pub sync_mode: SyncMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_mode: SyncMode::EveryWrite,
        }
    }
}

/// Handles to both tables, split at the reader/writer boundary.
///
/// Writers go to the ingestion cycle and publisher; readers go to the query
/// surface. Every handle in one `Storage` points at the same backend.
#[derive(Clone)]
pub struct Storage {
    pub ledger: Arc<dyn LedgerReader>,
    pub ledger_writer: Arc<dyn LedgerWriter>,
    pub roots: Arc<dyn RootReader>,
    pub root_writer: Arc<dyn RootWriter>,
}

impl Storage {
    /// Volatile storage; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryRootStore::new()),
        )
    }

    /// Open (or create) the file-backed tables under `config.data_dir`.
    pub fn open(config: &StorageConfig) -> StoreResult<Self> {
        let wal = WalConfig {
            sync_mode: config.sync_mode,
        };
        let ledger = FileLedger::open(&config.data_dir.join(LEDGER_FILE), wal.clone())?;
        let roots = FileRootStore::open(&config.data_dir.join(ROOTS_FILE), wal)?;
        Ok(Self::from_parts(Arc::new(ledger), Arc::new(roots)))
    }

    pub fn from_parts<L, R>(ledger: Arc<L>, roots: Arc<R>) -> Self
    where
        L: LedgerReader + LedgerWriter + 'static,
        R: RootReader + RootWriter + 'static,
    {
        Self {
            ledger: ledger.clone(),
            ledger_writer: ledger,
            roots: roots.clone(),
            root_writer: roots,
        }
    }
}
