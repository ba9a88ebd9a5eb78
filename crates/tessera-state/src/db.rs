use serde::{Deserialize, Serialize};
use std::path::Path;

use tessera_core::error::TesseraError;
use tessera_core::transaction::Transaction;
use tessera_core::types::{Day, TxId};

use crate::protocol::{ApplyOutcome, ProtocolState};

const SNAPSHOT_KEY: &[u8] = b"current";

/// An applied transaction as stored in the `transactions` tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub tx: Transaction,
    pub day: Day,
    pub outcome: ApplyOutcome,
}

/// Persistent state database backed by sled.
///
/// Named trees:
///   state         — "current"    → bincode(ProtocolState)
///   transactions  — TxId bytes   → bincode(TxRecord)
///   meta          — utf8 key     → raw bytes
pub struct StateDb {
    _db: sled::Db,
    state: sled::Tree,
    transactions: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TesseraError> {
        let db = sled::open(path).map_err(|e| TesseraError::Storage(e.to_string()))?;
        let state        = db.open_tree("state").map_err(|e| TesseraError::Storage(e.to_string()))?;
        let transactions = db.open_tree("transactions").map_err(|e| TesseraError::Storage(e.to_string()))?;
        let meta         = db.open_tree("meta").map_err(|e| TesseraError::Storage(e.to_string()))?;
        Ok(Self { _db: db, state, transactions, meta })
    }

    // ── State snapshot ───────────────────────────────────────────────────────

    pub fn get_state(&self) -> Result<Option<ProtocolState>, TesseraError> {
        match self.state.get(SNAPSHOT_KEY).map_err(|e| TesseraError::Storage(e.to_string()))? {
            Some(bytes) => {
                let st = bincode::deserialize(&bytes)
                    .map_err(|e| TesseraError::Serialization(e.to_string()))?;
                Ok(Some(st))
            }
            None => Ok(None),
        }
    }

    pub fn put_state(&self, state: &ProtocolState) -> Result<(), TesseraError> {
        let bytes = bincode::serialize(state)
            .map_err(|e| TesseraError::Serialization(e.to_string()))?;
        self.state
            .insert(SNAPSHOT_KEY, bytes)
            .map_err(|e| TesseraError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Transactions ─────────────────────────────────────────────────────────

    pub fn get_transaction(&self, tx_id: &TxId) -> Result<Option<TxRecord>, TesseraError> {
        match self.transactions.get(tx_id.as_bytes()).map_err(|e| TesseraError::Storage(e.to_string()))? {
            Some(bytes) => {
                let rec = bincode::deserialize(&bytes)
                    .map_err(|e| TesseraError::Serialization(e.to_string()))?;
                Ok(Some(rec))
            }
            None => Ok(None),
        }
    }

    pub fn put_transaction(&self, record: &TxRecord) -> Result<(), TesseraError> {
        let bytes = bincode::serialize(record)
            .map_err(|e| TesseraError::Serialization(e.to_string()))?;
        self.transactions
            .insert(record.tx.tx_id.as_bytes(), bytes)
            .map_err(|e| TesseraError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn transaction_exists(&self, tx_id: &TxId) -> bool {
        self.transactions.contains_key(tx_id.as_bytes()).unwrap_or(false)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), TesseraError> {
        self.meta
            .insert(key.as_bytes(), value)
            .map_err(|e| TesseraError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, TesseraError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| TesseraError::Storage(e.to_string()))
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), TesseraError> {
        self._db.flush().map_err(|e| TesseraError::Storage(e.to_string()))?;
        Ok(())
    }
}
