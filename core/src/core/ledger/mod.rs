//! Ledger of provisionally pinned content.
//!
//! One redb table, `pin_ledger`, maps each tracked content hash to the time
//! it was first admitted. All changes of a reconciliation run go through a
//! single [`LedgerTxn`] so they become durable together or not at all.

use crate::core::ledger::error::DatabaseError;
use crate::types::record::VersionedRecord;
use crate::types::{ContentHash, LedgerConfig, PinRecord};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::SystemTime;

pub mod error {
    use crate::types::ContentHash;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DatabaseError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        TableError(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        StorageError(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        TransactionError(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        CommitError(#[from] redb::CommitError),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("{hash} is already in the ledger with a different first-seen time")]
        DuplicateInsert { hash: ContentHash },
    }

    impl DatabaseError {
        /// True when another handle (usually another pinner process) holds
        /// the ledger file.
        pub fn is_already_open(&self) -> bool {
            matches!(
                self,
                DatabaseError::Redb(redb::DatabaseError::DatabaseAlreadyOpen)
            )
        }
    }
}

/// Content hash → first-seen record.
const PIN_LEDGER: TableDefinition<ContentHash, VersionedRecord> =
    TableDefinition::new("pin_ledger");

pub struct Ledger {
    db: redb::Database,
}

impl Ledger {
    /// Creates or opens the ledger file. redb locks the file for as long as
    /// the returned handle lives.
    pub fn open(config: LedgerConfig) -> Result<Self, DatabaseError> {
        if let Some(parent) = config.ledger_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = redb::Database::create(&config.ledger_path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PIN_LEDGER)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

/// Read operations.
impl Ledger {
    /// Returns every tracked hash with its first-seen time.
    pub fn read_all(&self) -> Result<HashMap<ContentHash, SystemTime>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PIN_LEDGER)?;
        let mut entries = HashMap::new();

        for entry in table.iter()? {
            let (hash, record) = entry?;
            entries.insert(hash.value(), record.value().into_latest().first_seen_at);
        }

        Ok(entries)
    }

    pub fn get(&self, hash: &ContentHash) -> Result<Option<SystemTime>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PIN_LEDGER)?;

        Ok(table
            .get(hash)?
            .map(|guard| guard.value().into_latest().first_seen_at))
    }
}

/// Write operations.
impl Ledger {
    /// Starts a write transaction. Nothing is visible to readers until
    /// [`LedgerTxn::commit`]; dropping the transaction discards it.
    pub fn begin(&mut self) -> Result<LedgerTxn<'_>, DatabaseError> {
        Ok(LedgerTxn {
            txn: self.db.begin_write()?,
            _ledger: PhantomData,
        })
    }

    /// Admits a single hash in its own transaction.
    pub fn upsert(
        &mut self,
        hash: &ContentHash,
        first_seen_at: SystemTime,
    ) -> Result<(), DatabaseError> {
        let txn = self.begin()?;
        txn.upsert(hash, first_seen_at)?;
        txn.commit()
    }

    /// Removes a single hash in its own transaction.
    ///
    /// Returns `true` if the hash was present.
    pub fn remove(&mut self, hash: &ContentHash) -> Result<bool, DatabaseError> {
        let txn = self.begin()?;
        let removed = txn.remove(hash)?;
        txn.commit()?;
        Ok(removed)
    }
}

/// A pending set of ledger changes.
pub struct LedgerTxn<'a> {
    txn: redb::WriteTransaction,
    _ledger: PhantomData<&'a mut Ledger>,
}

impl LedgerTxn<'_> {
    /// Inserts `hash` with `first_seen_at`.
    ///
    /// A no-op if the hash is already present with the same time.
    /// Returns `Err(DuplicateInsert)` if it is present with another time.
    pub fn upsert(&self, hash: &ContentHash, first_seen_at: SystemTime) -> Result<(), DatabaseError> {
        let mut table = self.txn.open_table(PIN_LEDGER)?;

        let existing = table
            .get(hash)?
            .map(|guard| guard.value().into_latest().first_seen_at);

        match existing {
            Some(existing) if existing == first_seen_at => Ok(()),
            Some(_) => Err(DatabaseError::DuplicateInsert { hash: hash.clone() }),
            None => {
                table.insert(hash, &VersionedRecord::from(PinRecord { first_seen_at }))?;
                Ok(())
            }
        }
    }

    /// Returns `true` if the hash was present.
    pub fn remove(&self, hash: &ContentHash) -> Result<bool, DatabaseError> {
        let mut table = self.txn.open_table(PIN_LEDGER)?;
        Ok(table.remove(hash)?.is_some())
    }

    pub fn commit(self) -> Result<(), DatabaseError> {
        self.txn.commit()?;
        Ok(())
    }

    pub fn abort(self) -> Result<(), DatabaseError> {
        self.txn.abort()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
