//! Engine Module
//!
//! The raw byte-key storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when MemTable is full
//! - Merge MemTable and SSTables into ordered range scans
//! - Manage crash recovery on startup

use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{FlowError, Result};
use crate::keyrange::is_empty_range;
use crate::memtable::{MemTable, MemTableEntry};
use crate::storage::{EntrySource, MergeIterator, SSTable, StorageManager};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (put/delete/flush/compact): serialized by `write_lock`
///   (write_lock → WAL → memtable → storage)
/// - **Reads** (get/scan): no write_lock for point lookups; a scan holds it
///   while taking its snapshot and opening its table cursors, so it sees
///   memtable and tables from the same instant
pub struct Engine {
    config: Config,

    /// Directory for all data files (SSTables)
    storage_dir: PathBuf,

    /// Write-ahead log for durability
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Serializes write operations
    write_lock: Mutex<()>,
}

impl Engine {
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load existing SSTables
    /// 3. Replay the WAL, flush what it held, truncate it
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Put { key, value } => memtable.put(key, value),
                    Operation::Delete { key } => memtable.delete(key),
                };
            }

            // Recovered data goes to an SSTable before the log is cleared
            if !memtable.is_empty() {
                tracing::info!("Flushing {} recovered entries to SSTable", memtable.entry_count());
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        wal.truncate()?;

        tracing::debug!("Engine opened at {}", config.data_dir.display());

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with default settings in the given directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build()?)
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.memtable.get(key) {
            return Ok(entry.into_value());
        }
        self.storage.get(key)
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Delete a key (no-op for keys that don't exist, but still logged)
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.write(Operation::Delete { key: key.to_vec() })
    }

    fn write(&self, operation: Operation) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        // WAL first (durability guarantee)
        self.wal.lock().append(operation.clone())?;

        let new_size = match operation {
            Operation::Put { key, value } => self.memtable.put(key, value),
            Operation::Delete { key } => self.memtable.delete(key),
        };

        if new_size >= self.config.memtable_size_limit {
            self.flush_internal()?;
        }

        Ok(())
    }

    /// Ascending scan over `[start, end)`-style bounds
    ///
    /// The scan owns a snapshot of the MemTable range and of the SSTable
    /// list; writes made after this call returns are not visible to it.
    /// Deleted keys are skipped.
    pub fn scan(&self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> Result<Scan> {
        if is_empty_range(&start, &end) {
            return Ok(Scan {
                inner: MergeIterator::new(Vec::new()),
            });
        }

        // Open every cursor under the lock: compaction unlinks the tables it merges
        let _write_guard = self.write_lock.lock();
        let readers = self.storage.snapshot();
        let mut sources: Vec<EntrySource> = Vec::with_capacity(readers.len() + 1);
        sources.push(Box::new(self.memtable.range(start, end).map(Ok::<_, FlowError>)));
        for reader in &readers {
            sources.push(Box::new(reader.range(start, end)?));
        }

        Ok(Scan {
            inner: MergeIterator::new(sources),
        })
    }

    /// Flush memtable to disk
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable)?;
        self.memtable.clear();
        // Entries are now durable in the SSTable
        self.wal.lock().truncate()?;

        Ok(())
    }

    /// Flush, then merge all SSTables into one
    pub fn compact(&self) -> Result<Option<SSTable>> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()?;
        self.storage.compact()
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Where SSTables are stored
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Ordered scan over live entries, yielding `(key, raw value)`
///
/// Owns its file handles and memtable snapshot; dropping it early releases
/// them.
pub struct Scan {
    inner: MergeIterator,
}

impl Iterator for Scan {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok((key, MemTableEntry::Value(value))) => return Some(Ok((key, value))),
                Ok((_, MemTableEntry::Tombstone)) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
