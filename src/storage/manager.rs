//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Hand out reader snapshots for range scans
//! - Merge tables during compaction

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{FlowError, Result};
use crate::memtable::MemTable;

use super::merge::{EntrySource, MergeIterator};
use super::{SSTable, SSTableBuilder, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: RwLock over shared readers; lookups and snapshots take the
///   read side, flush and compaction take the write side briefly
/// - `next_sstable_id`: atomic counter
pub struct StorageManager {
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<Arc<SSTableReader>>>,

    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    sstable_ids.push(id);
                }
            }
        }

        // Newest first
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for id in &sstable_ids {
            let reader = SSTableReader::open(&Self::sstable_path_with_dir(path, *id))?;
            sstables.push(Arc::new(reader));
        }

        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);
        tracing::debug!(
            "Storage at {} opened with {} SSTables",
            path.display(),
            sstables.len()
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key not found, or found tombstone (deleted)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(entry) = reader.get(key)? {
                return Ok(entry.into_value());
            }
        }

        Ok(None)
    }

    /// Flush a MemTable to a new SSTable
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(FlowError::Storage("Cannot flush empty MemTable".to_string()));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, entry) in memtable.iter() {
            builder.add_entry(&key, &entry)?;
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, Arc::new(reader));

        tracing::debug!(
            "Flushed {} entries to {}",
            metadata.entry_count,
            path.display()
        );
        Ok(metadata)
    }

    /// Current readers, newest first
    ///
    /// The snapshot stays valid while flushes and compactions swap the
    /// manager's list underneath it.
    pub fn snapshot(&self) -> Vec<Arc<SSTableReader>> {
        self.sstables.read().clone()
    }

    /// Merge every SSTable into one
    ///
    /// Shadowed versions are discarded. Tombstones are kept: if the process
    /// dies before the old files are removed, they must still hide the older
    /// values on the next open. Returns `None` when there was nothing to merge.
    pub fn compact(&self) -> Result<Option<SSTable>> {
        let inputs = self.snapshot();
        if inputs.len() < 2 {
            return Ok(None);
        }

        // Allocated before merging so the result sorts older than any table
        // flushed meanwhile
        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut sources: Vec<EntrySource> = Vec::with_capacity(inputs.len());
        for reader in &inputs {
            sources.push(Box::new(reader.iter()?));
        }

        let mut builder = SSTableBuilder::new(&path)?;
        for item in MergeIterator::new(sources) {
            let (key, entry) = item?;
            builder.add_entry(&key, &entry)?;
        }
        let metadata = builder.finish()?;
        let merged = Arc::new(SSTableReader::open(&path)?);

        let replaced: HashSet<PathBuf> = inputs.iter().map(|r| r.path().to_path_buf()).collect();
        {
            let mut sstables = self.sstables.write();
            sstables.retain(|r| !replaced.contains(r.path()));
            sstables.push(merged);
        }

        for old in &replaced {
            if let Err(e) = fs::remove_file(old) {
                tracing::warn!("Could not remove compacted SSTable {}: {}", old.display(), e);
            }
        }

        tracing::info!(
            "Compacted {} SSTables into {} ({} entries)",
            replaced.len(),
            path.display(),
            metadata.entry_count
        );
        Ok(Some(metadata))
    }

    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        name.strip_prefix("sstable_")?.parse().ok()
    }
}
