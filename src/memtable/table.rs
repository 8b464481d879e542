//! MemTable implementation

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::keyrange::is_empty_range;

use super::MemTableEntry;

/// Fixed per-entry overhead counted toward the size estimate
const ENTRY_OVERHEAD: usize = 16;

/// In-memory table for recent writes
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, MemTableEntry>>,
    /// Approximate size in bytes (keys + values + overhead)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get the entry for a key, tombstones included
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        self.insert(key, MemTableEntry::Value(value))
    }

    /// Record a tombstone for a key, returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        self.insert(key, MemTableEntry::Tombstone)
    }

    fn insert(&self, key: Vec<u8>, entry: MemTableEntry) -> usize {
        let added = entry_size(&key, &entry);
        let mut data = self.data.write();

        let removed = data
            .get(key.as_slice())
            .map(|old| entry_size(&key, old))
            .unwrap_or(0);
        data.insert(key, entry);

        // Only mutated under the write lock
        let new_size = self.size.load(Ordering::SeqCst) + added - removed;
        self.size.store(new_size, Ordering::SeqCst);
        new_size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot every entry in sorted key order (for flush)
    pub fn iter(&self) -> MemTableIterator {
        self.range(Bound::Unbounded, Bound::Unbounded)
    }

    /// Snapshot the entries within a key range, tombstones included
    ///
    /// The snapshot is taken under the read lock and owned by the iterator,
    /// so later writes don't affect an in-flight scan.
    pub fn range(&self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> MemTableIterator {
        if is_empty_range(&start, &end) {
            return MemTableIterator {
                entries: Vec::new().into_iter(),
            };
        }

        let data = self.data.read();
        let entries: Vec<(Vec<u8>, MemTableEntry)> = data
            .range::<[u8], _>((start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        MemTableIterator {
            entries: entries.into_iter(),
        }
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::SeqCst);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_size(key: &[u8], entry: &MemTableEntry) -> usize {
    let value_len = match entry {
        MemTableEntry::Value(v) => v.len(),
        MemTableEntry::Tombstone => 0,
    };
    key.len() + value_len + ENTRY_OVERHEAD
}

/// Iterator over a snapshot of MemTable entries
pub struct MemTableIterator {
    entries: std::vec::IntoIter<(Vec<u8>, MemTableEntry)>,
}

impl Iterator for MemTableIterator {
    type Item = (Vec<u8>, MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}
