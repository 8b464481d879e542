//! Storage Manager Tests
//!
//! Tests verify:
//! - Table discovery and id sequencing across restarts
//! - Newest table wins on lookups, tombstones hide older values
//! - Compaction keeps the newest version of every key

use std::fs;

use flowkv::memtable::MemTable;
use flowkv::storage::StorageManager;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn memtable(puts: &[(&str, &str)], deletes: &[&str]) -> MemTable {
    let memtable = MemTable::new();
    for (k, v) in puts {
        memtable.put(k.as_bytes().to_vec(), v.as_bytes().to_vec());
    }
    for k in deletes {
        memtable.delete(k.as_bytes().to_vec());
    }
    memtable
}

fn get(storage: &StorageManager, key: &str) -> Option<String> {
    storage
        .get(key.as_bytes())
        .unwrap()
        .map(|v| String::from_utf8(v).unwrap())
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("sstables");

    let storage = StorageManager::open(&dir).unwrap();

    assert!(dir.is_dir());
    assert_eq!(storage.sstable_count(), 0);
    assert_eq!(storage.next_sstable_id(), 1);
}

#[test]
fn test_ignores_non_sstable_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.txt"), b"hello").unwrap();
    fs::write(temp.path().join("sstable_000009.tmp"), b"partial").unwrap();

    let storage = StorageManager::open(temp.path()).unwrap();

    assert_eq!(storage.sstable_count(), 0);
}

#[test]
fn test_flush_empty_memtable_fails() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    assert!(storage.flush(&MemTable::new()).is_err());
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_newer_table_wins() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    storage
        .flush(&memtable(&[("/a", "old"), ("/b", "keep"), ("/c", "doomed")], &[]))
        .unwrap();
    storage
        .flush(&memtable(&[("/a", "new")], &["/c"]))
        .unwrap();

    assert_eq!(get(&storage, "/a").as_deref(), Some("new"));
    assert_eq!(get(&storage, "/b").as_deref(), Some("keep"));
    assert_eq!(get(&storage, "/c"), None);
    assert_eq!(get(&storage, "/zzz"), None);
}

#[test]
fn test_persistence_across_restart() {
    let temp = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(temp.path()).unwrap();
        storage.flush(&memtable(&[("/a", "1")], &[])).unwrap();
        storage.flush(&memtable(&[("/a", "2")], &[])).unwrap();
    }

    let storage = StorageManager::open(temp.path()).unwrap();

    assert_eq!(storage.sstable_count(), 2);
    assert_eq!(storage.next_sstable_id(), 3);
    assert_eq!(get(&storage, "/a").as_deref(), Some("2"));
}

#[test]
fn test_snapshot_is_newest_first() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();
    storage.flush(&memtable(&[("/first", "1")], &[])).unwrap();
    storage.flush(&memtable(&[("/second", "2")], &[])).unwrap();

    let snapshot = storage.snapshot();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].min_key(), Some(&b"/second"[..]));
    assert_eq!(snapshot[1].min_key(), Some(&b"/first"[..]));
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_merges_into_one_table() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();
    storage
        .flush(&memtable(&[("/a", "1"), ("/b", "1"), ("/c", "1")], &[]))
        .unwrap();
    storage
        .flush(&memtable(&[("/a", "2")], &["/b"]))
        .unwrap();

    let merged = storage.compact().unwrap().unwrap();

    assert_eq!(storage.sstable_count(), 1);
    // Shadowed versions are gone, the tombstone is kept
    assert_eq!(merged.entry_count(), 3);
    assert_eq!(get(&storage, "/a").as_deref(), Some("2"));
    assert_eq!(get(&storage, "/b"), None);
    assert_eq!(get(&storage, "/c").as_deref(), Some("1"));

    let sst_files = fs::read_dir(temp.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .map_or(false, |ext| ext == "sst")
        })
        .count();
    assert_eq!(sst_files, 1);
}

#[test]
fn test_compact_needs_two_tables() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();
    assert!(storage.compact().unwrap().is_none());

    storage.flush(&memtable(&[("/a", "1")], &[])).unwrap();
    assert!(storage.compact().unwrap().is_none());
}

#[test]
fn test_compacted_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(temp.path()).unwrap();
        storage.flush(&memtable(&[("/a", "1"), ("/b", "1")], &[])).unwrap();
        storage.flush(&memtable(&[], &["/a"])).unwrap();
        storage.compact().unwrap();
        // A table flushed after compaction must still win
        storage.flush(&memtable(&[("/b", "2")], &[])).unwrap();
    }

    let storage = StorageManager::open(temp.path()).unwrap();
    assert_eq!(storage.sstable_count(), 2);
    assert_eq!(get(&storage, "/a"), None);
    assert_eq!(get(&storage, "/b").as_deref(), Some("2"));
}
