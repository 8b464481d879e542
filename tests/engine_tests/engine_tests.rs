//! Tests for Engine
//!
//! These tests verify:
//! - Basic get/put/delete operations
//! - Flushes to SSTable, automatic and manual
//! - Crash recovery from WAL
//! - Ordered scans merged across memtable and SSTables
//! - Compaction and concurrent access

use std::ops::Bound;
use std::sync::Arc;
use std::thread;

use flowkv::config::{Config, WalSyncStrategy};
use flowkv::engine::Engine;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config(dir: &TempDir, memtable_limit: usize) -> Config {
    Config::builder()
        .data_dir(dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite) // Sync every write for test reliability
        .memtable_size_limit(memtable_limit)
        .build()
        .unwrap()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config(&temp_dir, 1024 * 1024)).unwrap();
    (temp_dir, engine)
}

fn scan_all(engine: &Engine, start: &[u8], end: &[u8]) -> Vec<(String, String)> {
    engine
        .scan(Bound::Included(start), Bound::Excluded(end))
        .unwrap()
        .map(|item| {
            let (k, v) = item.unwrap();
            (String::from_utf8(k).unwrap(), String::from_utf8(v).unwrap())
        })
        .collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_layout() {
    let (temp_dir, engine) = setup_temp_engine();

    assert!(temp_dir.path().join("wal.log").exists());
    assert!(temp_dir.path().join("sstables").is_dir());
    assert_eq!(engine.storage_dir(), temp_dir.path().join("sstables"));
    assert_eq!(engine.data_dir(), temp_dir.path());
}

#[test]
fn test_engine_put_get_delete() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"/config/mode", b"auto").unwrap();
    assert_eq!(engine.get(b"/config/mode").unwrap(), Some(b"auto".to_vec()));

    engine.put(b"/config/mode", b"manual").unwrap();
    assert_eq!(engine.get(b"/config/mode").unwrap(), Some(b"manual".to_vec()));

    engine.delete(b"/config/mode").unwrap();
    assert_eq!(engine.get(b"/config/mode").unwrap(), None);

    // Deleting a missing key is fine
    engine.delete(b"/never/written").unwrap();
}

#[test]
fn test_engine_empty_key_and_binary_value() {
    let (_temp, engine) = setup_temp_engine();
    let binary = vec![0u8, 0xFF, 0x10, 0x00];

    engine.put(b"", b"root").unwrap();
    engine.put(b"/bin", &binary).unwrap();

    assert_eq!(engine.get(b"").unwrap(), Some(b"root".to_vec()));
    assert_eq!(engine.get(b"/bin").unwrap(), Some(binary));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_engine_manual_flush() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"/a", b"1").unwrap();

    engine.flush().unwrap();

    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.get(b"/a").unwrap(), Some(b"1".to_vec()));

    // Nothing to flush: no new table
    engine.flush().unwrap();
    assert_eq!(engine.sstable_count(), 1);
}

#[test]
fn test_engine_auto_flush_on_size_limit() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config(&temp_dir, 100)).unwrap();

    for i in 0..20 {
        engine
            .put(format!("/k/{:02}", i).as_bytes(), b"some value bytes")
            .unwrap();
    }

    assert!(engine.sstable_count() > 0);
    for i in 0..20 {
        assert!(engine.get(format!("/k/{:02}", i).as_bytes()).unwrap().is_some());
    }
}

// =============================================================================
// Crash Recovery Tests
// =============================================================================

#[test]
fn test_engine_recovery_from_wal() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open(config(&temp_dir, 1024 * 1024)).unwrap();
        engine.put(b"/a", b"1").unwrap();
        engine.put(b"/b", b"2").unwrap();
        engine.delete(b"/a").unwrap();
        // Dropped without close: only the WAL has the data
        assert_eq!(engine.sstable_count(), 0);
    }

    let engine = Engine::open(config(&temp_dir, 1024 * 1024)).unwrap();

    assert_eq!(engine.get(b"/a").unwrap(), None);
    assert_eq!(engine.get(b"/b").unwrap(), Some(b"2".to_vec()));
    // Replayed entries were flushed and the log cleared
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(
        std::fs::metadata(temp_dir.path().join("wal.log")).unwrap().len(),
        0
    );
}

#[test]
fn test_engine_close_then_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open(config(&temp_dir, 1024 * 1024)).unwrap();
        engine.put(b"/key", b"value").unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    assert_eq!(engine.get(b"/key").unwrap(), Some(b"value".to_vec()));
    assert_eq!(engine.sstable_count(), 1);
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_merges_memtable_and_tables() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"/a/1", b"old").unwrap();
    engine.put(b"/a/2", b"gone").unwrap();
    engine.put(b"/a/3", b"kept").unwrap();
    engine.flush().unwrap();

    engine.put(b"/a/1", b"new").unwrap();
    engine.delete(b"/a/2").unwrap();
    engine.flush().unwrap();

    engine.put(b"/a/0", b"fresh").unwrap();
    engine.put(b"/b/1", b"outside").unwrap();

    assert_eq!(
        scan_all(&engine, b"/a/", b"/a/\xFF"),
        vec![
            ("/a/0".to_string(), "fresh".to_string()),
            ("/a/1".to_string(), "new".to_string()),
            ("/a/3".to_string(), "kept".to_string()),
        ]
    );
}

#[test]
fn test_scan_does_not_see_later_writes() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"/a", b"1").unwrap();
    engine.put(b"/c", b"3").unwrap();

    let scan = engine
        .scan(Bound::Unbounded, Bound::Unbounded)
        .unwrap();
    engine.put(b"/b", b"2").unwrap();
    engine.flush().unwrap();

    let keys: Vec<Vec<u8>> = scan.map(|item| item.unwrap().0).collect();
    assert_eq!(keys, vec![b"/a".to_vec(), b"/c".to_vec()]);
}

#[test]
fn test_scan_inverted_range_is_empty() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"/a", b"1").unwrap();
    engine.flush().unwrap();

    assert!(scan_all(&engine, b"/z", b"/a").is_empty());
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_engine_compact() {
    let (_temp, engine) = setup_temp_engine();
    for round in 0..3 {
        engine.put(b"/counter", format!("{}", round).as_bytes()).unwrap();
        engine.put(format!("/round/{}", round).as_bytes(), b"x").unwrap();
        engine.flush().unwrap();
    }
    engine.delete(b"/round/0").unwrap();

    let merged = engine.compact().unwrap();

    assert!(merged.is_some());
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.get(b"/counter").unwrap(), Some(b"2".to_vec()));
    assert_eq!(
        scan_all(&engine, b"/round/", b"/round/\xFF"),
        vec![
            ("/round/1".to_string(), "x".to_string()),
            ("/round/2".to_string(), "x".to_string()),
        ]
    );
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_engine_concurrent_writers_and_scanners() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(Engine::open(config(&temp_dir, 4 * 1024)).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..100 {
                    engine
                        .put(format!("/t{}/{:03}", t, i).as_bytes(), b"v")
                        .unwrap();
                }
            })
        })
        .collect();

    let scanner = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..20 {
                let keys: Vec<Vec<u8>> = engine
                    .scan(Bound::Unbounded, Bound::Unbounded)
                    .unwrap()
                    .map(|item| item.unwrap().0)
                    .collect();
                assert!(keys.windows(2).all(|w| w[0] < w[1]));
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    scanner.join().unwrap();

    let total = engine
        .scan(Bound::Unbounded, Bound::Unbounded)
        .unwrap()
        .count();
    assert_eq!(total, 400);
}

#[test]
fn test_scans_survive_concurrent_compaction() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);
    engine.put(b"/stable", b"here").unwrap();
    engine.flush().unwrap();

    let compactor = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for round in 0..200 {
                engine
                    .put(format!("/churn/{:03}", round).as_bytes(), b"v")
                    .unwrap();
                engine.flush().unwrap();
                if round % 2 == 1 {
                    engine.compact().unwrap();
                }
            }
        })
    };

    let scanners: Vec<_> = (0..3)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..300 {
                    let entries: Vec<(Vec<u8>, Vec<u8>)> = engine
                        .scan(Bound::Unbounded, Bound::Unbounded)
                        .unwrap()
                        .map(|item| item.unwrap())
                        .collect();
                    assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
                    assert!(entries
                        .iter()
                        .any(|(k, v)| k == b"/stable" && v == b"here"));
                }
            })
        })
        .collect();

    compactor.join().unwrap();
    for scanner in scanners {
        scanner.join().unwrap();
    }
    assert_eq!(engine.sstable_count(), 1);
}

#[test]
fn test_open_scan_outlives_compaction() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"/a", b"1").unwrap();
    engine.flush().unwrap();
    engine.put(b"/b", b"2").unwrap();
    engine.flush().unwrap();

    let scan = engine.scan(Bound::Unbounded, Bound::Unbounded).unwrap();
    // Merges both tables and unlinks their files
    engine.compact().unwrap();

    let keys: Vec<Vec<u8>> = scan.map(|item| item.unwrap().0).collect();
    assert_eq!(keys, vec![b"/a".to_vec(), b"/b".to_vec()]);
}
