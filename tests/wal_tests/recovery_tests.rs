//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from clean and empty logs
//! - Torn tails (partial writes) are cut off without counting as corruption
//! - CRC mismatches stop recovery and are counted
//! - Verify mode leaves the file alone

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use flowkv::config::WalSyncStrategy;
use flowkv::wal::{Operation, WalEntry, WalReader, WalRecovery, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    (temp_dir, wal_path)
}

fn write_entries(path: &Path, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer
            .append(Operation::Put {
                key: format!("/sensor/{}", i).into_bytes(),
                value: format!("{}", i * 10).into_bytes(),
            })
            .unwrap();
    }
}

fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Clean Logs
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_clean_log_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 20);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 20);
    assert_eq!(result.entries_recovered, 20);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 20);
    assert!(!result.was_truncated);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.lsn, (i + 1) as u64);
    }
}

// =============================================================================
// Torn Writes
// =============================================================================

#[test]
fn test_partial_header_is_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 3);
    let clean_len = fs::metadata(&wal_path).unwrap().len();
    append_raw(&wal_path, &[0x04, 0x00, 0x00]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(result.entries_corrupted, 0);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), clean_len);
}

#[test]
fn test_partial_payload_is_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 2);
    let torn = WalEntry::new(3, Operation::Delete { key: b"/sensor/0".to_vec() })
        .serialize()
        .unwrap();
    append_raw(&wal_path, &torn[..torn.len() - 3]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(result.last_lsn, 2);
    assert!(result.was_truncated);

    // The log is clean again afterwards
    let reread: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();
    assert!(reread.iter().all(|e| e.is_ok()));
    assert_eq!(reread.len(), 2);
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_crc_mismatch_stops_recovery() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 2);
    let mut bad = WalEntry::new(3, Operation::Delete { key: b"/x".to_vec() })
        .serialize()
        .unwrap();
    let last = bad.len() - 1;
    bad[last] ^= 0xFF;
    append_raw(&wal_path, &bad);
    // A good entry after the damage is not trusted either
    append_raw(
        &wal_path,
        &WalEntry::new(4, Operation::Delete { key: b"/y".to_vec() })
            .serialize()
            .unwrap(),
    );

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(result.entries_corrupted, 1);
    assert!(result.was_truncated);
}

#[test]
fn test_verify_does_not_modify() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 2);
    append_raw(&wal_path, &[0xFF; 5]);
    let len_before = fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(result.entries_recovered, 2);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}
