//! Tests for WAL Reader
//!
//! These tests verify:
//! - Sequential reads and position tracking
//! - Clean EOF versus a torn tail

use std::fs::{File, OpenOptions};
use std::io::Write;

use flowkv::config::WalSyncStrategy;
use flowkv::wal::{Operation, WalEntry, WalReader, WalWriter, HEADER_SIZE};
use flowkv::FlowError;
use tempfile::TempDir;

#[test]
fn test_read_empty_log() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wal.log");
    File::create(&path).unwrap();

    let mut reader = WalReader::open(&path).unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_read_in_order_and_track_position() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wal.log");
    let ops = vec![
        Operation::Put {
            key: b"/config/mode".to_vec(),
            value: b"\"auto\"".to_vec(),
        },
        Operation::Delete {
            key: b"/config/mode".to_vec(),
        },
    ];
    {
        let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        for op in &ops {
            writer.append(op.clone()).unwrap();
        }
    }

    let mut reader = WalReader::open(&path).unwrap();
    let first = reader.next_entry().unwrap().unwrap();
    assert_eq!(first.operation, ops[0]);
    assert_eq!(reader.position(), first.serialized_size().unwrap() as u64);

    let second = reader.next_entry().unwrap().unwrap();
    assert_eq!(second.operation, ops[1]);
    assert_eq!(second.lsn, 2);
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_iterator_stops_after_torn_tail() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wal.log");
    let whole = WalEntry::new(1, Operation::Delete { key: b"/a".to_vec() })
        .serialize()
        .unwrap();
    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .unwrap();
        file.write_all(&whole).unwrap();
        file.write_all(&whole[..HEADER_SIZE - 4]).unwrap();
    }

    let results: Vec<_> = WalReader::open(&path).unwrap().entries().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(FlowError::WalCorruption(_))));
}
