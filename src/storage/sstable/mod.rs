//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted key-value storage.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "FLKV" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   (ValLen = u32::MAX means tombstone, no value bytes)   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Block (variable)                                  │
//! │   [KeyLen: u32][Offset: u64][Key]                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   IndexOffset: u64 (8) | DataCRC: u32 (4) | Padding (4) │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod iterator;
mod reader;

use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

pub use builder::SSTableBuilder;
pub use iterator::SSTableCursor;
pub use reader::SSTableReader;

use crate::error::Result;
use crate::memtable::MemTableEntry;

pub(crate) const MAGIC: &[u8; 4] = b"FLKV";

pub(crate) const VERSION: u16 = 1;

/// Magic (4) + Version (2) + EntryCount (8)
pub(crate) const HEADER_SIZE: u64 = 14;

/// IndexOffset (8) + DataCRC (4) + Padding (4)
pub(crate) const FOOTER_SIZE: u64 = 16;

/// Value length marking a tombstone
pub(crate) const TOMBSTONE_MARKER: u32 = u32::MAX;

/// Metadata describing a finished SSTable
#[derive(Debug, Clone)]
pub struct SSTable {
    /// Path to the SSTable file
    pub path: PathBuf,
    /// Number of entries in this SSTable
    pub entry_count: u64,
    /// Smallest key
    pub min_key: Vec<u8>,
    /// Largest key
    pub max_key: Vec<u8>,
    /// File size in bytes
    pub file_size: u64,
}

impl SSTable {
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Returns false if key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.entry_count > 0 && key >= self.min_key.as_slice() && key <= self.max_key.as_slice()
    }
}

/// Read the data-block entry stored at `offset`
pub(crate) fn read_entry_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
) -> Result<(Vec<u8>, MemTableEntry)> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut header = [0u8; 8];
    reader.read_exact(&mut header)?;
    let (key_len, val_len) = split_lengths(&header);

    let mut key = vec![0u8; key_len as usize];
    reader.read_exact(&mut key)?;

    if val_len == TOMBSTONE_MARKER {
        return Ok((key, MemTableEntry::Tombstone));
    }

    let mut value = vec![0u8; val_len as usize];
    reader.read_exact(&mut value)?;
    Ok((key, MemTableEntry::Value(value)))
}

/// Decode `[key_len u32][val_len u32]`
pub(crate) fn split_lengths(header: &[u8; 8]) -> (u32, u32) {
    let key_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let val_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (key_len, val_len)
}
