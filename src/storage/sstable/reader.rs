//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{FlowError, Result};
use crate::memtable::MemTableEntry;

use crate::keyrange::to_owned_bound;

use super::iterator::SSTableCursor;
use super::{read_entry_at, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
///
/// Point lookups share one file handle behind a mutex; every range cursor
/// opens its own handle, so scans never hold a lock across I/O steps.
pub struct SSTableReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// key → data-block offset
    index: Arc<BTreeMap<Vec<u8>, u64>>,
    entry_count: u64,
}

impl SSTableReader {
    /// Open an SSTable, validate header and data checksum, load the index
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(FlowError::Storage(format!(
                "SSTable {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(FlowError::Storage(format!(
                "Invalid SSTable magic in {}: {:?}",
                path.display(),
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(FlowError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[6..14]);
        let entry_count = u64::from_le_bytes(count_bytes);

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let mut offset_bytes = [0u8; 8];
        offset_bytes.copy_from_slice(&footer[0..8]);
        let index_offset = u64::from_le_bytes(offset_bytes);
        let stored_crc = u32::from_le_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(FlowError::Storage(format!(
                "SSTable {} has index offset {} outside the file",
                path.display(),
                index_offset
            )));
        }

        // Data block checksum
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut hasher = crc32fast::Hasher::new();
        let mut remaining = index_offset - HEADER_SIZE;
        let mut chunk = vec![0u8; 64 * 1024];
        while remaining > 0 {
            let n = remaining.min(chunk.len() as u64) as usize;
            file.read_exact(&mut chunk[..n])?;
            hasher.update(&chunk[..n]);
            remaining -= n as u64;
        }
        if hasher.finalize() != stored_crc {
            return Err(FlowError::Storage(format!(
                "SSTable {} data checksum mismatch",
                path.display()
            )));
        }

        let mut index_data = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.read_exact(&mut index_data)?;
        let index = parse_index(&index_data).ok_or_else(|| {
            FlowError::Storage(format!("SSTable {} has a malformed index", path.display()))
        })?;

        if index.len() as u64 != entry_count {
            return Err(FlowError::Storage(format!(
                "SSTable {} header claims {} entries, index holds {}",
                path.display(),
                entry_count,
                index.len()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index: Arc::new(index),
            entry_count,
        })
    }

    /// Look up a key
    ///
    /// Returns `Ok(None)` when this table knows nothing about the key, and
    /// `Ok(Some(MemTableEntry::Tombstone))` when it records a deletion.
    pub fn get(&self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Ok(None),
        };

        let mut file = self.file.lock();
        let (_, entry) = read_entry_at(&mut *file, offset)?;
        Ok(Some(entry))
    }

    /// Cursor over `[start, end)`-style bounds, tombstones included
    pub fn range(&self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> Result<SSTableCursor> {
        let file = File::open(&self.path)?;
        Ok(SSTableCursor::new(
            BufReader::new(file),
            Arc::clone(&self.index),
            to_owned_bound(start),
            to_owned_bound(end),
        ))
    }

    /// Cursor over every entry
    pub fn iter(&self) -> Result<SSTableCursor> {
        self.range(Bound::Unbounded, Bound::Unbounded)
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false,
        }
    }
}

/// Parse `[key_len u32][offset u64][key]` records; `None` on a torn record
fn parse_index(data: &[u8]) -> Option<BTreeMap<Vec<u8>, u64>> {
    let mut index = BTreeMap::new();
    let mut pos = 0;

    while pos < data.len() {
        let key_len = u32::from_le_bytes(data.get(pos..pos + 4)?.try_into().ok()?) as usize;
        pos += 4;
        let offset = u64::from_le_bytes(data.get(pos..pos + 8)?.try_into().ok()?);
        pos += 8;
        let key = data.get(pos..pos + key_len)?.to_vec();
        pos += key_len;
        index.insert(key, offset);
    }

    Some(index)
}
