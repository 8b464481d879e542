//! SSTable Builder
//!
//! Writes sorted entries to a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{FlowError, Result};
use crate::memtable::MemTableEntry;

use super::{SSTable, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Builder for creating new SSTables from sorted entries
///
/// Call [`add`](Self::add) / [`add_tombstone`](Self::add_tombstone) in
/// strictly ascending key order, then [`finish`](Self::finish).
pub struct SSTableBuilder {
    path: PathBuf,
    writer: BufWriter<File>,
    entry_count: u64,
    /// Offset where the next entry lands
    current_offset: u64,
    index: Vec<(Vec<u8>, u64)>,
    /// Running CRC over the data block
    data_hasher: crc32fast::Hasher,
}

impl SSTableBuilder {
    /// Create the file and write a provisional header
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?; // count, patched in finish()

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE,
            index: Vec::new(),
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a key-value pair
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_entry(key, Some(value))
    }

    /// Add a tombstone
    pub fn add_tombstone(&mut self, key: &[u8]) -> Result<()> {
        self.write_entry(key, None)
    }

    /// Add a memtable-style entry
    pub fn add_entry(&mut self, key: &[u8], entry: &MemTableEntry) -> Result<()> {
        match entry {
            MemTableEntry::Value(v) => self.add(key, v),
            MemTableEntry::Tombstone => self.add_tombstone(key),
        }
    }

    fn write_entry(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if let Some((last, _)) = self.index.last() {
            if key <= last.as_slice() {
                return Err(FlowError::Storage(format!(
                    "SSTable keys out of order: {:?} after {:?}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(last)
                )));
            }
        }

        let val_len = match value {
            Some(v) if v.len() >= TOMBSTONE_MARKER as usize => {
                return Err(FlowError::Storage(format!(
                    "value of {} bytes is too large for an SSTable entry",
                    v.len()
                )))
            }
            Some(v) => v.len() as u32,
            None => TOMBSTONE_MARKER,
        };

        let mut header = [0u8; 8];
        header[..4].copy_from_slice(&(key.len() as u32).to_le_bytes());
        header[4..].copy_from_slice(&val_len.to_le_bytes());

        self.writer.write_all(&header)?;
        self.writer.write_all(key)?;
        self.data_hasher.update(&header);
        self.data_hasher.update(key);

        let mut written = (header.len() + key.len()) as u64;
        if let Some(v) = value {
            self.writer.write_all(v)?;
            self.data_hasher.update(v);
            written += v.len() as u64;
        }

        self.index.push((key.to_vec(), self.current_offset));
        self.current_offset += written;
        self.entry_count += 1;
        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Write index block and footer, patch the header, fsync
    pub fn finish(mut self) -> Result<SSTable> {
        let index_offset = self.current_offset;

        for (key, offset) in &self.index {
            self.writer.write_all(&(key.len() as u32).to_le_bytes())?;
            self.writer.write_all(&offset.to_le_bytes())?;
            self.writer.write_all(key)?;
        }

        let data_crc = self.data_hasher.finalize();
        self.writer.write_all(&index_offset.to_le_bytes())?;
        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;
        self.writer.flush()?;

        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| FlowError::Storage(format!("Failed to flush SSTable: {}", e)))?;
        file.seek(SeekFrom::Start(6))?; // after magic + version
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        let min_key = self.index.first().map(|(k, _)| k.clone()).unwrap_or_default();
        let max_key = self.index.last().map(|(k, _)| k.clone()).unwrap_or_default();

        Ok(SSTable {
            path: self.path,
            entry_count: self.entry_count,
            min_key,
            max_key,
            file_size,
        })
    }
}
