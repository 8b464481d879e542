//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{FlowError, Result};

use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset of the next unread entry
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A partially written tail
    /// (header or payload cut short) and checksum mismatches are reported as
    /// [`FlowError::WalCorruption`].
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = read_fully(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(FlowError::WalCorruption(format!(
                "partial header at offset {}: {} of {} bytes",
                self.position, read, HEADER_SIZE
            )));
        }

        let (_, _, len) = WalEntry::parse_header(&header)?;
        if len > MAX_ENTRY_SIZE {
            return Err(FlowError::WalCorruption(format!(
                "entry length {} at offset {} exceeds {}",
                len, self.position, MAX_ENTRY_SIZE
            )));
        }
        let mut record = Vec::with_capacity(HEADER_SIZE + len);
        record.extend_from_slice(&header);
        record.resize(HEADER_SIZE + len, 0);

        let read = read_fully(&mut self.reader, &mut record[HEADER_SIZE..])?;
        if read < len {
            return Err(FlowError::WalCorruption(format!(
                "partial payload at offset {}: {} of {} bytes",
                self.position, read, len
            )));
        }

        let entry = WalEntry::deserialize(&record)?;
        self.position += record.len() as u64;
        Ok(Some(entry))
    }

    /// Byte offset just past the last entry read successfully
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
///
/// Yields one error and then stops if the log is damaged.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
