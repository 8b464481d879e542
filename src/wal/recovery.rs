//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::Result;

use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

/// Outcome of scanning the raw log bytes
struct Scan {
    entries: Vec<WalEntry>,
    result: RecoveryResult,
    /// Length of the valid prefix of the file
    valid_len: u64,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Stop at the first torn or corrupted entry
    /// 3. Truncate the file to the valid prefix
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let scan = Self::scan(path)?;

        if scan.result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
            tracing::warn!(
                "WAL {} truncated to {} bytes ({} corrupted entries dropped)",
                path.display(),
                scan.valid_len,
                scan.result.entries_corrupted
            );
        }

        Ok((scan.entries, scan.result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Ok(Self::scan(path)?.result)
    }

    fn scan(path: &Path) -> Result<Scan> {
        let bytes = fs::read(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut pos = 0usize;

        while pos < bytes.len() {
            let rest = &bytes[pos..];

            // Torn header: partial write, not corruption
            let Ok((_, _, len)) = WalEntry::parse_header(rest) else {
                break;
            };
            if len > MAX_ENTRY_SIZE {
                result.entries_corrupted += 1;
                break;
            }
            // Torn payload
            if rest.len() < HEADER_SIZE + len {
                break;
            }

            match WalEntry::deserialize(&rest[..HEADER_SIZE + len]) {
                Ok(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                    pos += HEADER_SIZE + len;
                }
                Err(e) => {
                    tracing::debug!("WAL {} corrupt at offset {}: {}", path.display(), pos, e);
                    result.entries_corrupted += 1;
                    break;
                }
            }
        }

        result.was_truncated = pos < bytes.len();

        Ok(Scan {
            entries,
            result,
            valid_len: pos as u64,
        })
    }
}
