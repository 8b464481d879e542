//! SSTable Cursor
//!
//! Lazy ascending iteration over a key range of one SSTable.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::ops::Bound;
use std::sync::Arc;

use crate::error::Result;
use crate::memtable::MemTableEntry;

use crate::keyrange::is_empty_range;

use super::read_entry_at;

/// Cursor over SSTable entries in sorted key order
///
/// Walks the shared in-memory index one key at a time and reads each entry
/// from its own file handle, which is closed when the cursor is dropped.
pub struct SSTableCursor {
    file: BufReader<File>,
    index: Arc<BTreeMap<Vec<u8>, u64>>,
    /// Lower bound for the next index lookup
    next_from: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
    done: bool,
}

impl SSTableCursor {
    pub(super) fn new(
        file: BufReader<File>,
        index: Arc<BTreeMap<Vec<u8>, u64>>,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
    ) -> Self {
        let done = is_empty_range(&start, &end);
        Self {
            file,
            index,
            next_from: start,
            end,
            done,
        }
    }

    fn next_offset(&self) -> Option<(Vec<u8>, u64)> {
        self.index
            .range::<Vec<u8>, _>((self.next_from.as_ref(), self.end.as_ref()))
            .next()
            .map(|(k, &off)| (k.clone(), off))
    }
}

impl Iterator for SSTableCursor {
    /// (key, entry); tombstones are yielded, not skipped
    type Item = Result<(Vec<u8>, MemTableEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some((key, offset)) = self.next_offset() else {
            self.done = true;
            return None;
        };

        // Stop before asking the BTreeMap for an inverted range
        if let Bound::Excluded(end) | Bound::Included(end) = &self.end {
            if &key == end {
                self.done = true;
            }
        }
        self.next_from = Bound::Excluded(key);

        match read_entry_at(&mut self.file, offset) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
