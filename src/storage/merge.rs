//! Merging iterator
//!
//! Combines several sorted entry streams into one. Sources are ordered
//! newest first: when two sources hold the same key, the earlier source
//! wins and the shadowed entries are skipped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;
use crate::memtable::MemTableEntry;

/// A sorted stream of entries, tombstones included
pub type EntrySource = Box<dyn Iterator<Item = Result<(Vec<u8>, MemTableEntry)>> + Send>;

/// Head entry of one source, ordered so the heap pops the smallest key
/// first and, on equal keys, the lowest source index
struct Head {
    key: Vec<u8>,
    source: usize,
    entry: MemTableEntry,
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for Head {}

pub struct MergeIterator {
    sources: Vec<EntrySource>,
    heap: BinaryHeap<Head>,
    primed: bool,
    failed: bool,
}

impl MergeIterator {
    pub fn new(sources: Vec<EntrySource>) -> Self {
        let heap = BinaryHeap::with_capacity(sources.len());
        Self {
            sources,
            heap,
            primed: false,
            failed: false,
        }
    }

    /// Push the next entry of source `i`, if any
    fn refill(&mut self, source: usize) -> Result<()> {
        if let Some((key, entry)) = self.sources[source].next().transpose()? {
            self.heap.push(Head { key, source, entry });
        }
        Ok(())
    }

    fn prime(&mut self) -> Result<()> {
        for i in 0..self.sources.len() {
            self.refill(i)?;
        }
        self.primed = true;
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<(Vec<u8>, MemTableEntry)>> {
        if !self.primed {
            self.prime()?;
        }

        let Some(winner) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(winner.source)?;

        // Older versions of the same key sit right behind the winner
        while self.heap.peek().map_or(false, |head| head.key == winner.key) {
            if let Some(shadowed) = self.heap.pop() {
                self.refill(shadowed.source)?;
            }
        }

        Ok(Some((winner.key, winner.entry)))
    }
}

impl Iterator for MergeIterator {
    type Item = Result<(Vec<u8>, MemTableEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_entry() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
