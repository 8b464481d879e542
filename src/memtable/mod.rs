//! MemTable Module
//!
//! In-memory buffer of recent writes, flushed to an SSTable once it grows
//! past the configured limit.
//!
//! BTreeMap behind a RwLock: keys stay ordered, which both SSTable
//! generation and prefix scans depend on.

mod table;

pub use table::{MemTable, MemTableIterator};

/// Entry stored in the MemTable (and in SSTable data blocks)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

impl MemTableEntry {
    /// The live value, or `None` for a tombstone
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            MemTableEntry::Value(v) => Some(v),
            MemTableEntry::Tombstone => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, MemTableEntry::Tombstone)
    }
}
