//! Storage Module
//!
//! Persistent storage layer: immutable sorted tables plus the machinery to
//! read across them.
//!
//! ## Responsibilities
//! - Persist flushed MemTables to disk in sorted format
//! - Point lookups (newest table wins)
//! - Ordered range scans merged across tables
//! - Compaction of many tables into one

mod sstable;
mod manager;
mod merge;

pub use sstable::{SSTable, SSTableBuilder, SSTableCursor, SSTableReader};
pub use manager::StorageManager;
pub use merge::{EntrySource, MergeIterator};
