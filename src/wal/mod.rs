//! Write-ahead log
//!
//! Every mutation is appended here before it touches the memtable, so a
//! restart can rebuild whatever had not reached an SSTable yet. The log is
//! emptied after each successful flush.
//!
//! ## Record Layout
//! ```text
//! ┌──────────┬───────────┬───────────┬──────────────────────┐
//! │ LSN u64  │ CRC32 u32 │ Len u32   │ bincode(WalEntry)    │
//! └──────────┴───────────┴───────────┴──────────────────────┘
//!   records repeat back to back, all integers little-endian
//! ```
//!
//! The CRC covers the payload only. A record cut short at the tail is a torn
//! write and ends replay; a checksum mismatch is counted as corruption.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{Operation, WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
