//! Configuration for FlowKV
//!
//! Centralized configuration with sensible defaults. The data directory is the
//! only setting without a default: building a config without one fails.

use std::path::PathBuf;

use crate::error::{FlowError, Result};

/// Environment variable consulted by [`Config::from_env`]
pub const DATA_DIR_ENV: &str = "FLOWKV_DATA_DIR";

/// Main configuration for a FlowKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files (WAL, SSTables, etc.)
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── sstables/        (SSTable files)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Change Feed Configuration
    // -------------------------------------------------------------------------
    /// Default mailbox settings for subscribers that don't pick their own
    pub mailbox: MailboxSettings,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// What a publisher does when a subscriber's mailbox is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Wait for the subscriber to make room (publisher sees backpressure)
    Block,

    /// Discard the oldest queued event to make room
    DropOldest,

    /// No capacity limit; the backlog grows without bound
    Unbounded,
}

/// Per-subscriber mailbox settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxSettings {
    /// Number of events a mailbox holds (ignored for `Unbounded`)
    pub capacity: usize,

    /// Behavior when the mailbox is full
    pub policy: DeliveryPolicy,
}

impl MailboxSettings {
    /// Default mailbox size: five slots plus one spare
    pub const DEFAULT_CAPACITY: usize = 6;

    pub fn new(capacity: usize, policy: DeliveryPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            policy,
        }
    }
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            policy: DeliveryPolicy::Block,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Build a config from the environment (`FLOWKV_DATA_DIR`)
    pub fn from_env() -> Result<Config> {
        let mut builder = Config::builder();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            builder = builder.data_dir(dir);
        }
        builder.build()
    }
}

/// Builder for Config
#[derive(Debug)]
pub struct ConfigBuilder {
    data_dir: Option<PathBuf>,
    wal_sync_strategy: WalSyncStrategy,
    memtable_size_limit: usize,
    mailbox: MailboxSettings,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            mailbox: MailboxSettings::default(),
        }
    }
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.memtable_size_limit = size;
        self
    }

    /// Set the default mailbox capacity for new subscribers
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox = MailboxSettings::new(capacity, self.mailbox.policy);
        self
    }

    /// Set the default delivery policy for new subscribers
    pub fn delivery_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.mailbox.policy = policy;
        self
    }

    /// Finish the config
    ///
    /// Fails with [`FlowError::Config`] when no data directory was given.
    pub fn build(self) -> Result<Config> {
        let data_dir = match self.data_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => {
                return Err(FlowError::Config(
                    "cannot open database, data directory not set".to_string(),
                ))
            }
        };

        Ok(Config {
            data_dir,
            wal_sync_strategy: self.wal_sync_strategy,
            memtable_size_limit: self.memtable_size_limit,
            mailbox: self.mailbox,
        })
    }
}
