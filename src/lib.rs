//! # FlowKV
//!
//! An embedded, ordered key-value store with:
//! - Write-Ahead Logging (WAL) for durability and crash recovery
//! - `/`-separated hierarchical keys with directory-style child listing
//! - Live change feeds filtered by key prefix
//! - A tagged command stream and per-owner namespaced views
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐    ┌──────────────────────┐
//! │   CommandProcessor   │    │    NamespacedView    │
//! │ (tagged msg stream)  │    │ (/settings/<owner>/) │
//! └──────────┬───────────┘    └──────────┬───────────┘
//!            └─────────────┬─────────────┘
//!                          ▼
//!               ┌─────────────────────┐   publish   ┌──────────────┐
//!               │      Database       ├────────────►│  ChangeBus   │
//!               └──────────┬──────────┘             │ (mailboxes)  │
//!                          │                        └──────┬───────┘
//!                          ▼                               ▼
//!               ┌─────────────────────┐             Subscriptions
//!               │    OrderedStore     │             (prefix filters)
//!               │ (codec + hierarchy) │
//!               └──────────┬──────────┘
//!                          ▼
//!        ┌─────────────┬───┴─────────┬─────────────┐
//!        ▼             ▼             ▼             │
//!   ┌─────────┐  ┌───────────┐  ┌──────────┐       │
//!   │   WAL   │  │ MemTable  │  │ SSTables │◄──────┘
//!   │(Append) │  │ (RwLock)  │  │ (sorted) │   Engine
//!   └─────────┘  └───────────┘  └──────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod keyrange;
pub mod engine;

pub mod value;
pub mod codec;
pub mod store;
pub mod hierarchy;
pub mod changes;
pub mod api;
pub mod database;
pub mod processor;
pub mod namespace;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlowError, Result};
pub use config::{Config, DeliveryPolicy, MailboxSettings};
pub use engine::Engine;
pub use value::Value;
pub use codec::{Codec, JsonCodec};
pub use store::{OrderedStore, StoreSlot};
pub use changes::{ChangeBus, ChangeEvent, SubscriberId, Subscription};
pub use api::ReadWriteApi;
pub use database::Database;
pub use processor::{CommandProcessor, Message, Tag};
pub use namespace::NamespacedView;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlowKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
