//! Database
//!
//! The assembled system: one [`OrderedStore`] plus one [`ChangeBus`]. Every
//! mutation goes through here so the store write always happens before the
//! matching change event is published.

use std::sync::Arc;

use crate::api::ReadWriteApi;
use crate::changes::{ChangeBus, ChangeEvent, Subscription};
use crate::config::Config;
use crate::error::Result;
use crate::store::OrderedStore;
use crate::value::Value;

/// Shared handle; clones are cheap and see the same store and bus
#[derive(Clone)]
pub struct Database {
    store: Arc<OrderedStore>,
    bus: Arc<ChangeBus>,
}

impl Database {
    /// Open the store in `config.data_dir` and create a bus with the
    /// configured mailbox defaults
    pub fn open(config: &Config) -> Result<Self> {
        let store = Arc::new(OrderedStore::open(config)?);
        let bus = Arc::new(ChangeBus::new(config.mailbox));
        Ok(Self::new(store, bus))
    }

    pub fn new(store: Arc<OrderedStore>, bus: Arc<ChangeBus>) -> Self {
        Self { store, bus }
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.store.get(key)
    }

    /// The stored payload without decoding
    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get_raw(key)
    }

    /// Write `value` (or delete on `None`), then publish the change
    pub fn put(&self, key: &str, value: Option<Value>) -> Result<()> {
        // A top-level null deletes, and is announced as a deletion
        let value = value.filter(|v| !v.is_null());
        self.store.put(key, value.as_ref())?;
        self.bus.publish(&ChangeEvent::new(key, value));
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.put(key, None)
    }

    pub fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.store.keys(prefix)
    }

    pub fn range(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        self.store.range(prefix)
    }

    /// Delete every key under `prefix`, one deletion event per key
    ///
    /// Returns the number of keys removed.
    pub fn clear(&self, prefix: &str) -> Result<usize> {
        tracing::debug!("clear {}", prefix);
        let mut removed = 0;
        for item in self.store.range_scan(prefix.as_bytes(), b"")? {
            let (key, _) = item?;
            let key = String::from_utf8_lossy(&key).into_owned();
            self.store.delete(&key)?;
            self.bus.publish(&ChangeEvent::deletion(key));
            removed += 1;
        }
        Ok(removed)
    }

    /// Subscribe to changes under any of `prefixes` (all changes if empty)
    pub fn subscribe(&self, prefixes: Vec<String>) -> Subscription {
        Subscription::new(Arc::clone(&self.bus), prefixes)
    }

    pub fn store(&self) -> &Arc<OrderedStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }
}

impl ReadWriteApi for Database {
    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Database::keys(self, prefix)
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        Database::get(self, key)
    }

    fn put(&self, key: &str, value: Option<Value>) -> Result<()> {
        Database::put(self, key, value)
    }
}
