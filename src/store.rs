//! Ordered Store
//!
//! The engine with a [`Codec`] applied at the boundary. Keys are
//! `/`-separated strings compared as raw bytes; values are [`Value`]s.
//!
//! A `None` (or top-level `Value::Null`) written through [`OrderedStore::put`]
//! deletes the key, so a null payload is never stored.

use std::ops::Bound;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::{Codec, JsonCodec};
use crate::config::Config;
use crate::engine::{Engine, Scan};
use crate::error::{FlowError, Result};
use crate::hierarchy;
use crate::keyrange::prefix_limit;
use crate::storage::SSTable;
use crate::value::Value;

pub struct OrderedStore {
    engine: Engine,
    codec: Arc<dyn Codec>,
}

impl OrderedStore {
    /// Open the store in `config.data_dir` with the JSON codec
    pub fn open(config: &Config) -> Result<Self> {
        Self::with_codec(config, Arc::new(JsonCodec))
    }

    pub fn with_codec(config: &Config, codec: Arc<dyn Codec>) -> Result<Self> {
        if config.data_dir.as_os_str().is_empty() {
            return Err(FlowError::Config(
                "cannot open database, data directory not set".to_string(),
            ));
        }

        let engine = Engine::open(config.clone())?;
        tracing::info!(
            "Opened store at {} (codec: {})",
            config.data_dir.display(),
            codec.name()
        );
        Ok(Self { engine, codec })
    }

    /// Decoded value at `key`, `None` when absent
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        tracing::trace!("get {}", key);
        match self.engine.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// The stored payload without decoding
    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.engine.get(key.as_bytes())
    }

    /// Store `value` at `key`; `None` or `Value::Null` deletes it
    pub fn put(&self, key: &str, value: Option<&Value>) -> Result<()> {
        match value {
            Some(value) if !value.is_null() => {
                tracing::debug!("put {} {}", key, value);
                let bytes = self.codec.encode(value)?;
                self.engine.put(key.as_bytes(), &bytes)
            }
            _ => {
                tracing::debug!("delete {}", key);
                self.engine.delete(key.as_bytes())
            }
        }
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.put(key, None)
    }

    /// Ascending scan over `[from, to)`
    ///
    /// An empty `to` selects every key starting with `from`, i.e.
    /// `[from, from ‖ 0xFF)`. Values are the raw stored payloads.
    pub fn range_scan(&self, from: &[u8], to: &[u8]) -> Result<Scan> {
        let limit = if to.is_empty() {
            prefix_limit(from)
        } else {
            to.to_vec()
        };
        self.engine
            .scan(Bound::Included(from), Bound::Excluded(limit.as_slice()))
    }

    /// Every entry under `prefix`, decoded, in key order
    pub fn range(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        tracing::trace!("range {}", prefix);
        self.range_scan(prefix.as_bytes(), b"")?
            .map(|item| {
                let (key, bytes) = item?;
                Ok((String::from_utf8_lossy(&key).into_owned(), self.codec.decode(&bytes)?))
            })
            .collect()
    }

    /// Distinct child segments directly under `prefix`
    pub fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        tracing::trace!("keys {}", prefix);
        hierarchy::list_children(self, prefix)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        self.codec.decode(bytes)
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn flush(&self) -> Result<()> {
        self.engine.flush()
    }

    pub fn compact(&self) -> Result<Option<SSTable>> {
        self.engine.compact()
    }

    pub fn close(self) -> Result<()> {
        self.engine.close()
    }
}

/// Lazily opened, shared store handle
///
/// Concurrent first callers of [`StoreSlot::get_or_open`] block until the
/// single open finishes; later calls return the same handle. A failed open
/// leaves the slot empty.
#[derive(Default)]
pub struct StoreSlot {
    store: Mutex<Option<Arc<OrderedStore>>>,
}

impl StoreSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_open(&self, config: &Config) -> Result<Arc<OrderedStore>> {
        let mut slot = self.store.lock();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(OrderedStore::open(config)?);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    /// The handle, if already opened
    pub fn get(&self) -> Option<Arc<OrderedStore>> {
        self.store.lock().clone()
    }
}
