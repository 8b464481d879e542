//! Registered definitions
//!
//! `<register>` records the payload stored under a key so that whatever
//! assembles components can build one from it later.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Key the payload was read from
    pub key: String,
    /// Last `/` segment of the key
    pub name: String,
    /// Stored payload, undecoded
    pub source: Bytes,
}

impl Definition {
    pub fn new(key: impl Into<String>, source: impl Into<Bytes>) -> Self {
        let key = key.into();
        let name = match key.rfind('/') {
            Some(i) => key[i + 1..].to_string(),
            None => key.clone(),
        };
        Self {
            key,
            name,
            source: source.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: RwLock<BTreeMap<String, Definition>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace; returns the definition previously under that key
    pub fn insert(&self, definition: Definition) -> Option<Definition> {
        self.definitions
            .write()
            .insert(definition.key.clone(), definition)
    }

    pub fn get(&self, key: &str) -> Option<Definition> {
        self.definitions.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.definitions.read().contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}
