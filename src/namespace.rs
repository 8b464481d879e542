//! Per-owner key namespaces
//!
//! A [`NamespacedView`] prefixes every key with `/settings/<path><name>/`
//! and otherwise behaves like the database it wraps, change events included.

use crate::api::ReadWriteApi;
use crate::database::Database;
use crate::error::{FlowError, Result};
use crate::value::Value;

/// Root of every owner namespace
pub const SETTINGS_ROOT: &str = "/settings";

#[derive(Clone)]
pub struct NamespacedView {
    db: Database,
    namespace: String,
}

impl NamespacedView {
    /// Scope `db` to `/settings/<path><name>/`
    ///
    /// `path` is inserted verbatim, so it should end with `/` (e.g.
    /// `sensors/`). `name` must be a single non-empty segment.
    ///
    /// Views are isolated from each other only when neither namespace is a
    /// prefix of the other: an owner `a` without a path contains every owner
    /// placed under the path `a/`.
    pub fn new(db: Database, name: &str, path: Option<&str>) -> Result<Self> {
        if name.is_empty() || name.contains('/') {
            return Err(FlowError::Config(format!(
                "invalid namespace owner {:?}: must be one non-empty segment",
                name
            )));
        }
        let namespace = format!("{}/{}{}/", SETTINGS_ROOT, path.unwrap_or(""), name);
        tracing::debug!("namespace {}", namespace);
        Ok(Self { db, namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full store key for a key inside this namespace
    pub fn scoped(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    pub fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.db.keys(&self.scoped(prefix))
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.db.get(&self.scoped(key))
    }

    /// `None` deletes; the published event carries the full scoped key
    pub fn put(&self, key: &str, value: Option<Value>) -> Result<()> {
        self.db.put(&self.scoped(key), value)
    }
}

impl ReadWriteApi for NamespacedView {
    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        NamespacedView::keys(self, prefix)
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        NamespacedView::get(self, key)
    }

    fn put(&self, key: &str, value: Option<Value>) -> Result<()> {
        NamespacedView::put(self, key, value)
    }
}
