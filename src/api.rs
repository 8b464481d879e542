//! Read/write surface shared by the database and its namespaced views.

use crate::error::Result;
use crate::value::Value;

/// Key listing, lookup and mutation over `/`-separated keys
///
/// Components that persist settings take `&dyn ReadWriteApi` and can be
/// handed the whole [`Database`](crate::Database) or a
/// [`NamespacedView`](crate::NamespacedView).
pub trait ReadWriteApi: Send + Sync {
    /// Distinct child segments directly under `prefix`
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// `None` deletes the key
    fn put(&self, key: &str, value: Option<Value>) -> Result<()>;
}
