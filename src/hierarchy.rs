//! Directory-style listing over `/`-separated keys.

use crate::error::Result;
use crate::store::OrderedStore;

/// Hierarchy separator
pub const SEPARATOR: u8 = b'/';

/// First path segment of `key` after `prefix_len` bytes
///
/// The whole remainder when it holds no separator; empty when `key` equals
/// the prefix.
pub fn child_segment(key: &[u8], prefix_len: usize) -> &[u8] {
    let rest = key.get(prefix_len..).unwrap_or_default();
    match rest.iter().position(|&b| b == SEPARATOR) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Adapter yielding each distinct child segment of a sorted key stream
///
/// Only compares against the last emitted segment: sorted input puts keys
/// sharing a segment next to each other.
pub struct ChildSegments<I> {
    keys: I,
    prefix_len: usize,
    prev: Option<Vec<u8>>,
}

impl<I> ChildSegments<I> {
    pub fn new(keys: I, prefix_len: usize) -> Self {
        Self {
            keys,
            prefix_len,
            prev: None,
        }
    }
}

impl<I, V> Iterator for ChildSegments<I>
where
    I: Iterator<Item = Result<(Vec<u8>, V)>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = match self.keys.next()? {
                Ok((key, _)) => key,
                Err(e) => return Some(Err(e)),
            };

            let segment = child_segment(&key, self.prefix_len);
            if self.prev.as_deref() == Some(segment) {
                continue;
            }

            self.prev = Some(segment.to_vec());
            return Some(Ok(String::from_utf8_lossy(segment).into_owned()));
        }
    }
}

/// Distinct child segments under `prefix`, in key order
///
/// A key equal to `prefix` contributes an empty segment.
pub fn list_children(store: &OrderedStore, prefix: &str) -> Result<Vec<String>> {
    let scan = store.range_scan(prefix.as_bytes(), b"")?;
    ChildSegments::new(scan, prefix.len()).collect()
}
