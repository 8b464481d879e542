//! Key range helpers shared by the memtable, SSTable cursors and the store.

use std::ops::Bound;

/// Exclusive upper bound of a prefix query: `prefix ‖ 0xFF`
///
/// Keys that continue the prefix with a `0xFF` byte fall outside the range.
/// Stored keys are UTF-8, where `0xFF` never occurs.
pub fn prefix_limit(prefix: &[u8]) -> Vec<u8> {
    let mut limit = Vec::with_capacity(prefix.len() + 1);
    limit.extend_from_slice(prefix);
    limit.push(0xFF);
    limit
}

/// True when no key can satisfy both bounds
///
/// `BTreeMap::range` panics on these, so callers check first.
pub fn is_empty_range<K: Ord>(start: &Bound<K>, end: &Bound<K>) -> bool {
    match (start, end) {
        (Bound::Included(s), Bound::Included(e)) => s > e,
        (Bound::Included(s), Bound::Excluded(e))
        | (Bound::Excluded(s), Bound::Included(e))
        | (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
        _ => false,
    }
}

pub(crate) fn to_owned_bound(bound: Bound<&[u8]>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(k) => Bound::Included(k.to_vec()),
        Bound::Excluded(k) => Bound::Excluded(k.to_vec()),
        Bound::Unbounded => Bound::Unbounded,
    }
}
