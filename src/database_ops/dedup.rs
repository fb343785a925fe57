use std::hash::Hash;

use indexmap::IndexMap;

/// Collapse items sharing a key; a later item replaces an earlier one.
pub fn dedup_last_wins<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut by_key: IndexMap<K, T> = IndexMap::new();
    for item in items {
        by_key.insert(key(&item), item);
    }
    by_key.into_values().collect()
}
