use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone)]
/// Mapping from keys to sets of values
///
/// Keys and values keep their insertion order. Adding a relation that already exists
/// changes nothing.
pub struct MultiMap<K, V> {
    map: IndexMap<K, IndexSet<V>>,
}

impl<K, V> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq, V: Hash + Eq> MultiMap<K, V> {
    /// Create an empty [`MultiMap`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Relate `value` to `key`
    ///
    /// Returns `false` if the relation was already present.
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.map.entry(key).or_default().insert(value)
    }

    /// Relate all `values` to `key`
    pub fn add_all<I: IntoIterator<Item = V>>(&mut self, key: K, values: I) {
        self.map.entry(key).or_default().extend(values);
    }

    /// Make sure `key` is present, even without values
    pub fn touch(&mut self, key: K) {
        self.map.entry(key).or_default();
    }

    /// Values related to `key`
    pub fn get(&self, key: &K) -> Option<&IndexSet<V>> {
        self.map.get(key)
    }

    /// `true` if `value` is related to `key`
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.map.get(key).is_some_and(|values| values.contains(value))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if there are no keys
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.keys()
    }

    /// All keys with their value sets
    pub fn iter(&self) -> impl Iterator<Item = (&K, &IndexSet<V>)> + '_ {
        self.map.iter()
    }
}
