use crate::{PCollection, RFBound};
use std::hash::Hash;

impl<T: RFBound> PCollection<T> {
    /// Derive a key and produce `(K, T)`.
    pub fn key_by<K, F>(self, key_fn: F) -> PCollection<(K, T)>
    where
        K: RFBound + Eq + Hash,
        F: 'static + Send + Sync + Fn(&T) -> K,
    {
        self.map(move |t| (key_fn(t), t.clone()))
    }
}

impl<K: RFBound + Eq + Hash, V: RFBound> PCollection<(K, V)> {
    /// `(K, V)` → `(K, O)`
    pub fn map_values<O, F>(self, f: F) -> PCollection<(K, O)>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&V) -> O,
    {
        self.map(move |(k, v): &(K, V)| (k.clone(), f(v)))
    }

    pub fn keys(self) -> PCollection<K> {
        self.map(|(k, _): &(K, V)| k.clone())
    }
}
