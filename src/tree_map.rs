//! Ordered maps: `TreeMap` (unique keys) and `TreeMultiMap`.

use crate::compare::{Compare, Less};
use crate::cursor::{Container, Cursor};
use crate::error::{Error, Result};
use crate::node_store::{Iter, Keys, NodeStore, Values};
use crate::ordered::OrderedCore;
use crate::policy::{Multi, Policy, Unique};
use core::borrow::Borrow;
use core::fmt;

/// Key/value entries kept in key order, one entry per equivalent key.
pub struct TreeMap<K, V, C = Less, P = Unique> {
    core: OrderedCore<K, V, C, P>,
}

/// Key/value entries in key order; equal keys keep insertion order.
pub type TreeMultiMap<K, V, C = Less> = TreeMap<K, V, C, Multi>;

impl<K: Ord, V, P: Policy> TreeMap<K, V, Less, P> {
    pub fn new() -> Self {
        Self::with_comparator(Less)
    }
}

impl<K, V, C: Compare<K>, P: Policy> TreeMap<K, V, C, P> {
    pub fn with_comparator(comp: C) -> Self {
        Self {
            core: OrderedCore::new(comp),
        }
    }

    pub fn from_range<S>(src: &S, first: Cursor, last: Cursor, comp: C) -> Result<Self>
    where
        S: Container<Key = K, Value = V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        let mut map = Self::with_comparator(comp);
        map.core.insert_range(src, first, last)?;
        Ok(map)
    }

    pub fn key_comp(&self) -> &C {
        self.core.comp()
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.core.store().iter()
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        self.core.store().keys()
    }

    pub fn values(&self) -> Values<'_, K, V> {
        self.core.store().values()
    }

    pub fn range(&self, first: Cursor, last: Cursor) -> Result<Iter<'_, K, V>> {
        self.core.store().range(first, last)
    }

    /// Mutable access to the value at `pos`; keys are never mutable.
    pub fn value_mut(&mut self, pos: Cursor) -> Option<&mut V> {
        self.core.value_mut(pos)
    }

    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.find(q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        !self.find(q).is_end()
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.count(q)
    }

    pub fn lower_bound<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.lower_bound(q)
    }

    pub fn upper_bound<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.upper_bound(q)
    }

    pub fn equal_range<Q>(&self, q: &Q) -> (Cursor, Cursor)
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.equal_range(q)
    }

    /// Insert without overwriting: an existing equivalent key in a unique
    /// map keeps its value.
    pub fn insert(&mut self, key: K, value: V) -> P::Inserted {
        self.core.emplace(key, value)
    }

    pub fn emplace_hint(&mut self, hint: Cursor, key: K, value: V) -> Result<Cursor> {
        self.core.emplace_hint(hint, key, value)
    }

    pub fn insert_range<S>(&mut self, src: &S, first: Cursor, last: Cursor) -> Result<()>
    where
        S: Container<Key = K, Value = V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        self.core.insert_range(src, first, last)
    }

    pub fn erase(&mut self, pos: Cursor) -> Result<Cursor> {
        self.core.erase(pos)
    }

    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Result<Cursor> {
        self.core.erase_range(first, last)
    }

    /// Remove every entry whose key is equivalent to `q`.
    pub fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.erase_key(q)
    }

    pub fn extract(&mut self, pos: Cursor) -> Result<(K, V)> {
        self.core.extract(pos)
    }

    pub fn extract_key<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.take(q)
    }

    pub fn merge(&mut self, source: &mut Self) {
        self.core.merge(&mut source.core)
    }

    pub fn clear(&mut self) {
        self.core.clear()
    }

    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
        tracing::debug!(left = self.len(), right = other.len(), "tree maps swapped");
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> core::result::Result<(), String> {
        self.core.check_invariants()
    }
}

impl<K, V, C: Compare<K>> TreeMap<K, V, C, Unique> {
    /// The value under `q`; a missing key is `OutOfRange`.
    pub fn get<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.find(q)
            .value(self)
            .ok_or(Error::OutOfRange("key not present in map"))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.find(q);
        self.core
            .value_mut(pos)
            .ok_or(Error::OutOfRange("key not present in map"))
    }

    /// Insert, or overwrite the value of an existing key. `true` when the
    /// key was new.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Cursor, bool) {
        let pos = self.find(&key);
        if let Some(slot) = self.core.value_mut(pos) {
            *slot = value;
            return (pos, false);
        }
        self.core.emplace(key, value)
    }

    pub fn insert_or_assign_hint(&mut self, hint: Cursor, key: K, value: V) -> Result<Cursor> {
        self.core.store().resolve(hint)?;
        let pos = self.find(&key);
        if let Some(slot) = self.core.value_mut(pos) {
            *slot = value;
            return Ok(pos);
        }
        self.core.emplace_hint(hint, key, value)
    }

    /// Mutable value under `key`, inserting `V::default()` first when the
    /// key is missing.
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (pos, _) = self.core.emplace(key, V::default());
        self.core
            .value_mut(pos)
            .expect("cursor returned by emplace is live")
    }

    pub fn set(&mut self, key: K, value: V) {
        self.insert_or_assign(key, value);
    }
}

impl<K, V, C, P> Container for TreeMap<K, V, C, P> {
    type Key = K;
    type Value = V;

    fn node_store(&self) -> &NodeStore<K, V> {
        self.core.store()
    }
}

impl<K, V, C: Compare<K> + Default, P: Policy> Default for TreeMap<K, V, C, P> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, V: Clone, C: Clone, P> Clone for TreeMap<K, V, C, P> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, P> fmt::Debug for TreeMap<K, V, C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.node_store().iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C, P> PartialEq for TreeMap<K, V, C, P> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.node_store(), other.node_store());
        a.len() == b.len() && a.iter().eq(b.iter())
    }
}

impl<K: Eq, V: Eq, C, P> Eq for TreeMap<K, V, C, P> {}

impl<K, V, C: Compare<K>, P: Policy> Extend<(K, V)> for TreeMap<K, V, C, P> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, C: Compare<K> + Default, P: Policy> FromIterator<(K, V)> for TreeMap<K, V, C, P> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, C, P> IntoIterator for &'a TreeMap<K, V, C, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.node_store().iter()
    }
}
