//! Hashed maps: `HashMap` (unique keys) and `HashMultiMap`.

use crate::cursor::{Bucketed, Container, Cursor, LocalCursor};
use crate::error::{Error, Result};
use crate::hash_index::HashConfig;
use crate::hashed::HashedCore;
use crate::node_store::{Iter, Keys, NodeStore, Values};
use crate::policy::{Multi, Policy, Unique};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Key/value entries in insertion order with O(1) average lookup.
pub struct HashMap<K, V, S = DefaultHashBuilder, P = Unique> {
    core: HashedCore<K, V, S, P>,
}

/// Hashed map where a key may hold several values, kept together in
/// insertion order.
pub type HashMultiMap<K, V, S = DefaultHashBuilder> = HashMap<K, V, S, Multi>;

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: Policy,
{
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    pub fn with_config(config: HashConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, S::default())
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: Policy,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            core: HashedCore::new(hasher),
        }
    }

    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            core: HashedCore::with_config(hasher, config)?,
        })
    }

    pub fn from_range<C>(src: &C, first: Cursor, last: Cursor, hasher: S) -> Result<Self>
    where
        C: Container<Key = K, Value = V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        let mut map = Self::with_hasher(hasher);
        map.core.insert_range(src, first, last)?;
        Ok(map)
    }

    pub fn hash_function(&self) -> &S {
        self.core.hasher()
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

    pub fn value_mut(&mut self, pos: Cursor) -> Option<&mut V> {
        self.core.value_mut(pos)
    }

    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.find(q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(q).is_end()
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.count(q)
    }

    /// All entries under `q`, which are adjacent in iteration order.
    pub fn equal_range<Q>(&self, q: &Q) -> (Cursor, Cursor)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.equal_range(q)
    }

    /// Insert without overwriting an existing key of a unique map.
    pub fn insert(&mut self, key: K, value: V) -> P::Inserted {
        self.core.emplace(key, value)
    }

    pub fn emplace_hint(&mut self, hint: Cursor, key: K, value: V) -> Result<Cursor> {
        self.core.emplace_hint(hint, key, value)
    }

    pub fn insert_range<C>(&mut self, src: &C, first: Cursor, last: Cursor) -> Result<()>
    where
        C: Container<Key = K, Value = V> + ?Sized,
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

    pub fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.erase_key(q)
    }

    pub fn extract(&mut self, pos: Cursor) -> Result<(K, V)> {
        self.core.extract(pos)
    }

    pub fn extract_key<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
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
        tracing::debug!(left = self.len(), right = other.len(), "hash maps swapped");
    }

    // ---- buckets ---------------------------------------------------------

    pub fn bucket<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        self.core.bucket(q)
    }

    pub fn bucket_count(&self) -> usize {
        self.core.bucket_count()
    }

    pub fn bucket_size(&self, i: usize) -> Result<usize> {
        self.core.bucket_size(i)
    }

    pub fn bucket_cursors(&self, i: usize) -> Result<impl Iterator<Item = Cursor> + '_> {
        self.core.bucket_cursors(i)
    }

    /// First position of bucket `i`; `OutOfRange` past `bucket_count()`.
    pub fn begin_bucket(&self, i: usize) -> Result<LocalCursor> {
        self.core.begin_bucket(i)
    }

    pub fn end_bucket(&self, i: usize) -> Result<LocalCursor> {
        self.core.end_bucket(i)
    }

    pub fn load_factor(&self) -> f64 {
        self.core.load_factor()
    }

    pub fn max_load_factor(&self) -> f64 {
        self.core.max_load_factor()
    }

    pub fn set_max_load_factor(&mut self, z: f64) -> Result<()> {
        self.core.set_max_load_factor(z)
    }

    /// Make room for `n` entries. Fails with `OutOfRange` when that many
    /// buckets cannot be allocated.
    pub fn reserve(&mut self, n: usize) -> Result<()> {
        self.core.reserve(n)
    }

    /// Grow to at least `n` buckets; never shrinks.
    pub fn rehash(&mut self, n: usize) -> Result<()> {
        self.core.rehash(n)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> core::result::Result<(), String> {
        self.core.check_invariants()
    }
}

impl<K, V, S> HashMap<K, V, S, Unique>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn get<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q)
            .value(self)
            .ok_or(Error::OutOfRange("key not present in map"))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.find(q);
        self.core
            .value_mut(pos)
            .ok_or(Error::OutOfRange("key not present in map"))
    }

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

    pub fn set(&mut self, key: K, value: V) {
        self.insert_or_assign(key, value);
    }
}

impl<K, V, S, P> Container for HashMap<K, V, S, P> {
    type Key = K;
    type Value = V;

    fn node_store(&self) -> &NodeStore<K, V> {
        self.core.store()
    }
}

impl<K, V, S, P> Bucketed for HashMap<K, V, S, P> {
    fn bucket_entry(&self, bucket: usize, pos: usize) -> Option<Cursor> {
        self.core.bucket_entry(bucket, pos)
    }
}

impl<K, V, S, P> Default for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: Policy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, S: Clone, P> Clone for HashMap<K, V, S, P> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, P> fmt::Debug for HashMap<K, V, S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.node_store().iter()).finish()
    }
}

/// Equal when every key maps to the same sequence of values in both.
impl<K, V, S, P> PartialEq for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    P: Policy,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.keys().all(|k| {
            let (a, b) = (self.equal_range(k), other.equal_range(k));
            match (self.node_store().range(a.0, a.1), other.node_store().range(b.0, b.1)) {
                (Ok(x), Ok(y)) => x.map(|(_, v)| v).eq(y.map(|(_, v)| v)),
                _ => false,
            }
        })
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher, P: Policy> Eq for HashMap<K, V, S, P> {}

impl<K, V, S, P> Extend<(K, V)> for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: Policy,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // An unsatisfiable size hint only skips the up-front growth.
        let _ = self.reserve(self.len().saturating_add(iter.size_hint().0));
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, P> FromIterator<(K, V)> for HashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: Policy,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a HashMap<K, V, S, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.node_store().iter()
    }
}
