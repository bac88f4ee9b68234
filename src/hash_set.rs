//! Hashed sets: `HashSet` (unique keys) and `HashMultiSet`.

use crate::cursor::{Bucketed, Container, Cursor, LocalCursor};
use crate::error::Result;
use crate::hash_index::HashConfig;
use crate::hashed::HashedCore;
use crate::node_store::{Keys, NodeStore};
use crate::policy::{Multi, Policy, Unique};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Keys in insertion order with O(1) average lookup.
pub struct HashSet<K, S = DefaultHashBuilder, P = Unique> {
    core: HashedCore<K, (), S, P>,
}

/// Hashed keys where equal keys may repeat; repeats sit together.
pub type HashMultiSet<K, S = DefaultHashBuilder> = HashSet<K, S, Multi>;

impl<K, S, P> HashSet<K, S, P>
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

impl<K, S, P> HashSet<K, S, P>
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
        C: Container<Key = K, Value = ()> + ?Sized,
        K: Clone,
    {
        let mut set = Self::with_hasher(hasher);
        set.core.insert_range(src, first, last)?;
        Ok(set)
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

    pub fn iter(&self) -> Keys<'_, K, ()> {
        self.core.store().keys()
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

    pub fn equal_range<Q>(&self, q: &Q) -> (Cursor, Cursor)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.equal_range(q)
    }

    pub fn insert(&mut self, key: K) -> P::Inserted {
        self.core.emplace(key, ())
    }

    pub fn emplace_hint(&mut self, hint: Cursor, key: K) -> Result<Cursor> {
        self.core.emplace_hint(hint, key, ())
    }

    pub fn insert_range<C>(&mut self, src: &C, first: Cursor, last: Cursor) -> Result<()>
    where
        C: Container<Key = K, Value = ()> + ?Sized,
        K: Clone,
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

    pub fn extract(&mut self, pos: Cursor) -> Result<K> {
        self.core.extract(pos).map(|(k, ())| k)
    }

    pub fn extract_key<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.take(q).map(|(k, ())| k)
    }

    pub fn merge(&mut self, source: &mut Self) {
        self.core.merge(&mut source.core)
    }

    pub fn clear(&mut self) {
        self.core.clear()
    }

    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
        tracing::debug!(left = self.len(), right = other.len(), "hash sets swapped");
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

impl<K, S, P> Container for HashSet<K, S, P> {
    type Key = K;
    type Value = ();

    fn node_store(&self) -> &NodeStore<K, ()> {
        self.core.store()
    }
}

impl<K, S, P> Bucketed for HashSet<K, S, P> {
    fn bucket_entry(&self, bucket: usize, pos: usize) -> Option<Cursor> {
        self.core.bucket_entry(bucket, pos)
    }
}

impl<K, S, P> Default for HashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: Policy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, S: Clone, P> Clone for HashSet<K, S, P> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K: fmt::Debug, S, P> fmt::Debug for HashSet<K, S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.node_store().keys()).finish()
    }
}

/// Equal when both hold the same keys with the same multiplicities,
/// regardless of order.
impl<K, S, P> PartialEq for HashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: Policy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|k| self.count(k) == other.count(k))
    }
}

impl<K: Hash + Eq, S: BuildHasher, P: Policy> Eq for HashSet<K, S, P> {}

impl<K, S, P> Extend<K> for HashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: Policy,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // An unsatisfiable size hint only skips the up-front growth.
        let _ = self.reserve(self.len().saturating_add(iter.size_hint().0));
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, S, P> FromIterator<K> for HashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: Policy,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a, K, S, P> IntoIterator for &'a HashSet<K, S, P> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.node_store().keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Invariant: equality ignores order but not multiplicity.
    #[test]
    fn equality_is_by_contents() {
        let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
        let b: HashSet<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(a, b);
        let m1: HashMultiSet<i32> = [1, 1, 2].into_iter().collect();
        let m2: HashMultiSet<i32> = [1, 2, 2].into_iter().collect();
        assert_ne!(m1, m2);
    }

    /// Invariant: bucket indices past `bucket_count()` are out of range.
    #[test]
    fn bucket_bounds_checked() {
        let s: HashSet<i32> = HashSet::new();
        let n = s.bucket_count();
        assert_eq!(n, 10);
        assert_eq!(s.bucket_size(n - 1), Ok(0));
        assert!(matches!(s.bucket_size(n), Err(Error::OutOfRange(_))));
        assert!(s.bucket_cursors(n).is_err());
    }

    /// Invariant: a bad load factor is rejected at construction.
    #[test]
    fn config_validated() {
        let bad = HashConfig {
            max_load_factor: 0.0,
            ..HashConfig::default()
        };
        assert!(matches!(
            HashSet::<i32>::with_config(bad),
            Err(Error::InvalidArgument(_))
        ));
        let s = HashSet::<i32>::with_config(HashConfig {
            initial_buckets: 64,
            max_load_factor: 0.5,
        })
        .unwrap();
        assert_eq!(s.bucket_count(), 64);
        assert_eq!(s.max_load_factor(), 0.5);
    }

    /// Invariant: every key is found in the bucket `bucket(key)` names.
    #[test]
    fn keys_live_in_their_bucket() {
        let s: HashSet<u64> = (0..200).collect();
        for k in 0..200u64 {
            let b = s.bucket(&k);
            let hit = s.bucket_cursors(b).unwrap().any(|c| c.key(&s) == Some(&k));
            assert!(hit, "key {k} not in bucket {b}");
        }
        assert!(s.load_factor() <= s.max_load_factor());
        s.check_invariants().unwrap();
    }
}
