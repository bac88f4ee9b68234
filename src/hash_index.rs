//! HashIndex: bucket array of references into a `NodeStore`.
//!
//! Each bucket is a `Vec` of entry keys with their stored hash. The hash is
//! computed once, at insert; rehashing and erasing use the stored value and
//! never call back into `K: Hash`. Rehashing only moves references between
//! buckets; the store's links and every cursor are untouched.

use crate::error::{Error, Result};
use crate::node_store::{EntryKey, NodeStore};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use slotmap::SecondaryMap;

pub(crate) const MIN_BUCKET_COUNT: usize = 10;
pub(crate) const DEFAULT_MAX_LOAD_FACTOR: f64 = 1.0;
/// Largest bucket array the index will allocate.
pub(crate) const MAX_BUCKET_COUNT: usize =
    isize::MAX as usize / core::mem::size_of::<Vec<Slot>>();

/// Construction settings for the hashed containers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HashConfig {
    /// Bucket count to start with; raised to the minimum of 10.
    pub initial_buckets: usize,
    /// Ratio of entries to buckets that triggers growth. Finite and > 0.
    pub max_load_factor: f64,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            initial_buckets: MIN_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

fn check_load_factor(z: f64) -> Result<()> {
    if z.is_finite() && z > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(
            "max load factor must be finite and positive",
        ))
    }
}

/// Buckets needed to hold `entries` at load factor `z`.
fn required_buckets(entries: usize, z: f64) -> Result<usize> {
    let n = (entries as f64 / z).ceil();
    if n <= MAX_BUCKET_COUNT as f64 {
        Ok(n as usize)
    } else {
        Err(Error::OutOfRange("bucket count beyond the maximum"))
    }
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    entry: EntryKey,
    hash: u64,
}

#[derive(Clone, Debug)]
pub(crate) struct HashIndex<S> {
    hasher: S,
    buckets: Vec<Vec<Slot>>,
    hashes: SecondaryMap<EntryKey, u64>,
    max_load_factor: f64,
    reentrancy: DebugReentrancy,
}

fn empty_buckets(n: usize) -> Result<Vec<Vec<Slot>>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(n)
        .map_err(|_| Error::OutOfRange("bucket array cannot be allocated"))?;
    buckets.resize_with(n, Vec::new);
    Ok(buckets)
}

impl<S> HashIndex<S> {
    /// Entry at position `pos` of bucket `i`.
    pub(crate) fn bucket_entry(&self, i: usize, pos: usize) -> Option<EntryKey> {
        self.buckets.get(i)?.get(pos).map(|s| s.entry)
    }
}

impl<S: BuildHasher> HashIndex<S> {
    pub(crate) fn new(hasher: S) -> Self {
        Self {
            hasher,
            buckets: std::iter::repeat_with(Vec::new).take(MIN_BUCKET_COUNT).collect(),
            hashes: SecondaryMap::new(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub(crate) fn with_config(hasher: S, config: HashConfig) -> Result<Self> {
        check_load_factor(config.max_load_factor)?;
        if config.initial_buckets > MAX_BUCKET_COUNT {
            return Err(Error::OutOfRange("bucket count beyond the maximum"));
        }
        Ok(Self {
            buckets: empty_buckets(config.initial_buckets.max(MIN_BUCKET_COUNT))?,
            max_load_factor: config.max_load_factor,
            ..Self::new(hasher)
        })
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn len(&self) -> usize {
        self.hashes.len()
    }

    pub(crate) fn hash_of<Q: Hash + ?Sized>(&self, q: &Q) -> u64 {
        let _g = self.reentrancy.enter();
        self.hasher.hash_one(q)
    }

    pub(crate) fn bucket_of_hash(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn bucket_size(&self, i: usize) -> Result<usize> {
        self.buckets
            .get(i)
            .map(Vec::len)
            .ok_or(Error::OutOfRange("bucket index beyond bucket_count()"))
    }

    /// Entries of bucket `i` in the order they were added to it.
    pub(crate) fn bucket_entries(&self, i: usize) -> Result<impl Iterator<Item = EntryKey> + '_> {
        let bucket = self
            .buckets
            .get(i)
            .ok_or(Error::OutOfRange("bucket index beyond bucket_count()"))?;
        Ok(bucket.iter().map(|s| s.entry))
    }

    pub(crate) fn load_factor(&self) -> f64 {
        self.len() as f64 / self.buckets.len() as f64
    }

    pub(crate) fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Fails without changing anything when the current entries would need
    /// more than `MAX_BUCKET_COUNT` buckets under `z`.
    pub(crate) fn set_max_load_factor(&mut self, z: f64) -> Result<()> {
        check_load_factor(z)?;
        let needed = required_buckets(self.len(), z)?;
        self.grow_to(needed)?;
        self.max_load_factor = z;
        Ok(())
    }

    /// Make room for `n` entries without exceeding the max load factor.
    pub(crate) fn reserve(&mut self, n: usize) -> Result<()> {
        self.rehash(required_buckets(n, self.max_load_factor)?)
    }

    /// Grow to at least `n` buckets (and enough for the current load).
    /// Never shrinks; `n <= bucket_count()` does nothing.
    pub(crate) fn rehash(&mut self, n: usize) -> Result<()> {
        if n > MAX_BUCKET_COUNT {
            return Err(Error::OutOfRange("bucket count beyond the maximum"));
        }
        let needed = required_buckets(self.len(), self.max_load_factor)?;
        self.grow_to(n.max(needed))
    }

    fn grow_to(&mut self, n: usize) -> Result<()> {
        let target = n.max(MIN_BUCKET_COUNT);
        let from = self.buckets.len();
        if target <= from {
            return Ok(());
        }
        let old = std::mem::replace(&mut self.buckets, empty_buckets(target)?);
        for slot in old.into_iter().flatten() {
            let i = self.bucket_of_hash(slot.hash);
            self.buckets[i].push(slot);
        }
        tracing::trace!(from, to = target, entries = self.len(), "hash index rehashed");
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        for b in &mut self.buckets {
            b.clear();
        }
        self.hashes.clear();
    }

    /// First entry (in bucket order) whose key equals `q`.
    pub(crate) fn find<K, V, Q>(&self, store: &NodeStore<K, V>, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_hashed(store, self.hash_of(q), q)
    }

    /// `find` with the hash of `q` already computed.
    pub(crate) fn find_hashed<K, V, Q>(
        &self,
        store: &NodeStore<K, V>,
        hash: u64,
        q: &Q,
    ) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let _g = self.reentrancy.enter();
        self.buckets[self.bucket_of_hash(hash)]
            .iter()
            .find(|s| {
                let k: &Q = store.key_of(s.entry).borrow();
                s.hash == hash && k == q
            })
            .map(|s| s.entry)
    }

    /// Every entry whose key equals `q`, in bucket order.
    pub(crate) fn find_all<K, V, Q>(&self, store: &NodeStore<K, V>, q: &Q) -> Vec<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_all_hashed(store, self.hash_of(q), q)
    }

    pub(crate) fn find_all_hashed<K, V, Q>(
        &self,
        store: &NodeStore<K, V>,
        hash: u64,
        q: &Q,
    ) -> Vec<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let _g = self.reentrancy.enter();
        self.buckets[self.bucket_of_hash(hash)]
            .iter()
            .filter(|s| {
                let k: &Q = store.key_of(s.entry).borrow();
                s.hash == hash && k == q
            })
            .map(|s| s.entry)
            .collect()
    }

    /// True when two indexed entries hold equal keys.
    pub(crate) fn same_key<K: Eq, V>(
        &self,
        store: &NodeStore<K, V>,
        a: EntryKey,
        b: EntryKey,
    ) -> bool {
        let _g = self.reentrancy.enter();
        self.hashes.get(a) == self.hashes.get(b) && store.key_of(a) == store.key_of(b)
    }

    /// Index `entry` under `hash`, growing first if the new entry would push
    /// the load factor past the maximum.
    pub(crate) fn insert(&mut self, entry: EntryKey, hash: u64) {
        self.hashes.insert(entry, hash);
        if self.load_factor() > self.max_load_factor {
            let doubled = self.buckets.len().saturating_mul(2).min(MAX_BUCKET_COUNT);
            // A load factor too small to satisfy falls back to doubling.
            let needed = required_buckets(self.len(), self.max_load_factor).unwrap_or(doubled);
            if let Err(e) = self.grow_to(doubled.max(needed)) {
                // The entry still lands in a bucket; only the ratio is off.
                tracing::debug!(error = %e, "hash index could not grow");
            }
        }
        let i = self.bucket_of_hash(hash);
        self.buckets[i].push(Slot { entry, hash });
    }

    /// Drop `entry` from its bucket. Returns false when it is not indexed.
    pub(crate) fn erase(&mut self, entry: EntryKey) -> bool {
        let Some(hash) = self.hashes.remove(entry) else {
            return false;
        };
        let i = self.bucket_of_hash(hash);
        let bucket = &mut self.buckets[i];
        if let Some(p) = bucket.iter().position(|s| s.entry == entry) {
            bucket.remove(p);
        }
        true
    }

    /// Check that every stored entry sits in the bucket its hash selects,
    /// exactly once, and that the load factor is within bounds.
    pub(crate) fn check<K, V>(&self, store: &NodeStore<K, V>) -> Result<(), String> {
        let total: usize = self.buckets.iter().map(Vec::len).sum();
        if total != self.len() || total != store.len() {
            return Err(format!(
                "{} bucket slots, {} hashes, {} entries",
                total,
                self.len(),
                store.len()
            ));
        }
        for (i, bucket) in self.buckets.iter().enumerate() {
            for s in bucket {
                if self.bucket_of_hash(s.hash) != i {
                    return Err(format!("entry filed under bucket {} by mistake", i));
                }
                if self.hashes.get(s.entry) != Some(&s.hash) {
                    return Err("stored hash disagrees with slot".into());
                }
            }
        }
        if self.load_factor() > self.max_load_factor {
            return Err(format!(
                "load factor {} above max {}",
                self.load_factor(),
                self.max_load_factor
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            7
        }
    }

    fn add<S: BuildHasher>(
        store: &mut NodeStore<String, ()>,
        index: &mut HashIndex<S>,
        key: &str,
    ) -> EntryKey {
        let hash = index.hash_of(key);
        let e = store.link_before(None, key.to_string(), ());
        index.insert(e, hash);
        e
    }

    /// Invariant: after every insert the load factor stays within the max.
    #[test]
    fn growth_keeps_load_factor_bounded() {
        let mut store = NodeStore::new();
        let mut index = HashIndex::new(RandomState::new());
        assert_eq!(index.bucket_count(), MIN_BUCKET_COUNT);
        for i in 0..500 {
            add(&mut store, &mut index, &format!("k{}", i));
            assert!(index.load_factor() <= index.max_load_factor());
        }
        index.check(&store).unwrap();
        assert!(index.bucket_count() >= 500);
    }

    /// Invariant: rehash to a smaller count is a no-op; larger counts
    /// redistribute without losing entries.
    #[test]
    fn rehash_only_grows() {
        let mut store = NodeStore::new();
        let mut index = HashIndex::new(RandomState::new());
        let keys: Vec<String> = (0..40).map(|i| format!("k{}", i)).collect();
        for k in &keys {
            add(&mut store, &mut index, k);
        }
        let before = index.bucket_count();
        index.rehash(before - 1).unwrap();
        assert_eq!(index.bucket_count(), before);
        index.rehash(before * 3).unwrap();
        assert!(index.bucket_count() >= before * 3);
        index.check(&store).unwrap();
        for k in &keys {
            assert!(index.find(&store, k.as_str()).is_some());
        }
    }

    /// Invariant: `reserve(n)` sizes the array for `n` entries up front.
    #[test]
    fn reserve_sizes_for_entries() {
        let mut index: HashIndex<RandomState> = HashIndex::new(RandomState::new());
        index.set_max_load_factor(0.5).unwrap();
        index.reserve(100).unwrap();
        assert!(index.bucket_count() >= 200);
    }

    /// Invariant: sizes that cannot be allocated are rejected up front and
    /// leave the index as it was.
    #[test]
    fn oversized_requests_are_out_of_range() {
        let mut store = NodeStore::new();
        let mut index = HashIndex::new(RandomState::new());
        add(&mut store, &mut index, "a");
        let before = index.bucket_count();
        assert!(matches!(
            index.reserve(usize::MAX / 2),
            Err(Error::OutOfRange(_))
        ));
        assert!(matches!(index.rehash(usize::MAX), Err(Error::OutOfRange(_))));
        assert!(matches!(
            index.set_max_load_factor(1e-300),
            Err(Error::OutOfRange(_))
        ));
        assert_eq!(index.bucket_count(), before);
        assert_eq!(index.max_load_factor(), DEFAULT_MAX_LOAD_FACTOR);
        index.check(&store).unwrap();
    }

    /// Invariant: non-positive or non-finite load factors are rejected;
    /// lowering the max rehashes immediately.
    #[test]
    fn max_load_factor_validation_and_effect() {
        let mut store = NodeStore::new();
        let mut index = HashIndex::new(RandomState::new());
        for i in 0..10 {
            add(&mut store, &mut index, &i.to_string());
        }
        assert!(matches!(
            index.set_max_load_factor(0.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(index.set_max_load_factor(f64::NAN).is_err());
        index.set_max_load_factor(0.25).unwrap();
        assert!(index.bucket_count() >= 40);
        index.check(&store).unwrap();
        assert!(HashIndex::with_config(
            RandomState::new(),
            HashConfig {
                initial_buckets: 4,
                max_load_factor: -1.0
            }
        )
        .is_err());
    }

    /// Invariant: bucket accessors reject out-of-range indices.
    #[test]
    fn bucket_bounds() {
        let index: HashIndex<RandomState> = HashIndex::new(RandomState::new());
        assert_eq!(index.bucket_size(0), Ok(0));
        assert!(matches!(
            index.bucket_size(index.bucket_count()),
            Err(Error::OutOfRange(_))
        ));
        assert!(index.bucket_entries(index.bucket_count()).is_err());
    }

    /// Invariant: under total collision, lookups resolve by equality and
    /// erase removes exactly one reference.
    #[test]
    fn collisions_resolve_by_equality() {
        let mut store = NodeStore::new();
        let mut index = HashIndex::new(ConstBuildHasher);
        let a = add(&mut store, &mut index, "a");
        let b = add(&mut store, &mut index, "b");
        let b2 = add(&mut store, &mut index, "b");
        assert_eq!(index.find(&store, "a"), Some(a));
        assert_eq!(index.find(&store, "b"), Some(b));
        assert_eq!(index.find_all(&store, "b"), vec![b, b2]);
        assert_eq!(index.bucket_size(7 % index.bucket_count()), Ok(3));
        assert!(index.erase(b));
        assert!(!index.erase(b));
        store.unlink(b);
        assert_eq!(index.find(&store, "b"), Some(b2));
        index.check(&store).unwrap();
    }
}
