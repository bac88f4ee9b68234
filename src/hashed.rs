//! HashedCore: a `NodeStore` in insertion order plus a `HashIndex`.
//!
//! Iteration follows the list, so a hashed container walks its entries in
//! the order they were inserted. Equal keys of a multi container are
//! linked next to each other, which lets `equal_range` return a plain
//! cursor range.

use crate::cursor::{Container, Cursor, LocalCursor};
use crate::error::Result;
use crate::hash_index::{HashConfig, HashIndex};
use crate::node_store::{EntryKey, NodeStore};
use crate::policy::Policy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;

pub(crate) struct HashedCore<K, V, S, P> {
    store: NodeStore<K, V>,
    index: HashIndex<S>,
    _policy: PhantomData<P>,
}

impl<K: Clone, V: Clone, S: Clone, P> Clone for HashedCore<K, V, S, P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            index: self.index.clone(),
            _policy: PhantomData,
        }
    }
}

impl<K, V, S, P> HashedCore<K, V, S, P> {
    pub(crate) fn store(&self) -> &NodeStore<K, V> {
        &self.store
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn value_mut(&mut self, c: Cursor) -> Option<&mut V> {
        self.store.value_mut(c)
    }

    fn cursor(&self, pos: Option<EntryKey>) -> Cursor {
        self.store.cursor(pos)
    }

    pub(crate) fn bucket_entry(&self, i: usize, pos: usize) -> Option<Cursor> {
        let e = self.index.bucket_entry(i, pos)?;
        Some(self.cursor(Some(e)))
    }
}

impl<K, V, S, P> HashedCore<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: Policy,
{
    pub(crate) fn new(hasher: S) -> Self {
        Self {
            store: NodeStore::new(),
            index: HashIndex::new(hasher),
            _policy: PhantomData,
        }
    }

    pub(crate) fn with_config(hasher: S, config: HashConfig) -> Result<Self> {
        Ok(Self {
            store: NodeStore::new(),
            index: HashIndex::with_config(hasher, config)?,
            _policy: PhantomData,
        })
    }

    pub(crate) fn hasher(&self) -> &S {
        self.index.hasher()
    }

    // ---- lookups ---------------------------------------------------------

    pub(crate) fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.cursor(self.index.find(&self.store, q))
    }

    pub(crate) fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if P::UNIQUE {
            usize::from(!self.find(q).is_end())
        } else {
            self.index.find_all(&self.store, q).len()
        }
    }

    /// Contiguous run of entries equal to `q`, or `(end, end)`.
    pub(crate) fn equal_range<Q>(&self, q: &Q) -> (Cursor, Cursor)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let all = self.index.find_all(&self.store, q);
        let first = all.iter().copied().min_by_key(|&e| self.store.seq_of(e));
        let last = all.iter().copied().max_by_key(|&e| self.store.seq_of(e));
        match (first, last) {
            (Some(f), Some(l)) => (self.cursor(Some(f)), self.cursor(self.store.next_key(l))),
            _ => (self.store.end(), self.store.end()),
        }
    }

    // ---- insertion -------------------------------------------------------

    /// Newest entry equal to `key`, if any.
    fn newest_equal(&self, hash: u64, key: &K) -> Option<EntryKey> {
        self.index
            .find_all_hashed(&self.store, hash, key)
            .into_iter()
            .max_by_key(|&e| self.store.seq_of(e))
    }

    /// True when `h` and its predecessor hold equal keys, so linking before
    /// `h` would land inside their run.
    fn splits_run(&self, h: EntryKey) -> bool {
        self.store
            .prev_key(h)
            .is_some_and(|p| self.index.same_key(&self.store, p, h))
    }

    fn link(&mut self, at: Option<EntryKey>, hash: u64, key: K, value: V) -> Cursor {
        let e = if P::UNIQUE {
            self.store.link_before(at, key, value)
        } else {
            match self.newest_equal(hash, &key) {
                Some(n) => self.store.link_after(Some(n), key, value),
                None => {
                    let at = at.filter(|&h| !self.splits_run(h));
                    self.store.link_before(at, key, value)
                }
            }
        };
        self.index.insert(e, hash);
        self.cursor(Some(e))
    }

    /// Insert `(key, value)` at the back of the list, or right after the
    /// newest equal entry of a multi container.
    pub(crate) fn emplace(&mut self, key: K, value: V) -> P::Inserted {
        let hash = self.index.hash_of(&key);
        if P::UNIQUE {
            if let Some(e) = self.index.find_hashed(&self.store, hash, &key) {
                return P::inserted(self.cursor(Some(e)), false);
            }
        }
        let c = self.link(None, hash, key, value);
        P::inserted(c, true)
    }

    /// Like `emplace`, but a new key with no equal entry is linked before
    /// `hint` instead of at the back. In a multi container a hint inside a
    /// run of equal keys is ignored and the key goes to the back.
    pub(crate) fn emplace_hint(&mut self, hint: Cursor, key: K, value: V) -> Result<Cursor> {
        let at = self.store.resolve(hint)?;
        let hash = self.index.hash_of(&key);
        if P::UNIQUE {
            if let Some(e) = self.index.find_hashed(&self.store, hash, &key) {
                return Ok(self.cursor(Some(e)));
            }
        }
        Ok(self.link(at, hash, key, value))
    }

    pub(crate) fn insert_range<C>(&mut self, src: &C, first: Cursor, last: Cursor) -> Result<()>
    where
        C: Container<Key = K, Value = V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        for (k, v) in src.node_store().range(first, last)? {
            self.emplace(k.clone(), v.clone());
        }
        Ok(())
    }

    // ---- removal ---------------------------------------------------------

    fn detach(&mut self, e: EntryKey) -> (K, V) {
        self.index.erase(e);
        self.store
            .unlink(e)
            .expect("indexed entry must be live in the store")
    }

    pub(crate) fn erase(&mut self, c: Cursor) -> Result<Cursor> {
        let e = self.store.entry_at(c)?;
        let next = self.store.next_key(e);
        self.detach(e);
        Ok(self.cursor(next))
    }

    pub(crate) fn erase_range(&mut self, first: Cursor, last: Cursor) -> Result<Cursor> {
        for e in self.store.span(first, last)? {
            self.detach(e);
        }
        Ok(last)
    }

    pub(crate) fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let all = self.index.find_all(&self.store, q);
        let n = all.len();
        for e in all {
            self.detach(e);
        }
        n
    }

    pub(crate) fn extract(&mut self, c: Cursor) -> Result<(K, V)> {
        let e = self.store.entry_at(c)?;
        Ok(self.detach(e))
    }

    /// Remove and return the oldest entry equal to `q`.
    pub(crate) fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let e = self.equal_range(q).0.pos()?;
        Some(self.detach(e))
    }

    /// Move entries of `source` into `self`, in `source`'s order. In a
    /// unique container keys already present stay behind in `source`.
    pub(crate) fn merge(&mut self, source: &mut Self) {
        let before = self.len();
        let mut cur = source.store.head();
        while let Some(e) = cur {
            cur = source.store.next_key(e);
            if P::UNIQUE && !self.find(source.store.key_of(e)).is_end() {
                continue;
            }
            let (k, v) = source.detach(e);
            self.emplace(k, v);
        }
        tracing::debug!(
            moved = self.len() - before,
            left_behind = source.len(),
            "hashed containers merged"
        );
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.index.clear();
    }

    // ---- buckets ---------------------------------------------------------

    pub(crate) fn bucket<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        self.index.bucket_of_hash(self.index.hash_of(q))
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    pub(crate) fn bucket_size(&self, i: usize) -> Result<usize> {
        self.index.bucket_size(i)
    }

    /// Cursors of the entries in bucket `i`.
    pub(crate) fn bucket_cursors(&self, i: usize) -> Result<impl Iterator<Item = Cursor> + '_> {
        let id = self.store.id();
        Ok(self
            .index
            .bucket_entries(i)?
            .map(move |e| Cursor::new(id, Some(e))))
    }

    pub(crate) fn begin_bucket(&self, i: usize) -> Result<LocalCursor> {
        self.index.bucket_size(i)?;
        Ok(LocalCursor::new(self.store.id(), i, 0))
    }

    pub(crate) fn end_bucket(&self, i: usize) -> Result<LocalCursor> {
        let n = self.index.bucket_size(i)?;
        Ok(LocalCursor::new(self.store.id(), i, n))
    }

    pub(crate) fn load_factor(&self) -> f64 {
        self.index.load_factor()
    }

    pub(crate) fn max_load_factor(&self) -> f64 {
        self.index.max_load_factor()
    }

    pub(crate) fn set_max_load_factor(&mut self, z: f64) -> Result<()> {
        self.index.set_max_load_factor(z)
    }

    pub(crate) fn reserve(&mut self, n: usize) -> Result<()> {
        self.index.reserve(n)
    }

    pub(crate) fn rehash(&mut self, n: usize) -> Result<()> {
        self.index.rehash(n)
    }

    /// Bucket bookkeeping, then contiguity of equal keys along the list.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.index.len() != self.store.len() {
            return Err("index and store disagree on size".into());
        }
        self.index.check(&self.store)?;
        let mut cur = self.store.head();
        while let Some(e) = cur {
            let key = self.store.key_of(e);
            let run = self.index.find_all(&self.store, key).len();
            if run == 0 {
                return Err("entry missing from its bucket".into());
            }
            if P::UNIQUE && run > 1 {
                return Err("duplicate key in a unique container".into());
            }
            let mut last = e;
            for _ in 1..run {
                last = self
                    .store
                    .next_key(last)
                    .filter(|&n| self.store.key_of(n) == key)
                    .ok_or("equal keys are not contiguous")?;
            }
            cur = self.store.next_key(last);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Multi, Unique};
    use std::collections::hash_map::RandomState;

    fn keys<V, P>(core: &HashedCore<&'static str, V, RandomState, P>) -> Vec<&'static str> {
        core.store.keys().copied().collect()
    }

    /// Invariant: iteration follows insertion order, not hash order.
    #[test]
    fn unique_iterates_in_insertion_order() {
        let mut core: HashedCore<&str, i32, RandomState, Unique> =
            HashedCore::new(RandomState::new());
        for (i, k) in ["pear", "fig", "apple", "fig", "kiwi"].into_iter().enumerate() {
            core.emplace(k, i as i32);
        }
        assert_eq!(keys(&core), vec!["pear", "fig", "apple", "kiwi"]);
        let (c, fresh) = core.emplace("apple", 99);
        assert!(!fresh);
        assert_eq!(core.store.value(c), Some(&2));
        core.check_invariants().unwrap();
    }

    /// Invariant: multi duplicates are linked next to the newest equal entry.
    #[test]
    fn multi_duplicates_are_contiguous() {
        let mut core: HashedCore<&str, i32, RandomState, Multi> =
            HashedCore::new(RandomState::new());
        for (i, k) in ["a", "b", "a", "c", "a", "b"].into_iter().enumerate() {
            core.emplace(k, i as i32);
        }
        assert_eq!(keys(&core), vec!["a", "a", "a", "b", "b", "c"]);
        assert_eq!(core.count("a"), 3);
        let (lo, hi) = core.equal_range("a");
        let vals: Vec<i32> = core.store.range(lo, hi).unwrap().map(|(_, v)| *v).collect();
        assert_eq!(vals, vec![0, 2, 4]);
        assert_eq!(core.take("a"), Some(("a", 0)));
        assert_eq!(core.erase_key("a"), 2);
        assert_eq!(core.equal_range("a"), (core.store.end(), core.store.end()));
        core.check_invariants().unwrap();
    }

    /// Invariant: a hint places a new key; an existing key ignores it.
    #[test]
    fn hint_positions_new_keys_only() {
        let mut core: HashedCore<&str, (), RandomState, Unique> =
            HashedCore::new(RandomState::new());
        core.emplace("x", ());
        core.emplace("z", ());
        let z = core.find("z");
        core.emplace_hint(z, "y", ()).unwrap();
        assert_eq!(keys(&core), vec!["x", "y", "z"]);
        let x = core.find("x");
        assert_eq!(core.emplace_hint(core.store.end(), "x", ()).unwrap(), x);
        core.check_invariants().unwrap();
    }

    /// Invariant: a multi hint inside another key's run is ignored, while a
    /// hint at the head of a run is honored.
    #[test]
    fn multi_hint_never_splits_a_run() {
        let mut core: HashedCore<&str, (), RandomState, Multi> =
            HashedCore::new(RandomState::new());
        core.emplace("a", ());
        let second = core.emplace("a", ());
        core.emplace_hint(second, "b", ()).unwrap();
        assert_eq!(keys(&core), vec!["a", "a", "b"]);
        let (lo, hi) = core.equal_range("a");
        assert_eq!(core.store.range(lo, hi).unwrap().count(), 2);
        core.check_invariants().unwrap();

        let head = core.find("a");
        core.emplace_hint(head, "c", ()).unwrap();
        // A repeat of "b" ignores the hint and joins its run.
        core.emplace_hint(second, "b", ()).unwrap();
        assert_eq!(keys(&core), vec!["c", "a", "a", "b", "b"]);
        core.check_invariants().unwrap();
    }

    /// Invariant: rehashing keeps cursors and list order.
    #[test]
    fn rehash_keeps_cursors() {
        let mut core: HashedCore<u32, u32, RandomState, Unique> =
            HashedCore::new(RandomState::new());
        for k in 0..8 {
            core.emplace(k, k);
        }
        let c = core.find(&5);
        core.rehash(1000).unwrap();
        assert!(core.bucket_count() >= 1000);
        assert_eq!(core.store.value(c), Some(&5));
        let order: Vec<u32> = core.store.keys().copied().collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
        let members: usize = (0..core.bucket_count())
            .map(|i| core.bucket_cursors(i).unwrap().count())
            .sum();
        assert_eq!(members, 8);
        core.check_invariants().unwrap();
    }

    /// Invariant: merge moves only keys the target lacks.
    #[test]
    fn merge_unique() {
        let mut a: HashedCore<&str, (), RandomState, Unique> = HashedCore::new(RandomState::new());
        let mut b: HashedCore<&str, (), RandomState, Unique> = HashedCore::new(RandomState::new());
        a.emplace("one", ());
        b.emplace("one", ());
        b.emplace("two", ());
        a.merge(&mut b);
        assert_eq!(keys(&a), vec!["one", "two"]);
        assert_eq!(keys(&b), vec!["one"]);
    }
}
