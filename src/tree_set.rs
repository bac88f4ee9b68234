//! Ordered sets: `TreeSet` (unique keys) and `TreeMultiSet`.

use crate::compare::{Compare, Less};
use crate::cursor::{Container, Cursor};
use crate::error::Result;
use crate::node_store::{Keys, NodeStore};
use crate::ordered::OrderedCore;
use crate::policy::{Multi, Policy, Unique};
use core::borrow::Borrow;
use core::fmt;

/// Keys kept in comparator order, at most one per equivalence class.
pub struct TreeSet<K, C = Less, P = Unique> {
    core: OrderedCore<K, (), C, P>,
}

/// Keys kept in comparator order; equivalent keys stay in insertion order.
pub type TreeMultiSet<K, C = Less> = TreeSet<K, C, Multi>;

impl<K: Ord, P: Policy> TreeSet<K, Less, P> {
    pub fn new() -> Self {
        Self::with_comparator(Less)
    }
}

impl<K, C: Compare<K>, P: Policy> TreeSet<K, C, P> {
    pub fn with_comparator(comp: C) -> Self {
        Self {
            core: OrderedCore::new(comp),
        }
    }

    /// Build a set from clones of `[first, last)` of another container.
    pub fn from_range<S>(src: &S, first: Cursor, last: Cursor, comp: C) -> Result<Self>
    where
        S: Container<Key = K, Value = ()> + ?Sized,
        K: Clone,
    {
        let mut set = Self::with_comparator(comp);
        set.core.insert_range(src, first, last)?;
        Ok(set)
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

    pub fn iter(&self) -> Keys<'_, K, ()> {
        self.core.store().keys()
    }

    /// Keys of `[first, last)`.
    pub fn range(&self, first: Cursor, last: Cursor) -> Result<Keys<'_, K, ()>> {
        Ok(self.core.store().range(first, last)?.keys())
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

    /// `(cursor, true)` on a new key, `(existing, false)` otherwise; a
    /// multiset always inserts and returns the cursor.
    pub fn insert(&mut self, key: K) -> P::Inserted {
        self.core.emplace(key, ())
    }

    pub fn emplace_hint(&mut self, hint: Cursor, key: K) -> Result<Cursor> {
        self.core.emplace_hint(hint, key, ())
    }

    pub fn insert_range<S>(&mut self, src: &S, first: Cursor, last: Cursor) -> Result<()>
    where
        S: Container<Key = K, Value = ()> + ?Sized,
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

    /// Remove every key equivalent to `q`.
    pub fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.core.erase_key(q)
    }

    pub fn extract(&mut self, pos: Cursor) -> Result<K> {
        self.core.extract(pos).map(|(k, ())| k)
    }

    /// Remove and return the first key equivalent to `q`.
    pub fn extract_key<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
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
        tracing::debug!(left = self.len(), right = other.len(), "tree sets swapped");
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> core::result::Result<(), String> {
        self.core.check_invariants()
    }
}

impl<K, C, P> Container for TreeSet<K, C, P> {
    type Key = K;
    type Value = ();

    fn node_store(&self) -> &NodeStore<K, ()> {
        self.core.store()
    }
}

impl<K, C: Compare<K> + Default, P: Policy> Default for TreeSet<K, C, P> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, C: Clone, P> Clone for TreeSet<K, C, P> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K: fmt::Debug, C, P> fmt::Debug for TreeSet<K, C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.node_store().keys()).finish()
    }
}

impl<K: PartialEq, C, P> PartialEq for TreeSet<K, C, P> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.node_store(), other.node_store());
        a.len() == b.len() && a.keys().eq(b.keys())
    }
}

impl<K: Eq, C, P> Eq for TreeSet<K, C, P> {}

impl<K, C: Compare<K>, P: Policy> Extend<K> for TreeSet<K, C, P> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, C: Compare<K> + Default, P: Policy> FromIterator<K> for TreeSet<K, C, P> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, K, C, P> IntoIterator for &'a TreeSet<K, C, P> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.node_store().keys()
    }
}
