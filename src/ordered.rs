//! OrderedCore: a `NodeStore` kept in comparator order by a `TreeIndex`.
//!
//! Every insert picks the list position first (the lower or upper bound,
//! or an accepted hint) and then indexes the new entry so the tree's
//! in-order sequence is the list order. Equal keys in a multi container
//! are ordered by their sequence id, which keeps them in insertion order.

use crate::compare::Compare;
use crate::cursor::{Container, Cursor};
use crate::error::Result;
use crate::node_store::{EntryKey, NodeStore};
use crate::policy::Policy;
use crate::tree_index::TreeIndex;
use core::borrow::Borrow;
use core::marker::PhantomData;

pub(crate) struct OrderedCore<K, V, C, P> {
    store: NodeStore<K, V>,
    tree: TreeIndex,
    comp: C,
    _policy: PhantomData<P>,
}

impl<K: Clone, V: Clone, C: Clone, P> Clone for OrderedCore<K, V, C, P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            tree: self.tree.clone(),
            comp: self.comp.clone(),
            _policy: PhantomData,
        }
    }
}

/// Tree order for a new entry `a` against an indexed entry `b`.
fn precedes<K, V, C, P>(store: &NodeStore<K, V>, comp: &C, a: EntryKey, b: EntryKey) -> bool
where
    C: Compare<K>,
    P: Policy,
{
    let (ka, kb) = (store.key_of(a), store.key_of(b));
    if comp.less(ka, kb) {
        return true;
    }
    !P::UNIQUE && !comp.less(kb, ka) && store.seq_of(a) < store.seq_of(b)
}

impl<K, V, C, P> OrderedCore<K, V, C, P> {
    pub(crate) fn store(&self) -> &NodeStore<K, V> {
        &self.store
    }

    pub(crate) fn comp(&self) -> &C {
        &self.comp
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
}

impl<K, V, C, P> OrderedCore<K, V, C, P>
where
    C: Compare<K>,
    P: Policy,
{
    pub(crate) fn new(comp: C) -> Self {
        Self {
            store: NodeStore::new(),
            tree: TreeIndex::new(),
            comp,
            _policy: PhantomData,
        }
    }

    // ---- lookups ---------------------------------------------------------

    pub(crate) fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let hit = self
            .tree
            .find_nearest(&self.store, &self.comp, q)
            .filter(|&e| {
                let k: &Q = self.store.key_of(e).borrow();
                self.comp.equivalent(q, k)
            });
        self.cursor(hit)
    }

    pub(crate) fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        if P::UNIQUE {
            return usize::from(!self.find(q).is_end());
        }
        let mut n = 0;
        let mut cur = self.tree.lower_bound(&self.store, &self.comp, q);
        while let Some(e) = cur {
            let k: &Q = self.store.key_of(e).borrow();
            if !self.comp.equivalent(q, k) {
                break;
            }
            n += 1;
            cur = self.store.next_key(e);
        }
        n
    }

    pub(crate) fn lower_bound<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.cursor(self.tree.lower_bound(&self.store, &self.comp, q))
    }

    pub(crate) fn upper_bound<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.cursor(self.tree.upper_bound(&self.store, &self.comp, q))
    }

    pub(crate) fn equal_range<Q>(&self, q: &Q) -> (Cursor, Cursor)
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        (self.lower_bound(q), self.upper_bound(q))
    }

    // ---- insertion -------------------------------------------------------

    fn index(&mut self, entry: EntryKey) {
        let store = &self.store;
        let comp = &self.comp;
        self.tree
            .insert(entry, |a, b| precedes::<K, V, C, P>(store, comp, a, b));
    }

    /// Insert `(key, value)`. A unique container leaves an existing
    /// equivalent entry alone and reports it; a multi container places the
    /// new entry after every equivalent one.
    pub(crate) fn emplace(&mut self, key: K, value: V) -> P::Inserted {
        if P::UNIQUE {
            let lb = self.tree.lower_bound(&self.store, &self.comp, &key);
            if let Some(e) = lb {
                if !self.comp.less(&key, self.store.key_of(e)) {
                    return P::inserted(self.cursor(Some(e)), false);
                }
            }
            let e = self.store.link_before(lb, key, value);
            self.index(e);
            P::inserted(self.cursor(Some(e)), true)
        } else {
            let ub = self.tree.upper_bound(&self.store, &self.comp, &key);
            let e = self.store.link_before(ub, key, value);
            self.index(e);
            P::inserted(self.cursor(Some(e)), true)
        }
    }

    /// Insert with a position hint. The hint is taken when the key fits
    /// immediately before it; otherwise this is a plain `emplace`.
    pub(crate) fn emplace_hint(&mut self, hint: Cursor, key: K, value: V) -> Result<Cursor> {
        let at = self.store.resolve(hint)?;
        let prev = match at {
            Some(h) => self.store.prev_key(h),
            None => self.store.tail(),
        };
        let after_prev = match prev {
            None => true,
            Some(p) if P::UNIQUE => self.comp.less(self.store.key_of(p), &key),
            Some(p) => !self.comp.less(&key, self.store.key_of(p)),
        };
        let before_hint = match at {
            None => true,
            Some(h) => self.comp.less(&key, self.store.key_of(h)),
        };
        if after_prev && before_hint {
            let e = self.store.link_before(at, key, value);
            self.tree.insert_after(prev, e);
            return Ok(self.cursor(Some(e)));
        }
        Ok(P::cursor_of(self.emplace(key, value)))
    }

    /// Insert clones of `[first, last)` from `src`.
    pub(crate) fn insert_range<S>(&mut self, src: &S, first: Cursor, last: Cursor) -> Result<()>
    where
        S: Container<Key = K, Value = V> + ?Sized,
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
        self.tree.erase(e);
        self.store
            .unlink(e)
            .expect("indexed entry must be live in the store")
    }

    /// Remove the entry at `c`; returns the cursor after it.
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

    /// Remove every entry equivalent to `q`; returns how many went.
    pub(crate) fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let (first, last) = self.equal_range(q);
        let span = self
            .store
            .span(first, last)
            .expect("equal_range of a live tree is a valid span");
        let n = span.len();
        for e in span {
            self.detach(e);
        }
        n
    }

    pub(crate) fn extract(&mut self, c: Cursor) -> Result<(K, V)> {
        let e = self.store.entry_at(c)?;
        Ok(self.detach(e))
    }

    /// Remove and return the first entry equivalent to `q`.
    pub(crate) fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let e = self.find(q).pos()?;
        Some(self.detach(e))
    }

    /// Move entries out of `source` into `self`. In a unique container an
    /// entry whose key is already present stays behind in `source`.
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
            "ordered containers merged"
        );
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.tree.clear();
    }

    /// Red-black shape, tree/list agreement, then key order along the list.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        self.tree.check(&self.store)?;
        let mut cur = self.store.head();
        while let Some(e) = cur {
            let next = self.store.next_key(e);
            if let Some(n) = next {
                let (ka, kb) = (self.store.key_of(e), self.store.key_of(n));
                if self.comp.less(kb, ka) {
                    return Err("entries out of comparator order".into());
                }
                if !self.comp.less(ka, kb) {
                    if P::UNIQUE {
                        return Err("equivalent keys in a unique container".into());
                    }
                    if self.store.seq_of(e) > self.store.seq_of(n) {
                        return Err("equal keys out of insertion order".into());
                    }
                }
            }
            cur = next;
        }
        Ok(())
    }
}
