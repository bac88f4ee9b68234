//! NodeStore: the arena-backed doubly-linked list that owns every entry.
//!
//! Entries live in a `SlotMap` and are chained through `prev`/`next` keys.
//! The indices built on top (tree, hash buckets) only hold `EntryKey`s, so
//! relinking, rebalancing and rehashing never move a value. Keys are
//! generational: a key whose entry was erased never resolves again, which
//! is what makes stale cursors a reported error instead of an alias.
//!
//! Traversal is circular through the end sentinel: `next(last) == end`,
//! `next(end) == begin`, `prev(end) == last`, `prev(begin) == end`.

use crate::cursor::{Container, Cursor};
use crate::error::{Error, Result};
use core::fmt;
use core::iter::FusedIterator;
use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Generational key of one entry inside a `NodeStore`.
    pub struct EntryKey;
}

/// Process-unique identity of one store's backing state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

impl StoreId {
    fn fresh() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    seq: u64,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

pub struct NodeStore<K, V> {
    id: StoreId,
    slots: SlotMap<EntryKey, Node<K, V>>,
    head: Option<EntryKey>,
    tail: Option<EntryKey>,
    // Issues sequence ids; moves with the store on swap.
    next_seq: u64,
}

impl<K, V> Default for NodeStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeStore<K, V> {
    pub fn new() -> Self {
        Self {
            id: StoreId::fresh(),
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
            next_seq: 0,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn begin(&self) -> Cursor {
        self.cursor(self.head)
    }

    pub fn end(&self) -> Cursor {
        self.cursor(None)
    }

    /// Check that `c` belongs to this store and is live. `Ok(None)` is the
    /// end sentinel.
    pub fn resolve(&self, c: Cursor) -> Result<Option<EntryKey>> {
        if c.source() != self.id {
            return Err(Error::InvalidArgument(
                "cursor belongs to another container",
            ));
        }
        match c.pos() {
            None => Ok(None),
            Some(k) if self.slots.contains_key(k) => Ok(Some(k)),
            Some(_) => Err(Error::InvalidPosition("cursor refers to an erased entry")),
        }
    }

    /// Like `resolve`, but the end sentinel is rejected.
    pub(crate) fn entry_at(&self, c: Cursor) -> Result<EntryKey> {
        self.resolve(c)?
            .ok_or(Error::InvalidPosition("end cursor cannot be dereferenced"))
    }

    /// True when `c` points at a live entry of this store.
    pub fn contains(&self, c: Cursor) -> bool {
        matches!(self.resolve(c), Ok(Some(_)))
    }

    pub fn get(&self, c: Cursor) -> Option<(&K, &V)> {
        let k = self.resolve(c).ok()??;
        let n = &self.slots[k];
        Some((&n.key, &n.value))
    }

    pub fn key(&self, c: Cursor) -> Option<&K> {
        self.get(c).map(|(k, _)| k)
    }

    pub fn value(&self, c: Cursor) -> Option<&V> {
        self.get(c).map(|(_, v)| v)
    }

    /// Mutable access to the value only; keys are immutable once stored.
    pub fn value_mut(&mut self, c: Cursor) -> Option<&mut V> {
        let k = self.resolve(c).ok()??;
        Some(&mut self.slots[k].value)
    }

    /// Successor of `c`. Cursors that do not resolve step to `end()`.
    pub fn next(&self, c: Cursor) -> Cursor {
        match self.resolve(c) {
            Ok(Some(k)) => self.cursor(self.slots[k].next),
            Ok(None) => self.begin(),
            Err(_) => self.end(),
        }
    }

    /// Predecessor of `c`. Cursors that do not resolve step to `end()`.
    pub fn prev(&self, c: Cursor) -> Cursor {
        match self.resolve(c) {
            Ok(Some(k)) => self.cursor(self.slots[k].prev),
            Ok(None) => self.cursor(self.tail),
            Err(_) => self.end(),
        }
    }

    /// Link a new entry immediately before `pos` (`end()` appends).
    pub fn insert_before(&mut self, pos: Cursor, key: K, value: V) -> Result<Cursor> {
        let at = self.resolve(pos)?;
        let k = self.link_before(at, key, value);
        Ok(self.cursor(Some(k)))
    }

    pub fn push_back(&mut self, key: K, value: V) -> Cursor {
        let k = self.link_before(None, key, value);
        self.cursor(Some(k))
    }

    /// Erase the entry at `pos` and return a cursor to its successor.
    pub fn erase(&mut self, pos: Cursor) -> Result<Cursor> {
        let k = self.entry_at(pos)?;
        let next = self.slots[k].next;
        self.unlink(k);
        Ok(self.cursor(next))
    }

    /// Erase `[first, last)` and return `last`. The range is validated
    /// before anything is unlinked.
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Result<Cursor> {
        for k in self.span(first, last)? {
            self.unlink(k);
        }
        Ok(last)
    }

    /// Unlink the entry at `pos` and hand back its key and value.
    pub fn remove(&mut self, pos: Cursor) -> Result<(K, V)> {
        let k = self.entry_at(pos)?;
        self.unlink(k)
            .ok_or(Error::InvalidPosition("cursor refers to an erased entry"))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            store: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Iterate `[first, last)`.
    pub fn range(&self, first: Cursor, last: Cursor) -> Result<Iter<'_, K, V>> {
        let span = self.span(first, last)?;
        Ok(Iter {
            store: self,
            front: span.first().copied(),
            back: span.last().copied(),
            remaining: span.len(),
        })
    }

    // ---- crate-internal, key based -------------------------------------

    pub(crate) fn cursor(&self, pos: Option<EntryKey>) -> Cursor {
        Cursor::new(self.id, pos)
    }

    pub(crate) fn head(&self) -> Option<EntryKey> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<EntryKey> {
        self.tail
    }

    pub(crate) fn key_of(&self, k: EntryKey) -> &K {
        &self.slots[k].key
    }

    pub(crate) fn seq_of(&self, k: EntryKey) -> u64 {
        self.slots[k].seq
    }

    pub(crate) fn next_key(&self, k: EntryKey) -> Option<EntryKey> {
        self.slots[k].next
    }

    pub(crate) fn prev_key(&self, k: EntryKey) -> Option<EntryKey> {
        self.slots[k].prev
    }

    /// Keys of `[first, last)` in list order. Fails when walking forward
    /// from `first` hits the end before `last`.
    pub(crate) fn span(&self, first: Cursor, last: Cursor) -> Result<Vec<EntryKey>> {
        let mut cur = self.resolve(first)?;
        let stop = self.resolve(last)?;
        let mut out = Vec::new();
        while cur != stop {
            match cur {
                Some(k) => {
                    out.push(k);
                    cur = self.slots[k].next;
                }
                None => return Err(Error::InvalidRange("first does not precede last")),
            }
        }
        Ok(out)
    }

    pub(crate) fn link_before(&mut self, at: Option<EntryKey>, key: K, value: V) -> EntryKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        let prev = match at {
            Some(a) => self.slots[a].prev,
            None => self.tail,
        };
        let k = self.slots.insert(Node {
            key,
            value,
            seq,
            prev,
            next: at,
        });
        match prev {
            Some(p) => self.slots[p].next = Some(k),
            None => self.head = Some(k),
        }
        match at {
            Some(a) => self.slots[a].prev = Some(k),
            None => self.tail = Some(k),
        }
        k
    }

    /// Link a new entry right after `after` (`None` links at the front).
    pub(crate) fn link_after(&mut self, after: Option<EntryKey>, key: K, value: V) -> EntryKey {
        let at = match after {
            Some(a) => self.slots[a].next,
            None => self.head,
        };
        self.link_before(at, key, value)
    }

    pub(crate) fn unlink(&mut self, k: EntryKey) -> Option<(K, V)> {
        let node = self.slots.remove(k)?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some((node.key, node.value))
    }
}

impl<K, V> Container for NodeStore<K, V> {
    type Key = K;
    type Value = V;

    fn node_store(&self) -> &NodeStore<K, V> {
        self
    }
}

impl<K: Clone, V: Clone> Clone for NodeStore<K, V> {
    /// Copies entries and links; the copy is a different container, so it
    /// gets a fresh identity and cursors into `self` do not resolve in it.
    fn clone(&self) -> Self {
        Self {
            id: StoreId::fresh(),
            slots: self.slots.clone(),
            head: self.head,
            tail: self.tail,
            next_seq: self.next_seq,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// In-order iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    store: &'a NodeStore<K, V>,
    front: Option<EntryKey>,
    back: Option<EntryKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            store: self.store,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iter<'a, K, V> {
    /// The same span, yielding keys only.
    pub fn keys(self) -> Keys<'a, K, V> {
        Keys { inner: self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.store.slots[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.store.slots[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// In-order iterator over keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// In-order iterator over values.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}
