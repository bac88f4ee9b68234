//! Cursor protocol shared by every container.
//!
//! A `Cursor` names a position inside one container: an entry, or the end
//! sentinel. It is a plain `Copy` value and borrows nothing; every access
//! goes through the container, the same way a `Handle` resolves against its
//! map. Cursors stay valid across insertions and erasures of other entries.
//!
//! Reverse traversal is derived, not implemented per container: `Reverse<P>`
//! wraps any `Bidirectional` position and dereferences to the entry just
//! before it.

use crate::node_store::{EntryKey, NodeStore, StoreId};

/// Anything that exposes its entries through a `NodeStore`.
pub trait Container {
    type Key;
    type Value;

    fn node_store(&self) -> &NodeStore<Self::Key, Self::Value>;

    fn begin(&self) -> Cursor {
        self.node_store().begin()
    }

    fn end(&self) -> Cursor {
        self.node_store().end()
    }

    fn rbegin(&self) -> RevCursor {
        Reverse::new(self.end())
    }

    fn rend(&self) -> RevCursor {
        Reverse::new(self.begin())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    store: StoreId,
    pos: Option<EntryKey>,
}

impl Cursor {
    pub(crate) fn new(store: StoreId, pos: Option<EntryKey>) -> Self {
        Self { store, pos }
    }

    pub(crate) fn pos(&self) -> Option<EntryKey> {
        self.pos
    }

    /// Identity of the container state this cursor was issued by.
    pub fn source(&self) -> StoreId {
        self.store
    }

    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    pub fn next<C: Container + ?Sized>(self, c: &C) -> Cursor {
        c.node_store().next(self)
    }

    pub fn prev<C: Container + ?Sized>(self, c: &C) -> Cursor {
        c.node_store().prev(self)
    }

    /// True while the entry is live in `c`.
    pub fn is_valid<C: Container + ?Sized>(&self, c: &C) -> bool {
        c.node_store().contains(*self)
    }

    pub fn key<'a, C: Container + ?Sized>(&self, c: &'a C) -> Option<&'a C::Key> {
        c.node_store().key(*self)
    }

    pub fn value<'a, C: Container + ?Sized>(&self, c: &'a C) -> Option<&'a C::Value> {
        c.node_store().value(*self)
    }

    pub fn entry<'a, C: Container + ?Sized>(
        &self,
        c: &'a C,
    ) -> Option<(&'a C::Key, &'a C::Value)> {
        c.node_store().get(*self)
    }
}

/// A position that can step both ways and names the entry it reads.
pub trait Bidirectional: Copy + Eq {
    fn next_in<C: Container + ?Sized>(self, c: &C) -> Self;

    fn prev_in<C: Container + ?Sized>(self, c: &C) -> Self;

    /// Forward cursor of the entry this position dereferences to.
    fn target<C: Container + ?Sized>(self, c: &C) -> Cursor;
}

impl Bidirectional for Cursor {
    fn next_in<C: Container + ?Sized>(self, c: &C) -> Self {
        self.next(c)
    }

    fn prev_in<C: Container + ?Sized>(self, c: &C) -> Self {
        self.prev(c)
    }

    fn target<C: Container + ?Sized>(self, _c: &C) -> Cursor {
        self
    }
}

/// Offset-by-one reverse adapter: `Reverse(p)` reads the entry before `p`
/// and moves opposite to it. `Reverse(end)` is the reverse begin and
/// `Reverse(begin)` the reverse end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reverse<P> {
    base: P,
}

pub type RevCursor = Reverse<Cursor>;

impl<P: Bidirectional> Reverse<P> {
    pub fn new(base: P) -> Self {
        Self { base }
    }

    /// The underlying position, one past the entry this cursor reads.
    pub fn base(self) -> P {
        self.base
    }

    pub fn next<C: Container + ?Sized>(self, c: &C) -> Self {
        self.next_in(c)
    }

    pub fn prev<C: Container + ?Sized>(self, c: &C) -> Self {
        self.prev_in(c)
    }

    pub fn is_end<C: Container + ?Sized>(self, c: &C) -> bool {
        self.target(c).is_end()
    }

    pub fn key<'a, C: Container + ?Sized>(self, c: &'a C) -> Option<&'a C::Key> {
        self.target(c).key(c)
    }

    pub fn value<'a, C: Container + ?Sized>(self, c: &'a C) -> Option<&'a C::Value> {
        self.target(c).value(c)
    }

    pub fn entry<'a, C: Container + ?Sized>(
        self,
        c: &'a C,
    ) -> Option<(&'a C::Key, &'a C::Value)> {
        self.target(c).entry(c)
    }
}

impl<P: Bidirectional> Bidirectional for Reverse<P> {
    fn next_in<C: Container + ?Sized>(self, c: &C) -> Self {
        Reverse::new(self.base.prev_in(c))
    }

    fn prev_in<C: Container + ?Sized>(self, c: &C) -> Self {
        Reverse::new(self.base.next_in(c))
    }

    fn target<C: Container + ?Sized>(self, c: &C) -> Cursor {
        self.base.prev_in(c).target(c)
    }
}

impl From<Cursor> for RevCursor {
    fn from(c: Cursor) -> Self {
        Reverse::new(c)
    }
}

/// Containers whose entries can also be walked one hash bucket at a time.
pub trait Bucketed: Container {
    /// Entry at position `pos` of bucket `bucket`, in the order the bucket
    /// received its entries.
    fn bucket_entry(&self, bucket: usize, pos: usize) -> Option<Cursor>;
}

/// Position inside one bucket of a hashed container.
///
/// Buckets are not contiguous in the entry list, so a local cursor counts
/// positions within its bucket instead of naming an entry. It is valid until
/// the container is next modified; any insert or erase may renumber the
/// bucket, and a rehash redistributes every bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalCursor {
    store: StoreId,
    bucket: usize,
    pos: usize,
}

impl LocalCursor {
    pub(crate) fn new(store: StoreId, bucket: usize, pos: usize) -> Self {
        Self { store, bucket, pos }
    }

    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn next(self) -> Self {
        Self {
            pos: self.pos + 1,
            ..self
        }
    }

    /// Step back; saturates at the bucket's first position.
    pub fn prev(self) -> Self {
        Self {
            pos: self.pos.saturating_sub(1),
            ..self
        }
    }

    /// The entry this position reads, as a forward cursor. `None` at the
    /// bucket's end or against a container that did not issue it.
    pub fn cursor<C: Bucketed + ?Sized>(&self, c: &C) -> Option<Cursor> {
        if self.store != c.node_store().id() {
            return None;
        }
        c.bucket_entry(self.bucket, self.pos)
    }

    pub fn key<'a, C: Bucketed + ?Sized>(&self, c: &'a C) -> Option<&'a C::Key> {
        self.cursor(c)?.key(c)
    }

    pub fn value<'a, C: Bucketed + ?Sized>(&self, c: &'a C) -> Option<&'a C::Value> {
        self.cursor(c)?.value(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(n: i32) -> NodeStore<i32, ()> {
        let mut s = NodeStore::new();
        for i in 0..n {
            s.push_back(i, ());
        }
        s
    }

    /// Invariant: walking from `rbegin` to `rend` visits entries back to front.
    #[test]
    fn reverse_walk_visits_back_to_front() {
        let s = store(4);
        let mut seen = Vec::new();
        let mut r = s.rbegin();
        while r != s.rend() {
            seen.push(*r.key(&s).unwrap());
            r = r.next(&s);
        }
        assert_eq!(seen, vec![3, 2, 1, 0]);
        assert!(s.rend().is_end(&s));
    }

    /// Invariant: `Reverse(c)` reads the entry before `c`, and reversing a
    /// reverse cursor reads the original entry again.
    #[test]
    fn reverse_is_offset_by_one() {
        let s = store(3);
        let second = s.begin().next(&s);
        let r = Reverse::new(second);
        assert_eq!(r.key(&s), Some(&0));
        assert_eq!(r.prev(&s).key(&s), Some(&1));
        let rr = Reverse::new(r);
        assert_eq!(rr.target(&s), second);
        assert_eq!(rr.next(&s).target(&s), second.next(&s));
    }

    /// Invariant: reverse begin and end coincide on an empty container.
    #[test]
    fn empty_reverse_range() {
        let s = store(0);
        assert_eq!(s.rbegin(), s.rend());
        assert!(s.rbegin().key(&s).is_none());
    }

    /// Invariant: cursors compare equal iff they name the same entry.
    #[test]
    fn equality_is_positional() {
        let s = store(2);
        assert_eq!(s.begin(), s.begin());
        assert_ne!(s.begin(), s.end());
        assert_eq!(s.begin().next(&s).next(&s), s.end());
        assert!(s.begin().is_valid(&s));
        assert!(!s.end().is_valid(&s));
        let other = store(2);
        assert_ne!(s.end(), other.end());
    }
}
