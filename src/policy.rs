//! Unique-key and multi-key behavior, selected at the type level.
//!
//! Every container is generic over a `Policy`. The policy decides whether
//! an equivalent key blocks an insert and what `insert` returns; the cores
//! branch on `P::UNIQUE`, which is a constant and folds away.

use crate::cursor::Cursor;

mod sealed {
    pub trait Sealed {}
}

pub trait Policy: sealed::Sealed + Copy + Default + core::fmt::Debug + 'static {
    /// Whether an equivalent key already present blocks insertion.
    const UNIQUE: bool;

    /// What `insert`/`emplace` return: `(Cursor, bool)` for unique
    /// containers, the new `Cursor` for multi containers.
    type Inserted: Copy + core::fmt::Debug;

    fn inserted(at: Cursor, fresh: bool) -> Self::Inserted;

    /// The cursor inside an insert result.
    fn cursor_of(r: Self::Inserted) -> Cursor;
}

/// At most one entry per equivalent key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Unique;

/// Any number of entries per key; duplicates keep insertion order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Multi;

impl sealed::Sealed for Unique {}
impl sealed::Sealed for Multi {}

impl Policy for Unique {
    const UNIQUE: bool = true;
    type Inserted = (Cursor, bool);

    #[inline]
    fn inserted(at: Cursor, fresh: bool) -> (Cursor, bool) {
        (at, fresh)
    }

    #[inline]
    fn cursor_of(r: (Cursor, bool)) -> Cursor {
        r.0
    }
}

impl Policy for Multi {
    const UNIQUE: bool = false;
    type Inserted = Cursor;

    #[inline]
    fn inserted(at: Cursor, _fresh: bool) -> Cursor {
        at
    }

    #[inline]
    fn cursor_of(r: Cursor) -> Cursor {
        r
    }
}
