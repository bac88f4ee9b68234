//! assoc-collections: ordered and hashed associative containers (set,
//! multiset, map, multimap) built on one node store, with stable cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: eight containers from three independent pieces, so that each
//!   invariant lives in exactly one place.
//! - Layers:
//!   - NodeStore<K, V>: owns every entry in a `SlotMap` arena and chains
//!     them into a doubly-linked list. Cursors name entries by
//!     generational key; iteration is list order.
//!   - Indices: `TreeIndex` (red-black tree over entry keys) and
//!     `HashIndex<S>` (bucket array of entry keys with stored hashes). An
//!     index never owns a key or value.
//!   - Cores: `OrderedCore` (store + tree + comparator) and `HashedCore`
//!     (store + hash index). The `Policy` type parameter (`Unique` or
//!     `Multi`) selects duplicate handling and the insert return type.
//!   - Facades: `TreeSet`, `TreeMap`, `HashSet`, `HashMap` and their
//!     `Multi` aliases.
//!
//! Ordering contract
//! - Ordered containers: list order is comparator order, and the tree's
//!   in-order sequence is always the list order. Equal keys of a multi
//!   container follow insertion order (per-store sequence ids).
//! - Hashed containers: list order is insertion order, except that a new
//!   multi entry is linked right after the newest equal entry, so equal
//!   keys are contiguous and `equal_range` is a cursor range.
//!
//! Cursors
//! - `Cursor` is `Copy` and borrows nothing; it carries the `StoreId` of
//!   the container state that issued it. Using it with another container
//!   is `InvalidArgument`; using it after its entry was erased is
//!   `InvalidPosition` (the arena generation has moved on).
//! - Traversal is circular through the end sentinel. Reverse traversal is
//!   the generic `Reverse<P>` adapter over any `Bidirectional` position.
//! - `swap` moves whole states, identity included, so cursors follow the
//!   entries they name.
//!
//! Reentrancy policy
//! - Index methods that run user code (comparator, `Hash`, `Eq`) hold a
//!   debug-only reentrancy guard. Touching the same container from inside
//!   that code panics in debug builds; release builds compile it away.
//! - Hashes are computed once at insert and stored. Rehash and erase use
//!   the stored value and never call `K: Hash`.
//!
//! Notes and non-goals
//! - Single-threaded: containers are `Send` but not `Sync`.
//! - Keys are immutable once inserted; maps expose `value_mut` only.
//! - No persistence, no allocator parameter, no concurrent access.

mod compare;
mod cursor;
mod error;
mod hash_index;
mod hash_index_proptest;
mod hash_map;
mod hash_set;
mod hashed;
mod node_store;
mod ordered;
mod policy;
mod reentrancy;
mod tree_index;
mod tree_index_proptest;
mod tree_map;
mod tree_set;

// Public surface
pub use compare::{Compare, FnCompare, Greater, Less};
pub use cursor::{Bidirectional, Bucketed, Container, Cursor, LocalCursor, RevCursor, Reverse};
pub use error::{Error, Result};
pub use hash_index::HashConfig;
pub use hash_map::{HashMap, HashMultiMap};
pub use hash_set::{HashMultiSet, HashSet};
pub use node_store::{EntryKey, Iter, Keys, NodeStore, StoreId, Values};
pub use policy::{Multi, Policy, Unique};
pub use tree_map::{TreeMap, TreeMultiMap};
pub use tree_set::{TreeMultiSet, TreeSet};

pub use hashbrown::hash_map::DefaultHashBuilder;
