//! Debug-only reentrancy guard.
//!
//! The indices call into user code (comparators, hashers, `Eq`) while
//! their structure is being read or rewired. Calling back into the same
//! container from there is unsupported; in debug builds the guard turns it
//! into a panic, in release builds it compiles to nothing.

use core::cell::Cell;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

/// Per-index tracker. Guard user-code call sites with
/// `let _g = self.reentrancy.enter();`.
///
/// Not `Sync`; `Send` is kept so callers can move a container behind their
/// own lock.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    #[cfg(not(debug_assertions))]
    _unsync: PhantomData<Cell<()>>,
}

impl Clone for DebugReentrancy {
    // A clone starts outside any guarded section.
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            #[cfg(not(debug_assertions))]
            _unsync: PhantomData,
        }
    }

    /// Enter a guarded section. Panics in debug builds when already inside
    /// one.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(
                d == 0,
                "reentrancy detected: container used from inside its own comparator or hasher"
            );
            self.depth.set(d + 1);
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}
