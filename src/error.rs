//! Failure kinds raised by container operations.
//!
//! Lookups that miss are not errors: they return `end()`, `false`, `0` or
//! `None`. Everything here is a precondition violation detected at the call
//! that commits it.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Indexing past valid bounds: a missing key on `get`, a bucket index
    /// beyond `bucket_count()`.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),

    /// A cursor from another container, or a malformed argument such as a
    /// non-positive load factor.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A cursor range whose `first` does not reach `last`.
    #[error("invalid range: {0}")]
    InvalidRange(&'static str),

    /// The end sentinel where an entry is required, or a cursor whose entry
    /// has been erased.
    #[error("invalid position: {0}")]
    InvalidPosition(&'static str),
}
