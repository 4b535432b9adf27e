//! Error types for fallible map operations.
//!
//! Misses on lookup and duplicate inserts are not errors: they are reported through the end
//! cursor and the `inserted` flag respectively. Only removal by key reports a typed failure, so
//! that callers can tell whether anything was erased without probing with `find` first.

use thiserror::Error;

/// Errors returned by [`BstMap`](crate::BstMap) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No entry with an equivalent key exists in the map.
    ///
    /// The map is left unchanged.
    #[error("no entry found for key")]
    KeyNotFound,
}

/// A `Result` alias using this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
