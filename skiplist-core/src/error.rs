//! Error types for the concurrent skip list crate
//!
//! The concurrent operations (`insert`, `erase`, `contains`) never fail; they
//! report their outcome as a `bool`. The one fallible entry point is
//! constructing a list with an out-of-range configuration.

use thiserror::Error;

/// Errors that can occur while configuring or constructing a [`SkipList`].
///
/// [`SkipList`]: https://docs.rs/skiplist
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// `max_level` was zero; a skip list needs at least one level.
    #[error("max_level must be at least 1, got {0}")]
    MaxLevelTooSmall(u8),

    /// `max_level` exceeded the compiled-in structural ceiling.
    #[error("max_level {0} exceeds the maximum supported level {1}")]
    MaxLevelTooLarge(u8, u8),
}

/// A specialized `Result` for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
