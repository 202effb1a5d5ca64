//! A concurrent ordered map keyed by `u64`.
//!
//! The map is implemented as a lock-coupling skip list: reads
//! ([`SkipList::contains`]) are lock-free, and writes
//! ([`SkipList::insert`], [`SkipList::erase`]) synchronize only on the
//! handful of per-node locks their own key touches, never on a list-wide
//! lock. See [`SkipList`] for the full API.

mod config;
mod height;
mod node;
mod skiplist;

pub use config::{SkiplistConfig, DEFAULT_MAX_LEVEL, MAX_SUPPORTED_LEVEL};
pub use skiplist::SkipList;
pub use skiplist_core::{Error, Result};
