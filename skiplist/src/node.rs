//! The skip list node
//!
//! A node owns one forward pointer per level it participates in, a per-node
//! mutex guarding mutation of those pointers, and the two one-way flags
//! (`marked`, `fully_linked`) that the lock-free read paths (the locator and
//! `contains`) synchronize on.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::epoch::Atomic;
use parking_lot::Mutex;

/// A node in the skip list.
///
/// `forward` is indexed `0..=top_level`; index `0` is never read or written
/// by the algorithm (it exists only so that `forward[level]` lines up with
/// the 1-based levels used throughout this crate, matching the layout of
/// the lock-coupling algorithm this crate implements).
pub(crate) struct Node {
    pub(crate) key: u64,
    pub(crate) value: Vec<u8>,
    pub(crate) top_level: usize,
    pub(crate) forward: Vec<Atomic<Node>>,
    /// Guards mutation of `forward` entries for which this node is the
    /// predecessor, and guards the `marked` transition.
    pub(crate) mutex: Mutex<()>,
    pub(crate) marked: AtomicBool,
    pub(crate) fully_linked: AtomicBool,
}

impl Node {
    /// Allocates a new, not-yet-linked node at the given key/value/level.
    ///
    /// `fully_linked` starts `false`; the inserter publishes it only after
    /// every forward link up to `top_level` has been installed in the
    /// node's predecessors.
    pub(crate) fn new(key: u64, value: Vec<u8>, top_level: usize) -> Self {
        let mut forward = Vec::with_capacity(top_level + 1);
        forward.resize_with(top_level + 1, Atomic::null);

        Self {
            key,
            value,
            top_level,
            forward,
            mutex: Mutex::new(()),
            marked: AtomicBool::new(false),
            fully_linked: AtomicBool::new(false),
        }
    }

    /// Allocates the head sentinel: participates in every level up to
    /// `max_level`, key is never compared against (descent always starts
    /// past it).
    pub(crate) fn head(max_level: usize) -> Self {
        Self::new(0, Vec::new(), max_level)
    }

    /// Allocates the tail sentinel, holding the reserved maximum key.
    /// It never needs outgoing links: no live key compares greater than
    /// `u64::MAX`, so no descent ever advances past it.
    pub(crate) fn tail() -> Self {
        Self::new(u64::MAX, Vec::new(), 0)
    }

    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_fully_linked(&self) -> bool {
        self.fully_linked.load(Ordering::Acquire)
    }

    /// Publishes this node as a full member of the map. Must only be called
    /// once all of `forward[1..=top_level]` have been installed in the
    /// node's predecessors.
    #[inline]
    pub(crate) fn publish(&self) {
        self.fully_linked.store(true, Ordering::Release);
    }

    /// Logically deletes this node. Caller must hold `self.mutex`.
    #[inline]
    pub(crate) fn mark(&self) {
        self.marked.store(true, Ordering::Release);
    }
}
