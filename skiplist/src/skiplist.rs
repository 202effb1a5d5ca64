//! The concurrent ordered map
//!
//! Implements the lazy / optimistic lock-coupling skip list: a lock-free
//! descent (`find_node`) produces per-level predecessor/successor snapshots,
//! which `insert` and `erase` revalidate under per-node locks before
//! mutating; `contains` never locks at all and relies entirely on the
//! `fully_linked`/`marked` acquire/release pair to stay correct.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use log::trace;
use parking_lot::MutexGuard;
use skiplist_core::Result;

use crate::config::SkiplistConfig;
use crate::height::sample_level;
use crate::node::Node;

/// Per-level predecessor/successor snapshot produced by a lock-free descent.
///
/// Both vectors are indexed `0..=max_level`; index `0` is unused, matching
/// [`Node::forward`](crate::node::Node).
struct Locator<'g> {
    preds: Vec<Shared<'g, Node>>,
    succs: Vec<Shared<'g, Node>>,
    found_level: Option<usize>,
}

/// A concurrent ordered map keyed by `u64`, implemented as a lock-coupling
/// skip list.
///
/// `insert`, `erase`, and `contains` are all safe to call from arbitrarily
/// many threads at once with no external synchronization. `contains` never
/// blocks; `insert` and `erase` block only while holding the handful of
/// per-node locks their own key touches, never a list-wide lock.
///
/// # Example
///
/// ```
/// use skiplist::SkipList;
///
/// let list = SkipList::with_max_level(16).unwrap();
/// assert!(list.insert(1, b"a".to_vec()));
/// assert!(!list.insert(1, b"b".to_vec())); // no overwrite on collision
/// assert!(list.contains(1));
/// assert!(list.erase(1));
/// assert!(!list.contains(1));
/// ```
pub struct SkipList {
    max_level: usize,
    head: Atomic<Node>,
    len: AtomicUsize,
}

// SkipList is Send + Sync because every field is:
// - `Atomic<Node>` is Send + Sync as long as `Node` is, and `Node`'s only
//   interior-mutable fields (`Atomic<Node>` forward links, `Mutex<()>`,
//   `AtomicBool`s) are themselves Send + Sync.
// - `AtomicUsize` is Send + Sync.

impl SkipList {
    /// Creates an empty skip list from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config.max_level` is `0` or exceeds
    /// [`MAX_SUPPORTED_LEVEL`](crate::config::MAX_SUPPORTED_LEVEL).
    pub fn new(config: SkiplistConfig) -> Result<Self> {
        config.validate()?;

        let max_level = config.max_level as usize;
        let guard = &epoch::pin();

        let tail = Owned::new(Node::tail()).into_shared(guard);
        let head = Node::head(max_level);
        for level in 1..=max_level {
            head.forward[level].store(tail, Ordering::Relaxed);
        }

        Ok(Self {
            max_level,
            head: Atomic::new(head),
            len: AtomicUsize::new(0),
        })
    }

    /// Shorthand for `SkipList::new(SkiplistConfig::new(max_level))`.
    ///
    /// # Errors
    ///
    /// See [`SkipList::new`].
    pub fn with_max_level(max_level: u8) -> Result<Self> {
        Self::new(SkiplistConfig::new(max_level))
    }

    /// The lock-free descent shared by `insert`, `erase`, and `contains`.
    ///
    /// For each level from `max_level` down to `1`, advances `curr` while
    /// its key is less than `key`, recording the predecessor/successor pair
    /// at that level. Returns a snapshot: callers must revalidate it under
    /// locks before mutating anything it points at.
    fn find_node<'g>(&self, key: u64, guard: &'g Guard) -> Locator<'g> {
        let mut preds = vec![Shared::null(); self.max_level + 1];
        let mut succs = vec![Shared::null(); self.max_level + 1];
        let mut found_level = None;

        let mut pred = self.head.load(Ordering::Acquire, guard);
        for level in (1..=self.max_level).rev() {
            let mut curr = unsafe { pred.deref() }.forward[level].load(Ordering::Acquire, guard);

            while unsafe { curr.deref() }.key < key {
                pred = curr;
                curr = unsafe { curr.deref() }.forward[level].load(Ordering::Acquire, guard);
            }

            if found_level.is_none() && unsafe { curr.deref() }.key == key {
                found_level = Some(level);
            }

            preds[level] = pred;
            succs[level] = curr;
        }

        Locator {
            preds,
            succs,
            found_level,
        }
    }

    /// Inserts `key` with `value`. Returns `true` iff `key` was not already
    /// a live member of the map; on collision the existing value is left
    /// untouched.
    ///
    /// `key` must not be `u64::MAX`, which is reserved for the tail
    /// sentinel; violating this is a programming error, checked only in
    /// debug builds.
    pub fn insert(&self, key: u64, value: Vec<u8>) -> bool {
        debug_assert_ne!(
            key,
            u64::MAX,
            "u64::MAX is reserved for the tail sentinel and must not be inserted"
        );

        let top_layer = sample_level(self.max_level);
        let guard = &epoch::pin();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let loc = self.find_node(key, guard);

            if let Some(found_level) = loc.found_level {
                let node = unsafe { loc.succs[found_level].deref() };
                if node.is_marked() {
                    trace!(
                        "insert({key}): existing node is marked for deletion, retrying (attempt {attempt})"
                    );
                    continue;
                }
                while !node.is_fully_linked() {
                    std::hint::spin_loop();
                }
                return false;
            }

            let (locked, valid) = self.lock_and_validate_preds(&loc, top_layer, guard);
            if !valid {
                drop(locked);
                trace!("insert({key}): predecessor validation failed, retrying (attempt {attempt})");
                continue;
            }

            let new_node = Owned::new(Node::new(key, value, top_layer)).into_shared(guard);
            let new_node_ref = unsafe { new_node.deref() };
            for level in 1..=top_layer {
                new_node_ref.forward[level].store(loc.succs[level], Ordering::Relaxed);
            }
            for level in 1..=top_layer {
                let pred = unsafe { loc.preds[level].deref() };
                pred.forward[level].store(new_node, Ordering::Release);
            }

            new_node_ref.publish();
            drop(locked);
            self.len.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    }

    /// Removes `key`. Returns `true` iff `key` was a live member of the map
    /// at the moment it was physically unlinked.
    pub fn erase(&self, key: u64) -> bool {
        let guard = &epoch::pin();

        let mut is_marked = false;
        let mut node_to_delete: Shared<'_, Node> = Shared::null();
        let mut top_layer = 0usize;
        let mut victim_lock: Option<MutexGuard<'_, ()>> = None;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let loc = self.find_node(key, guard);

            let can_try = is_marked
                || loc.found_level.is_some_and(|level| {
                    ok_to_delete(unsafe { loc.succs[level].deref() }, level)
                });
            if !can_try {
                return false;
            }

            if !is_marked {
                let found_level = loc.found_level.expect("can_try implies found_level is Some");
                node_to_delete = loc.succs[found_level];
                let node = unsafe { node_to_delete.deref() };
                top_layer = node.top_level;

                let lock = node.mutex.lock();
                if node.is_marked() {
                    return false;
                }
                node.mark();
                is_marked = true;
                victim_lock = Some(lock);
            }

            let (locked, valid) = self.lock_and_validate_erase_preds(&loc, top_layer, node_to_delete, guard);
            if !valid {
                drop(locked);
                trace!("erase({key}): predecessor validation failed, retrying (attempt {attempt})");
                continue;
            }

            let victim = unsafe { node_to_delete.deref() };
            for level in (1..=top_layer).rev() {
                let pred = unsafe { loc.preds[level].deref() };
                let next = victim.forward[level].load(Ordering::Acquire, guard);
                pred.forward[level].store(next, Ordering::Release);
            }

            drop(locked);
            drop(victim_lock.take());
            unsafe {
                guard.defer_destroy(node_to_delete);
            }
            self.len.fetch_sub(1, Ordering::Relaxed);
            return true;
        }
    }

    /// Returns whether `key` is currently a live member of the map. Never
    /// blocks.
    pub fn contains(&self, key: u64) -> bool {
        let guard = &epoch::pin();
        let loc = self.find_node(key, guard);

        match loc.found_level {
            Some(level) => {
                let node = unsafe { loc.succs[level].deref() };
                node.is_fully_linked() && !node.is_marked()
            }
            None => false,
        }
    }

    /// Returns the number of live keys. Approximate under concurrent
    /// mutation; exact at quiescence.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns `true` iff [`len`](Self::len) is `0`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bottom-level key sequence, ending with `u64::MAX` (the
    /// tail sentinel).
    ///
    /// Not safe to call concurrently with mutation: there is no guarantee
    /// the result reflects any single point in time if `insert`/`erase`
    /// run in parallel with it.
    pub fn traverse(&self) -> Vec<u64> {
        let guard = &epoch::pin();
        let mut keys = Vec::new();
        let mut curr = unsafe { self.head.load(Ordering::Acquire, guard).deref() }.forward[1]
            .load(Ordering::Acquire, guard);

        loop {
            let node = unsafe { curr.deref() };
            keys.push(node.key);
            if node.key == u64::MAX {
                break;
            }
            curr = node.forward[1].load(Ordering::Acquire, guard);
        }

        keys
    }

    /// Locks the distinct predecessors `preds[1..=top_layer]` in ascending
    /// level order (comparing each against only the previously locked one,
    /// since predecessors are non-decreasing in list position as the level
    /// decreases and so duplicates always run contiguously), then validates,
    /// for every level, that neither the predecessor nor the successor has
    /// been marked and that the predecessor's link still points at the
    /// successor.
    fn lock_and_validate_preds<'g>(
        &self,
        loc: &Locator<'g>,
        top_layer: usize,
        guard: &'g Guard,
    ) -> (Vec<MutexGuard<'g, ()>>, bool) {
        let mut locked = Vec::with_capacity(top_layer);
        let mut last_locked: Option<*const Node> = None;

        for level in 1..=top_layer {
            let pred = unsafe { loc.preds[level].deref() };
            let pred_ptr = pred as *const Node;
            if last_locked != Some(pred_ptr) {
                locked.push(pred.mutex.lock());
                last_locked = Some(pred_ptr);
            }
        }

        let mut valid = true;
        for level in 1..=top_layer {
            let pred = unsafe { loc.preds[level].deref() };
            let succ = loc.succs[level];
            let succ_marked = unsafe { succ.deref() }.is_marked();
            if pred.is_marked()
                || succ_marked
                || pred.forward[level].load(Ordering::Acquire, guard) != succ
            {
                valid = false;
                break;
            }
        }

        (locked, valid)
    }

    /// As [`lock_and_validate_preds`](Self::lock_and_validate_preds), but
    /// for erase: additionally requires `succs[level]` to still be the
    /// node being deleted.
    fn lock_and_validate_erase_preds<'g>(
        &self,
        loc: &Locator<'g>,
        top_layer: usize,
        node_to_delete: Shared<'g, Node>,
        guard: &'g Guard,
    ) -> (Vec<MutexGuard<'g, ()>>, bool) {
        let mut locked = Vec::with_capacity(top_layer);
        let mut last_locked: Option<*const Node> = None;

        for level in 1..=top_layer {
            let pred = unsafe { loc.preds[level].deref() };
            let pred_ptr = pred as *const Node;
            if last_locked != Some(pred_ptr) {
                locked.push(pred.mutex.lock());
                last_locked = Some(pred_ptr);
            }
        }

        let mut valid = true;
        for level in 1..=top_layer {
            let pred = unsafe { loc.preds[level].deref() };
            let succ = loc.succs[level];
            if pred.is_marked()
                || succ != node_to_delete
                || pred.forward[level].load(Ordering::Acquire, guard) != succ
            {
                valid = false;
                break;
            }
        }

        (locked, valid)
    }
}

/// `ok_to_delete(node, level) := node.fully_linked ∧ node.top_level == level ∧ ¬node.marked`.
///
/// The `top_level == level` guard ensures erase only physically unlinks
/// through a node's own top level, never a level at which it merely
/// happens to share a key with the search target.
fn ok_to_delete(node: &Node, level: usize) -> bool {
    node.is_fully_linked() && node.top_level == level && !node.is_marked()
}

impl Drop for SkipList {
    fn drop(&mut self) {
        let guard = &epoch::pin();
        let mut curr = self.head.load(Ordering::Acquire, guard);

        loop {
            let next = unsafe { curr.deref() }
                .forward
                .get(1)
                .map(|link| link.load(Ordering::Acquire, guard));
            unsafe {
                guard.defer_destroy(curr);
            }
            match next {
                Some(next_node) => curr = next_node,
                None => break,
            }
        }
    }
}
