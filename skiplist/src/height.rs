//! Random level sampling for new nodes
//!
//! `rand::thread_rng()` is already a per-thread generator (it lives in a
//! thread-local and is seeded independently per OS thread), so sampling a
//! height never contends with any other thread's insert — exactly what the
//! lock-coupling algorithm needs from this step.

use rand::Rng;

/// Samples a level in `[1, max_level]` with `P(level > n) = 0.5^n`.
///
/// Starts at 1 and, while a fair coin lands heads and the level is still
/// below `max_level`, increments. This is the classic skip list geometric
/// distribution, bounded so a single node can never exceed the list's
/// configured maximum level.
pub(crate) fn sample_level(max_level: usize) -> usize {
    let mut level = 1;
    let mut rng = rand::thread_rng();

    while level < max_level && rng.gen_bool(0.5) {
        level += 1;
    }

    level
}
