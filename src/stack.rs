//! Keeps the recursive parser and evaluator off the end of the thread stack.
//!
//! Both recurse once per nested expression, and the evaluator once more per
//! script-level call, so the depth they reach is chosen by the script. Each
//! recursive entry point goes through [ensure_sufficient_stack], which moves
//! onto a freshly allocated segment when the current one runs low.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
