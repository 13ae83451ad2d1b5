//! Stack growth for the recursive parser and evaluator.
//!
//! Deeply nested forms recurse once per nesting level, so both passes wrap
//! their recursive step in [`ensure_sufficient_stack`].

/// Grow the stack when less than this remains (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
