//! Native stack headroom for the tree walkers.
//!
//! Parsing, folding and code generation each descend one Rust frame per
//! level of nesting, so a script of a few thousand nested parentheses can
//! exhaust the thread's stack. Each walker routes its recursive entry
//! through [`with_stack_room`], which switches to a fresh heap-allocated
//! segment when the current one runs low.

/// Headroom below which a new segment is allocated.
const MIN_REMAINING: usize = 128 * 1024;

/// Bytes in each new segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Call `f` with at least [`MIN_REMAINING`] bytes of stack available.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn with_stack_room<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_REMAINING, SEGMENT_SIZE, f)
}

/// No segmented stacks on wasm32; `f` runs directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn with_stack_room<R>(f: impl FnOnce() -> R) -> R {
    f()
}
