//! Quill Value - the value and memory model of the Quill scripting engine.
//!
//! This crate contains the data every other Quill crate agrees on:
//! - `Variant`: the tagged, `Copy` value type scripts compute with
//! - `Heap`: a generational arena of strings, objects and arrays
//! - `Gc`: a shared, lock-guarded handle to the heap with root-counted
//!   mark-sweep collection
//! - Operator evaluation with the numeric promotion order
//! - The script-level error taxonomy
//!
//! # Design Philosophy
//!
//! - **Handles, not pointers**: heap-tagged variants carry a `Handle`
//!   (slot index + generation). A handle that outlives its object is
//!   detected on access instead of dangling.
//! - **One mutation path**: object fields and array elements are only
//!   written through `ScriptObject::set` / `ScriptArray::set`, which keep
//!   the reference multiset used by the mark phase in sync.
//! - **Explicit collection**: nothing here collects on its own. Hosts and
//!   the `collect()` native decide when.

mod cast;
pub mod errors;
mod gc;
mod heap;
mod ops;
mod variant;

pub use cast::{to_f32, to_f64, to_i32, to_i64, to_text};
pub use errors::{ScriptError, ScriptResult};
pub use gc::{Gc, Heap};
pub use heap::{checked_index, Handle, HeapObject, RefSet, ScriptArray, ScriptObject, MAX_ARRAY_LEN};
pub use ops::{evaluate_binary, evaluate_unary, promote, values_equal, BinaryOp, UnaryOp};
pub use variant::{NativeId, NumericKind, Variant};
