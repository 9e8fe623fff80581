//! Quill Compile - lowers a syntax tree into bytecode.
//!
//! Two passes, both over the tree from `quill_syntax`:
//! - `fold_script` (optional): bottom-up constant folding and dead
//!   branch pruning.
//! - `compile` / `compile_append`: a single emission walk that resolves
//!   every name to a global, argument or local slot and patches forward
//!   branches as their targets become known.
//!
//! The compiler never sees the runtime: it asks a `Globals`
//! implementation which names belong to the global table, which are
//! compile-time constants, and which native calls may be folded.

mod compiler;
mod const_fold;
mod globals;
mod scope;

pub use compiler::{compile, compile_append, MAX_ARGS, MAX_LOCALS};
pub use const_fold::fold_script;
pub use globals::{Globals, NoGlobals};
