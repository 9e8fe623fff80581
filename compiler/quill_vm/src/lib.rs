//! Quill VM - executes compiled programs.
//!
//! # Architecture
//!
//! - `Context`: everything a program runs against. Named constants,
//!   the native function table, global variables and the shared heap.
//! - `Vm`: the dispatch loop over one flat value stack that holds both
//!   expression temporaries and call-frame linkage.
//! - `natives`: the standard native library (`print`, `array`, math).
//! - `print_handler`: where `print` output goes.
//!
//! There is no native call stack involved in script recursion: a script
//! that recurses too deep fills the value stack and fails with
//! `RunError::StackOverflow` instead of crashing the host.

mod context;
mod errors;
pub mod natives;
pub mod print_handler;
mod stack;
mod vm;

pub use context::{CallContext, Context, NativeEntry, NativeFlags, NativeFn};
pub use errors::RunError;
pub use print_handler::{buffer_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler};
pub use stack::ValueStack;
pub use vm::{collect, run, Vm, VmConfig};
