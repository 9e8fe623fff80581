//! The standard native library.
//!
//! Every native checks its own argument count and kinds and reports
//! misuse as a `UsageError` naming the expected shape, e.g.
//! `Usage: sqrt(x).`

mod basic;
mod math;

use quill_value::errors::{self, ScriptResult};
use quill_value::Variant;

use crate::context::Context;

/// Register every standard native and constant in `ctx`.
pub fn install(ctx: &mut Context) {
    basic::install(ctx);
    math::install(ctx);
}

/// Check the argument count against `shape` (the text after `Usage: `).
fn arity<const N: usize>(args: &[Variant], shape: &str) -> ScriptResult<[Variant; N]> {
    <[Variant; N]>::try_from(args).map_err(|_| errors::usage(format!("Usage: {shape}.")))
}

/// Numeric value as `f64`, or `None` for non-numeric kinds.
fn as_f64(value: Variant) -> Option<f64> {
    match value {
        Variant::Int32(v) => Some(f64::from(v)),
        Variant::Int64(v) => Some(v as f64),
        Variant::Float32(v) => Some(f64::from(v)),
        Variant::Float64(v) => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
