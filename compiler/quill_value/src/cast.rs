//! Explicit casts and the text form of values.

use crate::errors::{self, ScriptResult};
use crate::gc::Heap;
use crate::heap::HeapObject;
use crate::variant::Variant;

pub fn to_i32(heap: &Heap, value: Variant) -> ScriptResult<i32> {
    match value {
        Variant::Int32(v) => Ok(v),
        Variant::Int64(v) => Ok(v as i32),
        Variant::Float32(v) => Ok(v as i32),
        Variant::Float64(v) => Ok(v as i32),
        Variant::String(h) => parse_integer(heap.string(h)?, "int32").map(|v| v as i32),
        other => Err(errors::cannot_convert(other.type_name(), "int32")),
    }
}

pub fn to_i64(heap: &Heap, value: Variant) -> ScriptResult<i64> {
    match value {
        Variant::Int32(v) => Ok(i64::from(v)),
        Variant::Int64(v) => Ok(v),
        Variant::Float32(v) => Ok(v as i64),
        Variant::Float64(v) => Ok(v as i64),
        Variant::String(h) => parse_integer(heap.string(h)?, "int64"),
        other => Err(errors::cannot_convert(other.type_name(), "int64")),
    }
}

pub fn to_f32(heap: &Heap, value: Variant) -> ScriptResult<f32> {
    match value {
        Variant::Int32(v) => Ok(v as f32),
        Variant::Int64(v) => Ok(v as f32),
        Variant::Float32(v) => Ok(v),
        Variant::Float64(v) => Ok(v as f32),
        Variant::String(h) => parse_float(heap.string(h)?, "float32").map(|v| v as f32),
        other => Err(errors::cannot_convert(other.type_name(), "float32")),
    }
}

pub fn to_f64(heap: &Heap, value: Variant) -> ScriptResult<f64> {
    match value {
        Variant::Int32(v) => Ok(f64::from(v)),
        Variant::Int64(v) => Ok(v as f64),
        Variant::Float32(v) => Ok(f64::from(v)),
        Variant::Float64(v) => Ok(v),
        Variant::String(h) => parse_float(heap.string(h)?, "float64"),
        other => Err(errors::cannot_convert(other.type_name(), "float64")),
    }
}

/// Integers accept a float spelling and truncate it.
fn parse_integer(text: &str, target: &'static str) -> ScriptResult<i64> {
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v as i64),
        _ => Err(errors::conversion_failed(text, target)),
    }
}

fn parse_float(text: &str, target: &'static str) -> ScriptResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| errors::conversion_failed(text, target))
}

/// Text form used by `print`, `tostring`, string concatenation and the
/// REPL. Never fails: a stale handle prints as `{Collected}`.
pub fn to_text(heap: &Heap, value: &Variant) -> String {
    match *value {
        Variant::Null => "Null".to_owned(),
        Variant::Int32(v) => v.to_string(),
        Variant::Int64(v) => v.to_string(),
        Variant::Float32(v) => format!("{v:.6}"),
        Variant::Float64(v) => format!("{v:.6}"),
        Variant::String(h) | Variant::Object(h) | Variant::Array(h) => match heap.get(h) {
            Ok(HeapObject::String(text)) => text.to_string(),
            Ok(HeapObject::Object(_)) => "{Object}".to_owned(),
            Ok(HeapObject::Array(_)) => "{Array}".to_owned(),
            Err(_) => "{Collected}".to_owned(),
        },
        Variant::NativeFunction(id) => format!("{{Native#{}}}", id.0),
        Variant::CodeAddress(addr) => format!("{{Function@{addr:#06x}}}"),
        Variant::ReturnLink(_) => "{ReturnLink}".to_owned(),
    }
}

#[cfg(test)]
mod tests;
