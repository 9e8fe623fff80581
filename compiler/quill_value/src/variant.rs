//! The tagged script value.

use crate::heap::Handle;

/// Index of a host function in the native table of a context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NativeId(pub u32);

/// Numeric kinds in promotion order, narrowest first.
///
/// A binary numeric operator casts both operands to the larger of their
/// two kinds. Note that `Float32` ranks above `Int64`, so mixing the two
/// yields `Float32`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericKind {
    Int32,
    Int64,
    Float32,
    Float64,
}

/// A script value.
///
/// `Variant` is `Copy`: heap-tagged variants hold a `Handle` into the
/// collector, never an owning pointer. Exactly one payload is meaningful
/// per tag.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Variant {
    #[default]
    Null,
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(Handle),
    Object(Handle),
    Array(Handle),
    NativeFunction(NativeId),
    /// Byte offset of a compiled script function.
    CodeAddress(u32),
    /// Frame linkage word pushed by `Call`. Never visible to scripts.
    ReturnLink(usize),
}

impl Variant {
    /// Name of the tag, as reported by `typeof` and in error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::NativeFunction(_) => "native function",
            Self::CodeAddress(_) => "function",
            Self::ReturnLink(_) => "return link",
        }
    }

    /// The heap handle carried by string, object and array values.
    pub const fn heap_handle(&self) -> Option<Handle> {
        match self {
            Self::String(h) | Self::Object(h) | Self::Array(h) => Some(*h),
            _ => None,
        }
    }

    pub const fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Self::Int32(_) => Some(NumericKind::Int32),
            Self::Int64(_) => Some(NumericKind::Int64),
            Self::Float32(_) => Some(NumericKind::Float32),
            Self::Float64(_) => Some(NumericKind::Float64),
            _ => None,
        }
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Boolean coercion: `Null` and numeric zero are false, everything
    /// else (including the empty string) is true.
    pub fn truthy(&self) -> bool {
        match *self {
            Self::Null => false,
            Self::Int32(v) => v != 0,
            Self::Int64(v) => v != 0,
            Self::Float32(v) => v != 0.0,
            Self::Float64(v) => v != 0.0,
            _ => true,
        }
    }

    /// Script boolean: `Int32` 1 or 0.
    pub const fn from_bool(value: bool) -> Self {
        Self::Int32(value as i32)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Self::Float32(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}
