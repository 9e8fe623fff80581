//! Script-level errors.
//!
//! `ScriptError` is the single catchable error type that unwinds out of
//! compilation, operator evaluation, opcodes and native functions. Fatal
//! run conditions (stack overflow, debug traps, malformed programs) live
//! in the VM's own error type and wrap this one.
//!
//! The constructor functions below are the public API for building
//! errors: keeping every message in one module keeps wording consistent
//! between the compiler, the VM and the native library.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// A catchable script error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The compiler met a tree it cannot lower.
    #[error("compile error: {message}")]
    Compile { message: String },

    /// An operator or opcode received operand kinds it cannot handle.
    #[error("type error: {message}")]
    Type { message: String },

    /// A native function was called with the wrong argument shape.
    #[error("{message}")]
    Usage { message: String },

    /// Text could not be parsed as the requested number kind.
    #[error("conversion error: cannot convert \"{text}\" to {target}")]
    Conversion { text: String, target: &'static str },

    /// Integer division by zero.
    #[error("arithmetic error: {message}")]
    Arithmetic { message: String },

    /// The script's own `throw`.
    #[error("uncaught throw: {message}")]
    Throw { message: String },
}

impl ScriptError {
    /// Short category name, used by the REPL when printing errors.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Compile { .. } => "CompileError",
            Self::Type { .. } => "TypeError",
            Self::Usage { .. } => "UsageError",
            Self::Conversion { .. } => "ConversionError",
            Self::Arithmetic { .. } => "ArithmeticError",
            Self::Throw { .. } => "ScriptThrow",
        }
    }
}

// Compile errors

pub fn compile_error(message: impl Into<String>) -> ScriptError {
    ScriptError::Compile {
        message: message.into(),
    }
}

// Type errors

pub fn type_error(message: impl Into<String>) -> ScriptError {
    ScriptError::Type {
        message: message.into(),
    }
}

/// Neither operand has a kind the operator can promote to.
pub fn cannot_promote(op: &str, left: &str, right: &str) -> ScriptError {
    type_error(format!("operator `{op}` cannot be applied to {left} and {right}"))
}

pub fn invalid_unary(op: &str, operand: &str) -> ScriptError {
    type_error(format!("operator `{op}` cannot be applied to {operand}"))
}

pub fn cannot_convert(from: &str, target: &str) -> ScriptError {
    type_error(format!("cannot convert {from} to {target}"))
}

pub fn not_callable(type_name: &str) -> ScriptError {
    if type_name == "null" {
        type_error("call on a null value")
    } else {
        type_error(format!("{type_name} is not callable"))
    }
}

pub fn expected_kind(expected: &str, got: &str) -> ScriptError {
    type_error(format!("expected {expected}, got {got}"))
}

pub fn no_property(property: &str, type_name: &str) -> ScriptError {
    type_error(format!("cannot read property `{property}` of {type_name}"))
}

pub fn cannot_set_property(property: &str, type_name: &str) -> ScriptError {
    type_error(format!("cannot set property `{property}` of {type_name}"))
}

pub fn cannot_index(type_name: &str) -> ScriptError {
    type_error(format!("{type_name} cannot be indexed"))
}

pub fn negative_index(index: i64) -> ScriptError {
    type_error(format!("negative index {index}"))
}

pub fn index_too_large(index: i64) -> ScriptError {
    type_error(format!("index {index} exceeds the maximum array length"))
}

pub fn collected_object() -> ScriptError {
    type_error("use of a collected object")
}

pub fn assign_to_builtin(name: &str) -> ScriptError {
    type_error(format!("cannot assign to built-in `{name}`"))
}

pub fn missing_argument(index: usize) -> ScriptError {
    type_error(format!("argument {index} was not supplied by the caller"))
}

// Usage errors

pub fn usage(message: impl Into<String>) -> ScriptError {
    ScriptError::Usage {
        message: message.into(),
    }
}

// Conversion errors

pub fn conversion_failed(text: &str, target: &'static str) -> ScriptError {
    ScriptError::Conversion {
        text: text.to_owned(),
        target,
    }
}

// Arithmetic errors

pub fn division_by_zero() -> ScriptError {
    ScriptError::Arithmetic {
        message: "integer division by zero".to_owned(),
    }
}

// Script throw

pub fn script_throw(message: impl Into<String>) -> ScriptError {
    ScriptError::Throw {
        message: message.into(),
    }
}
