use thiserror::Error;

use quill_value::ScriptError;

/// Why a run stopped early.
///
/// `Script` errors are the catchable taxonomy shared with the compiler
/// and natives. The other variants abort the run outright.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RunError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("stack overflow: more than {capacity} values on the evaluation stack")]
    StackOverflow { capacity: usize },

    /// `debugbreak` was executed.
    #[error("debug trap at 0x{pc:04x}")]
    DebugTrap { pc: usize },

    /// The program is not something the compiler could have produced.
    #[error("invalid program: {message}")]
    InvalidProgram { message: String },
}

impl RunError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RunError::InvalidProgram {
            message: message.into(),
        }
    }

    /// Category name for display, matching `ScriptError::kind_name`.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            RunError::Script(e) => e.kind_name(),
            RunError::StackOverflow { .. } => "StackOverflow",
            RunError::DebugTrap { .. } => "DebugTrap",
            RunError::InvalidProgram { .. } => "InvalidProgram",
        }
    }

    /// Fatal errors indicate the VM state can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, RunError::Script(_))
    }
}
