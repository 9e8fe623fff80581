//! Per-function slot allocation and pending loop branches.

use smallvec::SmallVec;

use quill_value::errors::{self, ScriptResult};

use crate::compiler::MAX_LOCALS;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// A top-level chunk: undeclared names become globals.
    TopLevel,
    /// A function body: undeclared names become locals.
    Function,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LateBindKind {
    Break,
    Continue,
}

/// A `Jmp` emitted before its target was known.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LateBind {
    pub at: usize,
    pub kind: LateBindKind,
}

/// Compilation state of one frame.
///
/// Each function literal gets a fresh scope, so nothing an inner
/// function allocates can leak into the enclosing frame.
pub(crate) struct FunctionScope {
    pub kind: FrameKind,
    params: Vec<String>,
    /// Slot index -> name. `None` marks a hidden compiler temporary.
    locals: Vec<Option<String>>,
    /// Holds the old value of a postfix member or index update.
    update_slot: Option<u8>,
    pub late_binds: SmallVec<[LateBind; 8]>,
    pub loop_depth: u32,
}

impl FunctionScope {
    pub fn top_level() -> Self {
        FunctionScope {
            kind: FrameKind::TopLevel,
            params: Vec::new(),
            locals: Vec::new(),
            update_slot: None,
            late_binds: SmallVec::new(),
            loop_depth: 0,
        }
    }

    pub fn function(params: Vec<String>) -> Self {
        FunctionScope {
            kind: FrameKind::Function,
            params,
            ..Self::top_level()
        }
    }

    pub fn param(&self, name: &str) -> Option<u8> {
        self.params
            .iter()
            .position(|p| p == name)
            .map(|i| i as u8)
    }

    pub fn local(&self, name: &str) -> Option<u8> {
        self.locals
            .iter()
            .position(|l| l.as_deref() == Some(name))
            .map(|i| i as u8)
    }

    /// Slot of `name`, allocating the next free one on first use.
    pub fn declare_local(&mut self, name: &str) -> ScriptResult<u8> {
        match self.local(name) {
            Some(slot) => Ok(slot),
            None => self.push_local(Some(name.to_owned())),
        }
    }

    /// A slot no script name can reach.
    pub fn hidden_local(&mut self) -> ScriptResult<u8> {
        self.push_local(None)
    }

    /// Scratch slot for postfix updates. The old value is read back
    /// before any other expression is compiled, so one slot per frame
    /// serves every update in it.
    pub fn update_temp(&mut self) -> ScriptResult<u8> {
        if let Some(slot) = self.update_slot {
            return Ok(slot);
        }
        let slot = self.hidden_local()?;
        self.update_slot = Some(slot);
        Ok(slot)
    }

    fn push_local(&mut self, name: Option<String>) -> ScriptResult<u8> {
        if self.locals.len() >= MAX_LOCALS {
            return Err(errors::compile_error(format!(
                "more than {MAX_LOCALS} local variables in one function"
            )));
        }
        self.locals.push(name);
        Ok((self.locals.len() - 1) as u8)
    }

    /// Final frame size, for the `PushN` at the top of the body.
    pub fn local_count(&self) -> u8 {
        self.locals.len() as u8
    }
}
