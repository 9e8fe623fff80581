//! A persistent compile-and-run session.

use rustc_hash::FxHashSet;
use thiserror::Error;

use quill_bytecode::Program;
use quill_compile::{compile_append, fold_script};
use quill_syntax::{parse, ParseError};
use quill_value::{ScriptError, Variant};
use quill_vm::{Context, RunError, Vm, VmConfig};

use crate::diagnostic::render_parse_error;
use crate::host::HostGlobals;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Run the constant folder before compiling.
    pub optimize: bool,
    pub vm: VmConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            optimize: true,
            vm: VmConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(ScriptError),
    #[error(transparent)]
    Run(#[from] RunError),
}

impl SessionError {
    /// Human-readable report. Parse errors get a source snippet.
    pub fn render(&self, path: &str, source: &str) -> String {
        match self {
            SessionError::Parse(e) => render_parse_error(path, source, e),
            other => format!("error: {other}\n"),
        }
    }

    /// Errors that end the current run but not the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Run(e) if e.is_fatal())
    }
}

/// One context and one growing program image.
///
/// Every `eval` appends a new top-level chunk, so functions defined by
/// earlier entries keep their code addresses.
pub struct Session {
    ctx: Context,
    program: Program,
    declared: FxHashSet<String>,
    config: SessionConfig,
    vm: Vm,
}

impl Session {
    pub fn new() -> Self {
        Self::with_context(Context::new(), SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_context(Context::new(), config)
    }

    pub fn with_context(ctx: Context, config: SessionConfig) -> Self {
        Session {
            ctx,
            program: Program::new(),
            declared: FxHashSet::default(),
            vm: Vm::new(config.vm.clone()),
            config,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Parse, fold and append `source` without running it. Returns the
    /// new chunk's entry offset.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compile(&mut self, source: &str) -> Result<u32, SessionError> {
        let mut script = parse(source)?;
        let globals = HostGlobals::new(&mut self.ctx);
        if self.config.optimize {
            let folded = fold_script(&mut script, &globals);
            tracing::trace!(folded, "optimized");
        }
        compile_append(&mut self.program, &script, &globals, &mut self.declared)
            .map_err(SessionError::Compile)
    }

    /// Compile `source` and run it. Returns the value of a top-level
    /// `return`, or null.
    pub fn eval(&mut self, source: &str) -> Result<Variant, SessionError> {
        self.compile(source)?;
        self.run()
    }

    /// Run the program from its current entry point.
    pub fn run(&mut self) -> Result<Variant, SessionError> {
        Ok(self.vm.run(&self.program, &mut self.ctx)?)
    }

    /// Replace the program image, e.g. with one loaded from disk, and
    /// run it.
    pub fn run_image(&mut self, program: Program) -> Result<Variant, SessionError> {
        self.program = program;
        self.declared.clear();
        self.run()
    }

    /// Host collection from the global roots. Returns the number freed.
    pub fn collect(&self) -> usize {
        quill_vm::collect(&self.ctx)
    }

    pub fn object_count(&self) -> usize {
        self.ctx.gc().object_count()
    }

    pub fn display(&self, value: &Variant) -> String {
        self.ctx.display(value)
    }

    pub fn disassemble(&self) -> String {
        self.program.disassemble()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
