//! Syntax tree to bytecode.
//!
//! # Name resolution
//!
//! A bare identifier resolves, in order, to:
//! 1. the global table, if the host knows the name or it was declared
//!    as a global earlier in this session;
//! 2. a parameter of the function being compiled;
//! 3. a local slot already allocated in this frame;
//! 4. at top level, a new global; inside a function, the next free
//!    local slot.
//!
//! Locals are discovered by first use, so each frame starts with a
//! `PushN 0` that is patched with the final slot count once the body
//! has been emitted.
//!
//! # Stack effects
//!
//! Every expression leaves exactly one value. Stores leave the stored
//! value in place; expression statements drop it with `Pop`.

use rustc_hash::FxHashSet;

use quill_bytecode::{Opcode, Program};
use quill_syntax::ast::{
    DeclScope, Expr, ExprKind, FunctionLit, Literal, Script, Stmt, StmtKind, UpdateOp,
};
use quill_syntax::with_stack_room;
use quill_value::errors::{self, ScriptResult};
use quill_value::{BinaryOp, UnaryOp};

use crate::globals::Globals;
use crate::scope::{FrameKind, FunctionScope, LateBind, LateBindKind};

/// Most locals one frame can hold (`PushN` takes one byte).
pub const MAX_LOCALS: usize = 255;

/// Most arguments one call can pass (`Call` takes one byte).
pub const MAX_ARGS: usize = 255;

/// Compile `script` into a fresh program.
pub fn compile(script: &Script, globals: &dyn Globals) -> ScriptResult<Program> {
    let mut program = Program::new();
    let mut declared = FxHashSet::default();
    compile_append(&mut program, script, globals, &mut declared)?;
    Ok(program)
}

/// Append `script` to `program` as a new top-level chunk and make it the
/// entry point. Returns the chunk's offset.
///
/// `declared` carries the globals declared by earlier chunks and receives
/// the new ones. On error neither `program` nor `declared` change.
#[tracing::instrument(level = "debug", skip_all, fields(statements = script.body.len()))]
pub fn compile_append(
    program: &mut Program,
    script: &Script,
    globals: &dyn Globals,
    declared: &mut FxHashSet<String>,
) -> ScriptResult<u32> {
    let checkpoint = program.checkpoint();
    let mut compiler = Compiler {
        program,
        globals,
        declared: declared.clone(),
    };
    match compiler.compile_chunk(script) {
        Ok(entry) => {
            *declared = compiler.declared;
            tracing::debug!(entry, size = program.len() - entry as usize, "chunk compiled");
            Ok(entry)
        }
        Err(e) => {
            program.restore(checkpoint);
            Err(e)
        }
    }
}

/// Where a name lives at runtime.
#[derive(Clone, Debug)]
enum Slot {
    Global(String),
    Arg(u8),
    Local(u8),
}

struct Compiler<'a> {
    program: &'a mut Program,
    globals: &'a dyn Globals,
    declared: FxHashSet<String>,
}

const fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::BitAnd => Opcode::Band,
        BinaryOp::BitOr => Opcode::Bor,
        BinaryOp::BitXor => Opcode::Xor,
        BinaryOp::And => Opcode::And,
        BinaryOp::Or => Opcode::Or,
        BinaryOp::Eq => Opcode::Equ,
        BinaryOp::NotEq => Opcode::Neq,
        BinaryOp::Gt => Opcode::Gt,
        BinaryOp::GtEq => Opcode::Ge,
        BinaryOp::Lt => Opcode::Lt,
        BinaryOp::LtEq => Opcode::Le,
    }
}

const fn unary_opcode(op: UnaryOp) -> Opcode {
    match op {
        UnaryOp::Neg => Opcode::Neg,
        UnaryOp::Not => Opcode::Not,
        UnaryOp::BitNot => Opcode::Bnot,
        UnaryOp::Inc => Opcode::Inc,
        UnaryOp::Dec => Opcode::Dec,
    }
}

impl Compiler<'_> {
    fn compile_chunk(&mut self, script: &Script) -> ScriptResult<u32> {
        let entry = self.program.len();
        let push_n = self.program.emit_u8(Opcode::PushN, 0);
        let mut scope = FunctionScope::top_level();
        for stmt in &script.body {
            self.compile_stmt(&mut scope, stmt)?;
        }
        self.program.emit(Opcode::Brk);
        self.program.patch_u8(push_n, scope.local_count());
        let entry = u32::try_from(entry)
            .map_err(|_| errors::compile_error("program exceeds 4GiB of code"))?;
        self.program.set_entry(entry);
        Ok(entry)
    }

    // === Names ===

    fn is_global(&self, name: &str) -> bool {
        self.declared.contains(name) || self.globals.is_global(name)
    }

    fn resolve(&mut self, scope: &mut FunctionScope, name: &str) -> ScriptResult<Slot> {
        if self.is_global(name) {
            return Ok(Slot::Global(name.to_owned()));
        }
        if let Some(index) = scope.param(name) {
            return Ok(Slot::Arg(index));
        }
        if let Some(index) = scope.local(name) {
            return Ok(Slot::Local(index));
        }
        match scope.kind {
            FrameKind::TopLevel => Ok(self.declare_global(name)),
            FrameKind::Function => Ok(Slot::Local(scope.declare_local(name)?)),
        }
    }

    fn declare_global(&mut self, name: &str) -> Slot {
        self.declared.insert(name.to_owned());
        Slot::Global(name.to_owned())
    }

    fn emit_load(&mut self, slot: &Slot) {
        match slot {
            Slot::Global(name) => self.program.emit_str(Opcode::PushGlobalVar, name),
            Slot::Arg(index) => self.program.emit_u8(Opcode::PushArg, *index),
            Slot::Local(index) => self.program.emit_u8(Opcode::PushLocalI1, *index),
        };
    }

    fn emit_store(&mut self, slot: &Slot) {
        match slot {
            Slot::Global(name) => self.program.emit_str(Opcode::StoreGlobalVar, name),
            Slot::Arg(index) => self.program.emit_u8(Opcode::StoreArg, *index),
            Slot::Local(index) => self.program.emit_u8(Opcode::StoreLocalI1, *index),
        };
    }

    /// Slot of an identifier-like target, or `None` for members/indices.
    fn name_slot(&mut self, scope: &mut FunctionScope, target: &Expr) -> ScriptResult<Option<Slot>> {
        match &target.kind {
            ExprKind::Ident(name) => self.resolve(scope, name).map(Some),
            ExprKind::GlobalIdent(name) => Ok(Some(self.declare_global(name))),
            _ => Ok(None),
        }
    }

    // === Statements ===

    fn compile_stmt(&mut self, scope: &mut FunctionScope, stmt: &Stmt) -> ScriptResult<()> {
        with_stack_room(|| self.compile_stmt_inner(scope, stmt))
    }

    fn compile_stmt_inner(&mut self, scope: &mut FunctionScope, stmt: &Stmt) -> ScriptResult<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.compile_expr(scope, expr)?;
                self.program.emit(Opcode::Pop);
            }
            StmtKind::Block(body) => {
                for stmt in body {
                    self.compile_stmt(scope, stmt)?;
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(scope, cond)?;
                let skip_then = self.program.emit_branch(Opcode::Jz);
                self.compile_stmt(scope, then_branch)?;
                if let Some(else_branch) = else_branch {
                    let skip_else = self.program.emit_branch(Opcode::Jmp);
                    self.program.patch_branch(skip_then, self.program.len());
                    self.compile_stmt(scope, else_branch)?;
                    self.program.patch_branch(skip_else, self.program.len());
                } else {
                    self.program.patch_branch(skip_then, self.program.len());
                }
            }
            StmtKind::While { cond, body } => {
                let top = self.program.len();
                self.compile_expr(scope, cond)?;
                let exit = self.program.emit_branch(Opcode::Jz);
                let pending = self.compile_loop_body(scope, body)?;
                self.program.emit_branch_to(Opcode::Jmp, top);
                let end = self.program.len();
                self.program.patch_branch(exit, end);
                self.resolve_late_binds(&pending, end, top);
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.compile_stmt(scope, init)?;
                }
                let top = self.program.len();
                let exit = match cond {
                    Some(cond) => {
                        self.compile_expr(scope, cond)?;
                        Some(self.program.emit_branch(Opcode::Jz))
                    }
                    None => None,
                };
                let pending = self.compile_loop_body(scope, body)?;
                let step_start = self.program.len();
                if let Some(step) = step {
                    self.compile_expr(scope, step)?;
                    self.program.emit(Opcode::Pop);
                }
                self.program.emit_branch_to(Opcode::Jmp, top);
                let end = self.program.len();
                if let Some(exit) = exit {
                    self.program.patch_branch(exit, end);
                }
                self.resolve_late_binds(&pending, end, step_start);
            }
            StmtKind::ForEach {
                binding,
                iterable,
                body,
            } => self.compile_foreach(scope, binding, iterable, body)?,
            StmtKind::Return(value) => match value {
                Some(value) => {
                    self.compile_expr(scope, value)?;
                    self.program.emit(Opcode::Ret);
                }
                None => {
                    self.program.emit(Opcode::RetNull);
                }
            },
            StmtKind::Break => self.emit_late_bind(scope, LateBindKind::Break)?,
            StmtKind::Continue => self.emit_late_bind(scope, LateBindKind::Continue)?,
            StmtKind::Throw(value) => {
                self.compile_expr(scope, value)?;
                self.program.emit(Opcode::Throw);
            }
            StmtKind::DebugBreak => {
                self.program.emit(Opcode::Err);
            }
            StmtKind::Declare { scope: decl, items } => {
                let mut stored = 0u8;
                for item in items {
                    let slot = match decl {
                        DeclScope::Global => self.declare_global(&item.name),
                        DeclScope::Local => Slot::Local(scope.declare_local(&item.name)?),
                    };
                    match (&item.init, decl) {
                        (Some(init), _) => self.compile_expr(scope, init)?,
                        // A fresh `let` starts out null; `var x` leaves an
                        // existing global alone.
                        (None, DeclScope::Local) => {
                            self.program.emit(Opcode::PushNull);
                        }
                        (None, DeclScope::Global) => continue,
                    }
                    self.emit_store(&slot);
                    stored += 1;
                    if stored == u8::MAX {
                        self.program.emit_u8(Opcode::Popn, stored);
                        stored = 0;
                    }
                }
                if stored > 0 {
                    self.program.emit_u8(Opcode::Popn, stored);
                }
            }
            StmtKind::Empty => {}
        }
        Ok(())
    }

    /// Compile a loop body with its own pending break/continue list and
    /// hand that list back once the body is done.
    fn compile_loop_body(
        &mut self,
        scope: &mut FunctionScope,
        body: &Stmt,
    ) -> ScriptResult<Vec<LateBind>> {
        let outer = std::mem::take(&mut scope.late_binds);
        scope.loop_depth += 1;
        let result = self.compile_stmt(scope, body);
        scope.loop_depth -= 1;
        let inner = std::mem::replace(&mut scope.late_binds, outer);
        result?;
        Ok(inner.into_vec())
    }

    fn emit_late_bind(&mut self, scope: &mut FunctionScope, kind: LateBindKind) -> ScriptResult<()> {
        if scope.loop_depth == 0 {
            let word = match kind {
                LateBindKind::Break => "break",
                LateBindKind::Continue => "continue",
            };
            return Err(errors::compile_error(format!("`{word}` outside of a loop")));
        }
        let at = self.program.emit_branch(Opcode::Jmp);
        scope.late_binds.push(LateBind { at, kind });
        Ok(())
    }

    fn resolve_late_binds(&mut self, pending: &[LateBind], break_to: usize, continue_to: usize) {
        for bind in pending {
            let target = match bind.kind {
                LateBindKind::Break => break_to,
                LateBindKind::Continue => continue_to,
            };
            self.program.patch_branch(bind.at, target);
        }
    }

    /// `foreach (x : e) body`, as
    ///
    /// ```text
    ///     iter = e; index = 0
    /// top:
    ///     if !(index < iter.size) goto end
    ///     x = iter[index]
    ///     body
    /// continue:
    ///     ++index; goto top
    /// end:
    /// ```
    fn compile_foreach(
        &mut self,
        scope: &mut FunctionScope,
        binding: &Expr,
        iterable: &Expr,
        body: &Stmt,
    ) -> ScriptResult<()> {
        let iter = scope.hidden_local()?;
        let index = scope.hidden_local()?;

        self.compile_expr(scope, iterable)?;
        self.program.emit_u8(Opcode::StoreLocalI1, iter);
        self.program.emit(Opcode::PushI4_0);
        self.program.emit_u8(Opcode::StoreLocalI1, index);
        self.program.emit_u8(Opcode::Popn, 2);

        let top = self.program.len();
        self.program.emit_u8(Opcode::PushLocalI1, index);
        self.program.emit_u8(Opcode::PushLocalI1, iter);
        self.program.emit_str(Opcode::GetProp, "size");
        self.program.emit(Opcode::Lt);
        let exit = self.program.emit_branch(Opcode::Jz);

        self.compile_assignment(scope, binding, false, |c, _| {
            c.program.emit_u8(Opcode::PushLocalI1, iter);
            c.program.emit_u8(Opcode::PushLocalI1, index);
            c.program.emit(Opcode::GetIndex);
            Ok(())
        })?;
        self.program.emit(Opcode::Pop);

        let pending = self.compile_loop_body(scope, body)?;
        let step_start = self.program.len();
        self.program.emit_u8(Opcode::PushLocalI1, index);
        self.program.emit(Opcode::Inc);
        self.program.emit_u8(Opcode::StoreLocalI1, index);
        self.program.emit(Opcode::Pop);
        self.program.emit_branch_to(Opcode::Jmp, top);

        let end = self.program.len();
        self.program.patch_branch(exit, end);
        self.resolve_late_binds(&pending, end, step_start);
        Ok(())
    }

    // === Expressions ===

    fn compile_expr(&mut self, scope: &mut FunctionScope, expr: &Expr) -> ScriptResult<()> {
        with_stack_room(|| self.compile_expr_inner(scope, expr))
    }

    fn compile_expr_inner(&mut self, scope: &mut FunctionScope, expr: &Expr) -> ScriptResult<()> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.emit_literal(literal),
            ExprKind::Ident(name) => {
                let slot = self.resolve(scope, name)?;
                self.emit_load(&slot);
            }
            ExprKind::GlobalIdent(name) => {
                let slot = self.declare_global(name);
                self.emit_load(&slot);
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.compile_expr(scope, lhs)?;
                self.compile_expr(scope, rhs)?;
                self.program.emit(binary_opcode(*op));
            }
            ExprKind::Unary { op, operand } => {
                self.compile_expr(scope, operand)?;
                self.program.emit(unary_opcode(*op));
            }
            ExprKind::Update { op, prefix, target } => {
                self.compile_update(scope, *op, *prefix, target)?;
            }
            ExprKind::Assign { op, target, value } => {
                let op = *op;
                self.compile_assignment(scope, target, op.is_some(), |c, scope| {
                    c.compile_expr(scope, value)?;
                    if let Some(op) = op {
                        c.program.emit(binary_opcode(op));
                    }
                    Ok(())
                })?;
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.compile_expr(scope, cond)?;
                let skip_then = self.program.emit_branch(Opcode::Jz);
                self.compile_expr(scope, then_expr)?;
                let skip_else = self.program.emit_branch(Opcode::Jmp);
                self.program.patch_branch(skip_then, self.program.len());
                self.compile_expr(scope, else_expr)?;
                self.program.patch_branch(skip_else, self.program.len());
            }
            ExprKind::Call { callee, args } => {
                if args.len() > MAX_ARGS {
                    return Err(errors::compile_error(format!(
                        "more than {MAX_ARGS} arguments in one call"
                    )));
                }
                for arg in args {
                    self.compile_expr(scope, arg)?;
                }
                self.compile_expr(scope, callee)?;
                self.program.emit_u8(Opcode::Call, args.len() as u8);
            }
            ExprKind::Index { object, index } => {
                self.compile_expr(scope, object)?;
                self.compile_expr(scope, index)?;
                self.program.emit(Opcode::GetIndex);
            }
            ExprKind::Member { object, name } => {
                self.compile_expr(scope, object)?;
                self.program.emit_str(Opcode::GetProp, name);
            }
            ExprKind::Function(function) => self.compile_function(function)?,
        }
        Ok(())
    }

    fn emit_literal(&mut self, literal: &Literal) {
        let program = &mut *self.program;
        match literal {
            Literal::Null => program.emit(Opcode::PushNull),
            Literal::Int32(0) => program.emit(Opcode::PushI4_0),
            Literal::Int32(1) => program.emit(Opcode::PushI4_1),
            Literal::Int32(v) => program.emit_i32(Opcode::PushI4, *v),
            Literal::Int64(v) => program.emit_i64(Opcode::PushI8, *v),
            Literal::Float32(v) => program.emit_f32(Opcode::PushFP4, *v),
            Literal::Float64(v) => program.emit_f64(Opcode::PushFP8, *v),
            Literal::Str(text) => program.emit_str(Opcode::PushStr, text),
        };
    }

    /// Emit `target = <value>`, leaving the stored value on the stack.
    /// With `compound` set the current value of `target` is pushed before
    /// `value` runs, so `value` only has to apply the operator.
    ///
    /// The target is resolved before `value` emits anything, so a
    /// function literal assigned to a new top-level name can refer to
    /// that name.
    fn compile_assignment(
        &mut self,
        scope: &mut FunctionScope,
        target: &Expr,
        compound: bool,
        value: impl FnOnce(&mut Self, &mut FunctionScope) -> ScriptResult<()>,
    ) -> ScriptResult<()> {
        if let Some(slot) = self.name_slot(scope, target)? {
            if compound {
                self.emit_load(&slot);
            }
            value(self, scope)?;
            self.emit_store(&slot);
            return Ok(());
        }
        match &target.kind {
            ExprKind::Member { object, name } => {
                self.compile_expr(scope, object)?;
                if compound {
                    self.program.emit(Opcode::Dup);
                    self.program.emit_str(Opcode::GetProp, name);
                }
                value(self, scope)?;
                self.program.emit_str(Opcode::SetProp, name);
            }
            ExprKind::Index { object, index } => {
                self.compile_expr(scope, object)?;
                self.compile_expr(scope, index)?;
                if compound {
                    self.program.emit(Opcode::Dup2);
                    self.program.emit(Opcode::GetIndex);
                }
                value(self, scope)?;
                self.program.emit(Opcode::SetIndex);
            }
            _ => return Err(errors::compile_error("invalid assignment target")),
        }
        Ok(())
    }

    fn compile_update(
        &mut self,
        scope: &mut FunctionScope,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
    ) -> ScriptResult<()> {
        let step = unary_opcode(op.as_unary());
        if let Some(slot) = self.name_slot(scope, target)? {
            self.emit_load(&slot);
            if !prefix {
                self.program.emit(Opcode::Dup);
            }
            self.program.emit(step);
            self.emit_store(&slot);
            if !prefix {
                self.program.emit(Opcode::Pop);
            }
            return Ok(());
        }
        // Postfix keeps the loaded value in a scratch slot and reloads it
        // once the stepped value is stored.
        let temp = if prefix { None } else { Some(scope.update_temp()?) };
        match &target.kind {
            ExprKind::Member { object, name } => {
                self.compile_expr(scope, object)?;
                self.program.emit(Opcode::Dup);
                self.program.emit_str(Opcode::GetProp, name);
                if let Some(temp) = temp {
                    self.program.emit_u8(Opcode::StoreLocalI1, temp);
                }
                self.program.emit(step);
                self.program.emit_str(Opcode::SetProp, name);
            }
            ExprKind::Index { object, index } => {
                self.compile_expr(scope, object)?;
                self.compile_expr(scope, index)?;
                self.program.emit(Opcode::Dup2);
                self.program.emit(Opcode::GetIndex);
                if let Some(temp) = temp {
                    self.program.emit_u8(Opcode::StoreLocalI1, temp);
                }
                self.program.emit(step);
                self.program.emit(Opcode::SetIndex);
            }
            _ => return Err(errors::compile_error("invalid update target")),
        }
        if let Some(temp) = temp {
            self.program.emit(Opcode::Pop);
            self.program.emit_u8(Opcode::PushLocalI1, temp);
        }
        Ok(())
    }

    /// `function (params) { body }`: jump over the body, emit it with a
    /// fresh frame, then push its address as the expression's value.
    fn compile_function(&mut self, function: &FunctionLit) -> ScriptResult<()> {
        if function.params.len() > MAX_ARGS {
            return Err(errors::compile_error(format!(
                "more than {MAX_ARGS} parameters in one function"
            )));
        }
        let skip = self.program.emit_branch(Opcode::Jmp);
        let start = self.program.len();
        let push_n = self.program.emit_u8(Opcode::PushN, 0);

        let mut inner = FunctionScope::function(function.params.clone());
        for stmt in &function.body {
            self.compile_stmt(&mut inner, stmt)?;
        }
        self.program.emit(Opcode::RetNull);
        self.program.patch_u8(push_n, inner.local_count());
        self.program.patch_branch(skip, self.program.len());

        let start = u32::try_from(start)
            .map_err(|_| errors::compile_error("program exceeds 4GiB of code"))?;
        self.program.emit_u32(Opcode::PushFuncPtr, start);
        Ok(())
    }
}
