//! Constant folding and dead branch elimination.
//!
//! Runs on the syntax tree before emission. A node folds when every
//! operand is already a literal and the operation is pure:
//! - binary and unary operators, evaluated with the runtime's own
//!   semantics from `quill_value`;
//! - names the host reports as constants (`Pi`, `true`, ...);
//! - calls to pure natives with literal arguments (`sqrt(4)`).
//!
//! Evaluation errors (`1 / 0`, `"a" - 1`) are never reported here. The
//! node stays as it was so the error surfaces at runtime, in order with
//! the program's other side effects.
//!
//! Conditions that fold to a literal prune the branch that cannot run.

use quill_syntax::ast::{Expr, ExprKind, Literal, Script, Stmt, StmtKind};
use quill_syntax::with_stack_room;
use quill_value::{evaluate_binary, evaluate_unary, BinaryOp, Heap, UnaryOp, Variant};

use crate::globals::Globals;

/// Fold `script` in place. Returns the number of nodes rewritten.
#[tracing::instrument(level = "debug", skip_all)]
pub fn fold_script(script: &mut Script, globals: &dyn Globals) -> usize {
    let mut folder = Folder {
        globals,
        heap: Heap::new(),
        folded: 0,
    };
    folder.fold_block(&mut script.body);
    tracing::debug!(folded = folder.folded, "constant folding done");
    folder.folded
}

struct Folder<'a> {
    globals: &'a dyn Globals,
    /// Scratch heap for string results; dropped with the folder.
    heap: Heap,
    folded: usize,
}

fn take_kind(stmt: &mut Stmt) -> StmtKind {
    std::mem::replace(&mut stmt.kind, StmtKind::Empty)
}

fn literal_truth(expr: &Expr) -> Option<bool> {
    expr.as_literal().map(Literal::truthy)
}

impl Folder<'_> {
    // === Values ===

    fn to_variant(&mut self, literal: &Literal) -> Variant {
        match literal {
            Literal::Null => Variant::Null,
            Literal::Int32(v) => Variant::Int32(*v),
            Literal::Int64(v) => Variant::Int64(*v),
            Literal::Float32(v) => Variant::Float32(*v),
            Literal::Float64(v) => Variant::Float64(*v),
            Literal::Str(text) => self.heap.alloc_string(text.as_str()),
        }
    }

    fn to_literal(&self, value: Variant) -> Option<Literal> {
        match value {
            Variant::Null => Some(Literal::Null),
            Variant::Int32(v) => Some(Literal::Int32(v)),
            Variant::Int64(v) => Some(Literal::Int64(v)),
            Variant::Float32(v) => Some(Literal::Float32(v)),
            Variant::Float64(v) => Some(Literal::Float64(v)),
            Variant::String(handle) => self
                .heap
                .string(handle)
                .ok()
                .map(|text| Literal::Str(text.to_owned())),
            _ => None,
        }
    }

    fn fold_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<ExprKind> {
        let (lhs, rhs) = (lhs.as_literal()?, rhs.as_literal()?);
        let (lhs, rhs) = (self.to_variant(lhs), self.to_variant(rhs));
        let value = evaluate_binary(&mut self.heap, op, lhs, rhs).ok()?;
        self.to_literal(value).map(ExprKind::Literal)
    }

    fn fold_unary(&mut self, op: UnaryOp, operand: &Expr) -> Option<ExprKind> {
        let operand = self.to_variant(operand.as_literal()?);
        let value = evaluate_unary(&mut self.heap, op, operand).ok()?;
        self.to_literal(value).map(ExprKind::Literal)
    }

    fn fold_call(&self, callee: &Expr, args: &[Expr]) -> Option<ExprKind> {
        let ExprKind::Ident(name) = &callee.kind else {
            return None;
        };
        let args: Option<Vec<Literal>> = args.iter().map(|a| a.as_literal().cloned()).collect();
        self.globals
            .fold_call(name, &args?)
            .map(ExprKind::Literal)
    }

    // === Expressions ===

    fn fold_expr(&mut self, expr: &mut Expr) {
        with_stack_room(|| self.fold_expr_inner(expr));
    }

    fn fold_expr_inner(&mut self, expr: &mut Expr) {
        let replacement = match &mut expr.kind {
            ExprKind::Literal(_) | ExprKind::GlobalIdent(_) => None,
            ExprKind::Ident(name) => self.globals.constant(name).map(ExprKind::Literal),
            ExprKind::Binary { op, lhs, rhs } => {
                self.fold_expr(lhs);
                self.fold_expr(rhs);
                self.fold_binary(*op, lhs, rhs)
            }
            ExprKind::Unary { op, operand } => {
                self.fold_expr(operand);
                self.fold_unary(*op, operand)
            }
            ExprKind::Update { target, .. } => {
                self.fold_target(target);
                None
            }
            ExprKind::Assign { target, value, .. } => {
                self.fold_target(target);
                self.fold_expr(value);
                None
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.fold_expr(cond);
                self.fold_expr(then_expr);
                self.fold_expr(else_expr);
                literal_truth(cond).map(|truth| {
                    let chosen = if truth { then_expr } else { else_expr };
                    std::mem::replace(&mut chosen.kind, ExprKind::Literal(Literal::Null))
                })
            }
            ExprKind::Call { callee, args } => {
                for arg in args.iter_mut() {
                    self.fold_expr(arg);
                }
                self.fold_call(callee, args)
            }
            ExprKind::Index { object, index } => {
                self.fold_expr(object);
                self.fold_expr(index);
                None
            }
            ExprKind::Member { object, .. } => {
                self.fold_expr(object);
                None
            }
            ExprKind::Function(function) => {
                self.fold_block(&mut function.body);
                None
            }
        };
        if let Some(kind) = replacement {
            expr.kind = kind;
            self.folded += 1;
        }
    }

    /// Fold inside an assignment target without touching the target name.
    fn fold_target(&mut self, target: &mut Expr) {
        match &mut target.kind {
            ExprKind::Member { object, .. } => self.fold_expr(object),
            ExprKind::Index { object, index } => {
                self.fold_expr(object);
                self.fold_expr(index);
            }
            _ => {}
        }
    }

    // === Statements ===

    fn fold_block(&mut self, body: &mut Vec<Stmt>) {
        for stmt in body.iter_mut() {
            self.fold_stmt(stmt);
        }
        body.retain(|stmt| !matches!(stmt.kind, StmtKind::Empty));
    }

    fn fold_stmt(&mut self, stmt: &mut Stmt) {
        with_stack_room(|| self.fold_stmt_inner(stmt));
    }

    fn fold_stmt_inner(&mut self, stmt: &mut Stmt) {
        let replacement = match &mut stmt.kind {
            StmtKind::Expr(expr) => {
                self.fold_expr(expr);
                matches!(expr.kind, ExprKind::Literal(_)).then_some(StmtKind::Empty)
            }
            StmtKind::Block(body) => {
                self.fold_block(body);
                None
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.fold_expr(cond);
                self.fold_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.fold_stmt(else_branch);
                }
                match literal_truth(cond) {
                    Some(true) => Some(take_kind(then_branch)),
                    Some(false) => Some(else_branch.as_mut().map_or(StmtKind::Empty, |e| take_kind(e))),
                    None => None,
                }
            }
            StmtKind::While { cond, body } => {
                self.fold_expr(cond);
                self.fold_stmt(body);
                (literal_truth(cond) == Some(false)).then_some(StmtKind::Empty)
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.fold_stmt(init);
                }
                if let Some(c) = cond {
                    self.fold_expr(c);
                }
                if let Some(step) = step {
                    self.fold_expr(step);
                }
                self.fold_stmt(body);
                match cond.as_ref().and_then(literal_truth) {
                    // Only the initialiser ever runs.
                    Some(false) => Some(init.as_mut().map_or(StmtKind::Empty, |i| take_kind(i))),
                    Some(true) => {
                        *cond = None;
                        self.folded += 1;
                        None
                    }
                    None => None,
                }
            }
            StmtKind::ForEach {
                binding,
                iterable,
                body,
            } => {
                self.fold_target(binding);
                self.fold_expr(iterable);
                self.fold_stmt(body);
                None
            }
            StmtKind::Return(Some(expr)) | StmtKind::Throw(expr) => {
                self.fold_expr(expr);
                None
            }
            StmtKind::Declare { items, .. } => {
                for item in items.iter_mut() {
                    if let Some(init) = &mut item.init {
                        self.fold_expr(init);
                    }
                }
                None
            }
            StmtKind::Return(None)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::DebugBreak
            | StmtKind::Empty => None,
        };
        if let Some(kind) = replacement {
            stmt.kind = kind;
            self.folded += 1;
        }
    }
}

#[cfg(test)]
mod tests;
