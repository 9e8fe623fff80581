//! Syntax tree.
//!
//! A plain boxed tree: every node owns its children and carries the byte
//! span it was parsed from. The constant folder rewrites it in place and
//! the compiler walks it once.

use quill_value::{BinaryOp, UnaryOp};

use crate::span::Span;

/// A parsed source unit: the statements of one top-level chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// Which table a declaration writes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclScope {
    /// `var`: the global table.
    Global,
    /// `let`: a slot in the current frame.
    Local,
}

/// One `name [= init]` of a declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    /// `foreach (binding : iterable) body`
    ForEach {
        binding: Expr,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Throw(Expr),
    DebugBreak,
    Declare {
        scope: DeclScope,
        items: Vec<Declarator>,
    },
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Expr::new(ExprKind::Literal(literal), span)
    }

    /// Identifiers, explicit globals, members and indices can be written.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident(_)
                | ExprKind::GlobalIdent(_)
                | ExprKind::Member { .. }
                | ExprKind::Index { .. }
        )
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Inc,
    Dec,
}

impl UpdateOp {
    pub const fn as_unary(self) -> UnaryOp {
        match self {
            UpdateOp::Inc => UnaryOp::Inc,
            UpdateOp::Dec => UnaryOp::Dec,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),
    /// `var name` in expression position: always the global table.
    GlobalIdent(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x--`, ...
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        name: String,
    },
    Function(Box<FunctionLit>),
}

/// `function (params) { body }`
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionLit {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// A constant value in the tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Str(String),
}

impl Literal {
    /// Integer literal, narrowed to `Int32` when it fits.
    pub fn integer(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(v) => Literal::Int32(v),
            Err(_) => Literal::Int64(value),
        }
    }

    /// Boolean coercion, matching `Variant::truthy`.
    pub fn truthy(&self) -> bool {
        match self {
            Literal::Null => false,
            Literal::Int32(v) => *v != 0,
            Literal::Int64(v) => *v != 0,
            Literal::Float32(v) => *v != 0.0,
            Literal::Float64(v) => *v != 0.0,
            Literal::Str(_) => true,
        }
    }
}
