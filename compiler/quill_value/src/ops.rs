//! Operator evaluation on `Variant`s.
//!
//! Shared by the VM's opcode handlers and the constant folder so both
//! agree on promotion, wrapping and error behaviour.
//!
//! Rules:
//! - A string operand turns `+` into concatenation and equality/ordering
//!   into text comparison.
//! - Otherwise both operands are cast to the wider of their numeric
//!   kinds, in the order `Int32 < Int64 < Float32 < Float64`.
//! - Bitwise operators work on `Int64` if either side is `Int64`, else
//!   `Int32`.
//! - `And`/`Or` see both operands (no short circuit) and produce 0/1.

use std::cmp::Ordering;

use crate::cast::{to_f32, to_f64, to_i32, to_i64, to_text};
use crate::errors::{self, ScriptResult};
use crate::gc::Heap;
use crate::variant::{NumericKind, Variant};

/// Binary operators of the language.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl BinaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
        }
    }
}

/// Unary operators, including the `++`/`--` steps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    Inc,
    Dec,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        }
    }
}

/// The kind both operands are cast to, or `None` if either side is not
/// numeric.
pub fn promote(lhs: &Variant, rhs: &Variant) -> Option<NumericKind> {
    Some(lhs.numeric_kind()?.max(rhs.numeric_kind()?))
}

pub fn evaluate_binary(
    heap: &mut Heap,
    op: BinaryOp,
    lhs: Variant,
    rhs: Variant,
) -> ScriptResult<Variant> {
    match op {
        BinaryOp::Add if lhs.is_string() || rhs.is_string() => {
            let text = to_text(heap, &lhs) + &to_text(heap, &rhs);
            Ok(heap.alloc_string(text))
        }
        BinaryOp::Add => arithmetic(heap, Arith::Add, lhs, rhs),
        BinaryOp::Sub => arithmetic(heap, Arith::Sub, lhs, rhs),
        BinaryOp::Mul => arithmetic(heap, Arith::Mul, lhs, rhs),
        BinaryOp::Div => arithmetic(heap, Arith::Div, lhs, rhs),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => bitwise(heap, op, lhs, rhs),
        BinaryOp::And => Ok(Variant::from_bool(lhs.truthy() && rhs.truthy())),
        BinaryOp::Or => Ok(Variant::from_bool(lhs.truthy() || rhs.truthy())),
        BinaryOp::Eq => values_equal(heap, lhs, rhs).map(Variant::from_bool),
        BinaryOp::NotEq => values_equal(heap, lhs, rhs).map(|eq| Variant::from_bool(!eq)),
        BinaryOp::Gt => compare(heap, op, lhs, rhs).map(|o| Variant::from_bool(o == Some(Ordering::Greater))),
        BinaryOp::GtEq => compare(heap, op, lhs, rhs).map(|o| {
            Variant::from_bool(matches!(o, Some(Ordering::Greater | Ordering::Equal)))
        }),
        BinaryOp::Lt => compare(heap, op, lhs, rhs).map(|o| Variant::from_bool(o == Some(Ordering::Less))),
        BinaryOp::LtEq => compare(heap, op, lhs, rhs)
            .map(|o| Variant::from_bool(matches!(o, Some(Ordering::Less | Ordering::Equal)))),
    }
}

pub fn evaluate_unary(heap: &mut Heap, op: UnaryOp, operand: Variant) -> ScriptResult<Variant> {
    match op {
        UnaryOp::Neg => match operand {
            Variant::Int32(v) => Ok(Variant::Int32(v.wrapping_neg())),
            Variant::Int64(v) => Ok(Variant::Int64(v.wrapping_neg())),
            Variant::Float32(v) => Ok(Variant::Float32(-v)),
            Variant::Float64(v) => Ok(Variant::Float64(-v)),
            other => Err(errors::invalid_unary(op.as_symbol(), other.type_name())),
        },
        UnaryOp::Not => Ok(Variant::from_bool(!operand.truthy())),
        UnaryOp::BitNot => match operand {
            Variant::Int32(v) => Ok(Variant::Int32(!v)),
            Variant::Int64(v) => Ok(Variant::Int64(!v)),
            other => Err(errors::invalid_unary(op.as_symbol(), other.type_name())),
        },
        UnaryOp::Inc => evaluate_binary(heap, BinaryOp::Add, operand, Variant::Int32(1)),
        UnaryOp::Dec => evaluate_binary(heap, BinaryOp::Sub, operand, Variant::Int32(1)),
    }
}

/// Script equality. Never fails on kind mismatch: differing
/// non-numeric kinds are simply unequal.
pub fn values_equal(heap: &Heap, lhs: Variant, rhs: Variant) -> ScriptResult<bool> {
    if lhs.is_string() || rhs.is_string() {
        return Ok(to_text(heap, &lhs) == to_text(heap, &rhs));
    }
    match promote(&lhs, &rhs) {
        Some(NumericKind::Int32) => Ok(to_i32(heap, lhs)? == to_i32(heap, rhs)?),
        Some(NumericKind::Int64) => Ok(to_i64(heap, lhs)? == to_i64(heap, rhs)?),
        Some(NumericKind::Float32) => Ok(to_f32(heap, lhs)? == to_f32(heap, rhs)?),
        Some(NumericKind::Float64) => Ok(to_f64(heap, lhs)? == to_f64(heap, rhs)?),
        None => Ok(lhs == rhs),
    }
}

/// `None` means unordered (a NaN operand).
fn compare(heap: &Heap, op: BinaryOp, lhs: Variant, rhs: Variant) -> ScriptResult<Option<Ordering>> {
    if lhs.is_string() || rhs.is_string() {
        return Ok(Some(to_text(heap, &lhs).cmp(&to_text(heap, &rhs))));
    }
    let kind = promote(&lhs, &rhs)
        .ok_or_else(|| errors::cannot_promote(op.as_symbol(), lhs.type_name(), rhs.type_name()))?;
    Ok(match kind {
        NumericKind::Int32 => Some(to_i32(heap, lhs)?.cmp(&to_i32(heap, rhs)?)),
        NumericKind::Int64 => Some(to_i64(heap, lhs)?.cmp(&to_i64(heap, rhs)?)),
        NumericKind::Float32 => to_f32(heap, lhs)?.partial_cmp(&to_f32(heap, rhs)?),
        NumericKind::Float64 => to_f64(heap, lhs)?.partial_cmp(&to_f64(heap, rhs)?),
    })
}

#[derive(Copy, Clone)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    const fn symbol(self) -> &'static str {
        match self {
            Arith::Add => "+",
            Arith::Sub => "-",
            Arith::Mul => "*",
            Arith::Div => "/",
        }
    }
}

fn arithmetic(heap: &Heap, op: Arith, lhs: Variant, rhs: Variant) -> ScriptResult<Variant> {
    let kind = promote(&lhs, &rhs)
        .ok_or_else(|| errors::cannot_promote(op.symbol(), lhs.type_name(), rhs.type_name()))?;
    Ok(match kind {
        NumericKind::Int32 => {
            let (a, b) = (to_i32(heap, lhs)?, to_i32(heap, rhs)?);
            Variant::Int32(match op {
                Arith::Add => a.wrapping_add(b),
                Arith::Sub => a.wrapping_sub(b),
                Arith::Mul => a.wrapping_mul(b),
                Arith::Div if b == 0 => return Err(errors::division_by_zero()),
                Arith::Div => a.wrapping_div(b),
            })
        }
        NumericKind::Int64 => {
            let (a, b) = (to_i64(heap, lhs)?, to_i64(heap, rhs)?);
            Variant::Int64(match op {
                Arith::Add => a.wrapping_add(b),
                Arith::Sub => a.wrapping_sub(b),
                Arith::Mul => a.wrapping_mul(b),
                Arith::Div if b == 0 => return Err(errors::division_by_zero()),
                Arith::Div => a.wrapping_div(b),
            })
        }
        NumericKind::Float32 => {
            let (a, b) = (to_f32(heap, lhs)?, to_f32(heap, rhs)?);
            Variant::Float32(match op {
                Arith::Add => a + b,
                Arith::Sub => a - b,
                Arith::Mul => a * b,
                Arith::Div => a / b,
            })
        }
        NumericKind::Float64 => {
            let (a, b) = (to_f64(heap, lhs)?, to_f64(heap, rhs)?);
            Variant::Float64(match op {
                Arith::Add => a + b,
                Arith::Sub => a - b,
                Arith::Mul => a * b,
                Arith::Div => a / b,
            })
        }
    })
}

fn bitwise(heap: &Heap, op: BinaryOp, lhs: Variant, rhs: Variant) -> ScriptResult<Variant> {
    let wide = matches!(lhs, Variant::Int64(_)) || matches!(rhs, Variant::Int64(_));
    let narrow = matches!(lhs, Variant::Int32(_)) || matches!(rhs, Variant::Int32(_));
    if wide {
        let (a, b) = (to_i64(heap, lhs)?, to_i64(heap, rhs)?);
        Ok(Variant::Int64(match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            _ => a ^ b,
        }))
    } else if narrow {
        let (a, b) = (to_i32(heap, lhs)?, to_i32(heap, rhs)?);
        Ok(Variant::Int32(match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            _ => a ^ b,
        }))
    } else {
        Err(errors::cannot_promote(
            op.as_symbol(),
            lhs.type_name(),
            rhs.type_name(),
        ))
    }
}
