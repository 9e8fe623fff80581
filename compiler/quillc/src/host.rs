//! The compiler's view of a live `Context`.

use std::cell::RefCell;

use smallvec::SmallVec;

use quill_compile::Globals;
use quill_syntax::ast::Literal;
use quill_value::Variant;
use quill_vm::Context;

/// Answers name and folding queries from the context a program will run
/// against.
///
/// Folding is restricted to numbers and null in both directions, so a
/// folded call never touches the heap.
pub(crate) struct HostGlobals<'a> {
    ctx: RefCell<&'a mut Context>,
}

impl<'a> HostGlobals<'a> {
    pub(crate) fn new(ctx: &'a mut Context) -> Self {
        HostGlobals {
            ctx: RefCell::new(ctx),
        }
    }
}

fn literal_of(value: Variant) -> Option<Literal> {
    match value {
        Variant::Null => Some(Literal::Null),
        Variant::Int32(v) => Some(Literal::Int32(v)),
        Variant::Int64(v) => Some(Literal::Int64(v)),
        Variant::Float32(v) => Some(Literal::Float32(v)),
        Variant::Float64(v) => Some(Literal::Float64(v)),
        _ => None,
    }
}

fn variant_of(literal: &Literal) -> Option<Variant> {
    match *literal {
        Literal::Null => Some(Variant::Null),
        Literal::Int32(v) => Some(Variant::Int32(v)),
        Literal::Int64(v) => Some(Variant::Int64(v)),
        Literal::Float32(v) => Some(Variant::Float32(v)),
        Literal::Float64(v) => Some(Variant::Float64(v)),
        Literal::Str(_) => None,
    }
}

impl Globals for HostGlobals<'_> {
    fn is_global(&self, name: &str) -> bool {
        self.ctx.borrow().is_global(name)
    }

    fn constant(&self, name: &str) -> Option<Literal> {
        self.ctx.borrow().constant(name).and_then(literal_of)
    }

    fn fold_call(&self, name: &str, args: &[Literal]) -> Option<Literal> {
        let values: SmallVec<[Variant; 4]> = args.iter().map(variant_of).collect::<Option<_>>()?;
        let result = self.ctx.borrow_mut().call_pure(name, &values)?;
        literal_of(result)
    }
}
