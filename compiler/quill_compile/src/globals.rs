use quill_syntax::ast::Literal;

/// What the compiler may know about the host's global table.
pub trait Globals {
    /// `name` is a constant, a native function or a global variable.
    fn is_global(&self, name: &str) -> bool;

    /// Compile-time value of a named constant.
    fn constant(&self, _name: &str) -> Option<Literal> {
        None
    }

    /// Result of calling the pure native `name` with constant arguments,
    /// or `None` if the call must stay a runtime call.
    fn fold_call(&self, _name: &str, _args: &[Literal]) -> Option<Literal> {
        None
    }
}

/// An empty global table.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoGlobals;

impl Globals for NoGlobals {
    fn is_global(&self, _name: &str) -> bool {
        false
    }
}
