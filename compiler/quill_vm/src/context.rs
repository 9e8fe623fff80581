//! The execution context: constants, natives, globals and the heap.

use bitflags::bitflags;
use parking_lot::MutexGuard;
use rustc_hash::FxHashMap;

use quill_value::errors::{self, ScriptResult};
use quill_value::{Gc, Heap, NativeId, Variant};

use crate::print_handler::{stdout_handler, SharedPrintHandler};

/// A host function callable from scripts.
pub type NativeFn = fn(&mut CallContext<'_>, &[Variant]) -> ScriptResult<Variant>;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct NativeFlags: u8 {
        /// Same arguments, same result, no side effects and no heap
        /// allocation for numeric arguments. The optimizer may call it at
        /// compile time.
        const PURE = 1 << 0;
    }
}

#[derive(Clone, Debug)]
pub struct NativeEntry {
    pub name: Box<str>,
    pub func: NativeFn,
    pub flags: NativeFlags,
}

/// Everything a program runs against.
///
/// Name lookup checks constants first, then natives, then global
/// variables. Constants and natives are read-only to scripts.
pub struct Context {
    constants: FxHashMap<String, Variant>,
    natives: Vec<NativeEntry>,
    native_ids: FxHashMap<String, NativeId>,
    globals: FxHashMap<String, Variant>,
    gc: Gc,
    print: SharedPrintHandler,
}

impl Context {
    /// A context with the standard native library installed.
    pub fn new() -> Self {
        let mut ctx = Self::empty();
        crate::natives::install(&mut ctx);
        ctx
    }

    /// A context that only knows `null`, `true` and `false`.
    pub fn empty() -> Self {
        let mut ctx = Context {
            constants: FxHashMap::default(),
            natives: Vec::new(),
            native_ids: FxHashMap::default(),
            globals: FxHashMap::default(),
            gc: Gc::new(),
            print: stdout_handler(),
        };
        ctx.register_constant("null", Variant::Null);
        ctx.register_constant("false", Variant::Int32(0));
        ctx.register_constant("true", Variant::Int32(1));
        ctx
    }

    #[must_use]
    pub fn with_print_handler(mut self, print: SharedPrintHandler) -> Self {
        self.print = print;
        self
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    pub fn gc(&self) -> &Gc {
        &self.gc
    }

    pub fn heap(&self) -> MutexGuard<'_, Heap> {
        self.gc.lock()
    }

    // === Registration ===

    /// Add (or replace) a constant. Heap values are rooted for as long as
    /// the constant holds them.
    pub fn register_constant(&mut self, name: &str, value: Variant) {
        let mut heap = self.gc.lock();
        if let Some(handle) = value.heap_handle() {
            heap.add_root(handle);
        }
        let old = self.constants.insert(name.to_owned(), value);
        if let Some(handle) = old.and_then(|old| old.heap_handle()) {
            heap.remove_root(handle);
        }
    }

    /// Add (or replace) a native function and return its id.
    pub fn register_native(&mut self, name: &str, func: NativeFn, flags: NativeFlags) -> NativeId {
        let entry = NativeEntry {
            name: name.into(),
            func,
            flags,
        };
        if let Some(&id) = self.native_ids.get(name) {
            self.natives[id.0 as usize] = entry;
            return id;
        }
        let id = NativeId(self.natives.len() as u32);
        self.natives.push(entry);
        self.native_ids.insert(name.to_owned(), id);
        id
    }

    // === Lookup ===

    pub fn constant(&self, name: &str) -> Option<Variant> {
        self.constants.get(name).copied()
    }

    pub fn native(&self, id: NativeId) -> Option<&NativeEntry> {
        self.natives.get(id.0 as usize)
    }

    pub fn native_id(&self, name: &str) -> Option<NativeId> {
        self.native_ids.get(name).copied()
    }

    pub fn global(&self, name: &str) -> Option<Variant> {
        self.globals.get(name).copied()
    }

    /// The name is a constant, a native or a global variable.
    pub fn is_global(&self, name: &str) -> bool {
        self.constants.contains_key(name)
            || self.native_ids.contains_key(name)
            || self.globals.contains_key(name)
    }

    /// Value of a global name. Unknown names read as null.
    pub fn lookup(&self, name: &str) -> Variant {
        if let Some(value) = self.constant(name) {
            return value;
        }
        if let Some(id) = self.native_id(name) {
            return Variant::NativeFunction(id);
        }
        self.global(name).unwrap_or_default()
    }

    /// Assign a global variable, moving the heap root from the old value
    /// to the new one.
    pub fn set_global(&mut self, name: &str, value: Variant) -> ScriptResult<()> {
        if self.constants.contains_key(name) || self.native_ids.contains_key(name) {
            return Err(errors::assign_to_builtin(name));
        }
        let mut heap = self.gc.lock();
        if let Some(handle) = value.heap_handle() {
            heap.add_root(handle);
        }
        let old = self.globals.insert(name.to_owned(), value);
        if let Some(handle) = old.and_then(|old| old.heap_handle()) {
            heap.remove_root(handle);
        }
        Ok(())
    }

    /// Global variable names, sorted.
    pub fn global_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.globals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn constant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constants.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Native names in registration order.
    pub fn native_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.natives.iter().map(|entry| &*entry.name)
    }

    // === Host helpers ===

    /// Text form of a value. Natives are shown by name.
    pub fn display(&self, value: &Variant) -> String {
        match value {
            Variant::NativeFunction(id) => match self.native(*id) {
                Some(entry) => format!("{{Native:{}}}", entry.name),
                None => self.gc.lock().display(value),
            },
            _ => self.gc.lock().display(value),
        }
    }

    /// Collect from the global roots only. Returns the number freed.
    pub fn collect(&self) -> usize {
        self.gc.collect()
    }

    /// Call `name` at compile time if it is a pure native.
    ///
    /// Any failure yields `None` so the call is left for runtime, where
    /// its error is reported in order.
    pub fn call_pure(&mut self, name: &str, args: &[Variant]) -> Option<Variant> {
        let entry = self.native(self.native_id(name)?)?;
        if !entry.flags.contains(NativeFlags::PURE) {
            return None;
        }
        let func = entry.func;
        let mut call = CallContext::new(self, &[]);
        func(&mut call, args).ok()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// What a native function sees of the running program.
pub struct CallContext<'a> {
    ctx: &'a mut Context,
    /// The VM's live stack, kept alive by `collect`.
    stack: &'a [Variant],
}

impl<'a> CallContext<'a> {
    pub fn new(ctx: &'a mut Context, stack: &'a [Variant]) -> Self {
        CallContext { ctx, stack }
    }

    pub fn context(&mut self) -> &mut Context {
        self.ctx
    }

    pub fn heap(&self) -> MutexGuard<'_, Heap> {
        self.ctx.gc.lock()
    }

    pub fn display(&self, value: &Variant) -> String {
        self.ctx.display(value)
    }

    pub fn println(&self, line: &str) {
        self.ctx.print.println(line);
    }

    /// Collect with the global roots plus every heap value on the live
    /// stack, so the caller's temporaries survive.
    pub fn collect(&mut self) -> usize {
        let roots = self.stack.iter().filter_map(Variant::heap_handle);
        self.ctx.gc.lock().collect_with(roots)
    }
}
