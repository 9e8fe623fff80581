//! Heap object kinds and their reference bookkeeping.

use rustc_hash::FxHashMap;

use crate::errors::{self, ScriptResult};
use crate::variant::Variant;

/// Largest array length reachable through auto-growth.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

/// Generation-checked index of a heap slot.
///
/// A handle is valid only while its slot still holds the object it was
/// issued for; the slot's generation is bumped whenever the object is
/// swept.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Handle { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Counted multiset of outgoing heap edges.
///
/// Two fields holding the same child count as two edges, so the child
/// stays reachable until both are overwritten.
#[derive(Clone, Debug, Default)]
pub struct RefSet {
    edges: FxHashMap<Handle, u32>,
}

impl RefSet {
    fn add(&mut self, value: Variant) {
        if let Some(handle) = value.heap_handle() {
            *self.edges.entry(handle).or_insert(0) += 1;
        }
    }

    fn remove(&mut self, value: Variant) {
        let Some(handle) = value.heap_handle() else {
            return;
        };
        if let Some(count) = self.edges.get_mut(&handle) {
            *count -= 1;
            if *count == 0 {
                self.edges.remove(&handle);
            }
        }
    }

    /// Distinct children, regardless of edge count.
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.edges.keys().copied()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.edges.contains_key(&handle)
    }

    /// Number of edges pointing at `handle`.
    pub fn count(&self, handle: Handle) -> u32 {
        self.edges.get(&handle).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// An open string-keyed map of values.
#[derive(Debug, Default)]
pub struct ScriptObject {
    fields: FxHashMap<String, Variant>,
    refs: RefSet,
}

impl ScriptObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field value, `Null` when absent.
    pub fn get(&self, key: &str) -> Variant {
        self.fields.get(key).copied().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The only way to write a field. Keeps the reference set in step
    /// with the field map.
    pub fn set(&mut self, key: &str, value: Variant) {
        self.refs.add(value);
        if let Some(old) = self.fields.insert(key.to_owned(), value) {
            self.refs.remove(old);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn references(&self) -> &RefSet {
        &self.refs
    }
}

/// A resizable sequence of values that grows on out-of-range access.
#[derive(Debug, Default)]
pub struct ScriptArray {
    elements: Vec<Variant>,
    refs: RefSet,
}

impl ScriptArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Variant>) -> Self {
        let mut refs = RefSet::default();
        for element in &elements {
            refs.add(*element);
        }
        ScriptArray { elements, refs }
    }

    /// Read an element. Reading past the end grows the array with `Null`
    /// padding first.
    pub fn get(&mut self, index: usize) -> Variant {
        if index >= self.elements.len() {
            self.elements.resize(index + 1, Variant::Null);
        }
        self.elements[index]
    }

    /// Read without growing.
    pub fn peek(&self, index: usize) -> Option<Variant> {
        self.elements.get(index).copied()
    }

    /// The only way to write an element.
    pub fn set(&mut self, index: usize, value: Variant) {
        if index >= self.elements.len() {
            self.elements.resize(index + 1, Variant::Null);
        }
        self.refs.add(value);
        let old = std::mem::replace(&mut self.elements[index], value);
        self.refs.remove(old);
    }

    pub fn push(&mut self, value: Variant) {
        self.refs.add(value);
        self.elements.push(value);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Variant> + '_ {
        self.elements.iter().copied()
    }

    pub fn references(&self) -> &RefSet {
        &self.refs
    }
}

/// Validate a script-supplied array index.
pub fn checked_index(index: i64) -> ScriptResult<usize> {
    if index < 0 {
        return Err(errors::negative_index(index));
    }
    let index = index as usize;
    if index >= MAX_ARRAY_LEN {
        return Err(errors::index_too_large(index as i64));
    }
    Ok(index)
}

/// Closed set of heap allocation kinds.
#[derive(Debug)]
pub enum HeapObject {
    String(Box<str>),
    Object(ScriptObject),
    Array(ScriptArray),
}

impl HeapObject {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            HeapObject::String(_) => "string",
            HeapObject::Object(_) => "object",
            HeapObject::Array(_) => "array",
        }
    }

    /// Outgoing edges; strings have none.
    pub fn references(&self) -> Option<&RefSet> {
        match self {
            HeapObject::String(_) => None,
            HeapObject::Object(object) => Some(object.references()),
            HeapObject::Array(array) => Some(array.references()),
        }
    }
}

#[cfg(test)]
mod tests;
