//! The heap arena and the root-counted mark-sweep collector.
//!
//! Every heap allocation lives in a slot of `Heap`. Slots carry a
//! generation counter so a `Handle` to a swept object is detected on
//! access. Roots are counted: storing the same object in two globals
//! adds two roots, and the object stays rooted until both are removed.
//!
//! Collection never happens implicitly. `Heap::collect` marks from the
//! roots (plus any extra roots the caller supplies, such as the VM's live
//! stack) and sweeps everything else.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::errors::{self, ScriptResult};
use crate::heap::{Handle, HeapObject, ScriptArray, ScriptObject};
use crate::variant::Variant;

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<HeapObject>,
}

/// Arena of all live heap objects plus the root table.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    roots: FxHashMap<Handle, u32>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new object and return its handle.
    pub fn alloc(&mut self, object: HeapObject) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        Handle::new(index, 0)
    }

    pub fn alloc_string(&mut self, text: impl Into<Box<str>>) -> Variant {
        Variant::String(self.alloc(HeapObject::String(text.into())))
    }

    pub fn alloc_object(&mut self) -> Variant {
        Variant::Object(self.alloc(HeapObject::Object(ScriptObject::new())))
    }

    pub fn alloc_array(&mut self, elements: Vec<Variant>) -> Variant {
        Variant::Array(self.alloc(HeapObject::Array(ScriptArray::from_elements(elements))))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|slot| slot.generation == handle.generation() && slot.object.is_some())
    }

    pub fn get(&self, handle: Handle) -> ScriptResult<&HeapObject> {
        match self.slots.get(handle.index() as usize) {
            Some(Slot {
                generation,
                object: Some(object),
            }) if *generation == handle.generation() => Ok(object),
            _ => Err(errors::collected_object()),
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> ScriptResult<&mut HeapObject> {
        match self.slots.get_mut(handle.index() as usize) {
            Some(Slot {
                generation,
                object: Some(object),
            }) if *generation == handle.generation() => Ok(object),
            _ => Err(errors::collected_object()),
        }
    }

    pub fn string(&self, handle: Handle) -> ScriptResult<&str> {
        match self.get(handle)? {
            HeapObject::String(text) => Ok(text),
            other => Err(errors::expected_kind("string", other.kind_name())),
        }
    }

    pub fn object(&self, handle: Handle) -> ScriptResult<&ScriptObject> {
        match self.get(handle)? {
            HeapObject::Object(object) => Ok(object),
            other => Err(errors::expected_kind("object", other.kind_name())),
        }
    }

    pub fn object_mut(&mut self, handle: Handle) -> ScriptResult<&mut ScriptObject> {
        match self.get_mut(handle)? {
            HeapObject::Object(object) => Ok(object),
            other => Err(errors::expected_kind("object", other.kind_name())),
        }
    }

    pub fn array(&self, handle: Handle) -> ScriptResult<&ScriptArray> {
        match self.get(handle)? {
            HeapObject::Array(array) => Ok(array),
            other => Err(errors::expected_kind("array", other.kind_name())),
        }
    }

    pub fn array_mut(&mut self, handle: Handle) -> ScriptResult<&mut ScriptArray> {
        match self.get_mut(handle)? {
            HeapObject::Array(array) => Ok(array),
            other => Err(errors::expected_kind("array", other.kind_name())),
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn add_root(&mut self, handle: Handle) {
        *self.roots.entry(handle).or_insert(0) += 1;
    }

    /// Drop one root reference; the entry disappears at zero.
    pub fn remove_root(&mut self, handle: Handle) {
        if let Some(count) = self.roots.get_mut(&handle) {
            *count -= 1;
            if *count == 0 {
                self.roots.remove(&handle);
            }
        }
    }

    pub fn root_count(&self, handle: Handle) -> u32 {
        self.roots.get(&handle).copied().unwrap_or(0)
    }

    /// Text form of a value.
    pub fn display(&self, value: &Variant) -> String {
        crate::cast::to_text(self, value)
    }

    /// Collect using the root table only.
    pub fn collect(&mut self) -> usize {
        self.collect_with(std::iter::empty())
    }

    /// Mark from the root table plus `extra_roots`, then sweep. Returns
    /// the number of objects freed.
    pub fn collect_with(&mut self, extra_roots: impl IntoIterator<Item = Handle>) -> usize {
        let mut marked = vec![false; self.slots.len()];
        let mut worklist: Vec<Handle> = self.roots.keys().copied().collect();
        worklist.extend(extra_roots);

        while let Some(handle) = worklist.pop() {
            let index = handle.index() as usize;
            if marked.get(index).copied().unwrap_or(true) {
                continue;
            }
            let Ok(object) = self.get(handle) else {
                continue;
            };
            marked[index] = true;
            if let Some(refs) = object.references() {
                worklist.extend(refs.iter());
            }
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.is_some() && !marked[index] {
                slot.object = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        tracing::debug!(freed, remaining = self.live, "heap collected");
        freed
    }
}

/// Shared handle to a `Heap`.
///
/// Cloning shares the same arena. The lock lets a host thread run
/// `collect` while no VM is executing against the heap.
#[derive(Clone, Default)]
pub struct Gc {
    heap: Arc<Mutex<Heap>>,
}

impl Gc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock()
    }

    pub fn collect(&self) -> usize {
        self.heap.lock().collect()
    }

    pub fn object_count(&self) -> usize {
        self.heap.lock().len()
    }
}

impl fmt::Debug for Gc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gc")
            .field("objects", &self.object_count())
            .finish()
    }
}

#[cfg(test)]
mod tests;
