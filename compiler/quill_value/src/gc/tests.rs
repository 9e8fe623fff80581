use pretty_assertions::assert_eq;

use super::*;
use crate::errors::ScriptError;

fn object_handle(heap: &mut Heap) -> Handle {
    heap.alloc_object().heap_handle().unwrap()
}

#[test]
fn unrooted_objects_are_swept() {
    let mut heap = Heap::new();
    heap.alloc_string("a");
    heap.alloc_object();
    assert_eq!(heap.len(), 2);
    assert_eq!(heap.collect(), 2);
    assert!(heap.is_empty());
}

#[test]
fn rooted_graph_survives() {
    let mut heap = Heap::new();
    let root = object_handle(&mut heap);
    let child = heap.alloc_string("child");
    heap.object_mut(root).unwrap().set("c", child);
    heap.alloc_object();
    heap.add_root(root);

    assert_eq!(heap.collect(), 1);
    assert_eq!(heap.len(), 2);
    assert_eq!(heap.string(child.heap_handle().unwrap()).unwrap(), "child");
}

#[test]
fn roots_are_counted() {
    let mut heap = Heap::new();
    let h = object_handle(&mut heap);
    heap.add_root(h);
    heap.add_root(h);
    heap.remove_root(h);
    assert_eq!(heap.root_count(h), 1);
    assert_eq!(heap.collect(), 0);

    heap.remove_root(h);
    assert_eq!(heap.root_count(h), 0);
    assert_eq!(heap.collect(), 1);
}

#[test]
fn cycles_do_not_hang_mark() {
    let mut heap = Heap::new();
    let a = object_handle(&mut heap);
    let b = object_handle(&mut heap);
    heap.object_mut(a).unwrap().set("next", Variant::Object(b));
    heap.object_mut(b).unwrap().set("next", Variant::Object(a));
    heap.object_mut(a).unwrap().set("me", Variant::Object(a));

    heap.add_root(a);
    assert_eq!(heap.collect(), 0);

    heap.remove_root(a);
    assert_eq!(heap.collect(), 2);
}

#[test]
fn stale_handle_is_a_type_error() {
    let mut heap = Heap::new();
    let h = object_handle(&mut heap);
    heap.collect();
    assert!(!heap.contains(h));
    assert!(matches!(heap.get(h), Err(ScriptError::Type { .. })));

    // The slot is reused under a new generation.
    let again = object_handle(&mut heap);
    assert_eq!(again.index(), h.index());
    assert_ne!(again.generation(), h.generation());
    assert!(heap.object(h).is_err());
    assert!(heap.object(again).is_ok());
}

#[test]
fn extra_roots_keep_temporaries() {
    let mut heap = Heap::new();
    let temp = heap.alloc_array(vec![Variant::Int32(1)]);
    heap.alloc_string("garbage");
    let freed = heap.collect_with(temp.heap_handle());
    assert_eq!(freed, 1);
    assert!(heap.contains(temp.heap_handle().unwrap()));
}

#[test]
fn wrong_kind_access_fails() {
    let mut heap = Heap::new();
    let s = heap.alloc_string("x").heap_handle().unwrap();
    assert!(heap.array(s).is_err());
    assert!(heap.object_mut(s).is_err());
}

#[test]
fn gc_clones_share_the_heap() {
    let gc = Gc::new();
    let other = gc.clone();
    gc.lock().alloc_object();
    assert_eq!(other.object_count(), 1);
    assert_eq!(other.collect(), 1);
    assert_eq!(gc.object_count(), 0);
}
