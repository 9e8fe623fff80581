use pretty_assertions::assert_eq;

use super::*;
use crate::errors::ScriptError;

#[test]
fn text_forms() {
    let mut heap = Heap::new();
    let s = heap.alloc_string("hi");
    let o = heap.alloc_object();
    let a = heap.alloc_array(Vec::new());

    assert_eq!(to_text(&heap, &Variant::Null), "Null");
    assert_eq!(to_text(&heap, &Variant::Int32(-4)), "-4");
    assert_eq!(to_text(&heap, &Variant::Int64(1 << 40)), "1099511627776");
    assert_eq!(to_text(&heap, &Variant::Float64(2.25)), "2.250000");
    assert_eq!(to_text(&heap, &Variant::Float32(0.5)), "0.500000");
    assert_eq!(to_text(&heap, &s), "hi");
    assert_eq!(to_text(&heap, &o), "{Object}");
    assert_eq!(to_text(&heap, &a), "{Array}");
    assert_eq!(to_text(&heap, &Variant::CodeAddress(0x12)), "{Function@0x0012}");
}

#[test]
fn collected_values_print_as_collected() {
    let mut heap = Heap::new();
    let s = heap.alloc_string("gone");
    heap.collect();
    assert_eq!(to_text(&heap, &s), "{Collected}");
}

#[test]
fn numeric_casts_truncate() {
    let heap = Heap::new();
    assert_eq!(to_i32(&heap, Variant::Float64(3.9)).unwrap(), 3);
    assert_eq!(to_i64(&heap, Variant::Int32(-7)).unwrap(), -7);
    assert_eq!(to_f64(&heap, Variant::Int64(2)).unwrap(), 2.0);
}

#[test]
fn string_casts_parse_text() {
    let mut heap = Heap::new();
    let n = heap.alloc_string(" 42 ");
    let f = heap.alloc_string("2.5");
    assert_eq!(to_i32(&heap, n).unwrap(), 42);
    assert_eq!(to_i64(&heap, f).unwrap(), 2);
    assert_eq!(to_f64(&heap, f).unwrap(), 2.5);
}

#[test]
fn unparsable_text_is_a_conversion_error() {
    let mut heap = Heap::new();
    let bad = heap.alloc_string("abc");
    assert_eq!(
        to_i32(&heap, bad),
        Err(ScriptError::Conversion {
            text: "abc".to_owned(),
            target: "int32",
        })
    );
    assert!(matches!(to_f32(&heap, bad), Err(ScriptError::Conversion { .. })));
}

#[test]
fn non_numeric_kinds_are_type_errors() {
    let mut heap = Heap::new();
    let o = heap.alloc_object();
    assert!(matches!(to_i64(&heap, o), Err(ScriptError::Type { .. })));
    assert!(matches!(to_f64(&heap, Variant::Null), Err(ScriptError::Type { .. })));
}
