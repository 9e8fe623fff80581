use pretty_assertions::assert_eq;

use super::*;

fn handle(index: u32) -> Handle {
    Handle::new(index, 0)
}

#[test]
fn object_set_tracks_replaced_edges() {
    let mut object = ScriptObject::new();
    object.set("a", Variant::Object(handle(1)));
    assert!(object.references().contains(handle(1)));

    object.set("a", Variant::Int32(5));
    assert!(!object.references().contains(handle(1)));
    assert_eq!(object.get("a"), Variant::Int32(5));
}

#[test]
fn shared_child_survives_one_overwrite() {
    let mut object = ScriptObject::new();
    object.set("x", Variant::Array(handle(2)));
    object.set("y", Variant::Array(handle(2)));
    assert_eq!(object.references().count(handle(2)), 2);

    object.set("x", Variant::Null);
    assert!(object.references().contains(handle(2)));

    object.set("y", Variant::Null);
    assert!(object.references().is_empty());
}

#[test]
fn missing_field_reads_null() {
    let object = ScriptObject::new();
    assert_eq!(object.get("nope"), Variant::Null);
}

#[test]
fn array_write_pads_with_null() {
    let mut array = ScriptArray::new();
    array.set(3, Variant::Int32(9));
    assert_eq!(array.len(), 4);
    assert_eq!(array.peek(0), Some(Variant::Null));
    assert_eq!(array.peek(3), Some(Variant::Int32(9)));
}

#[test]
fn array_read_past_end_grows() {
    let mut array = ScriptArray::new();
    assert_eq!(array.get(32), Variant::Null);
    assert_eq!(array.len(), 33);
}

#[test]
fn array_element_edges_follow_writes() {
    let mut array = ScriptArray::from_elements(vec![Variant::String(handle(4))]);
    assert!(array.references().contains(handle(4)));
    array.set(0, Variant::Int64(1));
    assert!(array.references().is_empty());
    array.push(Variant::Object(handle(5)));
    assert!(array.references().contains(handle(5)));
}

#[test]
fn index_validation() {
    assert_eq!(checked_index(0), Ok(0));
    assert!(checked_index(-1).is_err());
    assert!(checked_index(1 << 24).is_err());
    assert_eq!(checked_index((1 << 24) - 1), Ok((1 << 24) - 1));
}
