//! Cross-crate scenarios for the value store (§8.2 B) plus the ordering and
//! duplicate-key properties (§8.1 §5–6).

use vessel_value::{Cell, Store};

#[test]
fn scenario_b_duplicate_keys() {
    let mut s = Store::new();
    for v in ["a", "b", "c", "d", "e"] {
        s.add("tag", Cell::from_string(v));
    }
    assert_eq!(s.get("tag").unwrap().to_string_lossy(), "a");
    let all: Vec<String> = s.get_all("tag").iter().map(|c| c.to_string_lossy()).collect();
    assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(s.remove("tag"), 5);
    assert!(s.is_empty());
}

#[test]
fn order_preservation_across_duplicates() {
    let mut s = Store::new();
    let names = ["k1", "k2", "k1", "k3", "k2"];
    for (i, n) in names.iter().enumerate() {
        s.add(*n, Cell::from_int(i as i32));
    }
    let mut visited = Vec::new();
    s.for_each(|n, c| visited.push((n.to_owned(), c.to_int())));
    let expected: Vec<(String, i32)> =
        names.iter().enumerate().map(|(i, n)| ((*n).to_owned(), i as i32)).collect();
    assert_eq!(visited, expected);
}

#[test]
fn coercion_saturation_leaves_original_cell_unchanged() {
    let c = Cell::from_long(i64::from(i32::MAX) + 1000);
    let clamped = c.to_int();
    assert_eq!(clamped, i32::MAX);
    assert_eq!(c.to_long(), i64::from(i32::MAX) + 1000, "coercion never mutates the source cell");
}

#[test]
fn tag_alignment_for_every_wire_code() {
    use vessel_core::TypeTag;
    for tag in TypeTag::ALL {
        assert_eq!(TypeTag::from_code(tag.code()).map(TypeTag::normalize), Some(tag.normalize()));
    }
}
