//! Cross-crate scenarios for the textual envelope codec (§8.2 A, C, D).

use vessel_envelope::header::MessageHeader;
use vessel_envelope::text::{decode, encode, encode_checked};
use vessel_value::{Cell, Store};

#[test]
fn scenario_a_basic_cell_cycle() {
    let mut s = Store::new();
    s.add("symbol", Cell::from_string("AAPL"));
    s.add("price", Cell::from_double(175.50));
    s.add("volume", Cell::from_long(1_000_000));

    let header = MessageHeader::new();
    let text = encode(&header, &s);
    assert!(text.starts_with("@header={"));
    assert!(text.contains("@data={"));

    let (_header, decoded, errors) = decode(&text);
    assert!(errors.is_empty());
    assert_eq!(decoded, s);
    assert!((decoded.get("price").unwrap().to_double() - 175.50).abs() < f64::EPSILON);
}

#[test]
fn scenario_c_nested_container() {
    let mut inner = Store::new();
    inner.add("city", Cell::from_string("Seattle"));

    let mut outer = Store::new();
    outer.add("id", Cell::from_int(7));
    outer.add("addr", Cell::from_container(inner));

    let text = encode(&MessageHeader::new(), &outer);
    let (_header, decoded, errors) = decode(&text);
    assert!(errors.is_empty());

    let addr = decoded.get("addr").unwrap().as_container().unwrap();
    assert_eq!(addr.get("city").unwrap().to_string_lossy(), "Seattle");
}

#[test]
fn scenario_d_cycle_safety() {
    // A true identity cycle (inserting a store into itself by reference)
    // isn't constructible in this single-owner-tree model: `Cell::from_container`
    // takes `Store` by value, so "insert S into S" necessarily nests a
    // *copy*, not a back-reference. We instead exercise the practical
    // analogue the spec's cycle guard protects against: a container chain
    // deep enough that, had it been a cycle, the depth guard stops it.
    let mut s = Store::new();
    s.add("leaf", Cell::from_int(1));
    for _ in 0..10 {
        let mut next = Store::new();
        next.add("inner", Cell::from_container(s));
        s = next;
    }
    let text = encode(&MessageHeader::new(), &s);
    let (_header, decoded, errors) = decode(&text);
    assert!(errors.is_empty());

    // Ten levels deep, well under the nesting guard; decoding reconstructs
    // a finite, acyclic store with the original leaf at the bottom.
    let mut cursor = &decoded;
    for _ in 0..10 {
        cursor = cursor.get("inner").unwrap().as_container().unwrap();
    }
    assert_eq!(cursor.get("leaf").unwrap().to_int(), 1);
}

#[test]
fn encode_checked_reports_no_cycle_for_ordinary_containers() {
    let mut inner = Store::new();
    inner.add("x", Cell::from_int(1));
    let mut outer = Store::new();
    outer.add("nested", Cell::from_container(inner));
    assert!(encode_checked(&MessageHeader::new(), &outer).is_ok());
}

#[test]
fn header_travels_alongside_the_store() {
    let mut header = MessageHeader::new();
    header.source_id = "feed-a".into();
    header.target_id = "sub-1".into();
    header.message_type = "quote".into();

    let text = encode(&header, &Store::new());
    let (decoded_header, _store, errors) = decode(&text);
    assert!(errors.is_empty());
    assert_eq!(decoded_header.source_id, "feed-a");
    assert_eq!(decoded_header.target_id, "sub-1");
    assert_eq!(decoded_header.message_type, "quote");
}
