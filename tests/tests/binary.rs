//! Cross-crate scenario for the binary codec (§8.2 E): truncation must
//! reject the whole decode, never hand back a partial store.

use vessel_value::binary::{decode_store, encode_store};
use vessel_value::{Cell, Store, ValueError};

#[test]
fn scenario_e_binary_truncation() {
    let mut s = Store::new();
    s.add("symbol", Cell::from_string("AAPL"));
    s.add("price", Cell::from_double(175.50));
    s.add("volume", Cell::from_long(1_000_000));

    let mut bytes = encode_store(&s);
    let truncated_len = bytes.len() - 4;
    bytes.truncate(truncated_len);

    let err = decode_store(&bytes).unwrap_err();
    assert!(matches!(err, ValueError::TruncatedBuffer { .. }));
}

#[test]
fn binary_round_trip_preserves_order_and_tags() {
    let mut s = Store::new();
    s.add("a", Cell::from_short(1));
    s.add("b", Cell::from_ulong(u64::MAX));
    s.add("a", Cell::from_bool(true));
    s.add("nested", Cell::from_array(vec![Cell::from_int(1), Cell::from_int(2)]));

    let bytes = encode_store(&s);
    let decoded = decode_store(&bytes).unwrap();
    assert_eq!(decoded, s);

    let mut order = Vec::new();
    decoded.for_each(|n, _| order.push(n.to_owned()));
    assert_eq!(order, vec!["a", "b", "a", "nested"]);
}

#[test]
fn llong_ullong_aliases_collapse_on_encode_decode() {
    use vessel_core::TypeTag;
    let mut s = Store::new();
    s.add("x", Cell::from_long(42));
    let bytes = encode_store(&s);
    let decoded = decode_store(&bytes).unwrap();
    assert_eq!(decoded.get("x").unwrap().tag(), TypeTag::Long.normalize());
}
