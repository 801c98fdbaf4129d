//! JSON projection (C6): a lossy-but-typed rendering of a [`Store`] as a
//! `serde_json::Value`, modeled on the DAP-style envelope projections the
//! teacher's debug adapter crate builds over `serde_json::Value` directly.
//!
//! A `Store` projects as a JSON **array**, not an object, because it allows
//! duplicate names (S2) — an object would silently lose every entry but the
//! last for a repeated key. Each element is `{"name", "type", "value"}`; an
//! array cell's own elements project the same way but without a `name`.
//!
//! This projection is one-way and typed-but-lossy (§4.4): the original
//! numeric width (`Short` vs `Int` vs `Long`, …) is preserved in the `type`
//! field, but there is no decoder back from JSON — a consumer that needs a
//! round trip should use the textual envelope codec instead.

use serde_json::{json, Value as Json};

use vessel_value::{Cell, Store, TypeTag};

/// Projects `store` as a JSON array of `{"name","type","value"}` objects.
#[must_use]
pub fn store_to_json(store: &Store) -> Json {
    Json::Array(store.iter().map(|(name, cell)| cell_to_json(Some(name), cell)).collect())
}

fn cell_to_json(name: Option<&str>, cell: &Cell) -> Json {
    let value = value_to_json(cell);
    let mut obj = serde_json::Map::new();
    if let Some(name) = name {
        obj.insert("name".to_owned(), Json::String(name.to_owned()));
    }
    obj.insert("type".to_owned(), Json::String(cell.tag().name().to_owned()));
    obj.insert("value".to_owned(), value);
    Json::Object(obj)
}

fn value_to_json(cell: &Cell) -> Json {
    match cell.tag() {
        TypeTag::Null => Json::Null,
        TypeTag::Bool => json!(cell.to_bool()),
        TypeTag::Short => json!(cell.to_short()),
        TypeTag::UShort => json!(cell.to_ushort()),
        TypeTag::Int => json!(cell.to_int()),
        TypeTag::UInt => json!(cell.to_uint()),
        TypeTag::Long | TypeTag::LLong => json!(cell.to_long()),
        TypeTag::ULong | TypeTag::ULLong => json!(cell.to_ulong()),
        TypeTag::Float => json!(cell.to_float()),
        TypeTag::Double => json!(cell.to_double()),
        TypeTag::String => Json::String(cell.to_string_lossy()),
        TypeTag::Bytes => Json::String(crate::hex::encode_lower(&cell.to_bytes())),
        TypeTag::Container => store_to_json(cell.as_container().expect("tag matches payload")),
        TypeTag::Array => Json::Array(
            cell.as_array()
                .expect("tag matches payload")
                .iter()
                .map(|e| cell_to_json(None, e))
                .collect(),
        ),
    }
}
