//! A minimal, dependency-free JSON text renderer used only by
//! [`crate::cell::Cell::to_string_lossy`]'s `Container` arm (§4.1: "container
//! yields its JSON projection").
//!
//! This is intentionally *not* the crate-external JSON projection (that's
//! `vessel-envelope::json`, which returns a structured `serde_json::Value`
//! for programmatic use) — `vessel-value` sits below `vessel-envelope` in
//! the workspace's dependency graph, so a plain-text renderer with the same
//! `{"name","type","value"}`-per-entry shape lives here instead of pulling
//! in `serde_json` just to satisfy one coercion rule.

use crate::cell::Cell;
use crate::store::Store;
use vessel_core::TypeTag;

/// Renders `store` as a JSON array of `{"name","type","value"}` objects,
/// the same shape `vessel-envelope::json::store_to_json` produces.
pub(crate) fn store_to_json_text(store: &Store) -> String {
    let mut out = String::from("[");
    for (i, (name, cell)) in store.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(&mut out, Some(name), cell);
    }
    out.push(']');
    out
}

fn push_cell(out: &mut String, name: Option<&str>, cell: &Cell) {
    out.push('{');
    if let Some(name) = name {
        out.push_str("\"name\":");
        push_json_string(out, name);
        out.push(',');
    }
    out.push_str("\"type\":");
    push_json_string(out, cell.tag().name());
    out.push_str(",\"value\":");
    push_value(out, cell);
    out.push('}');
}

fn push_value(out: &mut String, cell: &Cell) {
    match cell.tag() {
        TypeTag::Null => out.push_str("null"),
        TypeTag::Bool => out.push_str(if cell.to_bool() { "true" } else { "false" }),
        TypeTag::Short => out.push_str(&cell.to_short().to_string()),
        TypeTag::UShort => out.push_str(&cell.to_ushort().to_string()),
        TypeTag::Int => out.push_str(&cell.to_int().to_string()),
        TypeTag::UInt => out.push_str(&cell.to_uint().to_string()),
        TypeTag::Long | TypeTag::LLong => out.push_str(&cell.to_long().to_string()),
        TypeTag::ULong | TypeTag::ULLong => out.push_str(&cell.to_ulong().to_string()),
        TypeTag::Float => out.push_str(&cell.to_float().to_string()),
        TypeTag::Double => out.push_str(&cell.to_double().to_string()),
        TypeTag::String => push_json_string(out, &cell.to_string_lossy()),
        TypeTag::Bytes => push_json_string(out, &vessel_core::hex::encode_lower(&cell.to_bytes())),
        TypeTag::Container => out.push_str(&store_to_json_text(cell.as_container().expect("tag matches payload"))),
        TypeTag::Array => {
            out.push('[');
            for (i, e) in cell.as_array().expect("tag matches payload").iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_cell(out, None, e);
            }
            out.push(']');
        }
    }
}

fn push_json_string(out: &mut String, raw: &str) {
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn renders_flat_store_as_json_array() {
        let mut s = Store::new();
        s.add("a", Cell::from_int(1));
        s.add("b", Cell::from_string("x"));
        assert_eq!(
            store_to_json_text(&s),
            r#"[{"name":"a","type":"int","value":1},{"name":"b","type":"string","value":"x"}]"#
        );
    }

    #[test]
    fn escapes_control_characters_and_quotes() {
        let mut s = Store::new();
        s.add("msg", Cell::from_string("a\"b\nc"));
        assert_eq!(store_to_json_text(&s), r#"[{"name":"msg","type":"string","value":"a\"b\nc"}]"#);
    }

    #[test]
    fn nested_container_recurses() {
        let mut inner = Store::new();
        inner.add("x", Cell::from_bool(true));
        let mut outer = Store::new();
        outer.add("nested", Cell::from_container(inner));
        assert_eq!(
            store_to_json_text(&outer),
            r#"[{"name":"nested","type":"container","value":[{"name":"x","type":"bool","value":true}]}]"#
        );
    }
}
