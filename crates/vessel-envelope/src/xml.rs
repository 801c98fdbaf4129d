//! XML projection (C6): the same lossy-but-typed rendering as [`crate::json`],
//! as a hand-rolled `<cell>` element tree rather than a `serde_json::Value`
//! (the workspace carries no XML crate, so escaping is done directly —
//! mirroring how [`crate::escape`] hand-rolls the textual grammar's own
//! escaping rather than reaching for a parser-combinator crate).
//!
//! `Store` projects as `<store>` containing one `<cell name="..." type="...">`
//! per entry (again as a sequence, never as XML attributes-as-map, to
//! preserve duplicate names per S2); a nested array's elements omit `name`.

use vessel_value::{Cell, Store, TypeTag};

/// Projects `store` as an XML fragment rooted at `<store>`.
#[must_use]
pub fn store_to_xml(store: &Store) -> String {
    let mut out = String::from("<store>");
    for (name, cell) in store.iter() {
        write_cell(&mut out, Some(name), cell);
    }
    out.push_str("</store>");
    out
}

fn write_cell(out: &mut String, name: Option<&str>, cell: &Cell) {
    out.push_str("<cell");
    if let Some(name) = name {
        out.push_str(" name=\"");
        out.push_str(&escape_attr(name));
        out.push('"');
    }
    out.push_str(" type=\"");
    out.push_str(cell.tag().name());
    out.push('"');

    match cell.tag() {
        TypeTag::Container => {
            out.push('>');
            out.push_str(&store_to_xml(cell.as_container().expect("tag matches payload")));
            out.push_str("</cell>");
        }
        TypeTag::Array => {
            out.push('>');
            for e in cell.as_array().expect("tag matches payload") {
                write_cell(out, None, e);
            }
            out.push_str("</cell>");
        }
        TypeTag::Null => out.push_str("/>"),
        TypeTag::Bytes => {
            out.push('>');
            out.push_str(&crate::hex::encode_lower(&cell.to_bytes()));
            out.push_str("</cell>");
        }
        _ => {
            out.push('>');
            out.push_str(&escape_text(&cell.to_string_lossy()));
            out.push_str("</cell>");
        }
    }
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_attr(raw: &str) -> String {
    let mut out = escape_text(raw);
    out = out.replace('"', "&quot;");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_cells_project_as_named_elements() {
        let mut s = Store::new();
        s.add("price", Cell::from_double(1.5));
        let xml = store_to_xml(&s);
        assert_eq!(xml, r#"<store><cell name="price" type="double">1.5</cell></store>"#);
    }

    #[test]
    fn text_is_escaped() {
        let mut s = Store::new();
        s.add("msg", Cell::from_string("a < b & c"));
        let xml = store_to_xml(&s);
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn nested_container_projects_recursively() {
        let mut inner = Store::new();
        inner.add("x", Cell::from_int(1));
        let mut outer = Store::new();
        outer.add("nested", Cell::from_container(inner));
        let xml = store_to_xml(&outer);
        assert!(xml.contains(r#"<cell name="nested" type="container"><store><cell name="x" type="int">1</cell></store></cell>"#));
    }

    #[test]
    fn array_elements_omit_name() {
        let mut s = Store::new();
        s.add("nums", Cell::from_array(vec![Cell::from_int(1)]));
        let xml = store_to_xml(&s);
        assert!(xml.contains(r#"<cell name="nums" type="array"><cell type="int">1</cell></cell>"#));
    }
}
