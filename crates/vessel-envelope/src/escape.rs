//! Escape substitutions for the textual envelope grammar (§4.3).
//!
//! `]`, `;`, `,`, newline and backslash are the only characters the grammar
//! requires escaping — they are the cell/field delimiters plus the escape
//! character itself. Both directions are infallible: [`unescape`] treats an
//! unrecognized `\x` sequence as literal text rather than erroring, matching
//! the textual codec's "be liberal in input" stance (§9 open questions).

/// Escapes `raw` for embedding as a cell/field value or name.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ']' => out.push_str("\\]"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Inverts [`escape`]. Never fails: an unknown `\x` sequence is kept as-is.
#[must_use]
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(']') => out.push(']'),
            Some(';') => out.push(';'),
            Some(',') => out.push(','),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
