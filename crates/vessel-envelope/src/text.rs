//! The textual envelope codec (C5) — the primary serialization.
//!
//! Grammar (§4.3):
//!
//! ```text
//! @header={ <field-list> };@data={ <cell-list> };
//! ```
//!
//! `<field-list>` is zero or more `key=[value];` entries; `<cell-list>` is
//! zero or more `[name,tag,value];` cells. A cell's `value` is recursive for
//! `Container` (another `@header=…;@data=…;` block wrapped in `{ }`) and
//! `Array` (`{ <cell-list> }`), and plain escaped text otherwise.
//!
//! Decoding defaults to the **basic guarantee** (§7): a malformed leaf value
//! downgrades to a `null` cell bearing its declared name and parsing
//! continues; [`decode_strict`] instead fails on the first error. A
//! structurally broken cell or block (unbalanced brackets, a truncated
//! stream) always aborts the surrounding list — there is no way to safely
//! resume a cursor whose grammar is unknown, so [`decode`] returns whatever
//! was parsed before the break plus the error that stopped it.
//!
//! Legacy producers are tolerated on decode: a `{{ … }}` double-brace block
//! (§9 open question) opens and closes exactly like a single-brace one. This
//! codec always emits single-brace on encode.

use std::ops::Range;

use vessel_value::{Cell, Store, TypeTag};

use crate::header::MessageHeader;
use crate::view::CellSpan;
use crate::{escape, hex, EnvelopeError};

/// Containers/arrays nested past this depth abort the parse (mirrors
/// [`vessel_value::binary::MAX_NESTING_DEPTH`]).
pub const MAX_NESTING_DEPTH: usize = 64;

/* ───────────────────────────── Encoding ───────────────────────────── */

/// Tracks stores currently being encoded on the current call stack so a
/// nested container that would re-enter one of its own ancestors is encoded
/// as empty instead of recursing forever (S3). Threaded explicitly through
/// the recursive encode calls rather than kept as hidden thread-local state
/// (§9 design notes).
#[derive(Debug, Default)]
struct EncodeContext {
    stack: Vec<usize>,
    cycle_hit: bool,
}

impl EncodeContext {
    fn enter(&mut self, store: &Store) -> bool {
        let id = std::ptr::addr_of!(*store) as usize;
        if self.stack.contains(&id) {
            self.cycle_hit = true;
            return false;
        }
        self.stack.push(id);
        true
    }

    fn exit(&mut self) {
        self.stack.pop();
    }
}

/// Encodes `header` and `store` as a textual envelope. Always succeeds: a
/// nested container that re-enters an ancestor store is silently encoded as
/// an empty container (S3) rather than failing.
#[must_use]
pub fn encode(header: &MessageHeader, store: &Store) -> String {
    let mut ctx = EncodeContext::default();
    let mut out = String::new();
    write_envelope(&mut out, header, store, &mut ctx);
    out
}

/// Like [`encode`], but returns [`EnvelopeError::CycleDetected`] instead of
/// silently degrading when a nested container would re-enter an ancestor
/// store — the "strict" counterpart to S3's basic guarantee (§7).
///
/// # Errors
/// Returns [`EnvelopeError::CycleDetected`] if a cycle was encountered.
pub fn encode_checked(header: &MessageHeader, store: &Store) -> Result<String, EnvelopeError> {
    let mut ctx = EncodeContext::default();
    let mut out = String::new();
    write_envelope(&mut out, header, store, &mut ctx);
    if ctx.cycle_hit {
        return Err(EnvelopeError::CycleDetected);
    }
    Ok(out)
}

fn write_envelope(out: &mut String, header: &MessageHeader, store: &Store, ctx: &mut EncodeContext) {
    out.push_str("@header={");
    write_header_fields(out, header);
    out.push_str("};@data={");
    write_cell_list(out, store, ctx);
    out.push_str("};");
}

fn write_header_fields(out: &mut String, header: &MessageHeader) {
    for (key, value) in [
        ("source", &header.source_id),
        ("source_sub", &header.source_sub_id),
        ("target", &header.target_id),
        ("target_sub", &header.target_sub_id),
        ("message_type", &header.message_type),
        ("version", &header.version),
    ] {
        out.push_str(key);
        out.push_str("=[");
        out.push_str(&escape::escape(value));
        out.push_str("];");
    }
}

fn write_cell_list(out: &mut String, store: &Store, ctx: &mut EncodeContext) {
    for (name, cell) in store.iter() {
        write_cell(out, name, cell, ctx);
    }
}

fn write_cell(out: &mut String, name: &str, cell: &Cell, ctx: &mut EncodeContext) {
    out.push('[');
    out.push_str(&escape::escape(name));
    out.push(',');
    out.push(cell.tag().wire_char());
    out.push(',');
    write_value(out, cell, ctx);
    out.push_str("];");
}

fn write_value(out: &mut String, cell: &Cell, ctx: &mut EncodeContext) {
    match cell.tag() {
        TypeTag::Null => {}
        TypeTag::Bool => out.push_str(if cell.to_bool() { "true" } else { "false" }),
        TypeTag::Short => out.push_str(&cell.to_short().to_string()),
        TypeTag::UShort => out.push_str(&cell.to_ushort().to_string()),
        TypeTag::Int => out.push_str(&cell.to_int().to_string()),
        TypeTag::UInt => out.push_str(&cell.to_uint().to_string()),
        TypeTag::Long | TypeTag::LLong => out.push_str(&cell.to_long().to_string()),
        TypeTag::ULong | TypeTag::ULLong => out.push_str(&cell.to_ulong().to_string()),
        TypeTag::Float => out.push_str(&cell.to_float().to_string()),
        TypeTag::Double => out.push_str(&cell.to_double().to_string()),
        TypeTag::String => out.push_str(&escape::escape(&cell.to_string_lossy())),
        TypeTag::Bytes => out.push_str(&hex::encode_lower(&cell.to_bytes())),
        TypeTag::Container => {
            let inner = cell.as_container().expect("tag matches payload");
            out.push('{');
            if ctx.enter(inner) {
                write_envelope(out, &MessageHeader::new(), inner, ctx);
                ctx.exit();
            } else {
                write_envelope(out, &MessageHeader::new(), &Store::new(), ctx);
            }
            out.push('}');
        }
        TypeTag::Array => {
            let elems = cell.as_array().expect("tag matches payload");
            out.push('{');
            for e in elems {
                write_cell(out, "", e, ctx);
            }
            out.push('}');
        }
    }
}

/* ───────────────────────────── Decoding ───────────────────────────── */

/// Parses `input` as a full textual envelope, returning the best-effort
/// result plus every malformed-cell/field error encountered along the way
/// (the **basic guarantee**, §7). A structural break — an unterminated
/// bracket, a missing `@header=`/`@data=` marker — stops the parse at that
/// point; everything decoded before it is still returned.
#[must_use]
pub fn decode(input: &str) -> (MessageHeader, Store, Vec<EnvelopeError>) {
    let mut p = Parser::new(input, false);
    let result = match p.parse_envelope_inner(0) {
        Ok((header, store)) => (header, store, p.errors),
        Err(e) => {
            p.errors.push(e);
            (MessageHeader::new(), Store::new(), p.errors)
        }
    };
    #[cfg(feature = "tracing")]
    if !result.2.is_empty() {
        tracing::debug!(error_count = result.2.len(), "textual decode recorded errors under the basic guarantee");
    }
    result
}

/// Parses `input`, failing on the first error of any kind (structural or a
/// single malformed cell) instead of degrading to a `null` cell.
///
/// # Errors
/// Returns the first [`EnvelopeError`] encountered.
pub fn decode_strict(input: &str) -> Result<(MessageHeader, Store), EnvelopeError> {
    let mut p = Parser::new(input, true);
    p.parse_envelope_inner(0)
}

/// The result of a header-only parse (§4.3 "two parsing modes"): the header
/// is fully decoded; the data block's body is left unparsed but its byte
/// span in `input` is retained for [`HeaderOnlyParse::parse_data`] or a
/// lazy [`crate::view::ValueView`].
pub struct HeaderOnlyParse<'a> {
    /// The decoded messaging header.
    pub header: MessageHeader,
    source: &'a str,
    data_span: Range<usize>,
}

impl<'a> HeaderOnlyParse<'a> {
    /// Fully parses the retained data-block span into a [`Store`].
    #[must_use]
    pub fn parse_data(&self) -> (Store, Vec<EnvelopeError>) {
        decode_cell_list_body(&self.source[self.data_span.clone()], false)
    }

    /// Builds a zero-copy [`crate::view::ValueView`] over the retained span.
    #[must_use]
    pub fn view(&self) -> crate::view::ValueView<'a> {
        crate::view::ValueView::new(self.source, self.data_span.clone())
    }
}

/// Parses only the header, retaining the data block's span for later lazy
/// parsing (§4.3 "header-only" mode).
///
/// # Errors
/// Returns [`EnvelopeError`] if the `@header=`/`@data=` structure itself is
/// broken (a missing marker or an unterminated field).
pub fn decode_header_only(input: &str) -> Result<HeaderOnlyParse<'_>, EnvelopeError> {
    let mut p = Parser::new(input, true);
    p.expect_literal("@header=")?;
    let doubled = p.expect_open_brace()?;
    let header = p.parse_header_fields()?;
    p.expect_close_brace(doubled)?;
    p.expect_char(';')?;
    p.expect_literal("@data=")?;
    let data_doubled = p.expect_open_brace()?;
    let data_start = p.pos;
    loop {
        if p.peek() == Some('}') || p.peek().is_none() {
            break;
        }
        p.skip_one_cell(0)?;
    }
    let data_end = p.pos;
    p.expect_close_brace(data_doubled)?;
    p.expect_char(';')?;
    Ok(HeaderOnlyParse { header, source: input, data_span: data_start..data_end })
}

fn decode_cell_list_body(body: &str, strict: bool) -> (Store, Vec<EnvelopeError>) {
    let mut p = Parser::new(body, strict);
    match p.parse_cell_list(0) {
        Ok(store) => (store, p.errors),
        Err(e) => {
            p.errors.push(e);
            (Store::new(), p.errors)
        }
    }
}

/// Scans the cell spans of a data block for [`crate::view::ValueView`]
/// without building any [`Cell`] — pure cursor bookkeeping.
pub(crate) fn scan_top_level_cells(source: &str, span: Range<usize>) -> Vec<CellSpan> {
    let mut p = Parser::new(source, false);
    p.pos = span.start;
    let mut spans = Vec::new();
    while p.pos < span.end {
        if p.peek() == Some('}') || p.peek().is_none() {
            break;
        }
        if p.walk_cell(0, &mut spans).is_err() {
            break;
        }
    }
    spans
}

struct Parser<'a> {
    s: &'a str,
    pos: usize,
    strict: bool,
    errors: Vec<EnvelopeError>,
}

impl<'a> Parser<'a> {
    fn new(s: &'a str, strict: bool) -> Self {
        Self { s, pos: 0, strict, errors: Vec::new() }
    }

    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect_char(&mut self, c: char) -> Result<(), EnvelopeError> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(EnvelopeError::Syntax { at: self.pos, reason: format!("expected '{c}'") })
        }
    }

    fn expect_literal(&mut self, lit: &str) -> Result<(), EnvelopeError> {
        if self.s[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            Ok(())
        } else {
            Err(EnvelopeError::MalformedEnvelope { reason: format!("missing {lit}") })
        }
    }

    fn expect_open_brace(&mut self) -> Result<bool, EnvelopeError> {
        if self.s[self.pos..].starts_with("{{") {
            self.pos += 2;
            Ok(true)
        } else if self.peek() == Some('{') {
            self.pos += 1;
            Ok(false)
        } else {
            Err(EnvelopeError::Syntax { at: self.pos, reason: "expected '{'".to_owned() })
        }
    }

    fn expect_close_brace(&mut self, doubled: bool) -> Result<(), EnvelopeError> {
        if doubled {
            if self.s[self.pos..].starts_with("}}") {
                self.pos += 2;
                Ok(())
            } else {
                Err(EnvelopeError::Syntax { at: self.pos, reason: "expected '}}'".to_owned() })
            }
        } else {
            self.expect_char('}')
        }
    }

    /// Reads raw (still-escaped) text up to — and consuming — the first
    /// unescaped `terminator`.
    fn scan_until_unescaped(&mut self, terminator: char) -> Result<String, EnvelopeError> {
        let start = self.pos;
        let mut escaped = false;
        for (i, c) in self.s[self.pos..].char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            if c == '\\' {
                escaped = true;
                continue;
            }
            if c == terminator {
                let raw = self.s[self.pos..self.pos + i].to_owned();
                self.pos += i + c.len_utf8();
                return Ok(raw);
            }
        }
        Err(EnvelopeError::Syntax { at: start, reason: format!("unterminated field (expected '{terminator}')") })
    }

    fn record_or_fail(&mut self, err: EnvelopeError) -> Result<(), EnvelopeError> {
        if self.strict {
            return Err(err);
        }
        self.errors.push(err);
        Ok(())
    }

    fn parse_envelope_inner(&mut self, depth: usize) -> Result<(MessageHeader, Store), EnvelopeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EnvelopeError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
        }
        self.expect_literal("@header=")?;
        let d1 = self.expect_open_brace()?;
        let header = self.parse_header_fields()?;
        self.expect_close_brace(d1)?;
        self.expect_char(';')?;
        self.expect_literal("@data=")?;
        let d2 = self.expect_open_brace()?;
        let store = self.parse_cell_list(depth)?;
        self.expect_close_brace(d2)?;
        self.expect_char(';')?;
        Ok((header, store))
    }

    fn parse_header_fields(&mut self) -> Result<MessageHeader, EnvelopeError> {
        let mut header = MessageHeader::new();
        loop {
            if self.peek() == Some('}') || self.peek().is_none() {
                break;
            }
            let raw_key = self.scan_until_unescaped('=')?;
            let key = escape::unescape(&raw_key);
            self.expect_char('[')?;
            let raw_val = self.scan_until_unescaped(']')?;
            self.expect_char(';')?;
            let val = escape::unescape(&raw_val);
            match key.as_str() {
                "source" => header.source_id = val,
                "source_sub" => header.source_sub_id = val,
                "target" => header.target_id = val,
                "target_sub" => header.target_sub_id = val,
                "message_type" => header.message_type = val,
                "version" => header.version = val,
                _ => {} // unknown fields are ignored on decode (§4.3)
            }
        }
        Ok(header)
    }

    fn parse_cell_list(&mut self, depth: usize) -> Result<Store, EnvelopeError> {
        let mut store = Store::new();
        loop {
            if self.peek() == Some('}') || self.peek().is_none() {
                break;
            }
            match self.parse_one_cell(depth) {
                Ok((name, cell)) => store.add(name, cell),
                Err(e) => {
                    self.errors.push(e.clone());
                    if self.strict {
                        return Err(e);
                    }
                    break;
                }
            }
        }
        Ok(store)
    }

    fn parse_one_cell(&mut self, depth: usize) -> Result<(String, Cell), EnvelopeError> {
        self.expect_char('[')?;
        let raw_name = self.scan_until_unescaped(',')?;
        let name = escape::unescape(&raw_name);
        let tag_raw = self
            .bump()
            .ok_or_else(|| EnvelopeError::Syntax { at: self.pos, reason: "unterminated cell".to_owned() })?;
        self.expect_char(',')?;
        let tag = TypeTag::from_wire_char(tag_raw).map(TypeTag::normalize);

        let cell = if matches!(tag, Some(TypeTag::Container)) && self.peek() == Some('{') {
            let store = self.parse_container_value(depth + 1)?;
            self.expect_char(']')?;
            Cell::from_container(store)
        } else if matches!(tag, Some(TypeTag::Array)) && self.peek() == Some('{') {
            let elems = self.parse_array_value(depth + 1)?;
            self.expect_char(']')?;
            Cell::from_array(elems)
        } else {
            let raw_value = self.scan_until_unescaped(']')?;
            self.interpret_scalar(&name, tag, &raw_value)?
        };
        self.expect_char(';')?;
        Ok((name, cell))
    }

    fn parse_container_value(&mut self, depth: usize) -> Result<Store, EnvelopeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EnvelopeError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
        }
        let doubled = self.expect_open_brace()?;
        let (_header, store) = self.parse_envelope_inner(depth)?;
        self.expect_close_brace(doubled)?;
        Ok(store)
    }

    fn parse_array_value(&mut self, depth: usize) -> Result<Vec<Cell>, EnvelopeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EnvelopeError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
        }
        let doubled = self.expect_open_brace()?;
        let mut elems = Vec::new();
        loop {
            if self.peek() == Some('}') || self.peek().is_none() {
                break;
            }
            match self.parse_one_cell(depth) {
                Ok((_, cell)) => elems.push(cell),
                Err(e) => {
                    self.errors.push(e.clone());
                    if self.strict {
                        return Err(e);
                    }
                    break;
                }
            }
        }
        self.expect_close_brace(doubled)?;
        Ok(elems)
    }

    fn interpret_scalar(&mut self, name: &str, tag: Option<TypeTag>, raw: &str) -> Result<Cell, EnvelopeError> {
        let Some(tag) = tag else {
            self.record_or_fail(EnvelopeError::MalformedCell {
                name: name.to_owned(),
                reason: "unknown tag code".to_owned(),
            })?;
            return Ok(Cell::null());
        };
        let text = escape::unescape(raw);
        let mut bad = |reason: &str| EnvelopeError::MalformedCell { name: name.to_owned(), reason: reason.to_owned() };
        let cell = match tag {
            TypeTag::Null => Cell::null(),
            TypeTag::Bool => match text.trim() {
                "true" | "1" | "t" | "True" | "TRUE" => Cell::from_bool(true),
                "false" | "0" | "f" | "" | "False" | "FALSE" => Cell::from_bool(false),
                _ => {
                    self.record_or_fail(bad("not a boolean"))?;
                    Cell::null()
                }
            },
            TypeTag::Short => match text.trim().parse() {
                Ok(v) => Cell::from_short(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid i16"))?;
                    Cell::null()
                }
            },
            TypeTag::UShort => match text.trim().parse() {
                Ok(v) => Cell::from_ushort(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid u16"))?;
                    Cell::null()
                }
            },
            TypeTag::Int => match text.trim().parse() {
                Ok(v) => Cell::from_int(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid i32"))?;
                    Cell::null()
                }
            },
            TypeTag::UInt => match text.trim().parse() {
                Ok(v) => Cell::from_uint(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid u32"))?;
                    Cell::null()
                }
            },
            TypeTag::Long => match text.trim().parse() {
                Ok(v) => Cell::from_long(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid i64"))?;
                    Cell::null()
                }
            },
            TypeTag::ULong => match text.trim().parse() {
                Ok(v) => Cell::from_ulong(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid u64"))?;
                    Cell::null()
                }
            },
            TypeTag::Float => match text.trim().parse() {
                Ok(v) => Cell::from_float(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid f32"))?;
                    Cell::null()
                }
            },
            TypeTag::Double => match text.trim().parse() {
                Ok(v) => Cell::from_double(v),
                Err(_) => {
                    self.record_or_fail(bad("not a valid f64"))?;
                    Cell::null()
                }
            },
            TypeTag::String => Cell::from_string(text),
            TypeTag::Bytes => match hex::decode(text.trim()) {
                Some(b) => Cell::from_bytes(b),
                None => {
                    self.record_or_fail(bad("not valid hex"))?;
                    Cell::null()
                }
            },
            TypeTag::Container | TypeTag::Array => {
                unreachable!("structural tags are routed to parse_container_value/parse_array_value")
            }
            TypeTag::LLong | TypeTag::ULLong => unreachable!("normalize() folds aliases before this match"),
        };
        Ok(cell)
    }

    fn skip_one_cell(&mut self, depth: usize) -> Result<(), EnvelopeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EnvelopeError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
        }
        self.expect_char('[')?;
        let _name = self.scan_until_unescaped(',')?;
        let tag_raw = self
            .bump()
            .ok_or_else(|| EnvelopeError::Syntax { at: self.pos, reason: "unterminated cell".to_owned() })?;
        self.expect_char(',')?;
        let tag = TypeTag::from_wire_char(tag_raw).map(TypeTag::normalize);
        if matches!(tag, Some(TypeTag::Container)) && self.peek() == Some('{') {
            let doubled = self.expect_open_brace()?;
            self.skip_envelope_inner(depth + 1)?;
            self.expect_close_brace(doubled)?;
            self.expect_char(']')?;
        } else if matches!(tag, Some(TypeTag::Array)) && self.peek() == Some('{') {
            let doubled = self.expect_open_brace()?;
            loop {
                if self.peek() == Some('}') || self.peek().is_none() {
                    break;
                }
                self.skip_one_cell(depth + 1)?;
            }
            self.expect_close_brace(doubled)?;
            self.expect_char(']')?;
        } else {
            let _ = self.scan_until_unescaped(']')?;
        }
        self.expect_char(';')?;
        Ok(())
    }

    fn skip_envelope_inner(&mut self, depth: usize) -> Result<(), EnvelopeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EnvelopeError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
        }
        self.expect_literal("@header=")?;
        let d1 = self.expect_open_brace()?;
        loop {
            if self.peek() == Some('}') || self.peek().is_none() {
                break;
            }
            let _k = self.scan_until_unescaped('=')?;
            self.expect_char('[')?;
            let _v = self.scan_until_unescaped(']')?;
            self.expect_char(';')?;
        }
        self.expect_close_brace(d1)?;
        self.expect_char(';')?;
        self.expect_literal("@data=")?;
        let d2 = self.expect_open_brace()?;
        loop {
            if self.peek() == Some('}') || self.peek().is_none() {
                break;
            }
            self.skip_one_cell(depth)?;
        }
        self.expect_close_brace(d2)?;
        self.expect_char(';')?;
        Ok(())
    }

    /// Like [`Self::skip_one_cell`], but records a [`CellSpan`] for cells
    /// seen at `depth == 0` — the backbone of [`crate::view::ValueView`].
    fn walk_cell(&mut self, depth: usize, spans: &mut Vec<CellSpan>) -> Result<(), EnvelopeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EnvelopeError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
        }
        self.expect_char('[')?;
        let name_start = self.pos;
        let _ = self.scan_until_unescaped(',')?;
        let name_end = self.pos - 1;
        let tag_raw = self
            .bump()
            .ok_or_else(|| EnvelopeError::Syntax { at: self.pos, reason: "unterminated cell".to_owned() })?;
        self.expect_char(',')?;
        let tag = TypeTag::from_wire_char(tag_raw).map(TypeTag::normalize);
        let value_start = self.pos;
        let value_end;
        if matches!(tag, Some(TypeTag::Container)) && self.peek() == Some('{') {
            let doubled = self.expect_open_brace()?;
            self.skip_envelope_inner(depth + 1)?;
            self.expect_close_brace(doubled)?;
            value_end = self.pos;
            self.expect_char(']')?;
        } else if matches!(tag, Some(TypeTag::Array)) && self.peek() == Some('{') {
            let doubled = self.expect_open_brace()?;
            loop {
                if self.peek() == Some('}') || self.peek().is_none() {
                    break;
                }
                self.walk_cell(depth + 1, spans)?;
            }
            self.expect_close_brace(doubled)?;
            value_end = self.pos;
            self.expect_char(']')?;
        } else {
            let _ = self.scan_until_unescaped(']')?;
            value_end = self.pos - 1;
        }
        self.expect_char(';')?;
        if depth == 0 {
            spans.push(CellSpan { name: name_start..name_end, value: value_start..value_end, tag });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> Store {
        let mut s = Store::new();
        s.add("symbol", Cell::from_string("AAPL"));
        s.add("price", Cell::from_double(175.50));
        s.add("volume", Cell::from_long(1_000_000));
        s
    }

    #[test]
    fn scenario_a_basic_cell_cycle() {
        let s = sample_store();
        let header = MessageHeader::new();
        let text = encode(&header, &s);
        assert!(text.starts_with("@header={"));
        assert!(text.contains("[symbol,c,AAPL];[price,b,175.5];[volume,6,1000000];"));

        let (_h, decoded, errors) = decode(&text);
        assert!(errors.is_empty());
        assert_eq!(decoded, s);
        assert!((decoded.get("price").unwrap().to_double() - 175.50).abs() < f64::EPSILON);
    }

    #[test]
    fn scenario_b_duplicate_keys() {
        let mut s = Store::new();
        for v in ["a", "b", "c", "d", "e"] {
            s.add("tag", Cell::from_string(v));
        }
        let text = encode(&MessageHeader::new(), &s);
        let (_h, decoded, errors) = decode(&text);
        assert!(errors.is_empty());
        assert_eq!(decoded.get("tag").unwrap().to_string_lossy(), "a");
        assert_eq!(decoded.get_all("tag").len(), 5);
    }

    #[test]
    fn scenario_c_nested_container() {
        let mut inner = Store::new();
        inner.add("city", Cell::from_string("Seattle"));
        let mut outer = Store::new();
        outer.add("id", Cell::from_int(7));
        outer.add("addr", Cell::from_container(inner));

        let text = encode(&MessageHeader::new(), &outer);
        let (_h, decoded, errors) = decode(&text);
        assert!(errors.is_empty());
        let addr = decoded.get("addr").unwrap().as_container().unwrap();
        assert_eq!(addr.get("city").unwrap().to_string_lossy(), "Seattle");
    }

    #[test]
    fn header_fields_round_trip_and_swap() {
        let mut header = MessageHeader::new();
        header.source_id = "svc-a".into();
        header.target_id = "svc-b".into();
        header.message_type = "ping".into();

        let text = encode(&header, &Store::new());
        let (decoded_header, _s, errors) = decode(&text);
        assert!(errors.is_empty());
        assert_eq!(decoded_header.source_id, "svc-a");
        assert_eq!(decoded_header.target_id, "svc-b");
        assert_eq!(decoded_header.message_type, "ping");
        assert_eq!(decoded_header.version, "1.0.0.0");
    }

    #[test]
    fn malformed_cell_degrades_to_null_and_continues() {
        let text = "@header={};@data={[a,4,not_a_number];[b,4,9];};";
        let (_h, store, errors) = decode(text);
        assert_eq!(errors.len(), 1);
        assert_eq!(store.get("a").unwrap().tag(), TypeTag::Null);
        assert_eq!(store.get("b").unwrap().to_int(), 9);
    }

    #[test]
    fn strict_mode_fails_on_first_malformed_cell() {
        let text = "@header={};@data={[a,4,not_a_number];};";
        assert!(decode_strict(text).is_err());
    }

    #[test]
    fn missing_markers_is_malformed_envelope() {
        let (_h, store, errors) = decode("not an envelope at all");
        assert!(store.is_empty());
        assert!(!errors.is_empty());
    }

    #[test]
    fn escapes_round_trip_through_string_values() {
        let mut s = Store::new();
        s.add("msg", Cell::from_string("a]b;c,d\\e\nf"));
        let text = encode(&MessageHeader::new(), &s);
        let (_h, decoded, errors) = decode(&text);
        assert!(errors.is_empty());
        assert_eq!(decoded.get("msg").unwrap().to_string_lossy(), "a]b;c,d\\e\nf");
    }

    #[test]
    fn array_cells_round_trip() {
        let mut s = Store::new();
        s.add("list", Cell::from_array(vec![Cell::from_int(1), Cell::from_int(2), Cell::from_string("x")]));
        let text = encode(&MessageHeader::new(), &s);
        let (_h, decoded, errors) = decode(&text);
        assert!(errors.is_empty());
        let arr = decoded.get("list").unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[2].to_string_lossy(), "x");
    }

    #[test]
    fn legacy_double_brace_envelope_is_accepted() {
        let text = "@header={{}};@data={{[a,4,9];}};";
        let (_h, store, errors) = decode(text);
        assert!(errors.is_empty());
        assert_eq!(store.get("a").unwrap().to_int(), 9);
    }

    #[test]
    fn header_only_then_lazy_data_parse() {
        let s = sample_store();
        let mut header = MessageHeader::new();
        header.message_type = "quote".into();
        let text = encode(&header, &s);

        let parsed = decode_header_only(&text).unwrap();
        assert_eq!(parsed.header.message_type, "quote");
        let (store, errors) = parsed.parse_data();
        assert!(errors.is_empty());
        assert_eq!(store, s);
    }

    #[test]
    fn deeply_nested_containers_hit_the_depth_guard() {
        let mut innermost = Store::new();
        innermost.add("leaf", Cell::from_int(1));
        let mut current = innermost;
        for _ in 0..MAX_NESTING_DEPTH + 2 {
            let mut next = Store::new();
            next.add("inner", Cell::from_container(current));
            current = next;
        }
        let text = encode(&MessageHeader::new(), &current);
        let (_h, _store, errors) = decode(&text);
        assert!(errors.iter().any(|e| matches!(e, EnvelopeError::NestingTooDeep { .. })));
    }
}
