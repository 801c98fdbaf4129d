//! The binary codec (C4): a strict, length-prefixed, little-endian wire
//! format for a [`Store`].
//!
//! Per-cell layout: `[name_len:u32][name][tag:u8][payload]`. Store layout:
//! `[count:u32][cell*]`. Decoding is all-or-nothing (S3): any validation
//! failure — a bad tag byte, a length that overruns the buffer, invalid
//! UTF-8 — aborts the whole decode and returns an error; a partially
//! decoded store is never handed back to the caller.

use vessel_core::{ByteReader, ByteWriter, TypeTag};

use crate::cell::Cell;
use crate::store::Store;
use crate::{ValueError, ValueResult};

/// Maximum container/array nesting depth the decoder will follow before
/// reporting [`ValueError::NestingTooDeep`]. Guards against pathological or
/// adversarial input building an unbounded recursion.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Encodes a store into its binary wire representation.
#[must_use]
pub fn encode_store(store: &Store) -> Vec<u8> {
    let mut w = ByteWriter::new();
    write_store(&mut w, store);
    w.into_vec()
}

/// Decodes a store from its binary wire representation.
///
/// # Errors
/// Returns [`ValueError::TruncatedBuffer`] if `bytes` ends early,
/// [`ValueError::InvalidTag`] if a tag byte is outside `0..=15`,
/// [`ValueError::InvalidUtf8`] if a name/string field is not valid UTF-8, or
/// [`ValueError::NestingTooDeep`] if containers/arrays nest past
/// [`MAX_NESTING_DEPTH`]. On any error the buffer is left fully unconsumed
/// from the caller's point of view — no partial store is returned.
pub fn decode_store(bytes: &[u8]) -> ValueResult<Store> {
    let mut r = ByteReader::new(bytes);
    let result = read_store(&mut r, 0);
    #[cfg(feature = "tracing")]
    if let Err(ref e) = result {
        tracing::debug!(error = %e, len = bytes.len(), "binary decode aborted");
    }
    result
}

fn write_store(w: &mut ByteWriter, store: &Store) {
    w.write_u32_le(store.len() as u32);
    for (name, cell) in store.iter() {
        w.write_str_u32_prefixed(name);
        write_cell_value(w, cell);
    }
}

fn read_store(r: &mut ByteReader<'_>, depth: usize) -> ValueResult<Store> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ValueError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
    }
    let count = r.read_u32_le()?;
    let mut store = Store::new();
    for _ in 0..count {
        let name = r.read_str_u32_prefixed()?.to_owned();
        let cell = read_cell_value(r, depth + 1)?;
        store.add(name, cell);
    }
    Ok(store)
}

fn write_cell_value(w: &mut ByteWriter, cell: &Cell) {
    w.write_u8(cell.tag().code());
    match cell.tag() {
        TypeTag::Null => {}
        TypeTag::Bool => w.write_u8(u8::from(cell.to_bool())),
        TypeTag::Short => w.write_i16_le(cell.to_short()),
        TypeTag::UShort => w.write_u16_le(cell.to_ushort()),
        TypeTag::Int => w.write_i32_le(cell.to_int()),
        TypeTag::UInt => w.write_u32_le(cell.to_uint()),
        TypeTag::Long | TypeTag::LLong => w.write_i64_le(cell.to_long()),
        TypeTag::ULong | TypeTag::ULLong => w.write_u64_le(cell.to_ulong()),
        TypeTag::Float => w.write_f32_le(cell.to_float()),
        TypeTag::Double => w.write_f64_le(cell.to_double()),
        TypeTag::String => w.write_str_u32_prefixed(&cell.to_string_lossy()),
        TypeTag::Bytes => w.write_bytes_u32_prefixed(&cell.to_bytes()),
        TypeTag::Container => write_store(w, cell.as_container().expect("tag matches payload")),
        TypeTag::Array => {
            let elems = cell.as_array().expect("tag matches payload");
            w.write_u32_le(elems.len() as u32);
            for e in elems {
                write_cell_value(w, e);
            }
        }
    }
}

fn read_cell_value(r: &mut ByteReader<'_>, depth: usize) -> ValueResult<Cell> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ValueError::NestingTooDeep { depth, limit: MAX_NESTING_DEPTH });
    }
    let raw = r.read_u8()?;
    let tag = TypeTag::from_code(raw).ok_or(ValueError::InvalidTag { raw })?.normalize();
    let cell = match tag {
        TypeTag::Null => Cell::null(),
        TypeTag::Bool => Cell::from_bool(r.read_u8()? != 0),
        TypeTag::Short => Cell::from_short(r.read_i16_le()?),
        TypeTag::UShort => Cell::from_ushort(r.read_u16_le()?),
        TypeTag::Int => Cell::from_int(r.read_i32_le()?),
        TypeTag::UInt => Cell::from_uint(r.read_u32_le()?),
        TypeTag::Long => Cell::from_long(r.read_i64_le()?),
        TypeTag::ULong => Cell::from_ulong(r.read_u64_le()?),
        TypeTag::Float => Cell::from_float(r.read_f32_le()?),
        TypeTag::Double => Cell::from_double(r.read_f64_le()?),
        TypeTag::String => Cell::from_string(r.read_str_u32_prefixed()?),
        TypeTag::Bytes => Cell::from_bytes(r.read_bytes_u32_prefixed()?),
        TypeTag::Container => Cell::from_container(read_store(r, depth + 1)?),
        TypeTag::Array => {
            let count = r.read_u32_le()?;
            let mut elems = Vec::with_capacity(count as usize);
            for _ in 0..count {
                elems.push(read_cell_value(r, depth + 1)?);
            }
            Cell::from_array(elems)
        }
        TypeTag::LLong | TypeTag::ULLong => unreachable!("normalize() folds aliases before this match"),
    };
    Ok(cell)
}

/// Encodes a single cell's `[tag:u8][payload]` wire form — the same shape
/// `write_store` uses per entry, just without the name framing.
#[must_use]
pub fn encode_cell(cell: &Cell) -> Vec<u8> {
    let mut w = ByteWriter::new();
    write_cell_value(&mut w, cell);
    w.into_vec()
}

/// Decodes a single cell from its `[tag:u8][payload]` wire form.
///
/// # Errors
/// As [`decode_store`], scoped to one cell.
pub fn decode_cell(bytes: &[u8]) -> ValueResult<Cell> {
    let mut r = ByteReader::new(bytes);
    read_cell_value(&mut r, 0)
}

/// Constructs a cell directly from a raw wire tag byte and its payload bytes,
/// degrading to [`Cell::null`] on any parse failure rather than propagating
/// an error (V2: a malformed individual cell never aborts the caller, it
/// just becomes an innocuous value).
#[must_use]
pub fn from_wire(tag_code: u8, raw: &[u8]) -> Cell {
    let mut bytes = Vec::with_capacity(1 + raw.len());
    bytes.push(tag_code);
    bytes.extend_from_slice(raw);
    decode_cell(&bytes).unwrap_or_else(|_| Cell::null())
}
