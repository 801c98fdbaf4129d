//! vessel-core — shared primitives (no_std-ready)
//!
//! Provides:
//! - `TypeTag` — the 16-variant tag registry shared by every value cell (C1)
//! - Little-endian memory I/O: `ByteWriter`, `ByteReader`
//! - `CoreError` + alias `CoreResult<T>`
//!
//! Features:
//! - `std` (default): `impl std::error::Error` & tests
//! - `serde`: derive (de)serialization on the public types

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Public modules ─────────────────────────── */

/// Type tag registry shared by every value cell (C1).
pub mod tag;
pub use tag::TypeTag;

/// Lowercase, separator-free hex encoding shared by cell coercions, the
/// textual envelope grammar, and the JSON/XML projections.
pub mod hex;

/* ─────────────────────────── Common result ─────────────────────────── */

/// Common result alias for the core crate.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Byte Writer (LE) ─────────────────────────── */

/// Growable little-endian write buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    pub fn new() -> Self { Self { buf: Vec::new() } }
    /// Borrows the written content.
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Consumes the writer, returning the buffer.
    pub fn into_vec(self) -> Vec<u8> { self.buf }
    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }
    /// Writes a single byte.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Writes a little-endian `i16`.
    pub fn write_i16_le(&mut self, v: i16) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `u16`.
    pub fn write_u16_le(&mut self, v: u16) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `i32`.
    pub fn write_i32_le(&mut self, v: i32) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `u32`.
    pub fn write_u32_le(&mut self, v: u32) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `u64`.
    pub fn write_u64_le(&mut self, v: u64) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `i64`.
    pub fn write_i64_le(&mut self, v: i64) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `f32`.
    pub fn write_f32_le(&mut self, v: f32) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a little-endian `f64`.
    pub fn write_f64_le(&mut self, v: f64) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Writes a `u32`-LE length prefix followed by `bytes` (cf. §4.4).
    pub fn write_bytes_u32_prefixed(&mut self, bytes: &[u8]) {
        self.write_u32_le(bytes.len() as u32);
        self.write_bytes(bytes);
    }
    /// Writes a UTF-8 string prefixed by its byte length (`u32`-LE).
    pub fn write_str_u32_prefixed(&mut self, s: &str) { self.write_bytes_u32_prefixed(s.as_bytes()); }
}

/* ─────────────────────────── Byte Reader (LE) ─────────────────────────── */

/// Sequential reader over a byte slice (little-endian helpers).
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Builds a reader over `data`.
    pub fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }
    /// Current offset.
    pub fn offset(&self) -> usize { self.off }
    /// Bytes left to read.
    pub fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }

    /// Reads `n` bytes, or errors on EOF.
    pub fn read_bytes(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::UnexpectedEof { needed: n as u64, at: self.off as u64 });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Reads a `u8`.
    pub fn read_u8(&mut self) -> CoreResult<u8> { Ok(self.read_bytes(1)?[0]) }
    /// Reads a little-endian `i16`.
    pub fn read_i16_le(&mut self) -> CoreResult<i16> {
        let b = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }
    /// Reads a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> CoreResult<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }
    /// Reads a little-endian `i32`.
    pub fn read_i32_le(&mut self) -> CoreResult<i32> {
        let b = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
    /// Reads a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> CoreResult<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
    /// Reads a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> CoreResult<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }
    /// Reads a little-endian `i64`.
    pub fn read_i64_le(&mut self) -> CoreResult<i64> { Ok(self.read_u64_le()? as i64) }
    /// Reads a little-endian `f32`.
    pub fn read_f32_le(&mut self) -> CoreResult<f32> {
        let b = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
    /// Reads a little-endian `f64`.
    pub fn read_f64_le(&mut self) -> CoreResult<f64> {
        let bits = self.read_u64_le()?;
        Ok(f64::from_bits(bits))
    }

    /// Reads a `[len:u32-LE][bytes]` block, bounds-checked (§4.4 validation rules).
    pub fn read_bytes_u32_prefixed(&mut self) -> CoreResult<&'a [u8]> {
        let len = self.read_u32_le()? as usize;
        self.read_bytes(len)
    }

    /// Reads a `[len:u32-LE][UTF-8 bytes]` block and validates it as UTF-8.
    pub fn read_str_u32_prefixed(&mut self) -> CoreResult<&'a str> {
        let bytes = self.read_bytes_u32_prefixed()?;
        core::str::from_utf8(bytes).map_err(|_| CoreError::InvalidUtf8)
    }
}

/* ─────────────────────────── Errors ─────────────────────────── */

/// Low-level errors shared across the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoreError {
    /// Unexpected end of buffer.
    UnexpectedEof {
        /// Number of bytes still needed.
        needed: u64,
        /// Offset at which the read failed.
        at: u64,
    },
    /// Invalid UTF-8 in a length-prefixed string.
    InvalidUtf8,
    /// A type tag byte (0..=15) was invalid during binary decode.
    InvalidTypeTag {
        /// Raw byte encountered.
        raw: u8,
    },
    /// Catch-all for malformed payloads that don't fit a more specific variant.
    Corrupted(
        #[cfg(feature = "std")] std::borrow::Cow<'static, str>,
        #[cfg(not(feature = "std"))] alloc::borrow::Cow<'static, str>,
    ),
}

impl CoreError {
    /// Builds a "corrupted" error from a message.
    #[cfg(feature = "std")]
    pub fn corrupted(msg: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        CoreError::Corrupted(msg.into())
    }

    /// Builds a "corrupted" error from a message (no_std).
    #[cfg(not(feature = "std"))]
    pub fn corrupted(msg: impl Into<alloc::borrow::Cow<'static, str>>) -> Self {
        CoreError::Corrupted(msg.into())
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnexpectedEof { needed, at } => write!(f, "unexpected EOF: need {needed} bytes at {at}"),
            CoreError::InvalidUtf8 => write!(f, "invalid utf-8"),
            CoreError::InvalidTypeTag { raw } => write!(f, "invalid type tag: {raw}"),
            CoreError::Corrupted(msg) => write!(f, "corrupted: {msg}"),
        }
    }
}

/// Implements `std::error::Error` only with the `std` feature.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Convenience re-exports for importing the crate's key types at once.
pub mod prelude {
    pub use super::{ByteReader, ByteWriter, CoreError, CoreResult, TypeTag};
}

/* ─────────────────────────── Tests ─────────────────────────── */
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reader_le() -> CoreResult<()> {
        let mut w = ByteWriter::new();
        w.write_u16_le(0xBEEF);
        w.write_u32_le(0xDEAD_BEEF);
        w.write_i64_le(-42);
        w.write_f64_le(3.5);
        w.write_str_u32_prefixed("hello");

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_u16_le()?, 0xBEEF);
        assert_eq!(r.read_u32_le()?, 0xDEAD_BEEF);
        assert_eq!(r.read_i64_le()?, -42);
        assert_eq!(r.read_f64_le()?, 3.5);
        assert_eq!(r.read_str_u32_prefixed()?, "hello");
        Ok(())
    }

    #[test]
    fn truncated_read_reports_offset() {
        let w = {
            let mut w = ByteWriter::new();
            w.write_u16_le(1);
            w
        };
        let mut r = ByteReader::new(w.as_slice());
        let _ = r.read_u8();
        match r.read_u8() {
            Err(CoreError::UnexpectedEof { needed: 1, at: 1 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
