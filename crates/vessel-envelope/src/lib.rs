//! vessel-envelope — the textual envelope codec, its JSON/XML projections,
//! the zero-copy view over a decoded envelope, and the messaging header that
//! travels alongside a value store.
//!
//! - [`header`]: the routing [`header::MessageHeader`].
//! - [`text`]: the primary textual grammar (C5) — `encode`/`decode`/`decode_strict`/`decode_header_only`.
//! - [`view`]: the zero-copy span-based view over a parsed data block (C8).
//! - [`json`] (feature `serde`): the lossy-but-typed JSON projection (C6).
//! - [`xml`]: the lossy-but-typed XML projection (C6).
//! - [`escape`], [`hex`]: the grammar's character-escaping and hex helpers.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

pub mod escape;
pub mod header;
pub mod hex;
pub mod text;
pub mod view;
pub mod xml;

#[cfg(feature = "serde")]
pub mod json;

pub use header::MessageHeader;

/// Errors raised while encoding or decoding a textual envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// A structural token (a brace, bracket, or `@header=`/`@data=` marker)
    /// was missing or malformed at the given byte offset.
    #[error("syntax error at byte {at}: {reason}")]
    Syntax {
        /// Byte offset of the failure.
        at: usize,
        /// Human-readable description.
        reason: String,
    },
    /// The `@header=…;@data=…;` envelope wrapper itself was malformed.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// Human-readable description.
        reason: String,
    },
    /// A single cell's value failed to parse under its declared tag; in the
    /// basic decode mode this degrades to a `null` cell and parsing
    /// continues (§7), the error is only recorded.
    #[error("malformed cell {name:?}: {reason}")]
    MalformedCell {
        /// The cell's declared name.
        name: String,
        /// Human-readable description.
        reason: String,
    },
    /// A container/array nested past [`text::MAX_NESTING_DEPTH`].
    #[error("nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep {
        /// Observed depth.
        depth: usize,
        /// Configured limit.
        limit: usize,
    },
    /// A nested container re-entered one of its own ancestor stores
    /// (returned only by [`text::encode_checked`]; [`text::encode`] instead
    /// degrades the offending container to empty, per the basic guarantee).
    #[error("cycle detected while encoding a nested container")]
    CycleDetected,
}

/// Convenience re-exports.
pub mod prelude {
    pub use super::{
        header::MessageHeader,
        text::{decode, decode_header_only, decode_strict, encode, encode_checked},
        view::{CellView, ValueView},
        EnvelopeError,
    };
}
