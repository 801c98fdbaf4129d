//! vessel-value — the typed value cell, the value store, and their binary
//! codec.
//!
//! - [`cell`]: the 16-variant [`cell::Cell`] payload and its coercion rules.
//! - [`store`]: the insertion-ordered, duplicate-key-friendly [`store::Store`].
//! - [`binary`]: the length-prefixed binary codec (C4).
//! - [`accel`] (feature `accel`): the scalar aggregation policy (§6.5).

#![deny(missing_docs)]

pub mod cell;
pub mod store;
pub mod binary;
mod json_lite;

#[cfg(feature = "accel")]
pub mod accel;

pub use cell::{Cell, Coercion, FromCell, Visitor};
pub use store::Store;

pub use vessel_core::TypeTag;

/// Errors raised by this crate's cell coercions, store operations and binary codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// A length-prefixed field or section declared a length the buffer does not have.
    #[error("truncated buffer: need {needed} more bytes at offset {at}")]
    TruncatedBuffer {
        /// Bytes still needed.
        needed: u64,
        /// Offset of the failure.
        at: u64,
    },
    /// A decoded tag byte was outside `0..=15`.
    #[error("invalid type tag byte: {raw}")]
    InvalidTag {
        /// Raw byte read from the wire.
        raw: u8,
    },
    /// A cell name or string/bytes payload was not valid UTF-8 where UTF-8 was required.
    #[error("invalid utf-8 in decoded field")]
    InvalidUtf8,
    /// A container/array nested past the configured recursion limit.
    #[error("nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep {
        /// Observed depth.
        depth: usize,
        /// Configured limit.
        limit: usize,
    },
    /// `must_get` found no cell under the requested name (§7 `LookupMiss`).
    #[error("no cell named {name:?}")]
    LookupMiss {
        /// The name that was looked up.
        name: String,
    },
    /// `must_get`/a strict typed getter found a cell but its tag didn't
    /// match the requested type (§7 `CoercionFailure`).
    #[error("cell {name:?} holds tag {actual}, not the requested type")]
    CoercionFailure {
        /// The name that was looked up.
        name: String,
        /// The cell's actual tag, rendered via [`TypeTag::name`].
        actual: &'static str,
    },
}

impl From<vessel_core::CoreError> for ValueError {
    fn from(e: vessel_core::CoreError) -> Self {
        match e {
            vessel_core::CoreError::UnexpectedEof { needed, at } => ValueError::TruncatedBuffer { needed, at },
            vessel_core::CoreError::InvalidUtf8 => ValueError::InvalidUtf8,
            vessel_core::CoreError::InvalidTypeTag { raw } => ValueError::InvalidTag { raw },
            vessel_core::CoreError::Corrupted(_) => ValueError::InvalidUtf8,
        }
    }
}

/// Result alias for this crate.
pub type ValueResult<T> = core::result::Result<T, ValueError>;

/// Convenience re-exports.
pub mod prelude {
    pub use super::{Cell, Coercion, FromCell, Store, TypeTag, ValueError, ValueResult, Visitor};
}
