//! Lowercase, separator-free hex encoding for `Bytes` cells (§4.3, §4.5).
//!
//! Re-exported from [`vessel_core::hex`], which owns the implementation so
//! that `vessel-value`'s `Cell::to_string_lossy` can format bytes the same
//! way without depending on this (higher-layer) crate.

pub use vessel_core::hex::{decode, encode_lower};
