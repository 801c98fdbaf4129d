//! vessel-concurrent — the concurrency layer (C7) around a
//! [`vessel_value::Store`]: a shared/exclusive-locked writer side, a
//! lock-free snapshot reader, and an auto-refreshing background reader.
//!
//! - [`guarded`]: [`guarded::GuardedStore`], the `parking_lot`-backed
//!   read-many/write-one wrapper writers go through.
//! - [`snapshot`]: [`snapshot::SnapshotReader`], an `ArcSwap`-published
//!   immutable view that readers traverse without ever taking a lock.
//! - [`auto_refresh`]: [`auto_refresh::AutoRefreshReader`], a snapshot
//!   reader that keeps itself current via a background worker thread.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

#[cfg(feature = "sync")]
pub mod auto_refresh;
#[cfg(feature = "sync")]
pub mod guarded;
#[cfg(feature = "sync")]
pub mod snapshot;

#[cfg(feature = "sync")]
pub use auto_refresh::AutoRefreshReader;
#[cfg(feature = "sync")]
pub use guarded::GuardedStore;
#[cfg(feature = "sync")]
pub use snapshot::SnapshotReader;

/// Errors raised by the concurrency layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConcurrentError {
    /// A `compare_exchange` precondition did not hold (no write was performed).
    #[error("compare-exchange failed: value for {name:?} did not match the expected value")]
    CompareExchangeMismatch {
        /// The name the exchange targeted.
        name: String,
    },
}

/// Convenience re-exports.
#[cfg(feature = "sync")]
pub mod prelude {
    pub use super::{AutoRefreshReader, ConcurrentError, GuardedStore, SnapshotReader};
}
