//! The guarded store (C7): a shared/exclusive lock around a
//! [`vessel_value::Store`] (§4.6). Writers take the exclusive side; readers
//! that don't need a lock-free fast path (occasional lookups, diagnostics)
//! take the shared side directly rather than going through a
//! [`crate::snapshot::SnapshotReader`].

use std::time::Duration;

use parking_lot::RwLock;

use vessel_envelope::{header::MessageHeader, text, xml};
use vessel_value::{Cell, FromCell, Store};

use crate::ConcurrentError;

/// A `Store` behind a `parking_lot::RwLock`. Writers (`set`, `add`,
/// `remove`, `clear`, `bulk_update`, `compare_exchange`) take the exclusive
/// side; readers (`get`, `get_all`, `for_each`, `bulk_read`, `serialize`,
/// `to_json`, `to_xml`) take the shared side (§4.6).
#[derive(Debug, Default)]
pub struct GuardedStore {
    inner: RwLock<Store>,
}

impl GuardedStore {
    /// Wraps an existing store.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { inner: RwLock::new(store) }
    }

    /// A read-lock guard over the underlying store, for callers building
    /// their own multi-operation read transaction (e.g. [`crate::snapshot::SnapshotReader::new`]).
    pub(crate) fn read(&self) -> parking_lot::RwLockReadGuard<'_, Store> {
        self.inner.read()
    }

    /* ───────────────────────────── Writers ───────────────────────────── */

    /// Appends a new named cell (always a new entry, S2).
    pub fn add(&self, name: impl Into<String>, value: Cell) {
        self.inner.write().add(name, value);
    }

    /// Replaces the first entry for `name`, or appends if absent.
    pub fn set(&self, name: impl Into<String>, value: Cell) {
        self.inner.write().set(name, value);
    }

    /// Removes every entry named `name`, returning the count removed.
    pub fn remove(&self, name: &str) -> usize {
        self.inner.write().remove(name)
    }

    /// Clears the store.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Applies a batch of `set` operations under a single exclusive lock.
    pub fn bulk_update(&self, updates: Vec<(String, Cell)>) {
        self.inner.write().bulk_update(updates);
    }

    /// Replaces the first cell named `name` with `new` iff it currently
    /// equals `expected`.
    ///
    /// # Errors
    /// Returns [`ConcurrentError::CompareExchangeMismatch`] if the current
    /// value didn't match `expected` (or `name` is absent).
    pub fn compare_exchange(&self, name: &str, expected: &Cell, new: Cell) -> Result<(), ConcurrentError> {
        if self.inner.write().compare_exchange(name, expected, new) {
            Ok(())
        } else {
            Err(ConcurrentError::CompareExchangeMismatch { name: name.to_owned() })
        }
    }

    /* ───────────────────────────── Readers ───────────────────────────── */

    /// Clones the first cell named `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cell> {
        self.inner.read().get(name).cloned()
    }

    /// Clones every cell named `name`, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<Cell> {
        self.inner.read().get_all(name).into_iter().cloned().collect()
    }

    /// Strict typed get under the shared lock (§4.1/§4.2): `None` if `name`
    /// is absent or its tag doesn't match `T` exactly.
    #[must_use]
    pub fn get_typed<T: FromCell>(&self, name: &str) -> Option<T> {
        self.inner.read().get_typed(name)
    }

    /// Runs `f` over every `(name, cell)` pair under a single shared lock —
    /// the callback sees one consistent snapshot of the store (§5).
    pub fn for_each(&self, mut f: impl FnMut(&str, &Cell)) {
        self.inner.read().for_each(|n, c| f(n, c));
    }

    /// Clones the cells named in `names`, preserving request order.
    #[must_use]
    pub fn bulk_read(&self, names: &[&str]) -> Vec<Option<Cell>> {
        self.inner.read().bulk_read(names).into_iter().map(|c| c.cloned()).collect()
    }

    /// Encodes the store as a textual envelope with a default header.
    #[must_use]
    pub fn serialize(&self) -> String {
        text::encode(&MessageHeader::new(), &self.inner.read())
    }

    /// Projects the store as JSON (§4.5).
    #[cfg(feature = "serde")]
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        vessel_envelope::json::store_to_json(&self.inner.read())
    }

    /// Projects the store as XML (§4.5).
    #[must_use]
    pub fn to_xml(&self) -> String {
        xml::store_to_xml(&self.inner.read())
    }
}

/// Default refresh interval used by [`crate::auto_refresh::AutoRefreshReader`]
/// when none is given — chosen as a reasonable "stays fresh without
/// thrashing the read lock" default, not a contractual constant.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(250);
