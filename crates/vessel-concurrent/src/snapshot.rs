//! The snapshot reader (C7, §4.6): an `ArcSwap`-published immutable copy of
//! a [`GuardedStore`]'s contents, built the way `MystenLabs-sui`'s
//! `narwhal` crate publishes committee snapshots — `Arc::new(ArcSwap::from_pointee(...))` —
//! generalized from "one value, rarely replaced" to "re-snapshot on demand".
//!
//! Reads traverse the currently-published `Arc<Store>` with no lock at all:
//! `load()` is a single atomic pointer read, after which the store is
//! ordinary shared data. `refresh()` is the only operation that touches the
//! guarded store's lock.

use std::sync::Arc;

use arc_swap::ArcSwap;

use vessel_value::{Cell, FromCell, Store};

use crate::guarded::GuardedStore;

/// A lock-free reader over a point-in-time copy of a [`GuardedStore`].
pub struct SnapshotReader {
    current: ArcSwap<Store>,
}

impl SnapshotReader {
    /// Takes the store's read lock, clones its contents into a fresh
    /// snapshot, and releases the lock (§4.6).
    #[must_use]
    pub fn new(store: &GuardedStore) -> Self {
        let snapshot = store.read().clone();
        Self { current: ArcSwap::from_pointee(snapshot) }
    }

    /// Re-locks `store`, builds a new snapshot, and atomically publishes it.
    /// Readers holding a reference to the previous snapshot (via
    /// [`Self::load`]) are unaffected; the old snapshot is dropped once its
    /// last holder releases it.
    pub fn refresh(&self, store: &GuardedStore) {
        let snapshot = store.read().clone();
        #[cfg(feature = "tracing")]
        tracing::trace!(entries = snapshot.len(), "snapshot refreshed");
        self.current.store(Arc::new(snapshot));
    }

    /// Loads the currently-published snapshot — a single atomic
    /// load-acquire, no lock taken.
    #[must_use]
    pub fn load(&self) -> Arc<Store> {
        self.current.load_full()
    }

    /// Reads the first cell named `name` from the current snapshot.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cell> {
        self.load().get(name).cloned()
    }

    /// Reads every cell named `name` from the current snapshot.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<Cell> {
        self.load().get_all(name).into_iter().cloned().collect()
    }

    /// Strict typed get against the current snapshot (§4.1/§4.2, Scenario F):
    /// `None` if `name` is absent or its tag doesn't match `T` exactly.
    /// Writes since the last [`Self::refresh`] are invisible, like every
    /// other read on this type.
    #[must_use]
    pub fn get_typed<T: FromCell>(&self, name: &str) -> Option<T> {
        self.load().get_typed(name)
    }

    /// Runs `f` over every `(name, cell)` pair in one loaded snapshot — the
    /// callback sees a single consistent view for its whole duration (§5),
    /// since `load()` pins a specific `Arc<Store>` for the call.
    pub fn for_each(&self, mut f: impl FnMut(&str, &Cell)) {
        let snapshot = self.load();
        snapshot.for_each(|n, c| f(n, c));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_reflect_the_snapshot_at_construction() {
        let store = GuardedStore::new(Store::new());
        store.add("x", Cell::from_int(1));
        let reader = SnapshotReader::new(&store);
        assert_eq!(reader.get("x").unwrap().to_int(), 1);

        store.set("x", Cell::from_int(2));
        assert_eq!(reader.get("x").unwrap().to_int(), 1, "writer updates are invisible until refresh");
    }

    #[test]
    fn get_typed_reflects_snapshot_isolation_until_refresh() {
        let store = GuardedStore::new(Store::new());
        store.add("counter", Cell::from_int(0));
        let reader = SnapshotReader::new(&store);
        store.set("counter", Cell::from_int(42));
        assert_eq!(reader.get_typed::<i32>("counter"), Some(0));
        reader.refresh(&store);
        assert_eq!(reader.get_typed::<i32>("counter"), Some(42));
    }

    #[test]
    fn refresh_publishes_the_latest_write() {
        let store = GuardedStore::new(Store::new());
        store.add("x", Cell::from_int(1));
        let reader = SnapshotReader::new(&store);
        store.set("x", Cell::from_int(2));
        reader.refresh(&store);
        assert_eq!(reader.get("x").unwrap().to_int(), 2);
    }

    #[test]
    fn old_snapshot_handles_survive_a_refresh() {
        let store = GuardedStore::new(Store::new());
        store.add("x", Cell::from_int(1));
        let reader = SnapshotReader::new(&store);
        let old = reader.load();
        store.set("x", Cell::from_int(2));
        reader.refresh(&store);
        assert_eq!(old.get("x").unwrap().to_int(), 1);
        assert_eq!(reader.load().get("x").unwrap().to_int(), 2);
    }
}
