//! The auto-refresh reader (C7, §4.6): a [`SnapshotReader`] plus a
//! background worker that calls `refresh()` on a fixed interval, so callers
//! get an eventually-fresh lock-free view without driving the refresh loop
//! themselves.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};

use vessel_value::{Cell, FromCell};

use crate::guarded::{GuardedStore, DEFAULT_REFRESH_INTERVAL};
use crate::snapshot::SnapshotReader;

/// A [`SnapshotReader`] kept fresh by a background thread.
///
/// Stop is idempotent and safe from any thread (§4.6): calling
/// [`Self::stop`] more than once, or letting the value drop, only ever joins
/// the worker once. A stop request wakes a pending sleep immediately rather
/// than waiting out the remainder of the current interval.
pub struct AutoRefreshReader {
    reader: Arc<SnapshotReader>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl AutoRefreshReader {
    /// Spawns a worker that calls `refresh()` against `store` every
    /// `interval`, starting from an initial snapshot taken immediately.
    #[must_use]
    pub fn spawn(store: Arc<GuardedStore>, interval: Duration) -> Self {
        let reader = Arc::new(SnapshotReader::new(&store));
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let worker_reader = Arc::clone(&reader);
        let worker = std::thread::Builder::new()
            .name("vessel-concurrent-auto-refresh".to_owned())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        worker_reader.refresh(&store);
                    }
                }
            })
            .expect("spawning the auto-refresh worker thread");

        Self { reader, stop_tx: Some(stop_tx), worker: Some(worker) }
    }

    /// Spawns with [`DEFAULT_REFRESH_INTERVAL`].
    #[must_use]
    pub fn spawn_default(store: Arc<GuardedStore>) -> Self {
        Self::spawn(store, DEFAULT_REFRESH_INTERVAL)
    }

    /// Reads the first cell named `name` from the current snapshot.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cell> {
        self.reader.get(name)
    }

    /// Reads every cell named `name` from the current snapshot.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<Cell> {
        self.reader.get_all(name)
    }

    /// Strict typed get against the most recently refreshed snapshot
    /// (§4.1/§4.2): `None` if `name` is absent or its tag doesn't match `T`
    /// exactly.
    #[must_use]
    pub fn get_typed<T: FromCell>(&self, name: &str) -> Option<T> {
        self.reader.get_typed(name)
    }

    /// Runs `f` over the current snapshot's `(name, cell)` pairs.
    pub fn for_each(&self, f: impl FnMut(&str, &Cell)) {
        self.reader.for_each(f);
    }

    /// Signals the worker to stop and joins it. Safe to call from any
    /// thread and more than once — subsequent calls are no-ops.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AutoRefreshReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use vessel_value::Store;

    use super::*;

    #[test]
    fn periodically_observes_writer_updates() {
        let store = Arc::new(GuardedStore::new(Store::new()));
        store.add("x", Cell::from_int(1));
        let mut reader = AutoRefreshReader::spawn(Arc::clone(&store), Duration::from_millis(10));
        assert_eq!(reader.get("x").unwrap().to_int(), 1);

        store.set("x", Cell::from_int(2));
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(reader.get("x").unwrap().to_int(), 2);

        reader.stop();
    }

    #[test]
    fn stop_is_idempotent_and_wakes_immediately() {
        let store = Arc::new(GuardedStore::new(Store::new()));
        let mut reader = AutoRefreshReader::spawn(Arc::clone(&store), Duration::from_secs(3600));
        let started = std::time::Instant::now();
        reader.stop();
        reader.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn drop_joins_the_worker() {
        let store = Arc::new(GuardedStore::new(Store::new()));
        let reader = AutoRefreshReader::spawn(Arc::clone(&store), Duration::from_millis(10));
        drop(reader);
    }
}
