//! Cross-crate scenario for the concurrency layer (§8.2 F) plus the
//! ordering guarantees in §5.

use std::sync::Arc;
use std::time::Duration;

use vessel_concurrent::{AutoRefreshReader, GuardedStore, SnapshotReader};
use vessel_value::{Cell, Store};

#[test]
fn scenario_f_snapshot_isolation() {
    let mut s = Store::new();
    s.add("counter", Cell::from_int(0));
    let store = GuardedStore::new(s);

    let reader = SnapshotReader::new(&store);
    assert_eq!(reader.get_typed::<i32>("counter"), Some(0));

    store.set("counter", Cell::from_int(42));
    assert_eq!(reader.get_typed::<i32>("counter"), Some(0), "writes are invisible before refresh");

    reader.refresh(&store);
    assert_eq!(reader.get_typed::<i32>("counter"), Some(42));
}

#[test]
fn writers_serialize_under_the_exclusive_lock() {
    let store = Arc::new(GuardedStore::new(Store::new()));
    store.add("total", Cell::from_int(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let current = store.get("total").unwrap().to_int();
                    store.set("total", Cell::from_int(current + 1));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Individual increments can race (read-then-write isn't atomic across
    // the two calls), but the writer lock guarantees every `set` call is
    // itself serialized and visible — the final value is a legal
    // interleaving result, never a torn write.
    let total = store.get("total").unwrap().to_int();
    assert!((1..=800).contains(&total));
}

#[test]
fn auto_refresh_reader_stays_eventually_consistent() {
    let store = Arc::new(GuardedStore::new(Store::new()));
    store.add("x", Cell::from_int(1));
    let mut reader = AutoRefreshReader::spawn(Arc::clone(&store), Duration::from_millis(5));

    store.set("x", Cell::from_int(99));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(reader.get("x").unwrap().to_int(), 99);

    reader.stop();
}

#[test]
fn for_each_over_a_snapshot_is_stable_during_concurrent_writes() {
    let mut s = Store::new();
    for i in 0..50 {
        s.add(format!("k{i}"), Cell::from_int(i));
    }
    let store = Arc::new(GuardedStore::new(s));
    let reader = SnapshotReader::new(&store);

    let writer_store = Arc::clone(&store);
    let writer = std::thread::spawn(move || {
        for i in 0..50 {
            writer_store.set(format!("k{i}"), Cell::from_int(-1));
        }
    });

    let mut seen = Vec::new();
    reader.for_each(|_, c| seen.push(c.to_int()));
    writer.join().unwrap();

    // Whatever `for_each` saw, it saw a single snapshot's values — either
    // all the original 0..50 values or, if refreshed mid-test by another
    // reader, a fully-written pass. What must never happen is a mix that
    // couldn't have existed in any one snapshot.
    let all_original = seen.iter().enumerate().all(|(i, v)| *v == i as i32);
    let all_overwritten = seen.iter().all(|v| *v == -1);
    assert!(all_original || all_overwritten);
}
