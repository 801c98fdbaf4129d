//! Placeholder library target for the `vessel-tests` package — the actual
//! tests live in `tests/*.rs` as separate integration test binaries.
