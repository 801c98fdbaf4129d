//! The value store (C3): an insertion-ordered, duplicate-key-friendly
//! collection of named cells with a hash index for O(1) average lookups.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::cell::{Cell, FromCell};
use crate::{ValueError, ValueResult};

/// Positions a name maps to; most names are unique, so four inline slots
/// cover the common case before spilling to the heap.
type Positions = SmallVec<[usize; 4]>;

/// An insertion-ordered multimap from `String` names to [`Cell`] values.
///
/// Duplicate names are allowed (S2): `add` always appends a new entry,
/// while `set` replaces the first existing entry for a name (or appends if
/// the name is new). The hash index is repaired after every structural
/// mutation so lookups stay O(1) average regardless of duplicate density.
#[derive(Debug, Clone, Default)]
pub struct Store {
    entries: Vec<(String, Cell)>,
    index: HashMap<String, Positions>,
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool { self.entries == other.entries }
}
impl Eq for Store {}

impl Store {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of entries, including duplicates.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }
    /// True when the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    /// Alias for [`Store::len`], matching the operation name in the external spec.
    #[must_use]
    pub fn size(&self) -> usize { self.len() }
    /// Alias for [`Store::is_empty`].
    #[must_use]
    pub fn empty(&self) -> bool { self.is_empty() }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, (name, _)) in self.entries.iter().enumerate() {
            self.index.entry(name.clone()).or_default().push(i);
        }
    }

    /// Appends a new named cell, always creating a new entry even if the
    /// name already exists (S2: duplicate keys are first-class).
    pub fn add(&mut self, name: impl Into<String>, value: Cell) {
        let name = name.into();
        let pos = self.entries.len();
        self.index.entry(name.clone()).or_default().push(pos);
        self.entries.push((name, value));
    }

    /// Replaces every entry named `name` with a single new entry carrying
    /// `value`, at the position of the first existing occurrence; appends a
    /// new entry if `name` is not already present.
    pub fn set(&mut self, name: impl Into<String>, value: Cell) {
        let name = name.into();
        let positions = self.index.get(&name).cloned().unwrap_or_default();
        match positions.first() {
            Some(&first) => {
                self.entries[first].1 = value;
                if positions.len() > 1 {
                    let extra: std::collections::HashSet<usize> = positions[1..].iter().copied().collect();
                    let mut i = 0usize;
                    self.entries.retain(|_| {
                        let keep = !extra.contains(&i);
                        i += 1;
                        keep
                    });
                    self.rebuild_index();
                }
            }
            None => self.add(name, value),
        }
    }

    /// Removes every entry named `name`. Returns the number of entries removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.rebuild_index();
        let removed = before - self.entries.len();
        #[cfg(feature = "tracing")]
        if removed > 0 {
            tracing::trace!(name, removed, "store entries removed");
        }
        removed
    }

    /// Clears the store.
    pub fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::trace!(entries = self.entries.len(), "store cleared");
        self.entries.clear();
        self.index.clear();
    }

    /// Borrows the first cell named `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.index.get(name).and_then(|ps| ps.first()).map(|&pos| &self.entries[pos].1)
    }

    /// Mutably borrows the first cell named `name`, if any.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Cell> {
        let pos = *self.index.get(name).and_then(|ps| ps.first())?;
        Some(&mut self.entries[pos].1)
    }

    /// Strict typed get (§4.2 `get_typed<T>(key)`): `None` if `name` is
    /// absent *or* the first matching cell's tag doesn't exactly match `T`
    /// (no coercion — see [`Cell::get_typed`]). Use [`Self::must_get`] to
    /// tell the two "absent" cases apart as errors.
    #[must_use]
    pub fn get_typed<T: FromCell>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(Cell::get_typed)
    }

    /// Like [`Self::get_typed`], but surfaces *why* the value is missing
    /// instead of collapsing both cases to `None` (§7: [`ValueError::LookupMiss`]
    /// when `name` is absent, [`ValueError::CoercionFailure`] when it's
    /// present under a different tag).
    ///
    /// # Errors
    /// Returns [`ValueError::LookupMiss`] or [`ValueError::CoercionFailure`]
    /// as described above.
    pub fn must_get<T: FromCell>(&self, name: &str) -> ValueResult<T> {
        let cell = self.get(name).ok_or_else(|| ValueError::LookupMiss { name: name.to_owned() })?;
        cell.get_typed().ok_or_else(|| ValueError::CoercionFailure { name: name.to_owned(), actual: cell.tag().name() })
    }

    /// Borrows every cell named `name`, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&Cell> {
        match self.index.get(name) {
            Some(ps) => ps.iter().map(|&pos| &self.entries[pos].1).collect(),
            None => Vec::new(),
        }
    }

    /// Names currently present, in first-seen order, without duplicates.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter_map(|(n, _)| seen.insert(n.as_str()).then_some(n.as_str()))
            .collect()
    }

    /// Visits every `(name, cell)` pair in insertion order.
    pub fn for_each(&self, mut f: impl FnMut(&str, &Cell)) {
        for (name, cell) in &self.entries {
            f(name, cell);
        }
    }

    /// Reads every cell named in `names`, preserving the request order;
    /// missing names produce `None` rather than shrinking the result.
    #[must_use]
    pub fn bulk_read(&self, names: &[&str]) -> Vec<Option<&Cell>> {
        names.iter().map(|n| self.get(n)).collect()
    }

    /// Applies a batch of `set` operations under a single logical pass; each
    /// update follows the same "single new entry replaces every prior
    /// occurrence" semantics as [`Store::set`].
    pub fn bulk_update(&mut self, updates: Vec<(String, Cell)>) {
        for (name, value) in updates {
            self.set(name, value);
        }
    }

    /// Replaces the first cell named `name` with `new` only if its current
    /// value equals `expected`. Returns whether the exchange happened.
    pub fn compare_exchange(&mut self, name: &str, expected: &Cell, new: Cell) -> bool {
        let Some(&pos) = self.index.get(name).and_then(|ps| ps.first()) else { return false };
        if &self.entries[pos].1 == expected {
            self.entries[pos].1 = new;
            true
        } else {
            false
        }
    }

    /// Iterates `(name, cell)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }
}

/// `Store` (de)serializes as its ordered `(name, cell)` sequence — a plain
/// JSON object can't express duplicate keys (S2), so this never projects to
/// a map.
#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Store;
    use crate::cell::Cell;

    impl Serialize for Store {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.entries.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Store {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let entries = Vec::<(String, Cell)>::deserialize(deserializer)?;
            let mut store = Store::new();
            for (name, cell) in entries {
                store.add(name, cell);
            }
            Ok(store)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_are_preserved_in_order() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(1));
        s.add("x", Cell::from_int(2));
        assert_eq!(s.get_all("x").len(), 2);
        assert_eq!(s.get("x").unwrap().to_int(), 1);
    }

    #[test]
    fn set_replaces_every_prior_entry_with_one_new_cell() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(1));
        s.add("y", Cell::from_int(0));
        s.add("x", Cell::from_int(2));
        s.set("x", Cell::from_int(99));
        let all: Vec<i32> = s.get_all("x").iter().map(|c| c.to_int()).collect();
        assert_eq!(all, vec![99]);
        // The replacement lands at the first occurrence's position and the
        // unrelated key keeps its place.
        let mut order = Vec::new();
        s.for_each(|n, c| order.push((n.to_owned(), c.to_int())));
        assert_eq!(order, vec![("x".to_owned(), 99), ("y".to_owned(), 0)]);
    }

    #[test]
    fn set_on_absent_key_appends() {
        let mut s = Store::new();
        s.set("x", Cell::from_int(1));
        assert_eq!(s.get("x").unwrap().to_int(), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn bulk_update_follows_set_semantics() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(1));
        s.add("x", Cell::from_int(2));
        s.bulk_update(vec![("x".to_owned(), Cell::from_int(7)), ("y".to_owned(), Cell::from_int(8))]);
        assert_eq!(s.get_all("x").len(), 1);
        assert_eq!(s.get("x").unwrap().to_int(), 7);
        assert_eq!(s.get("y").unwrap().to_int(), 8);
    }

    #[test]
    fn remove_drops_all_entries_for_name_and_repairs_index() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(1));
        s.add("y", Cell::from_int(2));
        s.add("x", Cell::from_int(3));
        assert_eq!(s.remove("x"), 2);
        assert!(s.get("x").is_none());
        assert_eq!(s.get("y").unwrap().to_int(), 2);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn compare_exchange_only_on_match() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(1));
        assert!(!s.compare_exchange("x", &Cell::from_int(2), Cell::from_int(9)));
        assert!(s.compare_exchange("x", &Cell::from_int(1), Cell::from_int(9)));
        assert_eq!(s.get("x").unwrap().to_int(), 9);
    }

    #[test]
    fn get_typed_is_none_for_absent_key_or_tag_mismatch() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(7));
        assert_eq!(s.get_typed::<i32>("x"), Some(7));
        assert_eq!(s.get_typed::<i64>("x"), None);
        assert_eq!(s.get_typed::<i32>("missing"), None);
    }

    #[test]
    fn must_get_distinguishes_lookup_miss_from_coercion_failure() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(7));
        assert_eq!(s.must_get::<i32>("x"), Ok(7));
        assert!(matches!(s.must_get::<i32>("missing"), Err(ValueError::LookupMiss { .. })));
        assert!(matches!(s.must_get::<i64>("x"), Err(ValueError::CoercionFailure { .. })));
    }

    #[test]
    fn keys_are_unique_and_first_seen_order() {
        let mut s = Store::new();
        s.add("b", Cell::null());
        s.add("a", Cell::null());
        s.add("b", Cell::null());
        assert_eq!(s.keys(), vec!["b", "a"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_preserves_duplicate_keys_and_order() {
        let mut s = Store::new();
        s.add("x", Cell::from_int(1));
        s.add("y", Cell::from_string("hi"));
        s.add("x", Cell::from_int(2));
        let json = serde_json::to_string(&s).unwrap();
        let back: Store = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
        assert_eq!(back.get_all("x").len(), 2);
    }
}
