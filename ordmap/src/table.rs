//! [OrderTable] is the single-threaded core behind [`OrderedMap`](crate::OrderedMap).
//!
//! Entries are stored as a `Vec` of key-value pairs in iteration order, so position `p` of the
//! vector is position `p` of the map. A [`PositionIndex`] maps every key to its position.
use crate::{
    error::MissingKey,
    position_index::PositionIndex,
    sort::{sort_entries, ActiveComparator, ComparatorKind, Less, SortOptions},
};
use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

/// A hash map that maintains an explicit order of its entries.
pub(crate) struct OrderTable<K, V, S> {
    positions: PositionIndex,
    entries: Vec<(K, V)>,
    build_hasher: S,
    comparator: ActiveComparator<K, V>,
}

impl<K, V, S> OrderTable<K, V, S> {
    /// Returns an empty table with the specified capacity and provided BuildHasher.
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        OrderTable {
            positions: PositionIndex::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            build_hasher,
            comparator: ActiveComparator::None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn hasher(&self) -> &S {
        &self.build_hasher
    }

    /// All entries in iteration order.
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.entries[..]
    }

    pub fn get_index(&self, position: usize) -> Option<(&K, &V)> {
        self.entries.get(position).map(|entry| (&entry.0, &entry.1))
    }

    pub fn comparator_kind(&self) -> ComparatorKind {
        self.comparator.kind()
    }

    pub fn clear_comparator(&mut self) {
        if self.comparator.kind() != ComparatorKind::None {
            log::debug!("leaving sticky {:?} mode", self.comparator);
        }
        self.comparator = ActiveComparator::None;
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> OrderTable<K, V, S> {
    #[inline(always)]
    fn hash<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.build_hasher.hash_one(key)
    }

    /// Returns the position of the entry with the specified key, if it exists.
    pub fn get_index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.hash(key);
        self.positions
            .find(hash, |position| self.entries[position].0.borrow() == key)
    }

    /// Returns a reference to the value corresponding to the specified key, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_index_of(key)
            .map(|position| &self.entries[position].1)
    }

    fn insert_at(&mut self, hash: u64, position: usize, entry: (K, V)) {
        if position < self.entries.len() {
            self.positions.shift_up_from(position);
        }
        self.entries.insert(position, entry);
        self.positions.insert(hash, position, |other| {
            self.build_hasher.hash_one(&self.entries[other].0)
        });
    }

    fn remove_at(&mut self, position: usize) -> (K, V) {
        let hash = self.hash(&self.entries[position].0);
        let found = self.positions.remove(hash, position);
        debug_assert!(found, "entry at position {position} missing from index");
        let entry = self.entries.remove(position);
        // Removing the last entry leaves every other position as it is.
        if position < self.entries.len() {
            self.positions.shift_down_after(position);
        }
        entry
    }

    /// Inserts `value` at `key`, replacing any previous value.
    /// Returns the position of the entry and any previous value.
    ///
    /// A new key is appended, or placed at its sorted position while a comparator is active.
    /// Replacing a value keeps the entry's position, unless values are kept sorted and the new
    /// value no longer fits between its neighbors.
    pub fn insert_full(&mut self, key: K, value: V) -> (usize, Option<V>) {
        let hash = self.hash(&key);
        if let Some(position) = self
            .positions
            .find(hash, |position| self.entries[position].0 == key)
        {
            let old_value = std::mem::replace(&mut self.entries[position].1, value);
            return (self.restore_value_order(position), Some(old_value));
        }
        let position = self.comparator.insertion_point(&self.entries, &key, &value);
        self.insert_at(hash, position, (key, value));
        (position, None)
    }

    /// Moves the entry at `position` to where its value belongs, if values are kept sorted.
    ///
    /// The entry moves past the neighbors ordered strictly before or after it and no further, so
    /// the result is what a stable sort would produce.
    fn restore_value_order(&mut self, position: usize) -> usize {
        let ActiveComparator::ByValue(less) = &self.comparator else {
            return position;
        };
        let value = &self.entries[position].1;
        let target = if position > 0 && less(value, &self.entries[position - 1].1) {
            self.entries[..position].partition_point(|(_, other)| !less(value, other))
        } else if position + 1 < self.entries.len() && less(&self.entries[position + 1].1, value)
        {
            position + self.entries[position + 1..].partition_point(|(_, other)| less(other, value))
        } else {
            return position;
        };
        log::trace!("moving updated entry from position {position} to {target}");
        let entry = self.remove_at(position);
        let hash = self.hash(&entry.0);
        self.insert_at(hash, target, entry);
        target
    }

    /// Removes the entry with the specified key, returning its former position, key and value.
    ///
    /// Entries after it move up by one position.
    pub fn shift_remove_full<Q>(&mut self, key: &Q) -> Option<(usize, K, V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let position = self.get_index_of(key)?;
        let (key, value) = self.remove_at(position);
        Some((position, key, value))
    }

    /// Exchanges the positions of two keys together with their values.
    ///
    /// Afterwards `first` holds the value of `second` and vice versa, while the value found at
    /// each of the two positions is unchanged. Only the keys trade places.
    pub fn swap_keys<Q>(&mut self, first: &Q, second: &Q) -> Result<(), MissingKey>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let (first, second) = match (self.get_index_of(first), self.get_index_of(second)) {
            (Some(first), Some(second)) => (first, second),
            (Some(_), None) => return Err(MissingKey::Second),
            (None, Some(_)) => return Err(MissingKey::First),
            (None, None) => return Err(MissingKey::Both),
        };
        if first == second {
            return Ok(());
        }

        let first_hash = self.hash(&self.entries[first].0);
        let second_hash = self.hash(&self.entries[second].0);
        self.positions.remove(first_hash, first);
        self.positions.remove(second_hash, second);

        let (low, high) = (first.min(second), first.max(second));
        let (head, tail) = self.entries.split_at_mut(high);
        std::mem::swap(&mut head[low].0, &mut tail[0].0);

        self.positions.insert(first_hash, second, |other| {
            self.build_hasher.hash_one(&self.entries[other].0)
        });
        self.positions.insert(second_hash, first, |other| {
            self.build_hasher.hash_one(&self.entries[other].0)
        });

        if self.comparator.kind() == ComparatorKind::ByKey {
            self.clear_comparator();
        }
        Ok(())
    }

    /// Reorders all entries by their values.
    pub fn sort_by_values(&mut self, less: Arc<Less<V>>, options: SortOptions) {
        log::debug!("sorting {} entries by value ({options:?})", self.entries.len());
        self.clear_comparator();
        self.reorder(|entries| sort_entries(entries, &*less, options.stable, |entry| &entry.1));
        if options.sticky {
            self.comparator = ActiveComparator::ByValue(less);
        }
    }

    /// Reorders all entries by their keys.
    pub fn sort_by_keys(&mut self, less: Arc<Less<K>>, options: SortOptions) {
        log::debug!("sorting {} entries by key ({options:?})", self.entries.len());
        self.clear_comparator();
        self.reorder(|entries| sort_entries(entries, &*less, options.stable, |entry| &entry.0));
        if options.sticky {
            self.comparator = ActiveComparator::ByKey(less);
        }
    }

    /// Permutes the entries with `f` and rebuilds the position index, also if `f` unwinds.
    fn reorder(&mut self, f: impl FnOnce(&mut [(K, V)])) {
        struct Rebuild<'a, K: Hash + Eq, V, S: BuildHasher>(&'a mut OrderTable<K, V, S>);

        impl<K: Hash + Eq, V, S: BuildHasher> Drop for Rebuild<'_, K, V, S> {
            fn drop(&mut self) {
                self.0.rebuild_positions();
            }
        }

        let mut guard = Rebuild(self);
        f(&mut guard.0.entries);
    }

    fn rebuild_positions(&mut self) {
        let hashes: Vec<u64> = self
            .entries
            .iter()
            .map(|(key, _)| self.build_hasher.hash_one(key))
            .collect();
        self.positions.rebuild(&hashes);
    }

    #[cfg(test)]
    pub fn check(&self) {
        assert_eq!(self.positions.len(), self.entries.len());
        let mut positions: Vec<usize> = self.positions.positions().collect();
        positions.sort_unstable();
        assert!(positions.into_iter().eq(0..self.entries.len()));
        for (position, (key, _)) in self.entries.iter().enumerate() {
            assert_eq!(self.get_index_of(key), Some(position));
        }
        for pair in self.entries.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert!(
                !self
                    .comparator
                    .entry_less((&next.0, &next.1), (&prev.0, &prev.1)),
                "entries out of order for sticky {:?} mode",
                self.comparator
            );
        }
    }
}
