use hashbrown::hash_table::HashTable;

/// Maps keys to their position in the entry array.
///
/// Only positions are stored. Callers supply the hash of the key they are looking for and
/// compare candidates by position, hashing keys on demand from the entry array whenever the
/// table needs to rehash.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    table: HashTable<usize>,
}

impl PositionIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        PositionIndex {
            table: HashTable::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline(always)]
    pub fn find(&self, hash: u64, mut eq: impl FnMut(usize) -> bool) -> Option<usize> {
        self.table.find(hash, |&position| eq(position)).copied()
    }

    #[inline(always)]
    pub fn insert(&mut self, hash: u64, position: usize, hasher: impl Fn(usize) -> u64) {
        self.table
            .insert_unique(hash, position, |&other| hasher(other));
    }

    /// Removes the entry with the given position, returning whether it was present.
    #[inline(always)]
    pub fn remove(&mut self, hash: u64, position: usize) -> bool {
        match self.table.find_entry(hash, |&other| other == position) {
            Ok(entry) => {
                entry.remove();
                true
            }
            Err(_) => false,
        }
    }

    /// Closes the gap left by a removed interior position.
    pub fn shift_down_after(&mut self, removed: usize) {
        self.table.retain(|position| {
            if *position > removed {
                *position -= 1;
            }
            true
        });
    }

    /// Opens a gap at `position` for an insertion in the middle of the sequence.
    pub fn shift_up_from(&mut self, position: usize) {
        self.table.retain(|other| {
            if *other >= position {
                *other += 1;
            }
            true
        });
    }

    /// Replaces the whole index so that position `i` is found under `hashes[i]`.
    pub fn rebuild(&mut self, hashes: &[u64]) {
        self.table.clear();
        self.table.reserve(hashes.len(), |&position| hashes[position]);
        for (position, &hash) in hashes.iter().enumerate() {
            self.table
                .insert_unique(hash, position, |&other| hashes[other]);
        }
    }

    #[cfg(test)]
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.table.iter().copied()
    }
}
