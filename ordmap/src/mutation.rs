use crate::{
    sort::{Less, SortOptions},
    table::OrderTable,
};
use std::{
    hash::{BuildHasher, Hash},
    sync::Arc,
};

/// A mutating call on an [`OrderedMap`](crate::OrderedMap), admitted but not necessarily
/// applied yet.
pub(crate) enum Mutation<K, V> {
    Set(K, V),
    Delete(K),
    Swap(K, K),
    SortByValue(Arc<Less<V>>, SortOptions),
    SortByKey(Arc<Less<K>>, SortOptions),
    ClearSticky,
}

impl<K, V> Mutation<K, V> {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Set(..) => "set",
            Mutation::Delete(_) => "delete",
            Mutation::Swap(..) => "swap",
            Mutation::SortByValue(..) => "sort by value",
            Mutation::SortByKey(..) => "sort by key",
            Mutation::ClearSticky => "clear sticky",
        }
    }
}

impl<K: Hash + Eq, V> Mutation<K, V> {
    /// Performs the mutation on `table`.
    pub fn apply<S: BuildHasher>(self, table: &mut OrderTable<K, V, S>) {
        match self {
            Mutation::Set(key, value) => {
                let (position, old_value) = table.insert_full(key, value);
                if old_value.is_none() {
                    log::trace!("inserted new entry at position {position}");
                }
            }
            Mutation::Delete(key) => {
                if let Some((position, ..)) = table.shift_remove_full(&key) {
                    log::trace!("removed entry at position {position}");
                }
            }
            Mutation::Swap(first, second) => {
                // Admission only lets a swap through for keys that exist at this point.
                if let Err(missing) = table.swap_keys(&first, &second) {
                    log::error!("skipping admitted swap, {missing:?} key(s) absent from table");
                }
            }
            Mutation::SortByValue(less, options) => table.sort_by_values(less, options),
            Mutation::SortByKey(less, options) => table.sort_by_keys(less, options),
            Mutation::ClearSticky => table.clear_comparator(),
        }
    }
}
