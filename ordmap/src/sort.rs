//! Comparator-driven ordering of an [`OrderedMap`](crate::OrderedMap).
use std::{cmp::Ordering, fmt, sync::Arc};

/// A strict "less-than" predicate.
///
/// Sorting assumes the predicate is a strict weak order. A predicate that is not may leave
/// elements in an unspecified order, but never corrupts the map.
pub type Less<T> = dyn Fn(&T, &T) -> bool + Send + Sync;

/// Options for [`OrderedMap::sort_by_value`](crate::OrderedMap::sort_by_value) and
/// [`OrderedMap::sort_by_key`](crate::OrderedMap::sort_by_key).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortOptions {
    /// Keep the relative order of elements comparing equal.
    pub stable: bool,
    /// Retain the comparator so that newly inserted keys are placed at their sorted position.
    pub sticky: bool,
}

impl SortOptions {
    /// A stable, one-shot sort.
    pub const STABLE: Self = SortOptions {
        stable: true,
        sticky: false,
    };
    /// A stable sort whose comparator stays active for later insertions.
    pub const STICKY: Self = SortOptions {
        stable: true,
        sticky: true,
    };
}

/// Which comparator, if any, keeps the map continuously sorted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparatorKind {
    /// Keys are kept in the order they are set, swapped or sorted into.
    None,
    /// New keys are inserted in value order.
    ByValue,
    /// New keys are inserted in key order.
    ByKey,
}

/// The retained comparator of a map in sticky mode.
///
/// At most one of the two comparator kinds can be active at a time.
pub(crate) enum ActiveComparator<K, V> {
    None,
    ByValue(Arc<Less<V>>),
    ByKey(Arc<Less<K>>),
}

impl<K, V> fmt::Debug for ActiveComparator<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.kind(), f)
    }
}

impl<K, V> ActiveComparator<K, V> {
    pub fn kind(&self) -> ComparatorKind {
        match self {
            ActiveComparator::None => ComparatorKind::None,
            ActiveComparator::ByValue(_) => ComparatorKind::ByValue,
            ActiveComparator::ByKey(_) => ComparatorKind::ByKey,
        }
    }

    /// Returns `true` if entry `a` compares strictly before entry `b`.
    pub fn entry_less(&self, a: (&K, &V), b: (&K, &V)) -> bool {
        match self {
            ActiveComparator::None => false,
            ActiveComparator::ByValue(less) => less(a.1, b.1),
            ActiveComparator::ByKey(less) => less(a.0, b.0),
        }
    }

    /// Returns the position at which `(key, value)` is inserted into `entries`.
    ///
    /// `entries` must be sorted by this comparator. The new entry goes after all entries it does
    /// not compare strictly before, so ties keep insertion order. Without an active comparator,
    /// this is the end of `entries`.
    pub fn insertion_point(&self, entries: &[(K, V)], key: &K, value: &V) -> usize {
        match self {
            ActiveComparator::None => entries.len(),
            ActiveComparator::ByValue(less) => {
                entries.partition_point(|(_, other)| !less(value, other))
            }
            ActiveComparator::ByKey(less) => entries.partition_point(|(other, _)| !less(key, other)),
        }
    }
}

/// Turns a strict less-than predicate into a total [`Ordering`].
#[inline]
pub(crate) fn ordering<T: ?Sized>(less: &impl Fn(&T, &T) -> bool, a: &T, b: &T) -> Ordering {
    if less(a, b) {
        Ordering::Less
    } else if less(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Sorts `entries` by `less` applied to the projection `f`.
pub(crate) fn sort_entries<K, V, T: ?Sized>(
    entries: &mut [(K, V)],
    less: &Less<T>,
    stable: bool,
    f: impl Fn(&(K, V)) -> &T,
) {
    let less = |a: &T, b: &T| less(a, b);
    if stable {
        entries.sort_by(|a, b| ordering(&less, f(a), f(b)));
    } else {
        entries.sort_unstable_by(|a, b| ordering(&less, f(a), f(b)));
    }
}
