//! Iterators over an [`OrderedMap`].
//!
//! Each step takes the map's shared lock, reads the entry at the current position and releases
//! the lock again. Mutations applied in between are visible to later steps, so an iteration that
//! races with deletes may skip or repeat entries. It never observes a partially applied mutation.
use crate::OrderedMap;
use std::fmt;

struct Cursor<'a, K, V, S> {
    map: &'a OrderedMap<K, V, S>,
    position: usize,
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    fn new(map: &'a OrderedMap<K, V, S>) -> Self {
        Cursor { map, position: 0 }
    }

    fn step<R>(&mut self, f: impl FnOnce(&K, &V) -> R) -> Option<R> {
        let item = self.map.with_index(self.position, f)?;
        self.position += 1;
        Some(item)
    }
}

macro_rules! cursor_iterator {
    ($(#[$attr:meta])* $name:ident<$($bound:ident: Clone),+>, $item:ty, |$key:pat_param, $value:pat_param| $f:expr) => {
        $(#[$attr])*
        pub struct $name<'a, K, V, S> {
            cursor: Cursor<'a, K, V, S>,
        }

        impl<'a, K, V, S> $name<'a, K, V, S> {
            pub(crate) fn new(map: &'a OrderedMap<K, V, S>) -> Self {
                $name {
                    cursor: Cursor::new(map),
                }
            }
        }

        impl<'a, K, V, S> Iterator for $name<'a, K, V, S>
        where
            $($bound: Clone),+
        {
            type Item = $item;

            fn next(&mut self) -> Option<Self::Item> {
                self.cursor.step(|$key, $value| $f)
            }
        }

        impl<K, V, S> fmt::Debug for $name<'_, K, V, S> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("position", &self.cursor.position)
                    .finish_non_exhaustive()
            }
        }
    };
}

cursor_iterator!(
    /// Iterator over the key-value pairs of an [`OrderedMap`], see [`OrderedMap::iter`].
    Iter<K: Clone, V: Clone>,
    (K, V),
    |key, value| (key.clone(), value.clone())
);

cursor_iterator!(
    /// Iterator over the keys of an [`OrderedMap`], see [`OrderedMap::keys`].
    Keys<K: Clone>,
    K,
    |key, _| key.clone()
);

cursor_iterator!(
    /// Iterator over the values of an [`OrderedMap`], see [`OrderedMap::values`].
    Values<V: Clone>,
    V,
    |_, value| value.clone()
);
