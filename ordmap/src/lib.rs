//! [OrderedMap] is a thread-safe hash map whose entries keep an explicit order.
//!
//! Entries are iterated in position order `0..len`. Positions are assigned on insertion and only
//! change when entries are deleted, swapped or sorted. A map can optionally stay sorted: after a
//! sticky sort, new keys are inserted at their sorted position.
//!
//! Mutating methods take `&self`. They are admitted in a single total order and applied in that
//! order, either on a dedicated worker thread ([`ApplyMode::Deferred`], the default) or on the
//! calling thread ([`ApplyMode::Immediate`]). [`OrderedMap::wait`] blocks until everything
//! admitted so far has been applied. Reads never wait for queued mutations.
//!
//! Internally the entries are stored in a `Vec` in iteration order, supplemented by a hashbrown
//! `HashTable` of positions for fast lookups. Like in `index_map`, deleting an entry preserves the
//! order of the others and therefore costs time linear in the number of following entries.

mod barrier;
mod config;
mod error;
mod iter;
mod map;
mod mutation;
mod position_index;
mod sort;
mod table;
mod worker;

pub use barrier::Barrier;
pub use config::{ApplyMode, Builder, DefaultHashBuilder};
pub use error::{Error, MissingKey};
pub use iter::{Iter, Keys, Values};
pub use map::OrderedMap;
pub use sort::{ComparatorKind, Less, SortOptions};

#[cfg(test)]
mod test_map;
