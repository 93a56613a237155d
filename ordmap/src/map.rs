//! [OrderedMap] is a concurrent hash map with an explicit, externally controlled order.
use crate::{
    barrier::{Barrier, Completion},
    config::{ApplyMode, Builder, DefaultHashBuilder},
    error::{Error, MissingKey},
    iter::{Iter, Keys, Values},
    mutation::Mutation,
    sort::{ComparatorKind, SortOptions},
    table::OrderTable,
    worker::Worker,
};
use hashbrown::{HashMap, HashSet};
use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// State shared between a map and its apply worker.
pub(crate) struct Shared<K, V, S> {
    table: RwLock<OrderTable<K, V, S>>,
    barrier: Barrier,
}

impl<K, V, S> Shared<K, V, S> {
    // A mutation that panics leaves the table consistent, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, OrderTable<K, V, S>> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, OrderTable<K, V, S>> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Shared<K, V, S> {
    /// Applies an admitted mutation under the exclusive lock, then completes it on the barrier.
    pub fn apply(&self, mutation: Mutation<K, V>) {
        let _completion = Completion::new(&self.barrier);
        let name = mutation.name();
        log::trace!("applying {name}");
        if catch_unwind(AssertUnwindSafe(|| mutation.apply(&mut self.write()))).is_err() {
            log::error!("{name} panicked, the mutation was abandoned");
        }
    }
}

enum Applier<K, V, S> {
    Immediate,
    Deferred(Worker<K, V, S>),
}

/// A hash map that keeps its entries in an explicit order and can be shared between threads.
///
/// Every entry has a position `0..len`. New keys are appended, or inserted at their sorted
/// position while a sticky comparator is active (see [`sort_by_value`](Self::sort_by_value)).
/// Positions change only through [`delete`](Self::delete), [`swap`](Self::swap) and sorting.
///
/// # Mutations
///
/// Mutating methods take `&self`. Each call is admitted in a total order, and mutations take
/// effect in exactly that order. In the default [`ApplyMode::Deferred`] the effect is applied by
/// a worker thread and the call returns before it is visible. Call [`wait`](Self::wait) to block
/// until all mutations admitted so far have been applied:
///
/// ```
/// let map = ordmap::OrderedMap::new();
/// map.set("a", 1);
/// map.set("b", 2);
/// map.wait();
/// assert_eq!(map.get("a"), Some(1));
/// assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
/// ```
///
/// # Reads
///
/// Reads take a shared lock on the current state and never wait for queued mutations. They see
/// either none or all of the effects of any single mutation.
pub struct OrderedMap<K, V, S = DefaultHashBuilder> {
    shared: Arc<Shared<K, V, S>>,
    /// Keys that exist once every admitted mutation has been applied.
    admitted: Mutex<HashSet<K, S>>,
    applier: Applier<K, V, S>,
}

impl<K, V> OrderedMap<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Returns an empty map applying mutations on a worker thread.
    ///
    /// # Panics
    ///
    /// Panics if the worker thread cannot be spawned. Use [`Builder::build`] to handle that case.
    pub fn new() -> Self {
        Builder::new()
            .build()
            .unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedMap<(), ()> {
    /// Returns a [`Builder`] for configuring a new map.
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync + 'static,
{
    pub(crate) fn from_builder(builder: Builder<S>) -> Result<Self, Error> {
        let Builder {
            capacity,
            build_hasher,
            mode,
            worker_name,
        } = builder;
        let shared = Arc::new(Shared {
            table: RwLock::new(OrderTable::with_capacity_and_hasher(
                capacity,
                build_hasher.clone(),
            )),
            barrier: Barrier::new(),
        });
        let applier = match mode {
            ApplyMode::Immediate => Applier::Immediate,
            ApplyMode::Deferred => Applier::Deferred(Worker::spawn(worker_name, shared.clone())?),
        };
        Ok(OrderedMap {
            shared,
            admitted: Mutex::new(HashSet::with_capacity_and_hasher(capacity, build_hasher)),
            applier,
        })
    }

    fn admission(&self) -> MutexGuard<'_, HashSet<K, S>> {
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands an admitted mutation over for applying. Holding the admission guard makes the
    /// registration order on the barrier and queue order equal to the admission order.
    fn dispatch(&self, _admission: &MutexGuard<'_, HashSet<K, S>>, mutation: Mutation<K, V>) {
        log::trace!("admitting {}", mutation.name());
        self.shared.barrier.register(1);
        match &self.applier {
            Applier::Immediate => self.shared.apply(mutation),
            Applier::Deferred(worker) => worker.submit(mutation),
        }
    }

    /// Sets the value of `key`.
    ///
    /// A new key is appended at the end, or at its sorted position while a sticky comparator is
    /// active. Setting an existing key only replaces its value; its position is kept unless
    /// values are kept sorted and the new value requires a move.
    pub fn set(&self, key: K, value: V) {
        let mut admission = self.admission();
        if !admission.contains(&key) {
            admission.insert(key.clone());
        }
        self.dispatch(&admission, Mutation::Set(key, value));
    }

    /// Removes `key` and its value. Entries after it move up by one position.
    ///
    /// Does nothing if the key is absent.
    pub fn delete<Q>(&self, key: &Q)
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let mut admission = self.admission();
        match admission.take(key) {
            Some(key) => self.dispatch(&admission, Mutation::Delete(key)),
            None => log::trace!("delete of absent key"),
        }
    }

    /// Exchanges the positions of two keys along with their values.
    ///
    /// Afterwards [`get`](Self::get) returns the former value of `second` for `first` and vice
    /// versa, while traversal shows the same values at the same positions as before, labeled
    /// with the other key.
    ///
    /// Returns [`Error::KeyNotFound`] if either key is absent at this point of the mutation
    /// order, in which case nothing changes. Swapping the key order while keys are kept sorted
    /// leaves sticky mode.
    pub fn swap<Q>(&self, first: &Q, second: &Q) -> Result<(), Error>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let admission = self.admission();
        let (first, second) = match (admission.get(first), admission.get(second)) {
            (Some(first), Some(second)) => (first.clone(), second.clone()),
            (first, second) => {
                let missing = MissingKey::from_presence(first.is_some(), second.is_some());
                return Err(Error::KeyNotFound(missing.unwrap_or(MissingKey::Both)));
            }
        };
        self.dispatch(&admission, Mutation::Swap(first, second));
        Ok(())
    }

    /// Sorts all entries by value using the strict less-than predicate `less`.
    ///
    /// With [`SortOptions::stable`], entries with equal values keep their relative order. With
    /// [`SortOptions::sticky`], `less` stays active: new keys are inserted at their sorted
    /// position and updated values move to keep the order. Otherwise any active comparator is
    /// cleared.
    pub fn sort_by_value<F>(&self, less: F, options: SortOptions)
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        let admission = self.admission();
        self.dispatch(&admission, Mutation::SortByValue(Arc::new(less), options));
    }

    /// Sorts all entries by key using the strict less-than predicate `less`.
    ///
    /// Works like [`sort_by_value`](Self::sort_by_value), a sticky key comparator replaces any
    /// value comparator.
    pub fn sort_by_key<F>(&self, less: F, options: SortOptions)
    where
        F: Fn(&K, &K) -> bool + Send + Sync + 'static,
    {
        let admission = self.admission();
        self.dispatch(&admission, Mutation::SortByKey(Arc::new(less), options));
    }

    /// Stops keeping entries sorted. New keys are appended again.
    pub fn clear_sticky(&self) {
        let admission = self.admission();
        self.dispatch(&admission, Mutation::ClearSticky);
    }
}

impl<K, V, S> OrderedMap<K, V, S> {
    /// Blocks until every mutation admitted before this call has been applied.
    ///
    /// Must not be called from inside a comparator.
    pub fn wait(&self) {
        self.shared.barrier.drain();
    }

    /// Returns the number of admitted mutations that have not been applied yet.
    pub fn pending(&self) -> usize {
        self.shared.barrier.pending()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.shared.read().len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns which sticky comparator is active.
    pub fn active_comparator(&self) -> ComparatorKind {
        self.shared.read().comparator_kind()
    }

    /// Calls `f` on the entry at `position` under the shared lock.
    pub(crate) fn with_index<R>(&self, position: usize, f: impl FnOnce(&K, &V) -> R) -> Option<R> {
        let table = self.shared.read();
        table.get_index(position).map(|(key, value)| f(key, value))
    }

    /// Returns the key and value at `position`.
    pub fn get_index(&self, position: usize) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.with_index(position, |key, value| (key.clone(), value.clone()))
    }

    /// Returns an iterator over all key-value pairs in order.
    ///
    /// The iterator takes the shared lock once per step, so entries may come from different
    /// states when mutations are applied concurrently. Use [`snapshot`](Self::snapshot) for a
    /// consistent copy.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    /// Returns an iterator over all keys in order, see [`iter`](Self::iter).
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys::new(self)
    }

    /// Returns an iterator over all values in order, see [`iter`](Self::iter).
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values::new(self)
    }

    /// Returns all key-value pairs in order, copied under a single lock acquisition.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.shared.read().as_slice().to_vec()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> OrderedMap<K, V, S> {
    /// Calls `f` with the value of `key` under the shared lock, if the key is present.
    pub fn get_with<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let table = self.shared.read();
        let found = table.get(key).map(f);
        if found.is_none() {
            log::trace!("lookup of absent key");
        }
        found
    }

    /// Returns a copy of the value of `key`, if the key is present.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.position_of(key).is_some()
    }

    /// Returns the position of `key`, if the key is present.
    pub fn position_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.shared.read().get_index_of(key)
    }

    /// Returns a copy of all entries as a plain hash map, without order.
    pub fn to_map(&self) -> HashMap<K, V, S>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let table = self.shared.read();
        let mut map = HashMap::with_capacity_and_hasher(table.len(), table.hasher().clone());
        map.extend(table.as_slice().iter().cloned());
        map
    }

    #[cfg(test)]
    pub(crate) fn check(&self) {
        self.shared.read().check();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for OrderedMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.shared.read();
        f.debug_map()
            .entries(table.as_slice().iter().map(|(key, value)| (key, value)))
            .finish()
    }
}

impl<'a, K: Clone, V: Clone, S> IntoIterator for &'a OrderedMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
