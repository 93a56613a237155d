//! Construction options for [`OrderedMap`].
use crate::{error::Error, OrderedMap};
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use zwohash::ZwoHasher;

/// The hasher used by maps that don't specify one.
pub type DefaultHashBuilder = BuildHasherDefault<ZwoHasher>;

/// When the effect of a mutating call is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApplyMode {
    /// Mutations are queued and applied in admission order by a dedicated worker thread. Mutating
    /// calls return before their effect is visible; use [`OrderedMap::wait`] to observe it.
    #[default]
    Deferred,
    /// Mutations are applied on the calling thread before the call returns.
    Immediate,
}

/// Builder for an [`OrderedMap`] with non-default settings.
#[derive(Clone, Debug)]
pub struct Builder<S = DefaultHashBuilder> {
    pub(crate) capacity: usize,
    pub(crate) build_hasher: S,
    pub(crate) mode: ApplyMode,
    pub(crate) worker_name: String,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            capacity: 0,
            build_hasher: DefaultHashBuilder::default(),
            mode: ApplyMode::default(),
            worker_name: "ordmap-apply".to_owned(),
        }
    }
}

impl Builder {
    /// Returns a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> Builder<S> {
    /// Reserves room for `capacity` entries up front.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Uses `build_hasher` for hashing keys.
    pub fn hasher<T>(self, build_hasher: T) -> Builder<T> {
        Builder {
            capacity: self.capacity,
            build_hasher,
            mode: self.mode,
            worker_name: self.worker_name,
        }
    }

    /// Selects when mutations take effect.
    pub fn mode(mut self, mode: ApplyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Names the thread applying deferred mutations.
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Creates the map, starting its worker thread in [`ApplyMode::Deferred`].
    pub fn build<K, V>(self) -> Result<OrderedMap<K, V, S>, Error>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
        S: BuildHasher + Clone + Send + Sync + 'static,
    {
        OrderedMap::from_builder(self)
    }
}
