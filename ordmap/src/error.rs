use std::fmt;

/// Which of the two keys passed to [`OrderedMap::swap`](crate::OrderedMap::swap) is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingKey {
    /// Only the first key is absent.
    First,
    /// Only the second key is absent.
    Second,
    /// Neither key is present.
    Both,
}

impl MissingKey {
    /// Returns the missing key(s) given which of the two keys were found.
    pub fn from_presence(first: bool, second: bool) -> Option<Self> {
        match (first, second) {
            (true, true) => None,
            (false, true) => Some(MissingKey::First),
            (true, false) => Some(MissingKey::Second),
            (false, false) => Some(MissingKey::Both),
        }
    }
}

/// Error cases of [`OrderedMap`](crate::OrderedMap) operations.
#[derive(Debug)]
pub enum Error {
    /// A key referenced by a swap is not in the map.
    KeyNotFound(MissingKey),
    /// The thread applying deferred mutations could not be started.
    Spawn(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound(MissingKey::First) => f.write_str("first key not found in map"),
            Error::KeyNotFound(MissingKey::Second) => f.write_str("second key not found in map"),
            Error::KeyNotFound(MissingKey::Both) => f.write_str("neither key found in map"),
            Error::Spawn(err) => write!(f, "failed to spawn apply worker: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::KeyNotFound(_) => None,
            Error::Spawn(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Spawn(err)
    }
}
