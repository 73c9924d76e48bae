use std::fmt::Debug;

use ccv_core::storage::Key;
use thiserror::Error;

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage key error {0}")]
    KeyError(ccv_core::storage::Error),
}

/// A result of a function that may fail
pub type Result<T> = std::result::Result<T, Error>;

/// A database backend.
pub trait DB: Debug {
    /// Read the latest value for a subspace key from the DB
    fn read_subspace_val(&self, key: &Key) -> Result<Option<Vec<u8>>>;

    /// Write the value with the given subspace key to the DB. Returns the
    /// size difference from previous value, if any, or the size of the value
    /// otherwise.
    fn write_subspace_val(
        &mut self,
        key: &Key,
        value: impl AsRef<[u8]>,
    ) -> Result<i64>;

    /// Delete the value with the given subspace key from the DB. Returns the
    /// size of the removed value, if any, 0 if no previous value was found.
    fn delete_subspace_val(&mut self, key: &Key) -> Result<i64>;
}

/// A database prefix iterator.
pub trait DBIter<'iter> {
    /// Prefix iterator
    type PrefixIter: Debug + Iterator<Item = (String, Vec<u8>)>;

    /// Read subspace key value pairs with the given prefix from the DB,
    /// ordered by the storage keys.
    fn iter_prefix(&'iter self, prefix: Option<&Key>) -> Self::PrefixIter;
}
