//! The common storage read and write traits, implemented over any DB backend
//! and used by the child-chain modules to access their state.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::arithmetic_side_effects,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]

mod db;
mod error;
pub mod mockdb;
pub mod types;

use ccv_core::borsh::{BorshDeserialize, BorshSerialize};
use ccv_core::storage;
pub use db::{Error as DbError, Result as DbResult, *};
pub use error::{CustomError, Error, OptionExt, Result, ResultExt};

/// Common storage read interface
///
/// If you're using this trait and having compiler complaining about needing an
/// explicit lifetime parameter, simply use trait bounds with the following
/// syntax:
///
/// ```rust,ignore
/// where
///     S: StorageRead
/// ```
pub trait StorageRead {
    /// Storage read prefix iterator
    type PrefixIter<'iter>
    where
        Self: 'iter;

    /// Storage read Borsh encoded value. It will try to read from the storage
    /// and decode it if found.
    fn read<T: BorshDeserialize>(
        &self,
        key: &storage::Key,
    ) -> Result<Option<T>> {
        let bytes = self.read_bytes(key)?;
        match bytes {
            Some(bytes) => {
                let val = ccv_core::decode(bytes).into_storage_result()?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    /// Storage read raw bytes. It will try to read from the storage.
    fn read_bytes(&self, key: &storage::Key) -> Result<Option<Vec<u8>>>;

    /// Storage `has_key` in. It will try to read from the storage.
    fn has_key(&self, key: &storage::Key) -> Result<bool>;

    /// Storage prefix iterator ordered by the storage keys. It will try to get
    /// an iterator from the storage.
    ///
    /// For a more user-friendly iterator API, use [`fn@iter_prefix`] instead.
    fn iter_prefix<'iter>(
        &'iter self,
        prefix: &storage::Key,
    ) -> Result<Self::PrefixIter<'iter>>;

    /// Storage prefix iterator. It will try to read from the storage.
    fn iter_next<'iter>(
        &'iter self,
        iter: &mut Self::PrefixIter<'iter>,
    ) -> Result<Option<(String, Vec<u8>)>>;
}

/// Common storage write interface
pub trait StorageWrite {
    /// Write a value to be encoded with Borsh at the given key to storage.
    fn write<T: BorshSerialize>(
        &mut self,
        key: &storage::Key,
        val: T,
    ) -> Result<()> {
        let bytes = ccv_core::encode(&val);
        self.write_bytes(key, bytes)
    }

    /// Write a value as bytes at the given key to storage.
    fn write_bytes(
        &mut self,
        key: &storage::Key,
        val: impl AsRef<[u8]>,
    ) -> Result<()>;

    /// Delete a value at the given key from storage.
    fn delete(&mut self, key: &storage::Key) -> Result<()>;
}

/// Iterate Borsh encoded items matching the given prefix, ordered by the
/// storage keys.
pub fn iter_prefix<'a, T>(
    storage: &'a impl StorageRead,
    prefix: &storage::Key,
) -> Result<impl Iterator<Item = Result<(storage::Key, T)>> + 'a>
where
    T: BorshDeserialize,
{
    let iter = storage.iter_prefix(prefix)?;
    let iter = itertools::unfold(iter, |iter| {
        match storage.iter_next(iter) {
            Ok(Some((key, val))) => {
                let key = match storage::Key::parse(key).into_storage_result() {
                    Ok(key) => key,
                    Err(err) => return Some(Err(err)),
                };
                let val = match ccv_core::decode(val).into_storage_result() {
                    Ok(val) => val,
                    Err(err) => {
                        // Propagate val encoding errors into Iterator's Item
                        return Some(Err(err));
                    }
                };
                Some(Ok((key, val)))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    });
    Ok(iter)
}

/// Storage backed by a [`DB`]. Every write goes straight to the DB, so a
/// block's changes are visible to the next read within the same block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DbStorage<D> {
    db: D,
}

impl<D> DbStorage<D>
where
    D: DB,
{
    /// Wrap a DB
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Borrow the underlying DB
    pub fn db(&self) -> &D {
        &self.db
    }
}

impl<D> StorageRead for DbStorage<D>
where
    D: DB + for<'iter> DBIter<'iter>,
{
    type PrefixIter<'iter> = <D as DBIter<'iter>>::PrefixIter where Self: 'iter;

    fn read_bytes(&self, key: &storage::Key) -> Result<Option<Vec<u8>>> {
        self.db.read_subspace_val(key).into_storage_result()
    }

    fn has_key(&self, key: &storage::Key) -> Result<bool> {
        Ok(self.read_bytes(key)?.is_some())
    }

    fn iter_prefix<'iter>(
        &'iter self,
        prefix: &storage::Key,
    ) -> Result<Self::PrefixIter<'iter>> {
        Ok(self.db.iter_prefix(Some(prefix)))
    }

    fn iter_next<'iter>(
        &'iter self,
        iter: &mut Self::PrefixIter<'iter>,
    ) -> Result<Option<(String, Vec<u8>)>> {
        Ok(iter.next())
    }
}

impl<D> StorageWrite for DbStorage<D>
where
    D: DB,
{
    fn write_bytes(
        &mut self,
        key: &storage::Key,
        val: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.db
            .write_subspace_val(key, val)
            .into_storage_result()
            .map(|_size_diff| ())
    }

    fn delete(&mut self, key: &storage::Key) -> Result<()> {
        self.db
            .delete_subspace_val(key)
            .into_storage_result()
            .map(|_size_diff| ())
    }
}

/// Helpers for testing components that depend on storage
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::mockdb::MockDB;
    use super::*;

    /// Storage with a mock DB for testing
    pub type TestStorage = DbStorage<MockDB>;
}
