//! DB mock for testing

use std::collections::{btree_map, BTreeMap};

use ccv_core::storage::Key;

use crate::db::{DBIter, Error, Result, DB};
use crate::types::{KVBytes, PrefixIterator};

const SUBSPACE_CF: &str = "subspace";

/// An in-memory DB for testing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MockDB(BTreeMap<String, Vec<u8>>);

impl MockDB {
    fn subspace_key(key: &Key) -> Result<String> {
        let key = Key::parse(SUBSPACE_CF).map_err(Error::KeyError)?.join(key);
        Ok(key.to_string())
    }

    /// Number of stored key-value pairs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl DB for MockDB {
    fn read_subspace_val(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        let key = Self::subspace_key(key)?;
        Ok(self.0.get(&key).cloned())
    }

    #[allow(clippy::cast_possible_wrap, clippy::arithmetic_side_effects)]
    fn write_subspace_val(
        &mut self,
        key: &Key,
        value: impl AsRef<[u8]>,
    ) -> Result<i64> {
        let value = value.as_ref();
        let key = Self::subspace_key(key)?;
        let size_diff = match self.0.insert(key, value.to_owned()) {
            Some(prev_value) => value.len() as i64 - prev_value.len() as i64,
            None => value.len() as i64,
        };
        Ok(size_diff)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn delete_subspace_val(&mut self, key: &Key) -> Result<i64> {
        let key = Self::subspace_key(key)?;
        let prev_len = self
            .0
            .remove(&key)
            .map(|prev_value| prev_value.len() as i64)
            .unwrap_or_default();
        Ok(prev_len)
    }
}

impl<'iter> DBIter<'iter> for MockDB {
    type PrefixIter = MockPrefixIterator;

    fn iter_prefix(&'iter self, prefix: Option<&Key>) -> MockPrefixIterator {
        let stripped_prefix = format!("{SUBSPACE_CF}/");
        let prefix = format!(
            "{}{}",
            stripped_prefix,
            match prefix {
                Some(prefix) => {
                    if prefix == &Key::default() {
                        prefix.to_string()
                    } else {
                        format!("{prefix}/")
                    }
                }
                None => "".to_string(),
            }
        );
        let iter = self.0.clone().into_iter();
        MockPrefixIterator::new(MockIterator { prefix, iter }, stripped_prefix)
    }
}

/// A prefix iterator base for the [`MockPrefixIterator`].
#[derive(Debug)]
pub struct MockIterator {
    prefix: String,
    /// The concrete iterator
    pub iter: btree_map::IntoIter<String, Vec<u8>>,
}

/// A prefix iterator for the [`MockDB`].
pub type MockPrefixIterator = PrefixIterator<MockIterator>;

impl Iterator for MockIterator {
    type Item = Result<KVBytes>;

    fn next(&mut self) -> Option<Self::Item> {
        for (key, val) in &mut self.iter {
            if key.starts_with(&self.prefix) {
                return Some(Ok((
                    Box::from(key.as_bytes()),
                    Box::from(val.as_slice()),
                )));
            }
        }
        None
    }
}

impl Iterator for PrefixIterator<MockIterator> {
    type Item = (String, Vec<u8>);

    /// Returns the next pair
    fn next(&mut self) -> Option<(String, Vec<u8>)> {
        loop {
            let (key, val) = match self.iter.next()? {
                Ok(kv) => kv,
                Err(err) => {
                    tracing::error!("Mock prefix iterator failed: {err}");
                    return None;
                }
            };
            let key = match String::from_utf8(key.to_vec()) {
                Ok(key) => key,
                Err(err) => {
                    tracing::error!("Non UTF-8 key in the mock DB: {err}");
                    return None;
                }
            };
            if let Some(k) = key.strip_prefix(&self.stripped_prefix) {
                return Some((k.to_owned(), val.to_vec()));
            }
        }
    }
}
