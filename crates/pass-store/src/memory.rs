//! In-memory backend.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::batch::{BatchOp, WriteBatch};
use crate::error::StoreError;
use crate::traits::{Entries, KvStore};

/// `BTreeMap` store. Batches are applied under one write lock, so readers
/// never observe half a batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn floor(&self, prefix: &[u8], key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        if key < prefix {
            return Ok(None);
        }
        let map = self.inner.read();
        Ok(map
            .range::<[u8], _>((
                std::ops::Bound::Included(prefix),
                std::ops::Bound::Included(key),
            ))
            .next_back()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone())))
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: Option<usize>,
    ) -> Result<Entries, StoreError> {
        let map = self.inner.read();
        let from = if start < prefix { prefix } else { start };
        Ok(map
            .range::<[u8], _>((std::ops::Bound::Included(from), std::ops::Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.validate()?;
        let mut map = self.inner.write();
        for op in batch {
            match op {
                BatchOp::Put { key, value } => {
                    map.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
