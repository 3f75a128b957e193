//! Sled-backed store.
//!
//! One `sled::Db` per activity data directory. Batches are translated into
//! a `sled::Batch` and applied with `apply_batch`, which sled guarantees
//! to be atomic and crash-consistent.

use std::ops::Bound;
use std::path::Path;

use tracing::{debug, info};

use crate::batch::{BatchOp, WriteBatch};
use crate::error::StoreError;
use crate::traits::{Entries, KvStore};

/// Default page cache (16 MB). Activity state is small.
pub const DEFAULT_CACHE_CAPACITY: u64 = 16 * 1024 * 1024;

/// Embedded sled database.
#[derive(Clone, Debug)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create a database in `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::Config::default()
            .path(path)
            .cache_capacity(DEFAULT_CACHE_CAPACITY)
            .open()
            .map_err(|e| StoreError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        info!(path = %path.display(), recovered = db.was_recovered(), "opened sled store");
        Ok(Self { db })
    }

    /// Open a throwaway database that is deleted on drop.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::default()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::OpenFailed {
                path: "<temporary>".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { db })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn floor(&self, prefix: &[u8], key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        if key < prefix {
            return Ok(None);
        }
        let range = (Bound::Included(prefix), Bound::Included(key));
        match self.db.range::<&[u8], _>(range).next_back() {
            Some(item) => {
                let (k, v) = item?;
                if k.starts_with(prefix) {
                    Ok(Some((k.to_vec(), v.to_vec())))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: Option<usize>,
    ) -> Result<Entries, StoreError> {
        let from = if start < prefix { prefix } else { start };
        let range = (Bound::Included(from), Bound::<&[u8]>::Unbounded);
        let mut out = Vec::new();
        for item in self.db.range::<&[u8], _>(range) {
            if limit.is_some_and(|max| out.len() >= max) {
                break;
            }
            let (k, v) = item?;
            if !k.starts_with(prefix) {
                break;
            }
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.validate()?;
        let n = batch.len();
        let mut sled_batch = sled::Batch::default();
        for op in batch {
            match op {
                BatchOp::Put { key, value } => sled_batch.insert(key, value),
                BatchOp::Delete { key } => sled_batch.remove(key),
            }
        }
        self.db.apply_batch(sled_batch)?;
        debug!(ops = n, "applied batch");
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
