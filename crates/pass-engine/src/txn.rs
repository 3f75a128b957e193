//! Request-scoped write overlay.
//!
//! A `Txn` reads through to the store and buffers every write. Nothing is
//! visible to other readers until the engine turns the overlay into a
//! single `WriteBatch` and applies it. Dropping a `Txn` discards it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use pass_core::Amount;
use pass_store::{keys, Entries, KvStore, StoreError, WriteBatch};

pub(crate) struct Txn<'a> {
    store: &'a dyn KvStore,
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'a> Txn<'a> {
    pub(crate) fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            writes: BTreeMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(v) => Ok(Some(v.clone())),
            None => self.store.get(key),
        }
    }

    /// Greatest key `<= key` under `prefix`, staged writes included.
    pub(crate) fn floor(
        &self,
        prefix: &[u8],
        key: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        let staged = if key < prefix {
            None
        } else {
            self.writes
                .range::<[u8], _>((
                    std::ops::Bound::Included(prefix),
                    std::ops::Bound::Included(key),
                ))
                .next_back()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
        };
        let stored = self.store.floor(prefix, key)?;
        Ok(match (staged, stored) {
            (Some(s), Some(d)) => Some(if s.0 >= d.0 { s } else { d }),
            (s, d) => s.or(d),
        })
    }

    pub(crate) fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    pub(crate) fn get_u64(&self, key: &[u8]) -> Result<Option<u64>, StoreError> {
        self.get(key)?
            .map(|v| keys::decode_u64(key, &v))
            .transpose()
    }

    pub(crate) fn put_u64(&mut self, key: Vec<u8>, value: u64) {
        self.put(key, value.to_be_bytes().to_vec());
    }

    pub(crate) fn get_amount(&self, key: &[u8]) -> Result<Amount, StoreError> {
        Ok(self
            .get(key)?
            .map(|v| keys::decode_amount(key, &v))
            .transpose()?
            .unwrap_or(Amount::ZERO))
    }

    pub(crate) fn put_amount(&mut self, key: Vec<u8>, value: Amount) {
        self.put(key, value.to_be_bytes().to_vec());
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        self.get(key)?
            .map(|v| keys::decode_json(key, &v))
            .transpose()
    }

    pub(crate) fn put_json<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), StoreError> {
        let bytes = keys::encode_json(&key, value)?;
        self.put(key, bytes);
        Ok(())
    }

    /// Stage writes produced outside the engine, such as a gateway's.
    pub(crate) fn put_all(&mut self, entries: Entries) {
        self.writes.extend(entries);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (k, v) in self.writes {
            batch.put(k, v);
        }
        batch
    }
}
