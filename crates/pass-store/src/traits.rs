//! The storage trait the engine is written against.

use crate::batch::WriteBatch;
use crate::error::StoreError;

/// Key-value entries returned by scans, in ascending key order.
pub type Entries = Vec<(Vec<u8>, Vec<u8>)>;

/// Ordered byte-keyed storage with atomic batch writes.
///
/// Implementations must be `Send + Sync`; the engine shares one store
/// between its request lock and read-only queries.
pub trait KvStore: Send + Sync {
    /// Point lookup.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// The entry with the greatest key `<= key` among keys starting with
    /// `prefix`, if any.
    fn floor(&self, prefix: &[u8], key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Entries under `prefix` with key `>= start`, at most `limit` of them.
    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: Option<usize>,
    ) -> Result<Entries, StoreError>;

    /// Apply every operation of `batch` atomically.
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Make applied batches durable.
    fn flush(&self) -> Result<(), StoreError>;

    /// All entries under `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Entries, StoreError> {
        self.scan_from(prefix, prefix, None)
    }
}

impl<S: KvStore + ?Sized> KvStore for std::sync::Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn floor(&self, prefix: &[u8], key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        (**self).floor(prefix, key)
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: Option<usize>,
    ) -> Result<Entries, StoreError> {
        (**self).scan_from(prefix, start, limit)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).apply(batch)
    }

    fn flush(&self) -> Result<(), StoreError> {
        (**self).flush()
    }
}
