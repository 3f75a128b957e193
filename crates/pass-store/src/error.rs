use thiserror::Error;

/// Storage failure.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened.
    #[error("failed to open store at {path}: {reason}")]
    OpenFailed {
        /// Directory that was being opened.
        path: String,
        /// Backend message.
        reason: String,
    },

    /// The backend rejected a read, write, or flush.
    #[error("store backend error: {0}")]
    Backend(String),

    /// Empty keys are not allowed.
    #[error("empty keys are not allowed")]
    EmptyKey,

    /// Key exceeds the maximum allowed size.
    #[error("key exceeds maximum size of {max} bytes (got {actual})")]
    KeyTooLarge { max: usize, actual: usize },

    /// A value could not be encoded for storage.
    #[error("failed to encode value for key {key}: {reason}")]
    Encode {
        /// Printable form of the key.
        key: String,
        /// Encoder message.
        reason: String,
    },

    /// A stored value did not decode to the expected shape.
    #[error("corrupt value under key {key}: {reason}")]
    Corrupt {
        /// Printable form of the key.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl StoreError {
    pub(crate) fn printable_key(key: &[u8]) -> String {
        String::from_utf8_lossy(key).into_owned()
    }
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        Self::Backend(e.to_string())
    }
}
