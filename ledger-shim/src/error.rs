//! Error types for the ledger shim

use thiserror::Error;

/// Result type for shim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shim errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// No state stored under the key
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Certificate or attribute lookup failed
    #[error("Identity error: {0}")]
    Identity(String),

    /// Signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureError(String),

    /// Event could not be delivered to a sink
    #[error("Event error: {0}")]
    Event(String),

    /// Concurrency error (peer mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the key is absent rather than unreadable
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
