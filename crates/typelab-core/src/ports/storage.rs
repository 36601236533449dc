//! Blob storage port - where uploaded images end up.

use async_trait::async_trait;
use serde::Serialize;

/// Location of an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    pub path: String,
    pub public_url: String,
}

/// Blob storage trait - abstraction over file backends.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `bytes` under `path`, failing if something already lives there.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<StoredBlob, StorageError>;

    /// Read a previously stored blob.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Public URL for `path`, whether or not it exists yet.
    fn public_url(&self, path: &str) -> String;
}

/// Blob storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(String),
}
