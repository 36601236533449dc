//! Filesystem blob storage rooted at a media directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use typelab_core::ports::{BlobStorage, StorageError, StoredBlob};

/// Stores blobs as files under `root`, served from `base_url`.
#[derive(Debug, Clone)]
pub struct LocalBlobStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative blob path inside `root`.
    ///
    /// Only plain segments are allowed: no parent or current-dir components,
    /// no absolute paths, nothing empty.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let invalid = || StorageError::InvalidPath(path.to_string());

        if path.is_empty() || path.contains('\\') {
            return Err(invalid());
        }

        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                _ => return Err(invalid()),
            }
        }

        if path.split('/').any(str::is_empty) {
            return Err(invalid());
        }

        Ok(resolved)
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

/// Write `bytes` to a freshly created `target`, removing it again if the
/// write does not complete so the path is not left holding a partial blob.
async fn write_or_discard<W>(mut writer: W, bytes: &[u8], target: &Path) -> Result<(), StorageError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(cleanup) = tokio::fs::remove_file(target).await {
            tracing::warn!(path = %target.display(), error = %cleanup, "Failed to remove partial blob");
        }
        return Err(io_error(e));
    }
    Ok(())
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<StoredBlob, StorageError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
                _ => io_error(e),
            })?;
        write_or_discard(file, &bytes, &target).await?;

        tracing::info!(path, size = bytes.len(), "Stored blob");

        Ok(StoredBlob {
            path: path.to_string(),
            public_url: self.public_url(path),
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => io_error(e),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
