use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("blob {0:?} not found")]
    NotFound(String),
    #[error("invalid blob path {0:?}")]
    InvalidPath(String),
    #[error("unable to access blob {path:?}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_string())
        } else {
            StoreError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Written,
    Skipped,
}

/// Flat key-value storage for content-addressed blobs
///
/// Paths are relative, `/`-separated keys; for blobs the key is the hex digest.
pub trait BlobStore: Send + Sync {
    fn read_path(&self, path: &str) -> Result<Bytes, StoreError>;

    /// Store `content` under `path` unless the path already exists
    fn put_path(&self, path: &str, content: Bytes) -> Result<PutOutcome, StoreError>;

    fn exists(&self, path: &str) -> bool;
}

/// Blob store backed by a directory on disk
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    path: Box<Path>,
}

impl DirBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DirBlobStore {
            path: path.into().into_boxed_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        if path.is_empty() || Path::new(path).is_absolute() || path.split('/').any(|c| c == "..") {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        Ok(self.path.join(path))
    }

    /// Write `content` to a temporary file in the blob's directory, then rename it into
    /// place so readers never see a partial blob
    ///
    /// The temporary file is removed when the write or the rename fails.
    fn write_blob(&self, path: &str, blob_path: &Path, content: &[u8]) -> Result<(), StoreError> {
        let blob_dir = blob_path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        std::fs::create_dir_all(blob_dir).map_err(|e| StoreError::io(path, e))?;

        let mut temp_blob = tempfile::Builder::new()
            .prefix("tmp-blob-")
            .tempfile_in(blob_dir)
            .map_err(|e| StoreError::io(path, e))?;
        temp_blob
            .write_all(content)
            .map_err(|e| StoreError::io(path, e))?;
        temp_blob
            .persist(blob_path)
            .map_err(|e| StoreError::io(path, e.error))?;

        Ok(())
    }
}

impl BlobStore for DirBlobStore {
    fn read_path(&self, path: &str) -> Result<Bytes, StoreError> {
        let blob_path = self.full_path(path)?;

        std::fs::read(&blob_path)
            .map(Bytes::from)
            .map_err(|e| StoreError::io(path, e))
    }

    fn put_path(&self, path: &str, content: Bytes) -> Result<PutOutcome, StoreError> {
        let blob_path = self.full_path(path)?;
        if blob_path.exists() {
            return Ok(PutOutcome::Skipped);
        }

        self.write_blob(path, &blob_path, &content)?;
        Ok(PutOutcome::Written)
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).is_ok_and(|p| p.is_file())
    }
}

/// In-process blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_path(&self, path: &str) -> Result<Bytes, StoreError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| StoreError::InvalidPath(path.to_string()))?;

        blobs
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn put_path(&self, path: &str, content: Bytes) -> Result<PutOutcome, StoreError> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StoreError::InvalidPath(path.to_string()))?;

        if blobs.contains_key(path) {
            return Ok(PutOutcome::Skipped);
        }
        blobs.insert(path.to_string(), content);
        Ok(PutOutcome::Written)
    }

    fn exists(&self, path: &str) -> bool {
        self.blobs
            .read()
            .is_ok_and(|blobs| blobs.contains_key(path))
    }
}
