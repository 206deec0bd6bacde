use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use super::naming::{quarantine_name, validate_storage_name};
use super::traits::{BlobStore, Bucket};

/// Staging directory for in-flight writes, kept on the same filesystem as the
/// buckets so the final placement is a link or rename.
const TMP_DIR: &str = ".tmp";

/// Filesystem-backed blob directory.
///
/// Layout: `{root}/products/{name}`, `{root}/garbage/{timestamp}_{name}` and
/// `{root}/.tmp/` for staging. Directories are created on first use.
pub struct FilesystemBlobStore {
    root: PathBuf,
    io_timeout: Duration,
}

impl FilesystemBlobStore {
    pub fn new(root: PathBuf, io_timeout: Duration) -> Self {
        Self { root, io_timeout }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the blobs of `bucket`.
    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.dir_name())
    }

    fn blob_path(&self, bucket: Bucket, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_storage_name(name)?;
        Ok(self.bucket_dir(bucket).join(name))
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(TMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Run a filesystem operation under the configured timeout.
    ///
    /// Expiry abandons the wait, not the operation: a write may still land in
    /// its bucket afterwards. Such a blob has no catalog row and is left for an
    /// operator to remove.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                op,
                after: self.io_timeout,
            }),
        }
    }

    async fn place(
        &self,
        temp_path: &Path,
        blob_path: &Path,
        name: &str,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        if overwrite {
            return Ok(fs::rename(temp_path, blob_path).await?);
        }

        // A hard link fails atomically when the target exists, unlike rename.
        match fs::hard_link(temp_path, blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn write(
        &self,
        bucket: Bucket,
        name: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let blob_path = self.blob_path(bucket, name)?;

        self.bounded("write", async {
            fs::create_dir_all(self.bucket_dir(bucket)).await?;
            fs::create_dir_all(self.root.join(TMP_DIR)).await?;

            let temp_path = self.temp_path();
            if let Err(e) = fs::write(&temp_path, data).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::from(e));
            }

            let placed = self.place(&temp_path, &blob_path, name, overwrite).await;
            // Already consumed by a successful rename; otherwise best effort.
            let _ = fs::remove_file(&temp_path).await;
            placed
        })
        .await
    }

    async fn read(&self, bucket: Bucket, name: &str) -> Result<Vec<u8>, StorageError> {
        let blob_path = self.blob_path(bucket, name)?;
        self.bounded("read", async {
            match fs::read(&blob_path).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(StorageError::NotFound(name.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn exists(&self, bucket: Bucket, name: &str) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(bucket, name)?;
        self.bounded("exists", async {
            Ok::<_, StorageError>(fs::try_exists(&blob_path).await?)
        })
        .await
    }

    async fn delete(&self, bucket: Bucket, name: &str) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(bucket, name)?;
        self.bounded("delete", async {
            match fs::remove_file(&blob_path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(StorageError::from(e)),
            }
        })
        .await
    }

    async fn quarantine(&self, name: &str, at: DateTime<Utc>) -> Result<String, StorageError> {
        let source = self.blob_path(Bucket::Products, name)?;
        let target_name = quarantine_name(name, at);
        let target = self.blob_path(Bucket::Garbage, &target_name)?;

        self.bounded("quarantine", async {
            if !fs::try_exists(&source).await? {
                return Err(StorageError::NotFound(name.to_string()));
            }
            fs::create_dir_all(self.bucket_dir(Bucket::Garbage)).await?;
            match fs::rename(&source, &target).await {
                Ok(()) => {
                    debug!(name, quarantined = %target_name, "Moved blob to garbage bucket");
                    Ok(target_name)
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(StorageError::NotFound(name.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }
}
