use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageError;

/// Top-level partitions of the blob directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Blobs served to clients.
    Products,
    /// Orphaned blobs moved out of the serving path by the collector.
    Garbage,
}

impl Bucket {
    /// Directory name of the bucket under the storage root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Garbage => "garbage",
        }
    }
}

/// Named blob storage partitioned into buckets.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name` in `bucket`.
    ///
    /// Fails with [`StorageError::AlreadyExists`] when the name is taken and
    /// `overwrite` is false; replaces the existing blob otherwise.
    async fn write(
        &self,
        bucket: Bucket,
        name: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<(), StorageError>;

    /// Retrieve all bytes of a blob.
    async fn read(&self, bucket: Bucket, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, bucket: Bucket, name: &str) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, bucket: Bucket, name: &str) -> Result<bool, StorageError>;

    /// Move an active blob into the garbage bucket under a name qualified by `at`.
    ///
    /// Returns the name of the quarantined blob.
    async fn quarantine(&self, name: &str, at: DateTime<Utc>) -> Result<String, StorageError>;
}
