use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::storage::{
    Bucket, DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_UPLOAD_SIZE, UploadPolicy,
};

/// Image storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root upload directory. Default: "./uploads".
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// URL path under which the root is served. Default: "/uploads".
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Hard upload ceiling in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Accepted content types. Default: png, jpeg, jpg, webp.
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    /// Bound on each filesystem operation, in milliseconds. Default: 5000.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_public_prefix() -> String {
    "/uploads".into()
}
fn default_max_upload_size() -> u64 {
    DEFAULT_MAX_UPLOAD_SIZE
}
fn default_allowed_content_types() -> Vec<String> {
    DEFAULT_ALLOWED_CONTENT_TYPES
        .iter()
        .map(|ct| ct.to_string())
        .collect()
}
fn default_io_timeout_ms() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            public_prefix: default_public_prefix(),
            max_upload_size: default_max_upload_size(),
            allowed_content_types: default_allowed_content_types(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl StorageConfig {
    pub fn policy(&self) -> UploadPolicy {
        UploadPolicy::new(&self.allowed_content_types, self.max_upload_size)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// URL path at which the active bucket is served, always rooted at `/`.
    pub fn products_path(&self) -> String {
        let prefix = self.public_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("/{}", Bucket::Products.dir_name())
        } else {
            format!("/{prefix}/{}", Bucket::Products.dir_name())
        }
    }

    /// Public URL of an active blob.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{filename}", self.products_path())
    }
}
