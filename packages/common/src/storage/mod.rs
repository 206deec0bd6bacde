mod admission;
mod error;
mod hash;
mod traits;

pub mod filesystem;
pub mod naming;

pub use admission::{
    AdmissionError, DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_UPLOAD_SIZE, UploadPolicy,
};
pub use error::StorageError;
pub use filesystem::FilesystemBlobStore;
pub use hash::ContentHash;
pub use traits::{BlobStore, Bucket};
