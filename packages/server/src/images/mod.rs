mod catalog;
pub mod collector;
mod error;
mod references;
mod service;

pub use catalog::{ImageCatalog, InsertOutcome};
pub use collector::{CollectReport, collect_orphans, run_orphan_collector};
pub use error::ImageError;
pub use references::ReferenceCounter;
pub use service::{ImageService, StoredImage, UploadRequest};
