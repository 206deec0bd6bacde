use std::sync::Arc;

use common::storage::{BlobStore, FilesystemBlobStore};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::images::ImageService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub blob_store: Arc<dyn BlobStore>,
    pub images: ImageService,
}

impl AppState {
    /// State backed by a filesystem blob store rooted at `config.storage.root`.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let store = FilesystemBlobStore::new(config.storage.root.clone(), config.storage.io_timeout());
        Self::with_blob_store(db, config, Arc::new(store))
    }

    pub fn with_blob_store(
        db: DatabaseConnection,
        config: AppConfig,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        let images = ImageService::new(db.clone(), blob_store.clone(), config.storage.clone());
        Self {
            db,
            config: Arc::new(config),
            blob_store,
            images,
        }
    }
}
