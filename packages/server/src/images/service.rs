use std::sync::Arc;

use chrono::Utc;
use common::StorageConfig;
use common::storage::naming::generate_storage_name;
use common::storage::{BlobStore, Bucket, ContentHash, UploadPolicy};
use sea_orm::{DatabaseConnection, Set, TransactionSession, TransactionTrait};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::catalog::{ImageCatalog, InsertOutcome};
use super::error::ImageError;
use super::references::ReferenceCounter;
use crate::entity::image;

/// An upload as received from the client.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub original_filename: Option<String>,
    /// Size announced by the client, if any. Checked alongside the actual length.
    pub declared_size: Option<u64>,
    pub uploaded_by: Option<String>,
}

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: Uuid,
    pub url: String,
    pub filename: String,
    pub hash: String,
    /// `true` when identical content was already stored and reused.
    pub deduplicated: bool,
}

impl StoredImage {
    fn from_model(model: image::Model, deduplicated: bool) -> Self {
        Self {
            id: model.id,
            url: model.url,
            filename: model.filename,
            hash: model.hash,
            deduplicated,
        }
    }
}

/// Content-addressed upload, lookup and deletion of images.
#[derive(Clone)]
pub struct ImageService {
    db: DatabaseConnection,
    store: Arc<dyn BlobStore>,
    policy: UploadPolicy,
    storage: StorageConfig,
}

impl ImageService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn BlobStore>, storage: StorageConfig) -> Self {
        Self {
            db,
            store,
            policy: storage.policy(),
            storage,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn references(&self) -> ReferenceCounter<'_, DatabaseConnection> {
        ReferenceCounter::new(&self.db)
    }

    /// Store an image, reusing the existing blob when identical content is
    /// already known.
    #[instrument(skip(self, req), fields(size = req.bytes.len(), hash))]
    pub async fn upload(&self, req: UploadRequest) -> Result<StoredImage, ImageError> {
        let actual = req.bytes.len() as u64;
        let size = req.declared_size.map_or(actual, |declared| declared.max(actual));
        let content_type = self.policy.admit(req.content_type.as_deref(), size)?;

        let hash = ContentHash::compute(&req.bytes);
        tracing::Span::current().record("hash", tracing::field::display(&hash));

        let catalog = ImageCatalog::new(&self.db);
        if let Some(existing) = catalog.find_by_hash(&hash).await? {
            if let Ok(false) = self.store.exists(Bucket::Products, &existing.filename).await {
                warn!(
                    filename = %existing.filename,
                    "Reusing image whose active file is gone; its URL will not resolve"
                );
            }
            info!(filename = %existing.filename, "Reusing stored image");
            return Ok(StoredImage::from_model(existing, true));
        }

        let filename = generate_storage_name(req.original_filename.as_deref());
        self.store
            .write(Bucket::Products, &filename, &req.bytes, false)
            .await?;

        let model = image::ActiveModel {
            id: Set(Uuid::now_v7()),
            filename: Set(filename.clone()),
            url: Set(self.storage.url_for(&filename)),
            hash: Set(hash.to_hex()),
            uploaded_by: Set(req.uploaded_by),
            product_id: Set(None),
            content_type: Set(Some(content_type)),
            size: Set(actual as i64),
            created_at: Set(Utc::now()),
            ref_count: Set(0),
        };

        match catalog.insert(model, &hash).await {
            Ok(InsertOutcome::Inserted(inserted)) => {
                info!(filename = %inserted.filename, "Stored new image");
                Ok(StoredImage::from_model(inserted, false))
            }
            Ok(InsertOutcome::Existing(winner)) => {
                self.discard(&filename).await;
                info!(filename = %winner.filename, "Lost insert race, reusing stored image");
                Ok(StoredImage::from_model(winner, true))
            }
            Err(e) => {
                self.discard(&filename).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_by_filename(&self, filename: &str) -> Result<image::Model, ImageError> {
        ImageCatalog::new(&self.db)
            .find_by_filename(filename)
            .await?
            .ok_or_else(|| ImageError::NotFound(filename.to_string()))
    }

    pub async fn list(&self, orphaned_only: bool) -> Result<Vec<image::Model>, ImageError> {
        Ok(ImageCatalog::new(&self.db).list(orphaned_only).await?)
    }

    /// Delete an unreferenced image: its catalog row and its active file.
    #[instrument(skip(self))]
    pub async fn delete_by_filename(&self, filename: &str) -> Result<(), ImageError> {
        let catalog = ImageCatalog::new(&self.db);
        let image = catalog
            .find_by_filename(filename)
            .await?
            .ok_or_else(|| ImageError::NotFound(filename.to_string()))?;

        if image.ref_count > 0 {
            return Err(ImageError::InUse(image.filename));
        }
        // Conditional delete; an attach may have landed since the lookup.
        // Committed only once the file is gone, so a failed removal keeps the row.
        let txn = self.db.begin().await?;
        if !ImageCatalog::new(&txn).delete_unreferenced(image.id).await? {
            return Err(ImageError::InUse(image.filename));
        }

        let removed = self.store.delete(Bucket::Products, &image.filename).await?;
        txn.commit().await?;
        info!(image_id = %image.id, file_removed = removed, "Deleted image");
        Ok(())
    }

    async fn discard(&self, filename: &str) {
        if let Err(e) = self.store.delete(Bucket::Products, filename).await {
            warn!(filename, error = %e, "Failed to remove orphaned upload");
        }
    }
}
