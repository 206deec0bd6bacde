use sea_orm::{ConnectionTrait, TransactionSession, TransactionTrait};
use tracing::debug;
use uuid::Uuid;

use super::catalog::ImageCatalog;
use super::error::ImageError;
use crate::entity::image;

/// Tracks how many owners point at each image.
///
/// Every change is a single conditional `UPDATE`, so concurrent attach and
/// detach calls never lose updates and the count never drops below zero.
pub struct ReferenceCounter<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ReferenceCounter<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Record one more reference to `id`, optionally noting its owner.
    pub async fn attach(&self, id: Uuid, owner: Option<i64>) -> Result<image::Model, ImageError> {
        let catalog = ImageCatalog::new(self.conn);
        if !catalog.increment(id, owner).await? {
            return Err(ImageError::NotFound(id.to_string()));
        }
        debug!(image_id = %id, ?owner, "Attached image reference");
        self.reload(id).await
    }

    /// Release one reference to `id`.
    pub async fn detach(&self, id: Uuid) -> Result<image::Model, ImageError> {
        let catalog = ImageCatalog::new(self.conn);
        if !catalog.decrement(id).await? {
            return match catalog.find_by_id(id).await? {
                Some(_) => Err(ImageError::ReferenceUnderflow(id)),
                None => Err(ImageError::NotFound(id.to_string())),
            };
        }
        debug!(image_id = %id, "Detached image reference");
        self.reload(id).await
    }

    async fn reload(&self, id: Uuid) -> Result<image::Model, ImageError> {
        ImageCatalog::new(self.conn)
            .find_by_id(id)
            .await?
            .ok_or_else(|| ImageError::NotFound(id.to_string()))
    }
}

impl<'a, C: ConnectionTrait + TransactionTrait> ReferenceCounter<'a, C> {
    /// Move one reference from `old` to `new` for `owner`.
    ///
    /// The new image is attached before the old one is released, inside one
    /// transaction, so the replacement is never observed as unreferenced.
    pub async fn reassign(
        &self,
        old: Uuid,
        new: Uuid,
        owner: Option<i64>,
    ) -> Result<image::Model, ImageError> {
        if old == new {
            return self.reload(new).await;
        }

        let txn = self.conn.begin().await?;
        let counter = ReferenceCounter::new(&txn);
        let attached = counter.attach(new, owner).await?;
        counter.detach(old).await?;
        txn.commit().await?;

        Ok(attached)
    }
}
