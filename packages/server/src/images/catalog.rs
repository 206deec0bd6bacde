use chrono::{DateTime, Utc};
use common::storage::ContentHash;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};
use uuid::Uuid;

use crate::entity::image;

/// Result of inserting a new image row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was created.
    Inserted(image::Model),
    /// A row with the same hash already existed; it is returned unchanged.
    Existing(image::Model),
}

/// Persistent index of stored images.
pub struct ImageCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ImageCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<image::Model>, DbErr> {
        image::Entity::find_by_id(id).one(self.conn).await
    }

    pub async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<image::Model>, DbErr> {
        image::Entity::find()
            .filter(image::Column::Hash.eq(hash.to_hex()))
            .one(self.conn)
            .await
    }

    pub async fn find_by_filename(&self, filename: &str) -> Result<Option<image::Model>, DbErr> {
        image::Entity::find()
            .filter(image::Column::Filename.eq(filename))
            .one(self.conn)
            .await
    }

    /// Insert a new image row.
    ///
    /// Losing a race on the unique hash constraint is not an error: the
    /// winner's row is looked up and returned as [`InsertOutcome::Existing`].
    pub async fn insert(
        &self,
        model: image::ActiveModel,
        hash: &ContentHash,
    ) -> Result<InsertOutcome, DbErr> {
        match model.insert(self.conn).await {
            Ok(inserted) => Ok(InsertOutcome::Inserted(inserted)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                self.find_by_hash(hash)
                    .await?
                    .map(InsertOutcome::Existing)
                    .ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// List images, newest first.
    pub async fn list(&self, orphaned_only: bool) -> Result<Vec<image::Model>, DbErr> {
        let mut query = image::Entity::find();
        if orphaned_only {
            query = query.filter(image::Column::RefCount.lte(0));
        }
        query
            .order_by_desc(image::Column::CreatedAt)
            .all(self.conn)
            .await
    }

    /// Images with no references, optionally restricted to those created
    /// before `created_before`.
    pub async fn orphans(
        &self,
        created_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<image::Model>, DbErr> {
        let mut query = image::Entity::find().filter(image::Column::RefCount.lte(0));
        if let Some(cutoff) = created_before {
            query = query.filter(image::Column::CreatedAt.lt(cutoff));
        }
        query
            .order_by_asc(image::Column::CreatedAt)
            .all(self.conn)
            .await
    }

    /// Atomically add one reference. Returns `false` if the image does not exist.
    pub async fn increment(&self, id: Uuid, owner: Option<i64>) -> Result<bool, DbErr> {
        let mut update = image::Entity::update_many().col_expr(
            image::Column::RefCount,
            Expr::col(image::Column::RefCount).add(1),
        );
        if let Some(owner) = owner {
            update = update.col_expr(image::Column::ProductId, Expr::value(owner));
        }

        let result = update
            .filter(image::Column::Id.eq(id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Atomically remove one reference. Returns `false` if the image does not
    /// exist or its count is already zero.
    pub async fn decrement(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = image::Entity::update_many()
            .col_expr(
                image::Column::RefCount,
                Expr::col(image::Column::RefCount).sub(1),
            )
            .filter(image::Column::Id.eq(id))
            .filter(image::Column::RefCount.gt(0))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Delete the row only while it is still unreferenced.
    pub async fn delete_unreferenced(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = image::Entity::delete_many()
            .filter(image::Column::Id.eq(id))
            .filter(image::Column::RefCount.lte(0))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
