use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per distinct stored blob.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Name of the blob in the products bucket.
    #[sea_orm(unique)]
    pub filename: String,

    pub url: String,

    /// Lowercase hex SHA-256 of the blob, the deduplication key.
    #[sea_orm(unique)]
    pub hash: String,

    pub uploaded_by: Option<String>,

    /// Last owner that attached this image. Bookkeeping only; `ref_count`
    /// is authoritative.
    #[sea_orm(indexed)]
    pub product_id: Option<i64>,

    pub content_type: Option<String>,

    pub size: i64,

    pub created_at: DateTimeUtc,

    #[sea_orm(default_value = 0, indexed)]
    pub ref_count: i32,
}

impl ActiveModelBehavior for ActiveModel {}
