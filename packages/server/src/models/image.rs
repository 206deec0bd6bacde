use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::image;
use crate::images::StoredImage;

/// Response DTO for a completed upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Image ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Public URL of the stored image.
    #[schema(example = "/uploads/products/3f1c9a2e-5b7d-4c1a-9e8f-2d6b4a0c1e3f-banner.png")]
    pub url: String,
    /// Storage name in the products bucket.
    #[schema(example = "3f1c9a2e-5b7d-4c1a-9e8f-2d6b4a0c1e3f-banner.png")]
    pub filename: String,
    /// SHA-256 content hash.
    #[schema(example = "a1b2c3d4e5f6...")]
    pub hash: String,
    /// Whether identical content was already stored.
    pub deduplicated: bool,
}

impl From<StoredImage> for UploadResponse {
    fn from(stored: StoredImage) -> Self {
        Self {
            id: stored.id.to_string(),
            url: stored.url,
            filename: stored.filename,
            hash: stored.hash,
            deduplicated: stored.deduplicated,
        }
    }
}

/// Response DTO for a single image.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    pub filename: String,
    pub url: String,
    pub hash: String,
    pub uploaded_by: Option<String>,
    /// Last owner that attached this image.
    pub product_id: Option<i64>,
    #[schema(example = "image/png")]
    pub content_type: Option<String>,
    /// Blob size in bytes.
    pub size: i64,
    /// Number of owners currently referencing the image.
    pub ref_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<image::Model> for ImageResponse {
    fn from(model: image::Model) -> Self {
        Self {
            id: model.id.to_string(),
            filename: model.filename,
            url: model.url,
            hash: model.hash,
            uploaded_by: model.uploaded_by,
            product_id: model.product_id,
            content_type: model.content_type,
            size: model.size,
            ref_count: model.ref_count,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageListResponse {
    pub images: Vec<ImageResponse>,
    pub total: u64,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListImagesParams {
    /// Only return images with no references.
    #[param(example = false)]
    pub orphaned: Option<bool>,
}

/// Request body for attaching a reference.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct AttachRequest {
    /// Owning record, kept as a weak back-reference.
    #[schema(example = 42)]
    pub product_id: Option<i64>,
}
