use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use common::storage::AdmissionError;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::images::UploadRequest;
use crate::models::image::{ImageListResponse, ImageResponse, ListImagesParams, UploadResponse};
use crate::state::AppState;

/// Multipart overhead allowed on top of the configured file ceiling.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/images/upload",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores an image addressed by its SHA-256 content hash. The `file` multipart field is \
        required; an optional `uploaded_by` text field records the uploader. Uploading content that is \
        already stored returns the existing URL without writing anything.",
    request_body(content_type = "multipart/form-data", description = "Image file with optional uploader"),
    responses(
        (status = 200, description = "Image stored or deduplicated", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut request: Option<UploadRequest> = None;
    let mut uploaded_by: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let content_type = state
                    .images
                    .policy()
                    .check_content_type(field.content_type())?;
                let original_filename = field.file_name().map(|s| s.to_string());
                let bytes = read_file_field(field, state.images.policy().max_size()).await?;
                request = Some(UploadRequest {
                    bytes,
                    content_type: Some(content_type),
                    original_filename,
                    declared_size: None,
                    uploaded_by: None,
                });
            }
            Some("uploaded_by") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid uploaded_by field: {e}")))?;
                let text = text.trim();
                if !text.is_empty() {
                    uploaded_by = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let mut request =
        request.ok_or_else(|| AppError::Validation("File field 'file' is required".into()))?;
    request.uploaded_by = uploaded_by;

    let stored = state.images.upload(request).await?;
    Ok(Json(stored.into()))
}

/// Buffer a multipart file field. Once the field exceeds `max_size` the rest
/// is drained without buffering and the upload is refused.
async fn read_file_field(mut field: Field<'_>, max_size: u64) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    let mut total: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        total += chunk.len() as u64;
        if total <= max_size {
            bytes.extend_from_slice(&chunk);
        }
    }

    if total > max_size {
        return Err(AdmissionError::TooLarge {
            actual: total,
            limit: max_size,
        }
        .into());
    }

    Ok(bytes)
}

#[utoipa::path(
    get,
    path = "/images",
    tag = "Images",
    operation_id = "listImages",
    summary = "List images",
    description = "Returns stored images, newest first. Pass `orphaned=true` to list only images \
        without references.",
    params(ListImagesParams),
    responses(
        (status = 200, description = "List of images", body = ImageListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<ListImagesParams>,
) -> Result<Json<ImageListResponse>, AppError> {
    let images: Vec<ImageResponse> = state
        .images
        .list(params.orphaned.unwrap_or(false))
        .await?
        .into_iter()
        .map(ImageResponse::from)
        .collect();

    Ok(Json(ImageListResponse {
        total: images.len() as u64,
        images,
    }))
}

#[utoipa::path(
    get,
    path = "/images/{filename}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Get image metadata",
    params(("filename" = String, Path, description = "Storage name of the image")),
    responses(
        (status = 200, description = "Image metadata", body = ImageResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state.images.get_by_filename(&filename).await?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    delete,
    path = "/images/{filename}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an unreferenced image",
    description = "Removes the image file and its catalog entry. Images that are still referenced \
        cannot be deleted.",
    params(("filename" = String, Path, description = "Storage name of the image")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 400, description = "Image still in use (IN_USE)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<StatusCode, AppError> {
    state.images.delete_by_filename(&filename).await?;
    Ok(StatusCode::NO_CONTENT)
}
