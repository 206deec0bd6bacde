use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::image::{AttachRequest, ImageResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/references/{id}",
    tag = "References",
    operation_id = "attachReference",
    summary = "Attach a reference to an image",
    description = "Increments the image's reference count. A `product_id`, when given, is recorded \
        as the last owner to attach the image.",
    params(("id" = Uuid, Path, description = "Image ID")),
    request_body = AttachRequest,
    responses(
        (status = 200, description = "Reference attached", body = ImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn attach_reference(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<AttachRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state
        .images
        .references()
        .attach(id, payload.product_id)
        .await?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    delete,
    path = "/references/{id}",
    tag = "References",
    operation_id = "detachReference",
    summary = "Release a reference to an image",
    description = "Decrements the image's reference count. Releasing a reference the image does \
        not have is refused.",
    params(("id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Reference released", body = ImageResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "No reference to release (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn detach_reference(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state.images.references().detach(id).await?;
    Ok(Json(image.into()))
}
