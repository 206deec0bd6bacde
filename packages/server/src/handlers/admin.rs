use std::time::Duration;

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::images::{CollectReport, collect_orphans};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/admin/gc",
    tag = "Admin",
    operation_id = "collectOrphans",
    summary = "Run one orphan collection cycle",
    description = "Moves the files of unreferenced images into the garbage bucket. Catalog entries \
        are kept. Honors the configured minimum age.",
    responses(
        (status = 200, description = "Collection report", body = CollectReport),
        (status = 500, description = "Collection failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn run_gc(State(state): State<AppState>) -> Result<Json<CollectReport>, AppError> {
    let min_age = Duration::from_secs(state.config.gc.min_age_secs);
    let report = collect_orphans(&state.db, state.blob_store.as_ref(), min_age)
        .await
        .map_err(|e| AppError::Internal(format!("Orphan collection failed: {e}")))?;

    info!(
        scanned = report.scanned,
        moved = report.moved,
        missing = report.missing,
        failed = report.failed,
        "On-demand orphan collection finished"
    );

    Ok(Json(report))
}
