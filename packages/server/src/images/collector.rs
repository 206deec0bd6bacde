use std::time::Duration;

use chrono::{TimeDelta, Utc};
use common::storage::{BlobStore, StorageError};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::catalog::ImageCatalog;
use crate::config::GcConfig;

/// Outcome of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CollectReport {
    /// Unreferenced rows examined.
    pub scanned: u64,
    /// Files moved to the garbage bucket.
    pub moved: u64,
    /// Rows whose active file was already gone.
    pub missing: u64,
    /// Files that could not be moved this cycle.
    pub failed: u64,
}

/// Run the orphan collector as a background task.
pub async fn run_orphan_collector(
    db: DatabaseConnection,
    store: std::sync::Arc<dyn BlobStore>,
    config: GcConfig,
) {
    let scan_interval = Duration::from_secs(config.interval_secs.max(1));
    let min_age = Duration::from_secs(config.min_age_secs);

    info!(
        interval_secs = config.interval_secs,
        min_age_secs = config.min_age_secs,
        "Starting orphan collector"
    );

    let mut interval = tokio::time::interval(scan_interval);
    // The first tick completes immediately; skip it so a restart does not sweep.
    interval.tick().await;

    loop {
        interval.tick().await;

        match collect_orphans(&db, store.as_ref(), min_age).await {
            Ok(report) => info!(
                scanned = report.scanned,
                moved = report.moved,
                missing = report.missing,
                failed = report.failed,
                "Orphan collection finished"
            ),
            Err(e) => error!(error = %e, "Orphan collection failed"),
        }
    }
}

/// Move the active file of every unreferenced image into the garbage bucket.
///
/// Catalog rows are never modified. Images younger than `min_age` are skipped.
pub async fn collect_orphans(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    min_age: Duration,
) -> anyhow::Result<CollectReport> {
    let now = Utc::now();
    let cutoff = if min_age.is_zero() {
        None
    } else {
        Some(now - TimeDelta::from_std(min_age)?)
    };

    let orphans = ImageCatalog::new(db).orphans(cutoff).await?;
    let mut report = CollectReport {
        scanned: orphans.len() as u64,
        ..CollectReport::default()
    };

    for image in orphans {
        match store.quarantine(&image.filename, now).await {
            Ok(moved_to) => {
                report.moved += 1;
                info!(
                    image_id = %image.id,
                    filename = %image.filename,
                    moved_to = %moved_to,
                    "Quarantined orphaned image"
                );
            }
            Err(StorageError::NotFound(_)) => report.missing += 1,
            Err(e) => {
                report.failed += 1;
                warn!(
                    image_id = %image.id,
                    filename = %image.filename,
                    error = %e,
                    "Failed to quarantine image"
                );
            }
        }
    }

    Ok(report)
}
