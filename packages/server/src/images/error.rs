use common::storage::{AdmissionError, StorageError};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Rejected(#[from] AdmissionError),

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Cannot delete image that is still in use")]
    InUse(String),

    #[error("Image {0} has no references to release")]
    ReferenceUnderflow(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
