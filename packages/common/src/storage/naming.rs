//! Storage name generation and validation.
//!
//! Every blob name is a single path component. Generated names combine a
//! random token with a sanitized copy of the client's filename so that the
//! extension stays readable while nothing the client sends can escape the
//! bucket directory.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::StorageError;

/// Substituted when the client sends no usable filename.
pub const DEFAULT_FILENAME: &str = "image.jpg";

/// Upper bound on the sanitized part of a generated name.
const MAX_SANITIZED_LEN: usize = 128;

/// Upper bound on any storage name (common filesystem limit).
const MAX_NAME_LEN: usize = 255;

/// Reduce a client-supplied filename to `[A-Za-z0-9._-]`.
///
/// Directory components are dropped, every other character becomes `_`,
/// the extension is lowercased and a leading dot is neutralized.
pub fn sanitize_filename(original: Option<&str>) -> String {
    let trimmed = original
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FILENAME);

    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();
    let base = if base.is_empty() {
        DEFAULT_FILENAME
    } else {
        base
    };

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if let Some((stem, ext)) = sanitized.rsplit_once('.')
        && !stem.is_empty()
    {
        sanitized = format!("{stem}.{}", ext.to_ascii_lowercase());
    }

    if sanitized.starts_with('.') {
        sanitized.insert(0, '_');
    }

    truncate_keeping_extension(sanitized)
}

fn truncate_keeping_extension(name: String) -> String {
    if name.len() <= MAX_SANITIZED_LEN {
        return name;
    }
    // Sanitized names are pure ASCII, so byte slicing is safe.
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < MAX_SANITIZED_LEN / 2 => {
            let keep = MAX_SANITIZED_LEN - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => name[..MAX_SANITIZED_LEN].to_string(),
    }
}

/// Build a collision-free storage name for an upload.
pub fn generate_storage_name(original: Option<&str>) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(original))
}

/// Name given to a blob when it is moved into quarantine at `at`.
pub fn quarantine_name(name: &str, at: DateTime<Utc>) -> String {
    format!("{}_{name}", at.format("%Y-%m-%dT%H-%M-%S%.3f"))
}

/// Validate that `name` is a single, visible path component.
pub fn validate_storage_name(name: &str) -> Result<&str, StorageError> {
    let reject = |msg: &str| Err(StorageError::InvalidName(format!("{msg}: {name:?}")));

    if name.is_empty() {
        return reject("name cannot be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return reject("name is too long");
    }
    if name.chars().any(|c| c.is_control()) {
        return reject("control characters are not allowed");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("path separators are not allowed");
    }
    if name == ".." {
        return reject("'..' is not allowed");
    }
    if name.starts_with('.') {
        return reject("hidden names are not allowed");
    }

    Ok(name)
}
