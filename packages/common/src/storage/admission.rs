use std::fmt;

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Image formats accepted by default.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/jpg", "image/webp"];

/// Reasons an upload is refused before any bytes are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The client did not declare a content type.
    MissingContentType,
    /// The declared content type is not on the allow-list.
    UnsupportedContentType(String),
    /// The upload is larger than the configured ceiling.
    TooLarge { actual: u64, limit: u64 },
    /// The upload carries no bytes.
    Empty,
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContentType => write!(f, "Content type is required"),
            Self::UnsupportedContentType(ct) => {
                write!(f, "Content type '{ct}' is not allowed; only images are accepted")
            }
            Self::TooLarge { actual, limit } => {
                write!(f, "File exceeds maximum size of {limit} bytes ({actual} bytes)")
            }
            Self::Empty => write!(f, "File is empty"),
        }
    }
}

impl std::error::Error for AdmissionError {}

/// Content-type allow-list plus hard size ceiling applied to every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_content_types: Vec<String>,
    max_size: u64,
}

impl UploadPolicy {
    pub fn new<I, S>(allowed_content_types: I, max_size: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| essence(ct.as_ref()))
                .collect(),
            max_size,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Check a declared content type, returning its normalized essence
    /// (lowercase, parameters dropped).
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<String, AdmissionError> {
        let declared = content_type
            .map(essence)
            .filter(|ct| !ct.is_empty())
            .ok_or(AdmissionError::MissingContentType)?;

        if self.allowed_content_types.iter().any(|ct| *ct == declared) {
            Ok(declared)
        } else {
            Err(AdmissionError::UnsupportedContentType(declared))
        }
    }

    /// Check a byte length against the ceiling.
    pub fn check_size(&self, size: u64) -> Result<(), AdmissionError> {
        if size > self.max_size {
            return Err(AdmissionError::TooLarge {
                actual: size,
                limit: self.max_size,
            });
        }
        if size == 0 {
            return Err(AdmissionError::Empty);
        }
        Ok(())
    }

    /// Run every admission check; content type first, then size.
    pub fn admit(&self, content_type: Option<&str>, size: u64) -> Result<String, AdmissionError> {
        let content_type = self.check_content_type(content_type)?;
        self.check_size(size)?;
        Ok(content_type)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_UPLOAD_SIZE)
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
