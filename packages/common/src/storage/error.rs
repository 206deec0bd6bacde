use std::fmt;
use std::time::Duration;

/// Errors that can occur during blob directory operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested blob was not found.
    NotFound(String),
    /// A blob with this name already exists and overwriting was not requested.
    AlreadyExists(String),
    /// The storage name is unusable as a single path component.
    InvalidName(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The filesystem did not answer within the configured bound.
    Timeout { op: &'static str, after: Duration },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "blob not found: {name}"),
            Self::AlreadyExists(name) => write!(f, "blob already exists: {name}"),
            Self::InvalidName(msg) => write!(f, "invalid storage name: {msg}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Timeout { op, after } => {
                write!(f, "storage {op} timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
