use sift_store::StorageError;
use thiserror::Error;

/// Errors that can occur in job tracking operations.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Cancel error: {0}")]
    Cancel(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for job tracking operations.
pub type Result<T> = std::result::Result<T, JobError>;

// A serialization failure on read means the persisted record is malformed
// (for example an unknown status tag); everything else is infrastructure.
impl From<StorageError> for JobError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SerializationError(msg) => JobError::Decode(msg),
            other => JobError::Storage(other.to_string()),
        }
    }
}
