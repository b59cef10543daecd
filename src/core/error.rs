use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Field '{0}' missing from document")]
    MissingField(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(collection: &str, id: impl ToString) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
