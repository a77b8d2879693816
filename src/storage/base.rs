use super::types::ResultSet;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationError(String),
    #[error("Serialization failed: {0}")]
    SerializationError(String),
    #[error("Unexpected sink layout: {0}")]
    SchemaError(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<csv::Error> for StorageError {
    fn from(error: csv::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

/// Where merged notice rows live between runs. A sink has a single writer.
#[async_trait]
pub trait ResultSink: Send + Sync {
    fn describe(&self) -> String;

    /// `Ok(None)` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<ResultSet>, StorageError>;

    /// Replaces the stored set as a whole.
    async fn store(&self, rows: &ResultSet) -> Result<(), StorageError>;
}
