use thiserror::Error;

/// Main error type for folio operations
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Build failed: {0}")]
    Build(String),

    #[error("Sync failed: {0}")]
    Sync(String),

    #[error("Rotation failed: {0}")]
    Rotation(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Corrupt index artifact: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for folio operations
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    /// Check if this error indicates a transient failure that could be retried.
    ///
    /// A failed rotation leaves the pending generation staged and the live
    /// generation untouched, so the swap can simply be attempted again.
    pub fn is_retriable(&self) -> bool {
        matches!(self, FolioError::Rotation(_))
    }
}
