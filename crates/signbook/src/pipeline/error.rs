use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source lookup failed: {0}")]
    Source(#[from] crate::error::WorkerError),

    #[error("Page-break resolution failed: {0}")]
    Marker(#[from] crate::processor::MarkerError),

    #[error("Document processing failed: {0}")]
    Processing(#[from] crate::error::ProcessError),

    #[error("Failed to read '{path}' while splitting: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Archival failed: {0}")]
    Archive(crate::error::StorageError),

    #[error("Page persistence failed: {0}")]
    Database(#[from] crate::db::DatabaseError),
}
