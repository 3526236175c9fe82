use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("Renderer could not be launched: {0}")]
    RendererLaunchFailed(String),

    #[error("Renderer exited with {status} for URL: {url}")]
    RenderFailed { url: String, status: String },

    #[error("Render timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("Thumbnail generation failed: {0}")]
    ThumbnailFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Input file error: {0}")]
    InputError(String),

    #[error("Worker task failed: {0}")]
    WorkerPanic(String),
}

impl SnapshotError {
    /// Whether the error is confined to a single URL's job. Job-local errors are
    /// absorbed at the worker boundary and never abort the run.
    pub fn is_job_local(&self) -> bool {
        matches!(
            self,
            SnapshotError::RendererLaunchFailed(_)
                | SnapshotError::RenderFailed { .. }
                | SnapshotError::RenderTimeout(_)
                | SnapshotError::ThumbnailFailed(_)
        )
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::SerializationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SnapshotError {
    fn from(err: tokio::task::JoinError) -> Self {
        SnapshotError::WorkerPanic(err.to_string())
    }
}
