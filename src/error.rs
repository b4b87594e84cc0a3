// Takeout Archive Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unparsable metadata in {path}: {detail}")]
    UnparsableMetadata { path: String, detail: String },

    #[error("No unique sidecar match")]
    NoUniqueMatch,

    #[error("No usable timestamp in {0}")]
    MissingTimestamp(String),

    #[error("ExifTool error: {0}")]
    EmbedFailure(String),

    #[error("ExifTool not available: {0}")]
    ToolUnavailable(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid time zone: {0}")]
    TimeZone(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Copy error: {0}")]
    Copy(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ArchiveError {
    fn from(err: anyhow::Error) -> Self {
        ArchiveError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
