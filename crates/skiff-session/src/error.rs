//! Archive error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid session snapshot: {0}")]
    InvalidSnapshot(String),
}
