//! Clearing error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClearError {
    #[error("Storage error: {0}")]
    Storage(#[from] skiff_storage::StorageError),

    #[error("Website data store error: {0}")]
    WebsiteData(String),

    #[error("Clear task failed: {0}")]
    Task(String),
}
