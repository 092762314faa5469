//! Navigation error types

use thiserror::Error;

/// Why a navigation failed, as reported by the engine to `did_fail`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Navigation cancelled")]
    Cancelled,

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Network error {code}: {description}")]
    Network { code: i32, description: String },
}
