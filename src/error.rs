//! Error types for the site behavior layer

use thiserror::Error;

/// Main error type for UI operations.
///
/// None of these ever reach the visitor: the page boundary logs them and the
/// affected feature is simply unavailable.
#[derive(Error, Debug)]
pub enum UiError {
    #[error("Element '{0}' not found in document")]
    MissingElement(String),

    #[error("Section '{0}' is not a known section")]
    UnknownSection(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Menu controls not found after {0} attempts")]
    ControlsNotFound(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for UI operations
pub type UiResult<T> = Result<T, UiError>;
