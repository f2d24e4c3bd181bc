use thiserror::Error;

/// Engine-wide error type.
///
/// Repository failures surface as `Fetch`, rejected mutations (rename
/// collision, unknown id) as `Validation`. The storage and settings layers
/// convert their underlying errors before they reach a caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the engine
pub type Result<T> = std::result::Result<T, Error>;
