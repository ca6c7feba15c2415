use thiserror::Error;

/// Errors raised by remote sync and backup handling.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    Config(String),

    #[error("Gist not found. Please check the Gist ID.")]
    NotFound,

    #[error("GitHub rejected the token (HTTP {0}).")]
    Auth(u16),

    #[error("Request failed: HTTP {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("Conflict detected. Latest data fetched. Please try saving again.")]
    Conflict,

    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("No data to export")]
    NothingToExport,

    #[error("Invalid backup file: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Request(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Request(err.to_string())
    }
}

/// The specific shape constraint an imported backup violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("file is not valid JSON ({0})")]
    NotJson(String),

    #[error("root value must be a list of months")]
    NotAnArray,

    #[error("backup contains no months")]
    Empty,

    #[error("month #{index} is malformed: {reason}")]
    InvalidMonth { index: usize, reason: String },
}
