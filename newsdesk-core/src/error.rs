//! Error types for newsdesk.

use thiserror::Error;

/// Errors that can occur in newsdesk operations.
#[derive(Error, Debug)]
pub enum NewsdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Grid supports at most {max} columns, got {count} date buckets")]
    GridOverflow { count: usize, max: usize },

    #[error("Unknown time zone '{0}'")]
    UnknownTimeZone(String),

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Search index error: {0}")]
    Index(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for newsdesk operations.
pub type NewsdeskResult<T> = Result<T, NewsdeskError>;
