use thiserror::Error;

/// Unified error types for the board client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cookie file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cookie file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
