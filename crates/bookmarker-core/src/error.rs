use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid bookmark id: {0}")]
    InvalidBookmarkId(String),
    #[error("invalid key widths: {0}")]
    InvalidKeyWidths(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors surfaced by the get-or-create path.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The submitted value is not a well-formed absolute URL.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Every candidate key is held by a different URL.
    #[error("no free key left for url: {0}")]
    ResourceExhausted(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised while fetching page metadata.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("unsupported content type '{0}'")]
    UnsupportedContent(String),
    #[error("page carries no metadata: {0}")]
    MissingMetadata(String),
}

/// Errors raised when a change event does not carry a usable row image.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    #[error("event carries no new image")]
    MissingImage,
    #[error("missing attribute '{0}'")]
    MissingAttribute(&'static str),
    #[error("invalid attribute '{name}': {reason}")]
    InvalidAttribute { name: &'static str, reason: String },
}
