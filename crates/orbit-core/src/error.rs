use thiserror::Error;

/// A failed store query.
///
/// Carries a message rather than the backend's own error type so that it can
/// be cloned and handed to every waiter of a shared load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors while reading a JSON fixture into a [`crate::MemoryStore`].
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid fixture: {0}")]
    Json(#[from] serde_json::Error),
}
