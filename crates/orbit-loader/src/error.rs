use orbit_core::{NodeKey, StoreError};
use thiserror::Error;

/// Why a load or expansion produced no result.
///
/// `Clone` so that one failed shared expansion can be reported to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Store fetch failed: {0}")]
    StoreFetchFailed(#[from] StoreError),

    #[error("No store has been configured")]
    NotConfigured,

    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Load was cancelled")]
    Cancelled,

    #[error("Load worker failed: {0}")]
    Worker(String),
}

impl LoadError {
    /// Cancelled loads are dropped silently rather than reported.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
