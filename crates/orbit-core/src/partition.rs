//! Graph partitions.
//!
//! Records in the store may belong to one partition or to none. Records with
//! no partition predate partitioning and stay visible in every partition
//! until the store migrates them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(pub String);

impl PartitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which partition a record belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionScope {
    ScopedTo(PartitionId),
    /// Legacy record, visible in every partition.
    #[default]
    Unscoped,
}

impl PartitionScope {
    /// Returns true if a record with this scope passes `filter`.
    pub fn is_visible_in(&self, filter: &PartitionFilter) -> bool {
        match (self, filter) {
            (PartitionScope::Unscoped, _) => true,
            (PartitionScope::ScopedTo(_), PartitionFilter::Any) => true,
            (PartitionScope::ScopedTo(own), PartitionFilter::Only(wanted)) => own == wanted,
        }
    }
}

/// Partition restriction applied to store queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionFilter {
    #[default]
    Any,
    Only(PartitionId),
}

impl PartitionFilter {
    pub fn only(id: impl Into<String>) -> Self {
        PartitionFilter::Only(PartitionId::new(id))
    }
}

impl fmt::Display for PartitionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionFilter::Any => f.write_str("*"),
            PartitionFilter::Only(id) => write!(f, "{}", id),
        }
    }
}
