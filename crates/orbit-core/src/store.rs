//! The record store interface.
//!
//! The store is an external collaborator: persistence, indexing and media
//! pipelines all live behind it. Orbit only reads from it, always from a
//! background worker, so the methods are synchronous.

use crate::error::StoreResult;
use crate::partition::PartitionFilter;
use crate::record::{EdgeQuery, EdgeRecord, NodeQuery, NodeRecord};
use std::sync::Arc;

/// Read-only access to nodes and edges.
///
/// Implementations must apply the query's predicate, then its sort, then its
/// limit. Sorts must be stable for identical content.
pub trait GraphStore: Send + Sync {
    /// Fetches primary node records.
    fn fetch_primary_nodes(&self, query: &NodeQuery) -> StoreResult<Vec<NodeRecord>>;

    /// Fetches relational edge records.
    fn fetch_relational_edges(&self, query: &EdgeQuery) -> StoreResult<Vec<EdgeRecord>>;

    /// Fetches the secondary records owned by the primary node `owner`,
    /// sorted by label.
    fn fetch_owned_children(
        &self,
        owner: &str,
        partition: &PartitionFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NodeRecord>>;
}

impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    fn fetch_primary_nodes(&self, query: &NodeQuery) -> StoreResult<Vec<NodeRecord>> {
        (**self).fetch_primary_nodes(query)
    }

    fn fetch_relational_edges(&self, query: &EdgeQuery) -> StoreResult<Vec<EdgeRecord>> {
        (**self).fetch_relational_edges(query)
    }

    fn fetch_owned_children(
        &self,
        owner: &str,
        partition: &PartitionFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NodeRecord>> {
        (**self).fetch_owned_children(owner, partition, limit)
    }
}
