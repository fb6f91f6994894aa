//! In-memory record store.
//!
//! Backs the CLI and the test suites. Content can be built programmatically
//! or read from a JSON fixture:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "a", "kind": "primary", "label": "Alice" }],
//!   "edges": [{ "source": "a", "target": "b", "note": "siblings" }]
//! }
//! ```

use crate::error::{FixtureError, StoreResult};
use crate::node::{NodeKey, NodeKind};
use crate::partition::PartitionFilter;
use crate::record::{EdgeQuery, EdgeRecord, NodeQuery, NodeRecord, NodeSort};
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Serialized store content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// A [`GraphStore`] holding everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<NodeKey, NodeRecord>,
    edges: Vec<EdgeRecord>,
    /// Number of queries served, for callers that want to observe batching.
    queries: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from fixture content.
    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut store = Self::new();
        for node in fixture.nodes {
            store.insert_node(node);
        }
        for edge in fixture.edges {
            store.insert_edge(edge);
        }
        store
    }

    pub fn from_json_str(json: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Inserts or replaces a node record.
    pub fn insert_node(&mut self, record: NodeRecord) {
        self.nodes.insert(record.key(), record);
    }

    pub fn insert_edge(&mut self, record: EdgeRecord) {
        self.edges.push(record);
    }

    /// Builder-style [`Self::insert_node`].
    pub fn with_node(mut self, record: NodeRecord) -> Self {
        self.insert_node(record);
        self
    }

    /// Builder-style [`Self::insert_edge`].
    pub fn with_edge(mut self, record: EdgeRecord) -> Self {
        self.insert_edge(record);
        self
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of queries answered so far.
    pub fn queries_served(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Exports the current content.
    pub fn to_fixture(&self) -> Fixture {
        Fixture {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.clone(),
        }
    }

    fn count_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

fn sort_nodes(records: &mut [NodeRecord], sort: NodeSort) {
    match sort {
        NodeSort::Label => {
            records.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)))
        }
        NodeSort::Id => records.sort_by(|a, b| a.id.cmp(&b.id)),
    }
}

impl GraphStore for MemoryStore {
    fn fetch_primary_nodes(&self, query: &NodeQuery) -> StoreResult<Vec<NodeRecord>> {
        self.count_query();

        let mut records: Vec<NodeRecord> = self
            .nodes
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        sort_nodes(&mut records, query.sort);
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }

        trace!("fetch_primary_nodes -> {} records", records.len());
        Ok(records)
    }

    fn fetch_relational_edges(&self, query: &EdgeQuery) -> StoreResult<Vec<EdgeRecord>> {
        self.count_query();

        let mut records: Vec<EdgeRecord> = self
            .edges
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| a.target.cmp(&b.target))
        });
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }

        trace!("fetch_relational_edges -> {} records", records.len());
        Ok(records)
    }

    fn fetch_owned_children(
        &self,
        owner: &str,
        partition: &PartitionFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NodeRecord>> {
        self.count_query();

        let mut records: Vec<NodeRecord> = self
            .nodes
            .values()
            .filter(|record| match record.kind {
                NodeKind::Secondary => {
                    record.owner.as_deref() == Some(owner) && record.scope.is_visible_in(partition)
                }
                NodeKind::Primary => false,
            })
            .cloned()
            .collect();
        sort_nodes(&mut records, NodeSort::Label);
        if let Some(limit) = limit {
            records.truncate(limit);
        }

        Ok(records)
    }
}
