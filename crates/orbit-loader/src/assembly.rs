//! Budget-checked accumulation of a load result.

use orbit_core::{
    Budget, DirectedEdgeKey, EdgeRecord, GraphEdge, GraphNode, NodeKey, NodeMedia, NodeRecord,
};
use orbit_graph::GraphSnapshot;
use std::collections::{HashMap, HashSet};

/// Collects nodes and edges for a snapshot, refusing anything that would
/// break the budget, duplicate an edge, or dangle.
pub(crate) struct SnapshotAssembly {
    budget: Budget,
    nodes: Vec<GraphNode>,
    keys: HashSet<NodeKey>,
    edges: Vec<GraphEdge>,
    edge_set: HashSet<GraphEdge>,
    notes: HashMap<DirectedEdgeKey, String>,
    media: HashMap<NodeKey, NodeMedia>,
}

impl SnapshotAssembly {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            nodes: Vec::new(),
            keys: HashSet::new(),
            edges: Vec::new(),
            edge_set: HashSet::new(),
            notes: HashMap::new(),
            media: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, record: &NodeRecord) -> bool {
        let key = record.key();
        if self.keys.contains(&key) || self.nodes_full() {
            return false;
        }
        if let Some(media) = record.media() {
            self.media.insert(key.clone(), media);
        }
        self.keys.insert(key);
        self.nodes.push(record.to_node());
        true
    }

    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if edge.is_loop()
            || self.links_full()
            || self.edge_set.contains(&edge)
            || !self.keys.contains(edge.a())
            || !self.keys.contains(edge.b())
        {
            return false;
        }
        self.edge_set.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    /// Adds a relational edge and its note, if any.
    pub fn add_relational(&mut self, record: &EdgeRecord) -> bool {
        if !self.add_edge(record.to_edge()) {
            return false;
        }
        if let Some(note) = &record.note {
            self.notes.insert(record.directed_key(), note.clone());
        }
        true
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.keys.contains(key)
    }

    /// Ids of the primary nodes collected so far, in insertion order.
    pub fn primary_ids(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.key.is_primary())
            .map(|n| n.key.id.clone())
            .collect()
    }

    pub fn remaining_nodes(&self) -> usize {
        self.budget.remaining_nodes(self.nodes.len())
    }

    pub fn remaining_links(&self) -> usize {
        self.budget.remaining_links(self.edges.len())
    }

    pub fn nodes_full(&self) -> bool {
        self.remaining_nodes() == 0
    }

    pub fn links_full(&self) -> bool {
        self.remaining_links() == 0
    }

    pub fn finish(self, center: Option<NodeKey>) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes,
            edges: self.edges,
            notes: self.notes,
            media: self.media,
            center,
        }
    }
}
