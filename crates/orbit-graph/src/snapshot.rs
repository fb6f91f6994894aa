//! Owned load results.
//!
//! Loaders run on worker threads and hand back these plain values; nothing in
//! them refers to the store. A snapshot replaces the live graph, a delta is
//! appended to it.

use orbit_core::{DirectedEdgeKey, GraphEdge, GraphNode, NodeKey, NodeMedia};
use std::collections::HashMap;

/// The complete result of a full load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub notes: HashMap<DirectedEdgeKey, String>,
    pub media: HashMap<NodeKey, NodeMedia>,
    /// Neighborhood center, when the load had one. Used to seed positions.
    pub center: Option<NodeKey>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.iter().any(|n| &n.key == key)
    }
}

/// Elements discovered by one expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDelta {
    /// The node the expansion started from.
    pub anchor: NodeKey,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub notes: HashMap<DirectedEdgeKey, String>,
    pub media: HashMap<NodeKey, NodeMedia>,
}

impl GraphDelta {
    pub fn empty(anchor: NodeKey) -> Self {
        Self {
            anchor,
            nodes: Vec::new(),
            edges: Vec::new(),
            notes: HashMap::new(),
            media: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
