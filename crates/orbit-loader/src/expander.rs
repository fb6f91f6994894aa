//! One-step expansion around an existing node.
//!
//! The expander gets an owned copy of what the live graph already holds and
//! returns only what is new. It is monotonic: nothing already present is
//! returned again, so expanding the same anchor twice yields an empty delta
//! the second time.

use crate::config::LoaderOptions;
use crate::error::{LoadError, Result};
use orbit_core::{
    Budget, EdgeKind, EdgePredicate, EdgeQuery, EdgeRecord, GraphEdge, GraphStore,
    NodeKey, NodeKind, NodeQuery, NodeRecord, NodeSort, PartitionFilter,
};
use orbit_graph::GraphDelta;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandMode {
    /// Relational neighbors, plus owned children when enabled.
    Full,
    /// Owned children only.
    ContainmentOnly,
}

/// An expansion request with a snapshot of the graph it applies to.
#[derive(Debug, Clone)]
pub struct ExpandRequest {
    pub anchor: NodeKey,
    pub mode: ExpandMode,
    pub existing_nodes: HashSet<NodeKey>,
    pub existing_edges: HashSet<GraphEdge>,
    pub partition: PartitionFilter,
    pub budget: Budget,
    /// Generation of the graph the existing sets were taken from.
    pub graph: u64,
}

impl ExpandRequest {
    pub fn new(anchor: NodeKey, mode: ExpandMode) -> Self {
        Self {
            anchor,
            mode,
            existing_nodes: HashSet::new(),
            existing_edges: HashSet::new(),
            partition: PartitionFilter::Any,
            budget: Budget::default(),
            graph: 0,
        }
    }

    pub fn with_existing(
        mut self,
        nodes: HashSet<NodeKey>,
        edges: HashSet<GraphEdge>,
    ) -> Self {
        self.existing_nodes = nodes;
        self.existing_edges = edges;
        self
    }

    pub fn with_partition(mut self, partition: PartitionFilter) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_graph(mut self, graph: u64) -> Self {
        self.graph = graph;
        self
    }
}

/// The delta under construction, checked against the existing graph.
struct DeltaAssembly<'a> {
    request: &'a ExpandRequest,
    delta: GraphDelta,
    new_keys: HashSet<NodeKey>,
    new_edges: HashSet<GraphEdge>,
}

impl<'a> DeltaAssembly<'a> {
    fn new(request: &'a ExpandRequest) -> Self {
        Self {
            request,
            delta: GraphDelta::empty(request.anchor.clone()),
            new_keys: HashSet::new(),
            new_edges: HashSet::new(),
        }
    }

    fn known(&self, key: &NodeKey) -> bool {
        key == &self.request.anchor
            || self.request.existing_nodes.contains(key)
            || self.new_keys.contains(key)
    }

    fn node_room(&self) -> bool {
        self.request.existing_nodes.len() + self.new_keys.len() < self.request.budget.max_nodes
    }

    fn link_room(&self) -> bool {
        self.request.existing_edges.len() + self.new_edges.len() < self.request.budget.max_links
    }

    fn add_node(&mut self, record: &NodeRecord) -> bool {
        let key = record.key();
        if self.known(&key) || !self.node_room() {
            return false;
        }
        if let Some(media) = record.media() {
            self.delta.media.insert(key.clone(), media);
        }
        self.new_keys.insert(key);
        self.delta.nodes.push(record.to_node());
        true
    }

    fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if edge.is_loop()
            || !self.link_room()
            || self.request.existing_edges.contains(&edge)
            || self.new_edges.contains(&edge)
            || !self.known(edge.a())
            || !self.known(edge.b())
        {
            return false;
        }
        self.new_edges.insert(edge.clone());
        self.delta.edges.push(edge);
        true
    }
}

fn check(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(LoadError::Cancelled)
    } else {
        Ok(())
    }
}

/// Expands `request.anchor` by one step.
pub fn expand(
    store: &dyn GraphStore,
    request: &ExpandRequest,
    options: &LoaderOptions,
    cancel: &CancellationToken,
) -> Result<GraphDelta> {
    check(cancel)?;
    let anchor = &request.anchor;
    if anchor.kind == NodeKind::Secondary {
        debug!("{} is secondary, nothing to expand", anchor);
        return Ok(GraphDelta::empty(anchor.clone()));
    }

    let mut assembly = DeltaAssembly::new(request);

    if request.mode == ExpandMode::Full {
        expand_relational(store, &mut assembly, options, cancel)?;
    }

    let with_children = match request.mode {
        ExpandMode::Full => options.expand_containment,
        ExpandMode::ContainmentOnly => true,
    };
    if with_children {
        check(cancel)?;
        match store.fetch_owned_children(&anchor.id, &request.partition, None) {
            Ok(children) => {
                for child in &children {
                    if !assembly.link_room() {
                        break;
                    }
                    let edge = GraphEdge::new(anchor.clone(), child.key(), EdgeKind::Containment);
                    if assembly.known(&child.key()) || assembly.add_node(child) {
                        assembly.add_edge(edge);
                    }
                }
            }
            Err(e) if request.mode == ExpandMode::ContainmentOnly => return Err(e.into()),
            Err(e) => warn!("Children of {} could not be fetched: {}", anchor, e),
        }
    }

    check(cancel)?;
    let delta = assembly.delta;
    debug!(
        "Expanded {}: {} new nodes, {} new edges",
        anchor,
        delta.nodes.len(),
        delta.edges.len()
    );
    Ok(delta)
}

fn expand_relational(
    store: &dyn GraphStore,
    assembly: &mut DeltaAssembly<'_>,
    options: &LoaderOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let request = assembly.request;
    let anchor_id = request.anchor.id.as_str();

    // A failed side is skipped; only when both fail is there nothing to show.
    let mut records: Vec<EdgeRecord> = Vec::new();
    let mut failures = Vec::new();
    for predicate in [
        EdgePredicate::Outgoing(anchor_id.to_string()),
        EdgePredicate::Incoming(anchor_id.to_string()),
    ] {
        let query = EdgeQuery::new(predicate, request.partition.clone())
            .with_limit(options.per_side_edge_cap);
        match store.fetch_relational_edges(&query) {
            Ok(found) => records.extend(found),
            Err(e) => {
                warn!("Edge query around {} failed: {}", request.anchor, e);
                failures.push(e);
            }
        }
    }
    if failures.len() == 2 {
        return Err(failures.swap_remove(0).into());
    }
    records.retain(|r| r.source != r.target);

    // Neighbor ids not yet in the graph, in the order the edges came back.
    let mut candidates: Vec<String> = Vec::new();
    let mut candidate_set: HashSet<&str> = HashSet::new();
    for record in &records {
        if let Some(other) = record.other(anchor_id) {
            if !request.existing_nodes.contains(&NodeKey::primary(other))
                && candidate_set.insert(other)
            {
                candidates.push(other.to_string());
            }
        }
    }

    if !candidates.is_empty() {
        check(cancel)?;
        let query = NodeQuery::new(request.partition.clone())
            .with_ids(candidates.iter().cloned())
            .with_sort(NodeSort::Id);
        let found: HashMap<String, NodeRecord> = match store.fetch_primary_nodes(&query) {
            Ok(found) => found.into_iter().map(|r| (r.id.clone(), r)).collect(),
            Err(e) => {
                warn!("Node fetch for expansion failed, using ids as labels: {}", e);
                candidates
                    .iter()
                    .map(|id| (id.clone(), NodeRecord::primary(id.clone(), id.clone())))
                    .collect()
            }
        };
        for id in &candidates {
            if let Some(record) = found.get(id) {
                assembly.add_node(record);
            }
        }
    }

    for record in &records {
        if assembly.add_edge(record.to_edge()) {
            if let Some(note) = &record.note {
                assembly
                    .delta
                    .notes
                    .insert(record.directed_key(), note.clone());
            }
        }
    }
    Ok(())
}
