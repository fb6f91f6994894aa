//! Full loads: the global view and the neighborhood of a center node.
//!
//! Both run on a blocking worker and return an owned [`GraphSnapshot`]. The
//! first query of a load is its root: if it fails, the load fails. Later
//! queries that fail are logged and the load carries on with what it has.

use crate::assembly::SnapshotAssembly;
use crate::config::LoaderOptions;
use crate::error::{LoadError, Result};
use orbit_core::{
    Budget, EdgeKind, EdgePredicate, EdgeQuery, EdgeRecord, GraphEdge, GraphStore, NodeKey,
    NodeKind, NodeQuery, NodeRecord, NodeSort, PartitionFilter,
};
use orbit_graph::GraphSnapshot;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Parameters of a neighborhood load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodRequest {
    pub center: NodeKey,
    pub hops: u32,
    pub include_containment: bool,
    pub partition: PartitionFilter,
    pub budget: Budget,
}

impl NeighborhoodRequest {
    pub fn new(center: NodeKey, hops: u32) -> Self {
        Self {
            center,
            hops,
            include_containment: true,
            partition: PartitionFilter::Any,
            budget: Budget::default(),
        }
    }

    pub fn with_containment(mut self, include: bool) -> Self {
        self.include_containment = include;
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
}

fn check(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(LoadError::Cancelled)
    } else {
        Ok(())
    }
}

/// Loads the first `max_nodes` primary nodes by label and the edges among
/// them.
pub fn load_global(
    store: &dyn GraphStore,
    partition: &PartitionFilter,
    budget: &Budget,
    cancel: &CancellationToken,
) -> Result<GraphSnapshot> {
    check(cancel)?;

    let query = NodeQuery::new(partition.clone()).with_limit(budget.max_nodes);
    let records = store.fetch_primary_nodes(&query)?;

    let mut assembly = SnapshotAssembly::new(*budget);
    for record in &records {
        assembly.add_node(record);
    }

    let ids = assembly.primary_ids();
    if !ids.is_empty() && budget.max_links > 0 {
        check(cancel)?;
        let query = EdgeQuery::new(EdgePredicate::within(ids), partition.clone())
            .with_limit(budget.max_links);
        match store.fetch_relational_edges(&query) {
            Ok(edges) => {
                for edge in &edges {
                    assembly.add_relational(edge);
                }
            }
            Err(e) => warn!("Edge query for global view failed: {}", e),
        }
    }

    check(cancel)?;
    let snapshot = assembly.finish(None);
    info!(
        "Loaded global view of {}: {} nodes, {} edges",
        partition,
        snapshot.node_count(),
        snapshot.edge_count()
    );
    Ok(snapshot)
}

/// Loads the nodes within `hops` relational hops of the center, plus owned
/// children and the edges among everything loaded.
pub fn load_neighborhood(
    store: &dyn GraphStore,
    request: &NeighborhoodRequest,
    options: &LoaderOptions,
    cancel: &CancellationToken,
) -> Result<GraphSnapshot> {
    let NeighborhoodRequest {
        center,
        hops,
        include_containment,
        partition,
        budget,
    } = request;

    // Secondary records are only reachable through their owner.
    if center.kind == NodeKind::Secondary {
        return Err(LoadError::NodeNotFound(center.clone()));
    }

    let (visited, links) = traverse(store, request, options, cancel)?;

    // One batch fetch for every visited node.
    check(cancel)?;
    let query = NodeQuery::new(partition.clone())
        .with_ids(visited.iter().cloned())
        .with_sort(NodeSort::Id)
        .with_limit(visited.len());
    let records: HashMap<String, NodeRecord> = match store.fetch_primary_nodes(&query) {
        Ok(records) => records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        Err(e) => {
            warn!("Node fetch for neighborhood failed, using ids as labels: {}", e);
            visited
                .iter()
                .map(|id| (id.clone(), NodeRecord::primary(id.clone(), id.clone())))
                .collect()
        }
    };

    let mut assembly = SnapshotAssembly::new(*budget);
    for id in &visited {
        if let Some(record) = records.get(id) {
            assembly.add_node(record);
        }
    }
    if !assembly.contains(center) {
        return Err(LoadError::NodeNotFound(center.clone()));
    }
    for link in &links {
        assembly.add_relational(link);
    }

    if *include_containment {
        for owner in assembly.primary_ids() {
            check(cancel)?;
            if assembly.nodes_full() || assembly.links_full() {
                break;
            }
            let limit = assembly.remaining_nodes().min(assembly.remaining_links());
            match store.fetch_owned_children(&owner, partition, Some(limit)) {
                Ok(children) => {
                    for child in &children {
                        if assembly.nodes_full() || assembly.links_full() {
                            break;
                        }
                        if assembly.add_node(child) {
                            assembly.add_edge(GraphEdge::new(
                                NodeKey::primary(owner.as_str()),
                                child.key(),
                                EdgeKind::Containment,
                            ));
                        }
                    }
                }
                Err(e) => warn!("Children of {} could not be fetched: {}", owner, e),
            }
        }
    }

    // Edges among loaded nodes that the traversal did not see.
    if !assembly.links_full() {
        check(cancel)?;
        let ids = assembly.primary_ids();
        let query = EdgeQuery::new(EdgePredicate::touching(ids), partition.clone())
            .with_limit(options.oversampled(assembly.remaining_links()));
        match store.fetch_relational_edges(&query) {
            Ok(edges) => {
                for edge in &edges {
                    if assembly.links_full() {
                        break;
                    }
                    assembly.add_relational(edge);
                }
            }
            Err(e) => warn!("Supplemental edge query failed: {}", e),
        }
    }

    check(cancel)?;
    let snapshot = assembly.finish(Some(center.clone()));
    info!(
        "Loaded neighborhood of {} ({} hops): {} nodes, {} edges",
        center,
        hops,
        snapshot.node_count(),
        snapshot.edge_count()
    );
    Ok(snapshot)
}

/// Frontier BFS over relational edges.
///
/// Returns the visited ids in discovery order and the distinct edges seen
/// between them.
fn traverse(
    store: &dyn GraphStore,
    request: &NeighborhoodRequest,
    options: &LoaderOptions,
    cancel: &CancellationToken,
) -> Result<(Vec<String>, Vec<EdgeRecord>)> {
    let budget = &request.budget;
    let mut visited: Vec<String> = vec![request.center.id.clone()];
    let mut seen: HashSet<String> = visited.iter().cloned().collect();
    let mut links: Vec<EdgeRecord> = Vec::new();
    let mut link_set: HashSet<GraphEdge> = HashSet::new();
    let mut frontier: Vec<String> = visited.clone();

    for hop in 0..request.hops {
        check(cancel)?;
        if frontier.is_empty()
            || visited.len() >= budget.max_nodes
            || links.len() >= budget.max_links
        {
            break;
        }

        let query = EdgeQuery::new(
            EdgePredicate::touching(frontier.iter().cloned()),
            request.partition.clone(),
        )
        .with_limit(options.oversampled(budget.remaining_links(links.len())));
        let records = match store.fetch_relational_edges(&query) {
            Ok(records) => records,
            Err(e) => {
                warn!("Hop {} from {} failed, stopping early: {}", hop, request.center, e);
                break;
            }
        };

        let mut next = Vec::new();
        for record in records {
            if record.source == record.target {
                continue;
            }
            for id in [&record.source, &record.target] {
                if !seen.contains(id) && visited.len() < budget.max_nodes {
                    seen.insert(id.clone());
                    visited.push(id.clone());
                    next.push(id.clone());
                }
            }
            let both_seen = seen.contains(&record.source) && seen.contains(&record.target);
            if both_seen && links.len() < budget.max_links && link_set.insert(record.to_edge()) {
                links.push(record);
            }
        }

        debug!(
            "Hop {}: {} frontier nodes, {} new, {} links so far",
            hop,
            frontier.len(),
            next.len(),
            links.len()
        );
        frontier = next;
    }

    Ok((visited, links))
}
