//! The live exploration graph.
//!
//! `GraphModel` wraps a petgraph undirected graph with a key index, the
//! canonical edge set, per-edge notes and per-node media, plus everything the
//! interactive side needs to know about each node: its layout, whether it is
//! pinned, dragged or selected. It is owned by the interactive thread and is
//! only ever changed by committing a load result or by a user action.

use crate::layout::Layout;
use crate::seed::{SeedConfig, GOLDEN_ANGLE};
use crate::snapshot::{GraphDelta, GraphSnapshot};
use emath::Pos2;
use orbit_core::{
    Budget, DirectedEdgeKey, EdgeKind, GraphEdge, GraphNode, NodeKey, NodeMedia,
    PartitionFilter,
};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Which edges the renderer draws. Physics always uses all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDisplay {
    #[default]
    All,
    /// Only edges touching the current selection.
    SelectionOnly,
}

/// What a [`GraphModel::merge`] actually admitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub nodes_added: Vec<NodeKey>,
    pub edges_added: usize,
    /// Elements dropped because the budget was already exhausted.
    pub rejected: usize,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty() && self.edges_added == 0
    }
}

/// Read-only view of the graph handed to the physics step alongside the
/// mutable layout.
pub struct SceneView<'a> {
    graph: &'a UnGraph<GraphNode, GraphEdge>,
    pinned: &'a HashSet<NodeKey>,
    dragging: Option<&'a NodeKey>,
}

impl<'a> SceneView<'a> {
    pub fn nodes(&self) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.graph.edge_weights()
    }

    /// Pinned or currently dragged.
    pub fn is_fixed(&self, key: &NodeKey) -> bool {
        self.pinned.contains(key) || self.dragging == Some(key)
    }
}

/// The live graph.
#[derive(Debug, Default)]
pub struct GraphModel {
    graph: UnGraph<GraphNode, GraphEdge>,
    index: HashMap<NodeKey, NodeIndex>,
    edge_set: HashSet<GraphEdge>,
    notes: HashMap<DirectedEdgeKey, String>,
    media: HashMap<NodeKey, NodeMedia>,
    layout: Layout,
    pinned: HashSet<NodeKey>,
    dragging: Option<NodeKey>,
    selection: Option<NodeKey>,
    partition: PartitionFilter,
    seed: SeedConfig,
    /// Bumped whenever the node or edge set changes.
    revision: u64,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: SeedConfig) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    // ── Structure ───────────────────────────────────────────────────────

    /// Replaces the whole graph with a snapshot.
    ///
    /// Nodes present before and after keep their position, pin and
    /// selection state. Everything else is seeded fresh.
    pub fn replace(&mut self, snapshot: GraphSnapshot) {
        let GraphSnapshot {
            nodes,
            edges,
            notes,
            media,
            center,
        } = snapshot;

        self.graph = UnGraph::default();
        self.index.clear();
        self.edge_set.clear();
        for node in nodes {
            self.insert_node(node);
        }
        for edge in edges {
            self.insert_edge(edge);
        }
        self.notes = notes;
        self.notes.retain(|key, _| admits_note(&self.edge_set, key));
        self.media = media;
        self.media.retain(|key, _| self.index.contains_key(key));

        let index = &self.index;
        self.layout.retain(|k| index.contains_key(k));
        self.pinned.retain(|k| index.contains_key(k));
        if self.selection.as_ref().is_some_and(|k| !index.contains_key(k)) {
            self.selection = None;
        }
        if self.dragging.as_ref().is_some_and(|k| !index.contains_key(k)) {
            self.dragging = None;
        }

        self.seed_unplaced(center.as_ref());
        self.revision += 1;

        debug!(
            "Replaced graph: {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        );
    }

    /// Appends an expansion result, re-checking the budget.
    ///
    /// New nodes are placed on a ring around the anchor, or around the
    /// origin when the anchor has no position.
    pub fn merge(&mut self, delta: GraphDelta, budget: &Budget) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for node in delta.nodes {
            if self.index.contains_key(&node.key) {
                continue;
            }
            if self.node_count() >= budget.max_nodes {
                outcome.rejected += 1;
                continue;
            }
            outcome.nodes_added.push(node.key.clone());
            self.insert_node(node);
        }

        for edge in delta.edges {
            if self.edge_set.contains(&edge) {
                continue;
            }
            if self.edge_count() >= budget.max_links {
                outcome.rejected += 1;
                continue;
            }
            if self.insert_edge(edge) {
                outcome.edges_added += 1;
            }
        }

        for (key, note) in delta.notes {
            if admits_note(&self.edge_set, &key) {
                self.notes.entry(key).or_insert(note);
            }
        }
        for (key, media) in delta.media {
            if self.index.contains_key(&key) {
                self.media.insert(key, media);
            }
        }

        if !outcome.nodes_added.is_empty() {
            let anchor = self.layout.position(&delta.anchor).unwrap_or(Pos2::ZERO);
            let rotation = self.degree(&delta.anchor) as f32 * GOLDEN_ANGLE;
            let total = outcome.nodes_added.len();
            for (slot, key) in outcome.nodes_added.iter().enumerate() {
                let position = self.seed.ring(anchor, slot, total, rotation);
                self.layout.place(key, position);
            }
        }

        if !outcome.is_empty() {
            self.revision += 1;
        }
        if outcome.rejected > 0 {
            debug!(
                "Merge from {} rejected {} elements over budget",
                delta.anchor, outcome.rejected
            );
        }
        outcome
    }

    /// Removes everything, including selection and pins.
    pub fn clear(&mut self) {
        self.graph = UnGraph::default();
        self.index.clear();
        self.edge_set.clear();
        self.notes.clear();
        self.media.clear();
        self.layout.clear();
        self.pinned.clear();
        self.dragging = None;
        self.selection = None;
        self.revision += 1;
    }

    /// Switches the active partition. The graph is cleared when it changes.
    ///
    /// Returns true if the partition changed.
    pub fn set_partition(&mut self, partition: PartitionFilter) -> bool {
        if self.partition == partition {
            return false;
        }
        self.partition = partition;
        self.clear();
        true
    }

    pub fn partition(&self) -> &PartitionFilter {
        &self.partition
    }

    /// Updates the label of a node after its record was edited elsewhere.
    pub fn refresh_label(&mut self, key: &NodeKey, label: impl Into<String>) -> bool {
        match self.index.get(key).and_then(|i| self.graph.node_weight_mut(*i)) {
            Some(node) => {
                node.label = label.into();
                true
            }
            None => false,
        }
    }

    fn insert_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.key) {
            return false;
        }
        let key = node.key.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        true
    }

    fn insert_edge(&mut self, edge: GraphEdge) -> bool {
        if edge.is_loop() || self.edge_set.contains(&edge) {
            return false;
        }
        let (Some(&a), Some(&b)) = (self.index.get(edge.a()), self.index.get(edge.b())) else {
            return false;
        };
        self.edge_set.insert(edge.clone());
        self.graph.add_edge(a, b, edge);
        true
    }

    fn seed_unplaced(&mut self, center: Option<&NodeKey>) {
        let center = center.filter(|k| self.index.contains_key(*k));
        let origin = match center {
            Some(key) => match self.layout.position(key).filter(|p| p.is_finite()) {
                Some(p) => p,
                None => {
                    self.layout.place(key, Pos2::ZERO);
                    Pos2::ZERO
                }
            },
            None => Pos2::ZERO,
        };

        let unplaced: Vec<NodeKey> = self
            .graph
            .node_weights()
            .map(|n| &n.key)
            .filter(|k| !self.layout.is_positioned(k))
            .cloned()
            .collect();

        let total = unplaced.len();
        for (slot, key) in unplaced.iter().enumerate() {
            let position = match center {
                Some(_) => self.seed.ring(origin, slot, total, 0.0),
                None => self.seed.spiral(origin, slot),
            };
            self.layout.place(key, position);
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn contains_edge(&self, edge: &GraphEdge) -> bool {
        self.edge_set.contains(edge)
    }

    pub fn node(&self, key: &NodeKey) -> Option<&GraphNode> {
        self.index.get(key).and_then(|i| self.graph.node_weight(*i))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Every edge, as used by physics and the lens.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    /// The subset of edges the renderer should draw.
    pub fn draw_edges(&self, display: EdgeDisplay) -> Vec<&GraphEdge> {
        match display {
            EdgeDisplay::All => self.edges().collect(),
            EdgeDisplay::SelectionOnly => match &self.selection {
                Some(selected) => self.edges().filter(|e| e.touches(selected)).collect(),
                None => Vec::new(),
            },
        }
    }

    /// Keys of the nodes adjacent to `key`.
    pub fn neighbors(&self, key: &NodeKey) -> Vec<&NodeKey> {
        let Some(&idx) = self.index.get(key) else {
            return Vec::new();
        };
        self.graph
            .neighbors(idx)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|n| &n.key)
            .collect()
    }

    pub fn degree(&self, key: &NodeKey) -> usize {
        self.index
            .get(key)
            .map(|idx| self.graph.edges(*idx).count())
            .unwrap_or(0)
    }

    pub fn note(&self, key: &DirectedEdgeKey) -> Option<&str> {
        self.notes.get(key).map(String::as_str)
    }

    pub fn media(&self, key: &NodeKey) -> Option<&NodeMedia> {
        self.media.get(key)
    }

    /// Owned copy of the node keys, for handing to a background expansion.
    pub fn key_set(&self) -> HashSet<NodeKey> {
        self.index.keys().cloned().collect()
    }

    /// Owned copy of the canonical edge set.
    pub fn edge_set(&self) -> HashSet<GraphEdge> {
        self.edge_set.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Layout and interaction ──────────────────────────────────────────

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn position(&self, key: &NodeKey) -> Option<Pos2> {
        self.layout.position(key)
    }

    /// Splits the model into the mutable layout and a read-only scene for
    /// one physics step.
    pub fn physics_view(&mut self) -> (&mut Layout, SceneView<'_>) {
        (
            &mut self.layout,
            SceneView {
                graph: &self.graph,
                pinned: &self.pinned,
                dragging: self.dragging.as_ref(),
            },
        )
    }

    pub fn pin(&mut self, key: &NodeKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.layout.stop(key);
        self.pinned.insert(key.clone())
    }

    pub fn unpin(&mut self, key: &NodeKey) -> bool {
        self.pinned.remove(key)
    }

    pub fn is_pinned(&self, key: &NodeKey) -> bool {
        self.pinned.contains(key)
    }

    pub fn pinned(&self) -> &HashSet<NodeKey> {
        &self.pinned
    }

    pub fn select(&mut self, key: &NodeKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.selection = Some(key.clone());
        true
    }

    pub fn deselect(&mut self) -> Option<NodeKey> {
        self.selection.take()
    }

    pub fn selection(&self) -> Option<&NodeKey> {
        self.selection.as_ref()
    }

    /// Starts dragging a node. Any previous drag ends.
    pub fn begin_drag(&mut self, key: &NodeKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.layout.stop(key);
        self.dragging = Some(key.clone());
        true
    }

    /// Moves the dragged node. Velocity is reset to zero.
    pub fn drag_to(&mut self, position: Pos2) -> bool {
        match &self.dragging {
            Some(key) if position.is_finite() => {
                self.layout.place(key, position);
                true
            }
            _ => false,
        }
    }

    /// Releases the dragged node, optionally pinning it where it was dropped.
    pub fn end_drag(&mut self, pin: bool) -> Option<NodeKey> {
        let key = self.dragging.take()?;
        if pin {
            self.pinned.insert(key.clone());
        }
        Some(key)
    }

    pub fn dragging(&self) -> Option<&NodeKey> {
        self.dragging.as_ref()
    }
}

/// A note is kept only while its relational edge is in the graph.
fn admits_note(edges: &HashSet<GraphEdge>, key: &DirectedEdgeKey) -> bool {
    key.kind == EdgeKind::Relational
        && edges.contains(&GraphEdge::relational(&key.source, &key.target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(NodeKey::primary(id), id.to_uppercase())
    }

    fn snapshot(ids: &[&str], links: &[(&str, &str)]) -> GraphSnapshot {
        GraphSnapshot {
            nodes: ids.iter().map(|id| node(id)).collect(),
            edges: links
                .iter()
                .map(|(a, b)| GraphEdge::relational(a, b))
                .collect(),
            ..GraphSnapshot::default()
        }
    }

    #[test]
    fn test_replace_seeds_every_node() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a", "b", "c"], &[("a", "b")]));

        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edge_count(), 1);
        for n in model.nodes() {
            assert!(model.layout().is_positioned(&n.key));
        }
    }

    #[test]
    fn test_replace_keeps_surviving_positions() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a", "b"], &[("a", "b")]));
        let a = NodeKey::primary("a");
        model.begin_drag(&a);
        model.drag_to(Pos2::new(500.0, 500.0));
        model.end_drag(true);

        model.replace(snapshot(&["a", "c"], &[("a", "c")]));
        assert_eq!(model.position(&a), Some(Pos2::new(500.0, 500.0)));
        assert!(model.is_pinned(&a));
        assert!(model.position(&NodeKey::primary("b")).is_none());
    }

    #[test]
    fn test_replace_drops_stale_selection() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a", "b"], &[]));
        model.select(&NodeKey::primary("b"));
        model.replace(snapshot(&["a"], &[]));
        assert!(model.selection().is_none());
    }

    #[test]
    fn test_replace_ignores_duplicates_and_dangling_edges() {
        let mut model = GraphModel::new();
        let mut snap = snapshot(&["a", "b", "a"], &[("a", "b"), ("b", "a"), ("a", "z")]);
        snap.edges.push(GraphEdge::relational("a", "a"));
        model.replace(snap);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.edge_count(), 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        let delta = GraphDelta {
            nodes: vec![node("b"), node("c")],
            edges: vec![GraphEdge::relational("a", "b"), GraphEdge::relational("c", "a")],
            ..GraphDelta::empty(NodeKey::primary("a"))
        };

        let first = model.merge(delta.clone(), &Budget::default());
        assert_eq!(first.nodes_added.len(), 2);
        assert_eq!(first.edges_added, 2);

        let revision = model.revision();
        let second = model.merge(delta, &Budget::default());
        assert!(second.is_empty());
        assert_eq!(model.revision(), revision);
        assert_eq!(model.node_count(), 3);
    }

    #[test]
    fn test_merge_respects_budget() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        let delta = GraphDelta {
            nodes: vec![node("b"), node("c"), node("d")],
            edges: vec![
                GraphEdge::relational("a", "b"),
                GraphEdge::relational("a", "c"),
                GraphEdge::relational("a", "d"),
            ],
            ..GraphDelta::empty(NodeKey::primary("a"))
        };

        let outcome = model.merge(delta, &Budget::new(2, 1));
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.edge_count(), 1);
        assert_eq!(outcome.rejected, 4);
    }

    #[test]
    fn test_merge_keeps_notes_of_admitted_edges_only() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        let mut delta = GraphDelta {
            nodes: vec![node("b"), node("c")],
            edges: vec![GraphEdge::relational("a", "b"), GraphEdge::relational("a", "c")],
            ..GraphDelta::empty(NodeKey::primary("a"))
        };
        let kept = DirectedEdgeKey::relational("a", "b");
        let over_budget = DirectedEdgeKey::relational("a", "c");
        let dangling = DirectedEdgeKey::relational("a", "zz");
        delta.notes.insert(kept.clone(), "friends".to_string());
        delta.notes.insert(over_budget.clone(), "rivals".to_string());
        delta.notes.insert(dangling.clone(), "strangers".to_string());

        model.merge(delta, &Budget::new(10, 1));
        assert_eq!(model.edge_count(), 1);
        assert_eq!(model.note(&kept), Some("friends"));
        assert_eq!(model.note(&over_budget), None);
        assert_eq!(model.note(&dangling), None);
    }

    #[test]
    fn test_merge_seeds_around_anchor() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        let a = NodeKey::primary("a");
        model.begin_drag(&a);
        model.drag_to(Pos2::new(1000.0, 0.0));
        model.end_drag(false);

        let delta = GraphDelta {
            nodes: vec![node("b")],
            edges: vec![GraphEdge::relational("a", "b")],
            ..GraphDelta::empty(a.clone())
        };
        model.merge(delta, &Budget::default());
        let b = model.position(&NodeKey::primary("b")).unwrap();
        let anchor = Pos2::new(1000.0, 0.0);
        assert!((b.distance(anchor) - SeedConfig::default().ring_radius).abs() < 1e-2);
    }

    #[test]
    fn test_set_partition_clears() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        assert!(!model.set_partition(PartitionFilter::Any));
        assert!(model.set_partition(PartitionFilter::only("work")));
        assert!(model.is_empty());
        assert!(model.layout().is_empty());
    }

    #[test]
    fn test_draw_edges_selection_only() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        assert!(model.draw_edges(EdgeDisplay::SelectionOnly).is_empty());
        model.select(&NodeKey::primary("c"));
        let drawn = model.draw_edges(EdgeDisplay::SelectionOnly);
        assert_eq!(drawn, vec![&GraphEdge::relational("b", "c")]);
        assert_eq!(model.draw_edges(EdgeDisplay::All).len(), 2);
    }

    #[test]
    fn test_refresh_label() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        assert!(model.refresh_label(&NodeKey::primary("a"), "Renamed"));
        assert_eq!(model.node(&NodeKey::primary("a")).unwrap().label, "Renamed");
        assert!(!model.refresh_label(&NodeKey::primary("zz"), "x"));
    }

    #[test]
    fn test_drag_without_target_is_ignored() {
        let mut model = GraphModel::new();
        model.replace(snapshot(&["a"], &[]));
        assert!(!model.drag_to(Pos2::new(1.0, 1.0)));
        assert!(!model.begin_drag(&NodeKey::primary("missing")));
        assert!(model.end_drag(false).is_none());
    }
}
