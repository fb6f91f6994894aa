//! End-to-end behavior of the explorer over an in-memory store.

use orbit_core::{
    EdgePredicate, EdgeQuery, EdgeRecord, GraphStore, MemoryStore, NodeKey, NodeQuery, NodeRecord,
    PartitionFilter, PartitionId, PartitionScope, StoreResult,
};
use orbit_explorer::{Explorer, ExplorerConfig, LoadRequest, LoadStatus};
use orbit_graph::{pos2, Viewport};
use orbit_loader::LoaderService;
use std::sync::Arc;
use std::time::Duration;

fn chain(len: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    for i in 0..len {
        store.insert_node(NodeRecord::primary(format!("n{i}"), format!("Node {i}")));
        if i > 0 {
            store.insert_edge(EdgeRecord::new(format!("n{}", i - 1), format!("n{i}")));
        }
    }
    store
}

fn explorer_over(store: MemoryStore) -> Explorer {
    let loader = LoaderService::default();
    loader.configure(Arc::new(store));
    Explorer::new(ExplorerConfig::default(), loader)
}

fn key(id: &str) -> NodeKey {
    NodeKey::primary(id)
}

/// Holds the per-node edge queries that only expansions issue.
struct SlowExpansions(MemoryStore);

impl GraphStore for SlowExpansions {
    fn fetch_primary_nodes(&self, query: &NodeQuery) -> StoreResult<Vec<NodeRecord>> {
        self.0.fetch_primary_nodes(query)
    }

    fn fetch_relational_edges(&self, query: &EdgeQuery) -> StoreResult<Vec<EdgeRecord>> {
        if matches!(
            query.predicate,
            EdgePredicate::Outgoing(_) | EdgePredicate::Incoming(_)
        ) {
            std::thread::sleep(Duration::from_millis(300));
        }
        self.0.fetch_relational_edges(query)
    }

    fn fetch_owned_children(
        &self,
        owner: &str,
        partition: &PartitionFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NodeRecord>> {
        self.0.fetch_owned_children(owner, partition, limit)
    }
}

#[tokio::test]
async fn test_neighborhood_load_commits() {
    let mut explorer = explorer_over(chain(6));
    explorer.load_neighborhood(key("n2"), Some(1));
    assert!(explorer.status().is_loading());

    assert_eq!(explorer.settle().await, 1);
    assert_eq!(explorer.status(), &LoadStatus::Idle);
    assert_eq!(explorer.model().node_count(), 3);
    for id in ["n1", "n2", "n3"] {
        assert!(explorer.model().contains(&key(id)));
    }
    let scale = explorer.camera().scale();
    assert!((0.4..=3.0).contains(&scale));
    assert!(explorer.physics().is_running());
}

#[tokio::test]
async fn test_superseded_load_is_never_committed() {
    let mut explorer = explorer_over(chain(10));
    explorer.load_neighborhood(key("n0"), Some(1));
    explorer.load_neighborhood(key("n8"), Some(1));
    explorer.settle().await;

    assert!(explorer.model().contains(&key("n8")));
    assert!(!explorer.model().contains(&key("n0")));
    assert_eq!(explorer.model().node_count(), 3);
}

#[tokio::test]
async fn test_cancelled_load_leaves_model_unchanged() {
    let mut explorer = explorer_over(chain(10));
    explorer.load_neighborhood(key("n0"), Some(1));
    explorer.settle().await;
    let before: Vec<NodeKey> = explorer.nodes().map(|n| n.key.clone()).collect();
    let revision = explorer.model().revision();

    explorer.load_neighborhood(key("n8"), Some(3));
    explorer.cancel_load();
    assert_eq!(explorer.settle().await, 0);

    let after: Vec<NodeKey> = explorer.nodes().map(|n| n.key.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(explorer.model().revision(), revision);
    assert_eq!(explorer.status(), &LoadStatus::Idle);
}

#[tokio::test]
async fn test_not_configured_then_retry() {
    let loader = LoaderService::default();
    let mut explorer = Explorer::new(ExplorerConfig::default(), loader.clone());
    explorer.load_global();
    explorer.settle().await;

    match explorer.status() {
        LoadStatus::Failed { message, retry } => {
            assert!(message.contains("configured"));
            assert_eq!(retry, &LoadRequest::Global);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(explorer.model().is_empty());

    loader.configure(Arc::new(chain(4)));
    assert!(explorer.retry());
    explorer.settle().await;
    assert_eq!(explorer.status(), &LoadStatus::Idle);
    assert_eq!(explorer.model().node_count(), 4);
    assert_eq!(explorer.model().edge_count(), 3);
}

#[tokio::test]
async fn test_expand_appends() {
    let mut explorer = explorer_over(chain(6));
    explorer.load_neighborhood(key("n0"), Some(1));
    explorer.settle().await;
    assert!(!explorer.model().contains(&key("n2")));

    assert!(explorer.expand(&key("n1")));
    assert!(explorer.expand(&key("n1")));
    explorer.settle().await;

    assert!(explorer.model().contains(&key("n2")));
    assert_eq!(explorer.model().node_count(), 3);
    assert_eq!(explorer.model().edge_count(), 2);
    assert!(!explorer.expand(&key("n5")));
}

#[tokio::test]
async fn test_expansion_against_replaced_graph_is_dropped() {
    let work = PartitionScope::ScopedTo(PartitionId::new("work"));
    let store = MemoryStore::new()
        .with_node(NodeRecord::primary("a", "A").with_scope(work.clone()))
        .with_node(NodeRecord::primary("b", "B").with_scope(work.clone()))
        .with_node(NodeRecord::primary("c", "C").with_scope(work.clone()))
        .with_edge(EdgeRecord::new("a", "b").with_scope(work.clone()))
        .with_edge(EdgeRecord::new("b", "c").with_scope(work));
    let mut explorer = explorer_over(store);
    explorer.load_neighborhood(key("a"), Some(1));
    explorer.settle().await;
    assert_eq!(explorer.model().node_count(), 2);

    explorer.expand(&key("b"));
    assert!(explorer.set_partition(PartitionFilter::only("home")));
    explorer.settle().await;

    // "a" is not visible in "home", so the reload fails; the expansion
    // issued against the old graph must not land either.
    assert!(!explorer.model().contains(&key("c")));
    assert!(explorer.model().is_empty());
    assert!(explorer.status().is_failed());
}

#[tokio::test]
async fn test_expand_after_reload_is_not_lost_to_stale_expansion() {
    let loader = LoaderService::default();
    loader.configure(Arc::new(SlowExpansions(chain(4))));
    let mut explorer = Explorer::new(ExplorerConfig::default(), loader);
    explorer.load_neighborhood(key("n0"), Some(1));
    explorer.settle().await;
    assert!(explorer.expand(&key("n1")));

    // Reload the same neighborhood while the expansion is still running.
    explorer.load_neighborhood(key("n0"), Some(1));
    let mut committed = 0;
    for _ in 0..100 {
        committed += explorer.poll();
        if committed > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(committed, 1);
    assert_eq!(explorer.loader().in_flight(), 1);
    assert!(!explorer.model().contains(&key("n2")));

    assert!(explorer.expand(&key("n1")));
    explorer.settle().await;

    assert!(explorer.model().contains(&key("n2")));
    assert_eq!(explorer.status(), &LoadStatus::Idle);
    assert_eq!(explorer.loader().in_flight(), 0);
}

#[tokio::test]
async fn test_partition_switch_reloads_global() {
    let home = PartitionScope::ScopedTo(PartitionId::new("home"));
    let store = MemoryStore::new()
        .with_node(NodeRecord::primary("h", "Home").with_scope(home))
        .with_node(NodeRecord::primary("w", "Work").with_scope(PartitionScope::ScopedTo(
            PartitionId::new("work"),
        )))
        .with_node(NodeRecord::primary("legacy", "Legacy"));
    let mut explorer = explorer_over(store);
    explorer.load_global();
    explorer.settle().await;
    assert_eq!(explorer.model().node_count(), 3);

    assert!(explorer.set_partition(PartitionFilter::only("home")));
    assert!(!explorer.set_partition(PartitionFilter::only("home")));
    explorer.settle().await;
    assert!(explorer.model().contains(&key("h")));
    assert!(explorer.model().contains(&key("legacy")));
    assert!(!explorer.model().contains(&key("w")));
}

#[tokio::test]
async fn test_pinned_node_holds_through_ticks() {
    let mut explorer = explorer_over(chain(5));
    explorer.load_global();
    explorer.settle().await;

    let pinned = key("n2");
    assert!(explorer.pin(&pinned));
    let before = explorer.position(&pinned);
    explorer.set_active(true);
    for _ in 0..60 {
        explorer.tick(1.0 / 30.0);
    }
    assert_eq!(explorer.position(&pinned), before);
}

#[tokio::test]
async fn test_drag_follows_pointer() {
    let mut explorer = explorer_over(chain(3));
    explorer.set_viewport(Viewport::new(800.0, 600.0));
    explorer.load_global();
    explorer.settle().await;
    explorer.reset_camera();

    let node = key("n1");
    assert!(explorer.begin_drag(&node));
    assert!(explorer.drag_to(pos2(500.0, 300.0)));
    for _ in 0..5 {
        explorer.tick(1.0 / 30.0);
    }
    assert_eq!(explorer.position(&node), Some(pos2(100.0, 0.0)));
    assert_eq!(explorer.end_drag(), Some(node.clone()));
    assert!(!explorer.model().is_pinned(&node));
}

#[tokio::test]
async fn test_lens_and_edge_display() {
    let config = ExplorerConfig {
        edge_display: orbit_graph::EdgeDisplay::SelectionOnly,
        ..ExplorerConfig::default()
    };
    let loader = LoaderService::default();
    loader.configure(Arc::new(chain(6)));
    let mut explorer = Explorer::new(config, loader);
    explorer.load_global();
    explorer.settle().await;

    assert!(explorer.draw_edges().is_empty());
    assert_eq!(explorer.physics_edges().count(), 5);

    explorer.select(&key("n0"));
    assert_eq!(explorer.draw_edges().len(), 1);
    let lens = explorer.lens();
    assert_eq!(lens.distance(&key("n0")), Some(0));
    assert_eq!(lens.distance(&key("n2")), Some(2));
    assert_eq!(lens.distance(&key("n3")), None);
    assert!(lens.node_opacity(&key("n5")) < 0.5);
}

#[tokio::test]
async fn test_center_on_and_fit() {
    let mut explorer = explorer_over(chain(4));
    explorer.load_global();
    explorer.settle().await;

    let target = key("n3");
    assert!(explorer.center_on(&target));
    for _ in 0..200 {
        explorer.tick(1.0 / 30.0);
        if !explorer.camera().is_animating() {
            break;
        }
    }
    assert!(!explorer.center_on(&key("missing")));
    assert!(explorer.fit_all());
    explorer.reset_camera();
    assert_eq!(explorer.camera().scale(), 1.0);
}

#[tokio::test]
async fn test_containment_expansion_and_label_refresh() {
    let store = chain(2).with_node(NodeRecord::secondary("attr", "Colour", "n0"));
    let config = ExplorerConfig {
        include_containment: false,
        ..ExplorerConfig::default()
    };
    let loader = LoaderService::default();
    loader.configure(Arc::new(store));
    let mut explorer = Explorer::new(config, loader);
    explorer.load_neighborhood(key("n0"), None);
    explorer.settle().await;
    assert_eq!(explorer.model().node_count(), 2);

    assert!(explorer.expand_containment_only(&key("n0")));
    explorer.settle().await;
    assert!(explorer.model().contains(&NodeKey::secondary("attr")));

    assert!(explorer.refresh_label(&key("n0"), "Renamed"));
    assert_eq!(explorer.model().node(&key("n0")).unwrap().label, "Renamed");
}
