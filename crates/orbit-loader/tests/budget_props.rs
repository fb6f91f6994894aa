//! Budget and uniqueness properties over random graphs.

use orbit_core::{Budget, EdgeRecord, GraphEdge, MemoryStore, NodeKey, NodeRecord, PartitionFilter};
use orbit_loader::{
    expand, load_global, load_neighborhood, ExpandMode, ExpandRequest, LoaderOptions,
    NeighborhoodRequest,
};
use proptest::prelude::*;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

fn build_store(nodes: usize, links: &[(usize, usize)], owned: &[usize]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for i in 0..nodes {
        store.insert_node(NodeRecord::primary(format!("p{i}"), format!("P{i}")));
    }
    for (n, owner) in owned.iter().enumerate() {
        let owner = owner % nodes;
        store.insert_node(NodeRecord::secondary(format!("s{n}"), format!("S{n}"), format!("p{owner}")));
    }
    for (a, b) in links {
        store.insert_edge(EdgeRecord::new(format!("p{}", a % nodes), format!("p{}", b % nodes)));
    }
    store
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
    (1usize..25).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..60),
            prop::collection::vec(0..n, 0..15),
        )
    })
}

fn assert_well_formed(nodes: &[orbit_core::GraphNode], edges: &[GraphEdge], budget: &Budget) {
    assert!(nodes.len() <= budget.max_nodes);
    assert!(edges.len() <= budget.max_links);

    let keys: HashSet<&NodeKey> = nodes.iter().map(|n| &n.key).collect();
    assert_eq!(keys.len(), nodes.len());

    let unique: HashSet<&GraphEdge> = edges.iter().collect();
    assert_eq!(unique.len(), edges.len());
    for edge in edges {
        assert!(edge.a() <= edge.b());
        assert!(!edge.is_loop());
        assert!(keys.contains(edge.a()) && keys.contains(edge.b()));
    }
}

proptest! {
    #[test]
    fn neighborhood_stays_within_budget(
        (n, links, owned) in graph_strategy(),
        hops in 0u32..4,
        max_nodes in 1usize..12,
        max_links in 0usize..20,
    ) {
        let store = build_store(n, &links, &owned);
        let budget = Budget::new(max_nodes, max_links);
        let request = NeighborhoodRequest::new(NodeKey::primary("p0"), hops).with_budget(budget);
        let snapshot = load_neighborhood(
            &store,
            &request,
            &LoaderOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_well_formed(&snapshot.nodes, &snapshot.edges, &budget);
        prop_assert!(snapshot.contains(&NodeKey::primary("p0")));
    }

    #[test]
    fn global_stays_within_budget(
        (n, links, owned) in graph_strategy(),
        max_nodes in 0usize..30,
        max_links in 0usize..40,
    ) {
        let store = build_store(n, &links, &owned);
        let budget = Budget::new(max_nodes, max_links);
        let snapshot =
            load_global(&store, &PartitionFilter::Any, &budget, &CancellationToken::new()).unwrap();
        assert_well_formed(&snapshot.nodes, &snapshot.edges, &budget);
    }

    #[test]
    fn expansion_is_monotonic(
        (n, links, owned) in graph_strategy(),
        max_nodes in 1usize..20,
        max_links in 0usize..30,
    ) {
        let store = build_store(n, &links, &owned);
        let budget = Budget::new(max_nodes, max_links);
        let options = LoaderOptions::default();
        let cancel = CancellationToken::new();

        let anchor = NodeKey::primary("p0");
        let mut nodes: HashSet<NodeKey> = HashSet::from([anchor.clone()]);
        let mut edges: HashSet<GraphEdge> = HashSet::new();

        let request = ExpandRequest::new(anchor.clone(), ExpandMode::Full)
            .with_existing(nodes.clone(), edges.clone())
            .with_budget(budget);
        let delta = expand(&store, &request, &options, &cancel).unwrap();

        for node in &delta.nodes {
            prop_assert!(!nodes.contains(&node.key));
        }
        nodes.extend(delta.nodes.iter().map(|n| n.key.clone()));
        edges.extend(delta.edges.iter().cloned());
        prop_assert!(nodes.len() <= max_nodes.max(1));
        prop_assert!(edges.len() <= max_links);

        let again = ExpandRequest::new(anchor, ExpandMode::Full)
            .with_existing(nodes, edges)
            .with_budget(budget);
        let second = expand(&store, &again, &options, &cancel).unwrap();
        prop_assert!(second.is_empty());
    }
}
