//! Relevance lens.
//!
//! Given a selection, the lens runs an unweighted BFS over the live edges and
//! grades every node by hop distance. Renderers read opacity and visibility
//! from the resulting [`LensContext`]; the physics step reads the relevant
//! set to restrict itself to the neighborhood around the selection.

use crate::model::GraphModel;
use orbit_core::{GraphEdge, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::trace;

/// Opacity by distance from the selection. Distances past the last tier use
/// the last tier.
const TIER_OPACITY: [f32; 4] = [1.0, 0.85, 0.6, 0.4];

/// Opacity of nodes the BFS did not reach.
const DIMMED_OPACITY: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LensSettings {
    pub enabled: bool,
    /// Hide unreached nodes instead of dimming them.
    pub hide_non_relevant: bool,
    /// Maximum hop distance considered relevant.
    pub depth: u32,
}

impl Default for LensSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            hide_non_relevant: false,
            depth: 2,
        }
    }
}

/// The result of one lens computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LensContext {
    settings: LensSettings,
    selection: Option<NodeKey>,
    distance: HashMap<NodeKey, u32>,
    relevant: HashSet<NodeKey>,
}

impl LensContext {
    /// A context that leaves every node fully visible.
    pub fn all_visible(settings: LensSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// True when a selection is driving the lens.
    pub fn is_active(&self) -> bool {
        self.settings.enabled && self.selection.is_some()
    }

    pub fn settings(&self) -> &LensSettings {
        &self.settings
    }

    pub fn selection(&self) -> Option<&NodeKey> {
        self.selection.as_ref()
    }

    pub fn distance(&self, key: &NodeKey) -> Option<u32> {
        self.distance.get(key).copied()
    }

    /// Nodes within `depth` hops of the selection. Empty when inactive.
    pub fn relevant(&self) -> &HashSet<NodeKey> {
        &self.relevant
    }

    pub fn is_relevant(&self, key: &NodeKey) -> bool {
        !self.is_active() || self.relevant.contains(key)
    }

    pub fn node_opacity(&self, key: &NodeKey) -> f32 {
        if !self.is_active() {
            return 1.0;
        }
        match self.distance(key) {
            Some(d) => tier(d),
            None => self.unreached_opacity(),
        }
    }

    /// Opacity of the edge between `a` and `b`, graded by its farther end.
    pub fn edge_opacity(&self, a: &NodeKey, b: &NodeKey) -> f32 {
        if !self.is_active() {
            return 1.0;
        }
        match (self.distance(a), self.distance(b)) {
            (Some(da), Some(db)) => tier(da.max(db)),
            _ => self.unreached_opacity(),
        }
    }

    pub fn is_hidden(&self, key: &NodeKey) -> bool {
        self.is_active() && self.settings.hide_non_relevant && !self.relevant.contains(key)
    }

    fn unreached_opacity(&self) -> f32 {
        if self.settings.hide_non_relevant {
            0.0
        } else {
            DIMMED_OPACITY
        }
    }
}

fn tier(distance: u32) -> f32 {
    let idx = (distance as usize).min(TIER_OPACITY.len() - 1);
    TIER_OPACITY[idx]
}

pub struct LensEngine;

impl LensEngine {
    /// Computes the lens for `selection` over `edges`.
    pub fn build<'a, I>(settings: LensSettings, selection: Option<&NodeKey>, edges: I) -> LensContext
    where
        I: IntoIterator<Item = &'a GraphEdge>,
    {
        let Some(selection) = selection.filter(|_| settings.enabled) else {
            return LensContext::all_visible(settings);
        };

        let mut adjacency: HashMap<&NodeKey, Vec<&NodeKey>> = HashMap::new();
        for edge in edges {
            adjacency.entry(edge.a()).or_default().push(edge.b());
            adjacency.entry(edge.b()).or_default().push(edge.a());
        }

        let mut distance: HashMap<NodeKey, u32> = HashMap::new();
        let mut queue: VecDeque<(&NodeKey, u32)> = VecDeque::new();
        distance.insert(selection.clone(), 0);
        queue.push_back((selection, 0));

        while let Some((key, d)) = queue.pop_front() {
            if d >= settings.depth {
                continue;
            }
            let Some(neighbors) = adjacency.get(key) else {
                continue;
            };
            for &next in neighbors {
                if !distance.contains_key(next) {
                    distance.insert(next.clone(), d + 1);
                    queue.push_back((next, d + 1));
                }
            }
        }

        trace!("Lens around {} reached {} nodes", selection, distance.len());

        let relevant = distance.keys().cloned().collect();
        LensContext {
            settings,
            selection: Some(selection.clone()),
            distance,
            relevant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    settings: LensSettings,
    selection: Option<NodeKey>,
    revision: u64,
}

/// Keeps the last lens context and rebuilds it only when the settings, the
/// selection or the model's edge set changed.
#[derive(Debug, Default)]
pub struct LensCache {
    key: Option<CacheKey>,
    context: LensContext,
    builds: u64,
}

impl LensCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&mut self, settings: LensSettings, model: &GraphModel) -> &LensContext {
        let key = CacheKey {
            settings,
            selection: model.selection().cloned(),
            revision: model.revision(),
        };
        if self.key.as_ref() != Some(&key) {
            self.context = LensEngine::build(settings, key.selection.as_ref(), model.edges());
            self.key = Some(key);
            self.builds += 1;
        }
        &self.context
    }

    /// Number of times the context was recomputed.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> NodeKey {
        NodeKey::primary(id)
    }

    fn chain() -> Vec<GraphEdge> {
        vec![
            GraphEdge::relational("a", "b"),
            GraphEdge::relational("b", "c"),
            GraphEdge::relational("c", "d"),
            GraphEdge::relational("d", "e"),
        ]
    }

    #[test]
    fn test_no_selection_is_all_visible() {
        let edges = chain();
        let ctx = LensEngine::build(LensSettings::default(), None, &edges);
        assert!(!ctx.is_active());
        assert_eq!(ctx.node_opacity(&key("e")), 1.0);
        assert!(ctx.is_relevant(&key("e")));
        assert!(!ctx.is_hidden(&key("e")));
    }

    #[test]
    fn test_disabled_is_all_visible() {
        let edges = chain();
        let settings = LensSettings {
            enabled: false,
            ..LensSettings::default()
        };
        let ctx = LensEngine::build(settings, Some(&key("a")), &edges);
        assert!(!ctx.is_active());
        assert!(ctx.relevant().is_empty());
    }

    #[test]
    fn test_distances_stop_at_depth() {
        let edges = chain();
        let ctx = LensEngine::build(LensSettings::default(), Some(&key("a")), &edges);

        assert_eq!(ctx.distance(&key("a")), Some(0));
        assert_eq!(ctx.distance(&key("b")), Some(1));
        assert_eq!(ctx.distance(&key("c")), Some(2));
        assert_eq!(ctx.distance(&key("d")), None);
        assert!(ctx.relevant().iter().all(|k| ctx.distance(k).unwrap() <= 2));
    }

    #[test]
    fn test_opacity_tiers() {
        let edges = chain();
        let ctx = LensEngine::build(LensSettings::default(), Some(&key("b")), &edges);

        assert_eq!(ctx.node_opacity(&key("b")), 1.0);
        assert_eq!(ctx.node_opacity(&key("a")), 0.85);
        assert_eq!(ctx.node_opacity(&key("d")), 0.6);
        assert_eq!(ctx.node_opacity(&key("e")), DIMMED_OPACITY);
        assert_eq!(ctx.edge_opacity(&key("a"), &key("b")), 0.85);
        assert_eq!(ctx.edge_opacity(&key("d"), &key("e")), DIMMED_OPACITY);
    }

    #[test]
    fn test_hide_non_relevant() {
        let edges = chain();
        let settings = LensSettings {
            hide_non_relevant: true,
            depth: 1,
            ..LensSettings::default()
        };
        let ctx = LensEngine::build(settings, Some(&key("a")), &edges);
        assert!(ctx.is_hidden(&key("c")));
        assert!(!ctx.is_hidden(&key("b")));
        assert_eq!(ctx.node_opacity(&key("c")), 0.0);
    }

    #[test]
    fn test_isolated_selection() {
        let edges: Vec<GraphEdge> = Vec::new();
        let ctx = LensEngine::build(LensSettings::default(), Some(&key("lonely")), &edges);
        assert!(ctx.is_active());
        assert_eq!(ctx.relevant().len(), 1);
        assert_eq!(ctx.distance(&key("lonely")), Some(0));
    }
}
