//! Edge types for the exploration graph.
//!
//! Edges are undirected once they reach the live graph. A [`GraphEdge`] is
//! always stored with its endpoints in canonical order, so `(a, b, kind)`
//! identifies it uniquely and can be hashed for deduplication. Direction is
//! only kept by [`DirectedEdgeKey`], which exists to attach notes.

use crate::node::NodeKey;
use serde::{Deserialize, Serialize};

/// The type of connection between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A link between two primary records.
    Relational,

    /// A primary record owning a secondary one.
    Containment,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Relational => "relational",
            Self::Containment => "containment",
        };
        write!(f, "{}", s)
    }
}

/// An undirected edge in canonical order.
///
/// The fields are private: the only way to build one is [`GraphEdge::new`],
/// which sorts the endpoints. Deserialization goes through it as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EdgeParts")]
pub struct GraphEdge {
    a: NodeKey,
    b: NodeKey,
    kind: EdgeKind,
}

impl GraphEdge {
    /// Creates an edge, swapping the endpoints if needed so that `a <= b`.
    pub fn new(x: NodeKey, y: NodeKey, kind: EdgeKind) -> Self {
        if x <= y {
            Self { a: x, b: y, kind }
        } else {
            Self { a: y, b: x, kind }
        }
    }

    /// Relational edge between two primary ids.
    pub fn relational(source: &str, target: &str) -> Self {
        Self::new(
            NodeKey::primary(source),
            NodeKey::primary(target),
            EdgeKind::Relational,
        )
    }

    /// Containment edge from a primary owner to a secondary child.
    pub fn containment(owner: &str, child: &str) -> Self {
        Self::new(
            NodeKey::primary(owner),
            NodeKey::secondary(child),
            EdgeKind::Containment,
        )
    }

    pub fn a(&self) -> &NodeKey {
        &self.a
    }

    pub fn b(&self) -> &NodeKey {
        &self.b
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// Returns true if either endpoint is `key`.
    pub fn touches(&self, key: &NodeKey) -> bool {
        &self.a == key || &self.b == key
    }

    /// Returns the endpoint opposite to `key`, if `key` is an endpoint.
    pub fn other(&self, key: &NodeKey) -> Option<&NodeKey> {
        if &self.a == key {
            Some(&self.b)
        } else if &self.b == key {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Returns true for a self-loop.
    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }
}

/// Serialized shape of a [`GraphEdge`], in whatever order it was written.
#[derive(Deserialize)]
struct EdgeParts {
    a: NodeKey,
    b: NodeKey,
    kind: EdgeKind,
}

impl From<EdgeParts> for GraphEdge {
    fn from(parts: EdgeParts) -> Self {
        GraphEdge::new(parts.a, parts.b, parts.kind)
    }
}

/// Directed identity of a relational edge, used only to attach a note to one
/// traversal direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectedEdgeKey {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl DirectedEdgeKey {
    pub fn relational(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Relational,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_order() {
        let forward = GraphEdge::relational("a", "b");
        let backward = GraphEdge::relational("b", "a");

        assert_eq!(forward, backward);
        assert_eq!(forward.a().id, "a");
        assert_eq!(forward.b().id, "b");

        let mut set = HashSet::new();
        set.insert(forward);
        assert!(!set.insert(backward), "reversed edge must dedupe");
    }

    #[test]
    fn test_kind_distinguishes_edges() {
        let rel = GraphEdge::new(
            NodeKey::primary("a"),
            NodeKey::secondary("x"),
            EdgeKind::Relational,
        );
        let own = GraphEdge::containment("a", "x");
        assert_ne!(rel, own);
    }

    #[test]
    fn test_other_endpoint() {
        let edge = GraphEdge::containment("owner", "child");
        let owner = NodeKey::primary("owner");
        let child = NodeKey::secondary("child");

        assert_eq!(edge.other(&owner), Some(&child));
        assert_eq!(edge.other(&child), Some(&owner));
        assert_eq!(edge.other(&NodeKey::primary("stranger")), None);
        assert!(edge.touches(&owner));
    }

    #[test]
    fn test_deserialize_canonicalizes() {
        let json = r#"{
            "a": { "kind": "primary", "id": "z" },
            "b": { "kind": "primary", "id": "m" },
            "kind": "relational"
        }"#;
        let edge: GraphEdge = serde_json::from_str(json).unwrap();
        assert_eq!(edge, GraphEdge::relational("m", "z"));
        assert_eq!(edge.a().id, "m");
    }

    #[test]
    fn test_directed_key_keeps_direction() {
        let ab = DirectedEdgeKey::relational("a", "b");
        let ba = DirectedEdgeKey::relational("b", "a");
        assert_ne!(ab, ba);
    }
}
