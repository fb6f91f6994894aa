//! Node addressing.
//!
//! Every vertex is addressed by a [`NodeKey`]: its kind plus a stable id
//! coming from the record store. Keys are cheap to hash and totally ordered,
//! which is what edge canonicalization relies on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two families of vertices in an exploration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entity-like record. Participates in relational edges.
    Primary,

    /// Attribute-like record owned by a primary node.
    Secondary,
}

impl NodeKind {
    /// Returns a short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Primary => "primary",
            NodeKind::Secondary => "secondary",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Universal address of a vertex.
///
/// Ordering compares the kind first and the id second. The order itself
/// carries no meaning beyond being total and stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: String,
}

impl NodeKey {
    /// Creates a key of the given kind.
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Creates a primary (entity-like) key.
    pub fn primary(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Primary, id)
    }

    /// Creates a secondary (attribute-like) key.
    pub fn secondary(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Secondary, id)
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.kind, NodeKind::Primary)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A vertex as held by the live graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: NodeKey,
    pub label: String,
}

impl GraphNode {
    pub fn new(key: NodeKey, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
        }
    }
}

/// Icon and image references captured during a load so the renderer never
/// has to go back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMedia {
    pub icon: Option<String>,
    pub image: Option<String>,
}

impl NodeMedia {
    /// Returns `None` when neither reference is set, so empty entries are
    /// never cached.
    pub fn from_refs(icon: Option<String>, image: Option<String>) -> Option<Self> {
        if icon.is_none() && image.is_none() {
            None
        } else {
            Some(Self { icon, image })
        }
    }
}
