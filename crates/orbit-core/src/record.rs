//! Plain records returned by the store, and the query shapes used to ask
//! for them.
//!
//! Queries follow the predicate + sort + limit model: the store filters,
//! sorts deterministically, then truncates. Loaders depend on the sort being
//! stable so that repeated loads over identical content are reproducible.

use crate::edge::{DirectedEdgeKey, GraphEdge};
use crate::node::{GraphNode, NodeKey, NodeKind, NodeMedia};
use crate::partition::{PartitionFilter, PartitionScope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A vertex record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub scope: PartitionScope,
    /// Owning primary id. Only meaningful for secondary records.
    #[serde(default)]
    pub owner: Option<String>,
}

impl NodeRecord {
    /// Creates an unscoped primary record.
    pub fn primary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Primary,
            label: label.into(),
            icon: None,
            image: None,
            scope: PartitionScope::Unscoped,
            owner: None,
        }
    }

    /// Creates an unscoped secondary record owned by `owner`.
    pub fn secondary(
        id: impl Into<String>,
        label: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Secondary,
            label: label.into(),
            icon: None,
            image: None,
            scope: PartitionScope::Unscoped,
            owner: Some(owner.into()),
        }
    }

    pub fn with_scope(mut self, scope: PartitionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.kind, self.id.clone())
    }

    pub fn to_node(&self) -> GraphNode {
        GraphNode::new(self.key(), self.label.clone())
    }

    pub fn media(&self) -> Option<NodeMedia> {
        NodeMedia::from_refs(self.icon.clone(), self.image.clone())
    }
}

/// A relational edge record as stored. Direction is source → target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub scope: PartitionScope,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            note: None,
            scope: PartitionScope::Unscoped,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_scope(mut self, scope: PartitionScope) -> Self {
        self.scope = scope;
        self
    }

    /// The undirected, canonical edge for this record.
    pub fn to_edge(&self) -> GraphEdge {
        GraphEdge::relational(&self.source, &self.target)
    }

    pub fn directed_key(&self) -> DirectedEdgeKey {
        DirectedEdgeKey::relational(self.source.clone(), self.target.clone())
    }

    /// The endpoint opposite to `id`.
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Sort order for node queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSort {
    /// Label, ties broken by id.
    #[default]
    Label,
    Id,
}

/// Query for primary node records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeQuery {
    pub partition: PartitionFilter,
    /// Restrict to these ids ("id in set"). `None` means no restriction.
    pub ids: Option<BTreeSet<String>>,
    pub sort: NodeSort,
    pub limit: Option<usize>,
}

impl NodeQuery {
    pub fn new(partition: PartitionFilter) -> Self {
        Self {
            partition,
            ..Self::default()
        }
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: NodeSort) -> Self {
        self.sort = sort;
        self
    }

    /// Returns true if `record` passes the predicate part of this query.
    pub fn matches(&self, record: &NodeRecord) -> bool {
        record.kind == NodeKind::Primary
            && record.scope.is_visible_in(&self.partition)
            && self
                .ids
                .as_ref()
                .map(|ids| ids.contains(&record.id))
                .unwrap_or(true)
    }
}

/// Which relational edges a query selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EdgePredicate {
    #[default]
    Any,
    /// Source or target is in the set.
    Touching(BTreeSet<String>),
    /// Both source and target are in the set.
    Within(BTreeSet<String>),
    /// Source equals the id.
    Outgoing(String),
    /// Target equals the id.
    Incoming(String),
}

impl EdgePredicate {
    pub fn touching(ids: impl IntoIterator<Item = String>) -> Self {
        EdgePredicate::Touching(ids.into_iter().collect())
    }

    pub fn within(ids: impl IntoIterator<Item = String>) -> Self {
        EdgePredicate::Within(ids.into_iter().collect())
    }

    pub fn matches(&self, record: &EdgeRecord) -> bool {
        match self {
            EdgePredicate::Any => true,
            EdgePredicate::Touching(ids) => {
                ids.contains(&record.source) || ids.contains(&record.target)
            }
            EdgePredicate::Within(ids) => {
                ids.contains(&record.source) && ids.contains(&record.target)
            }
            EdgePredicate::Outgoing(id) => &record.source == id,
            EdgePredicate::Incoming(id) => &record.target == id,
        }
    }
}

/// Sort order for edge queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSort {
    /// Source id, ties broken by target id.
    #[default]
    SourceTarget,
}

/// Query for relational edge records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeQuery {
    pub predicate: EdgePredicate,
    pub partition: PartitionFilter,
    pub sort: EdgeSort,
    pub limit: Option<usize>,
}

impl EdgeQuery {
    pub fn new(predicate: EdgePredicate, partition: PartitionFilter) -> Self {
        Self {
            predicate,
            partition,
            sort: EdgeSort::default(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &EdgeRecord) -> bool {
        record.scope.is_visible_in(&self.partition) && self.predicate.matches(record)
    }
}
