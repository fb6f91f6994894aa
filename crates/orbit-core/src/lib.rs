//! Orbit Core - the data model shared by every Orbit crate
//!
//! This crate defines how graph vertices and edges are addressed, how the
//! external record store is queried, and the budgets that bound every load.
//! It has no async runtime and no layout logic; those live in `orbit-graph`
//! and `orbit-loader`.
//!
//! # Example
//!
//! ```no_run
//! use orbit_core::{GraphStore, MemoryStore, NodeQuery, PartitionFilter};
//!
//! let store = MemoryStore::from_json_file("fixture.json").unwrap();
//! let nodes = store
//!     .fetch_primary_nodes(&NodeQuery::new(PartitionFilter::Any).with_limit(10))
//!     .unwrap();
//! ```

mod budget;
mod edge;
mod error;
mod memory;
mod node;
mod partition;
mod record;
mod store;

pub use budget::Budget;
pub use edge::{DirectedEdgeKey, EdgeKind, GraphEdge};
pub use error::{FixtureError, StoreError, StoreResult};
pub use memory::{Fixture, MemoryStore};
pub use node::{GraphNode, NodeKey, NodeKind, NodeMedia};
pub use partition::{PartitionFilter, PartitionId, PartitionScope};
pub use record::{EdgePredicate, EdgeQuery, EdgeRecord, EdgeSort, NodeQuery, NodeRecord, NodeSort};
pub use store::GraphStore;
