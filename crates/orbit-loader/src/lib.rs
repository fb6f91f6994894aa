//! Loading for Orbit.
//!
//! Two kinds of load feed the live graph:
//! - full loads ([`neighborhood::load_global`], [`neighborhood::load_neighborhood`])
//!   that produce a [`orbit_graph::GraphSnapshot`] replacing it
//! - expansions ([`expander::expand`]) that produce a
//!   [`orbit_graph::GraphDelta`] appended to it
//!
//! Both are synchronous functions over a [`orbit_core::GraphStore`], budgeted
//! and cancellable. [`LoaderService`] runs them on the blocking pool.

mod assembly;
pub mod config;
pub mod error;
pub mod expander;
pub mod neighborhood;
pub mod service;

pub use config::LoaderOptions;
pub use error::{LoadError, Result};
pub use expander::{expand, ExpandMode, ExpandRequest};
pub use neighborhood::{load_global, load_neighborhood, NeighborhoodRequest};
pub use service::LoaderService;
