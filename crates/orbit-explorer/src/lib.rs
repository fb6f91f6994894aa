//! Orbit's interactive controller.
//!
//! [`Explorer`] is what a renderer talks to: it accepts user commands, issues
//! background loads, commits their results in order, and exposes the live
//! graph, camera and lens for drawing.

pub mod config;
pub mod explorer;
pub mod status;

pub use config::{ConfigError, ExplorerConfig};
pub use explorer::Explorer;
pub use status::{LoadRequest, LoadStatus};
