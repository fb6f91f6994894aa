//! Explorer configuration.
//!
//! Every section has defaults, so a JSON file only needs the keys it wants
//! to change:
//!
//! ```json
//! { "budget": { "max_nodes": 80 }, "lens": { "depth": 1 } }
//! ```

use orbit_core::{Budget, PartitionFilter};
use orbit_graph::{CameraConfig, EdgeDisplay, LensSettings, PhysicsConfig, SeedConfig};
use orbit_loader::LoaderOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub budget: Budget,
    pub loader: LoaderOptions,
    pub physics: PhysicsConfig,
    pub lens: LensSettings,
    pub camera: CameraConfig,
    pub seed: SeedConfig,
    /// Partition active at startup.
    pub partition: PartitionFilter,
    /// Hops used by a neighborhood load when none is given.
    pub default_hops: u32,
    pub include_containment: bool,
    pub edge_display: EdgeDisplay,
    /// Fit the camera to the graph after every full load.
    pub auto_fit: bool,
    /// Pin a node where it is dropped after a drag.
    pub pin_on_drop: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            budget: Budget::default(),
            loader: LoaderOptions::default(),
            physics: PhysicsConfig::default(),
            lens: LensSettings::default(),
            camera: CameraConfig::default(),
            seed: SeedConfig::default(),
            partition: PartitionFilter::Any,
            default_hops: 2,
            include_containment: true,
            edge_display: EdgeDisplay::All,
            auto_fit: true,
            pin_on_drop: false,
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config() {
        let config = ExplorerConfig::from_json_str(
            r#"{ "budget": { "max_nodes": 80 }, "lens": { "depth": 1 }, "partition": { "only": "work" } }"#,
        )
        .unwrap();
        assert_eq!(config.budget.max_nodes, 80);
        assert_eq!(config.budget.max_links, 300);
        assert_eq!(config.lens.depth, 1);
        assert!(config.lens.enabled);
        assert_eq!(config.partition, PartitionFilter::only("work"));
        assert_eq!(config.default_hops, 2);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "edge_display": "selection_only", "auto_fit": false }}"#).unwrap();
        let config = ExplorerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.edge_display, EdgeDisplay::SelectionOnly);
        assert!(!config.auto_fit);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ExplorerConfig::from_json_str("{ nope"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ExplorerConfig::from_json_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
