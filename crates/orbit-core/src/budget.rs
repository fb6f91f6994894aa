use serde::{Deserialize, Serialize};

/// Hard ceilings on what a single graph may hold.
///
/// Checked at every insertion point while loading or expanding, and again
/// when results are committed to the live model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    pub max_nodes: usize,
    pub max_links: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_nodes: 150,
            max_links: 300,
        }
    }
}

impl Budget {
    pub fn new(max_nodes: usize, max_links: usize) -> Self {
        Self {
            max_nodes,
            max_links,
        }
    }

    /// Nodes that can still be added on top of `current`.
    pub fn remaining_nodes(&self, current: usize) -> usize {
        self.max_nodes.saturating_sub(current)
    }

    /// Links that can still be added on top of `current`.
    pub fn remaining_links(&self, current: usize) -> usize {
        self.max_links.saturating_sub(current)
    }
}
