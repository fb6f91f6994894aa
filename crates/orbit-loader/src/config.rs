use serde::{Deserialize, Serialize};

/// Tuning for loads and expansions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Cap on outgoing edges, and separately on incoming edges, fetched by
    /// one expansion.
    pub per_side_edge_cap: usize,
    /// Whether a full expansion also fetches owned children.
    pub expand_containment: bool,
    /// Over-fetch factor for edge queries whose results are filtered
    /// afterwards.
    pub supplemental_oversample: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            per_side_edge_cap: 40,
            expand_containment: true,
            supplemental_oversample: 3,
        }
    }
}

impl LoaderOptions {
    pub(crate) fn oversampled(&self, remaining: usize) -> usize {
        remaining.saturating_mul(self.supplemental_oversample.max(1))
    }
}
