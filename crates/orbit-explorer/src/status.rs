use orbit_core::NodeKey;
use orbit_loader::ExpandMode;
use std::fmt;

/// A load the explorer can issue, kept so that a failure can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Global,
    Neighborhood { center: NodeKey, hops: u32 },
    Expand { anchor: NodeKey, mode: ExpandMode },
}

impl LoadRequest {
    /// Full loads replace the graph; expansions append to it.
    pub fn is_full(&self) -> bool {
        match self {
            LoadRequest::Global | LoadRequest::Neighborhood { .. } => true,
            LoadRequest::Expand { .. } => false,
        }
    }
}

impl fmt::Display for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadRequest::Global => write!(f, "global view"),
            LoadRequest::Neighborhood { center, hops } => {
                write!(f, "neighborhood of {} ({} hops)", center, hops)
            }
            LoadRequest::Expand { anchor, mode } => match mode {
                ExpandMode::Full => write!(f, "expansion of {}", anchor),
                ExpandMode::ContainmentOnly => write!(f, "children of {}", anchor),
            },
        }
    }
}

/// What the renderer shows about loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading(LoadRequest),
    Failed { message: String, retry: LoadRequest },
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed { .. })
    }
}
