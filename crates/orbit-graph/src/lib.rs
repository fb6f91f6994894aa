//! The interactive side of Orbit.
//!
//! Everything in this crate is owned by a single interactive thread: the live
//! graph with its layout, the force simulation that moves it, the lens that
//! grades it around the selection, and the camera that maps it to the screen.
//! Nothing here talks to the store; loads arrive as [`GraphSnapshot`] and
//! [`GraphDelta`] values.

pub mod camera;
pub mod layout;
pub mod lens;
pub mod model;
pub mod physics;
pub mod seed;
pub mod snapshot;

pub use camera::{bounding_rect, CameraConfig, CameraController, Viewport};
pub use layout::Layout;
pub use lens::{LensCache, LensContext, LensEngine, LensSettings};
pub use model::{EdgeDisplay, GraphModel, MergeOutcome, SceneView};
pub use physics::{PhysicsConfig, PhysicsSimulator, SimulationState, StepReport, TICK_INTERVAL};
pub use seed::SeedConfig;
pub use snapshot::{GraphDelta, GraphSnapshot};
pub use emath::{pos2, vec2, Pos2, Rect, Vec2};
