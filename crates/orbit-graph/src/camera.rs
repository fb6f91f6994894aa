//! World-to-screen transform.
//!
//! `screen = viewport_center + pan + world * scale`

use emath::{pos2, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Pan distance under which an animation snaps to its target.
const SNAP_DISTANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Screen-space margin kept around the graph by `fit_all`.
    pub fit_padding: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// How fast an animated pan approaches its target, per second.
    pub ease_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fit_padding: 60.0,
            min_scale: 0.4,
            max_scale: 3.0,
            ease_rate: 8.0,
        }
    }
}

/// Size of the drawing surface in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// World-space bounds of circles given as `(center, radius)`. `None` when
/// there are no finite ones.
pub fn bounding_rect(circles: impl IntoIterator<Item = (Pos2, f32)>) -> Option<Rect> {
    circles
        .into_iter()
        .filter(|(center, radius)| center.is_finite() && radius.is_finite())
        .map(|(center, radius)| {
            Rect::from_center_size(center, Vec2::splat(2.0 * radius.abs()))
        })
        .reduce(|a, b| a.union(b))
}

#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    scale: f32,
    pan: Vec2,
    target_pan: Option<Vec2>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            scale: 1.0,
            pan: Vec2::ZERO,
            target_pan: None,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn to_screen(&self, world: Pos2, viewport_center: Pos2) -> Pos2 {
        viewport_center + self.pan + world.to_vec2() * self.scale
    }

    pub fn to_world(&self, screen: Pos2, viewport_center: Pos2) -> Pos2 {
        ((screen - viewport_center - self.pan) / self.scale).to_pos2()
    }

    /// Starts an animated pan that brings `world` to the viewport center.
    pub fn center_on(&mut self, world: Pos2) {
        if world.is_finite() {
            self.target_pan = Some(-world.to_vec2() * self.scale);
        }
    }

    /// Moves an animated pan forward by `dt` seconds.
    ///
    /// Returns true while the animation is still running.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(target) = self.target_pan else {
            return false;
        };
        let t = 1.0 - (-self.config.ease_rate * dt.max(0.0)).exp();
        self.pan += (target - self.pan) * t;
        if (target - self.pan).length() < SNAP_DISTANCE {
            self.pan = target;
            self.target_pan = None;
            return false;
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.target_pan.is_some()
    }

    /// Scales and pans so every circle fits the viewport with padding.
    ///
    /// Returns false, leaving the camera untouched, when nothing is
    /// positioned.
    pub fn fit_all(
        &mut self,
        circles: impl IntoIterator<Item = (Pos2, f32)>,
        viewport: Viewport,
    ) -> bool {
        let Some(bounds) = bounding_rect(circles) else {
            return false;
        };
        let size = bounds.size();
        let avail_w = (viewport.width - 2.0 * self.config.fit_padding).max(1.0);
        let avail_h = (viewport.height - 2.0 * self.config.fit_padding).max(1.0);
        let fit = (avail_w / size.x.max(1.0)).min(avail_h / size.y.max(1.0));

        self.scale = fit.clamp(self.config.min_scale, self.config.max_scale);
        self.pan = -bounds.center().to_vec2() * self.scale;
        self.target_pan = None;
        true
    }

    /// Back to unit scale with the origin at the viewport center.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.pan = Vec2::ZERO;
        self.target_pan = None;
    }

    /// Sets the zoom directly, clamped to the configured range.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        }
    }
}
