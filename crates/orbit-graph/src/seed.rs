//! Initial placement for nodes entering the graph.
//!
//! A node never exists without a position. Nodes that arrive with an anchor
//! (an expansion origin or a neighborhood center) are placed on a ring
//! around it; anything else goes onto a golden-angle spiral, which spaces
//! points evenly regardless of how many there are.

use emath::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Golden angle in radians.
pub const GOLDEN_ANGLE: f32 = 2.399_963;

/// Nodes per ring before the ring radius starts growing.
const RING_CAPACITY: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Distance from the anchor for nodes placed around it.
    pub ring_radius: f32,
    /// Spacing factor of the spiral used when there is no anchor.
    pub spiral_spacing: f32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            ring_radius: 140.0,
            spiral_spacing: 60.0,
        }
    }
}

impl SeedConfig {
    /// Position `slot` of `total` nodes around `anchor`.
    ///
    /// `rotation` shifts the whole ring, so successive expansions from the
    /// same anchor do not stack on top of each other.
    pub fn ring(&self, anchor: Pos2, slot: usize, total: usize, rotation: f32) -> Pos2 {
        let total = total.max(1) as f32;
        let radius = self.ring_radius * (total / RING_CAPACITY).sqrt().max(1.0);
        let angle = rotation + TAU * slot as f32 / total;
        anchor + Vec2::angled(angle) * radius
    }

    /// Position `index` on the golden-angle spiral around `center`.
    pub fn spiral(&self, center: Pos2, index: usize) -> Pos2 {
        let n = index as f32 + 1.0;
        center + Vec2::angled(n * GOLDEN_ANGLE) * (self.spiral_spacing * n.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_radius() {
        let seed = SeedConfig::default();
        let anchor = Pos2::new(50.0, -20.0);
        for slot in 0..4 {
            let p = seed.ring(anchor, slot, 4, 0.0);
            assert!((p.distance(anchor) - seed.ring_radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_large_ring_grows() {
        let seed = SeedConfig::default();
        let p = seed.ring(Pos2::ZERO, 0, 32, 0.0);
        assert!(p.to_vec2().length() > seed.ring_radius);
    }

    #[test]
    fn test_spiral_points_are_distinct() {
        let seed = SeedConfig::default();
        let points: Vec<Pos2> = (0..20).map(|i| seed.spiral(Pos2::ZERO, i)).collect();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                assert!(points[i].distance(points[j]) > 1.0);
            }
        }
    }
}
