//! Position and velocity maps.
//!
//! Owned by [`crate::GraphModel`]. Only the physics step writes velocities;
//! positions are written by the physics step, by seeding, and by user drag.

use emath::{Pos2, Vec2};
use orbit_core::NodeKey;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Layout {
    positions: HashMap<NodeKey, Pos2>,
    velocities: HashMap<NodeKey, Vec2>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, key: &NodeKey) -> Option<Pos2> {
        self.positions.get(key).copied()
    }

    pub fn velocity(&self, key: &NodeKey) -> Vec2 {
        self.velocities.get(key).copied().unwrap_or(Vec2::ZERO)
    }

    /// Places a node and clears its velocity.
    pub fn place(&mut self, key: &NodeKey, position: Pos2) {
        self.positions.insert(key.clone(), position);
        self.velocities.insert(key.clone(), Vec2::ZERO);
    }

    /// Writes a position computed by the integrator, keeping the velocity.
    pub(crate) fn advance(&mut self, key: &NodeKey, position: Pos2, velocity: Vec2) {
        self.positions.insert(key.clone(), position);
        self.velocities.insert(key.clone(), velocity);
    }

    /// Zeroes the velocity of a node without touching its position.
    pub fn stop(&mut self, key: &NodeKey) {
        if let Some(v) = self.velocities.get_mut(key) {
            *v = Vec2::ZERO;
        }
    }

    pub fn positions(&self) -> &HashMap<NodeKey, Pos2> {
        &self.positions
    }

    pub fn is_positioned(&self, key: &NodeKey) -> bool {
        self.positions
            .get(key)
            .map(|p| p.is_finite())
            .unwrap_or(false)
    }

    /// Drops entries for nodes not accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&NodeKey) -> bool) {
        self.positions.retain(|k, _| keep(k));
        self.velocities.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.velocities.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
