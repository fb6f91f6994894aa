//! Force-directed layout.
//!
//! The simulator is a plain step function over the model's layout. It never
//! schedules itself: whoever drives the interactive loop calls
//! [`PhysicsSimulator::tick`] every [`TICK_INTERVAL`] while it is running.
//!
//! Forces, per tick, over the simulated subset:
//! - inverse-square repulsion between every pair
//! - collision push when two bodies overlap
//! - Hookean springs along edges
//! - weak gravity toward the origin
//!
//! Pinned and dragged nodes push others around but are never moved.

use crate::lens::LensContext;
use crate::model::{GraphModel, SceneView};
use crate::layout::Layout;
use crate::seed::GOLDEN_ANGLE;
use emath::{Pos2, Vec2};
use orbit_core::{EdgeKind, NodeKey, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::trace;

/// How often the driver should call `tick`.
pub const TICK_INTERVAL: Duration = Duration::from_millis(33);

/// Below this distance two bodies are treated as coincident.
const COINCIDENT: f32 = 1e-3;

/// Tuning for the force model. Forces are in world units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub repulsion: f32,
    /// Repulsion distance floor, so near-coincident nodes do not explode.
    pub min_distance: f32,
    pub collision_strength: f32,
    pub collision_padding: f32,
    pub primary_radius: f32,
    pub secondary_radius: f32,
    pub relational_rest_length: f32,
    pub relational_stiffness: f32,
    pub containment_rest_length: f32,
    pub containment_stiffness: f32,
    pub center_gravity: f32,
    /// Fraction of velocity kept each tick.
    pub damping: f32,
    pub max_speed: f32,
    /// Kinetic energy under which the layout counts as settled.
    pub settle_energy: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion: 2000.0,
            min_distance: 12.0,
            collision_strength: 0.5,
            collision_padding: 6.0,
            primary_radius: 18.0,
            secondary_radius: 10.0,
            relational_rest_length: 140.0,
            relational_stiffness: 0.02,
            containment_rest_length: 60.0,
            containment_stiffness: 0.06,
            center_gravity: 0.002,
            damping: 0.85,
            max_speed: 40.0,
            settle_energy: 0.05,
        }
    }
}

impl PhysicsConfig {
    pub fn radius(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Primary => self.primary_radius,
            NodeKind::Secondary => self.secondary_radius,
        }
    }

    fn spring(&self, kind: EdgeKind) -> (f32, f32) {
        match kind {
            EdgeKind::Relational => (self.relational_rest_length, self.relational_stiffness),
            EdgeKind::Containment => (self.containment_rest_length, self.containment_stiffness),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulationState {
    #[default]
    Idle,
    Running,
}

/// Summary of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Bodies that took part in the step, fixed ones included.
    pub simulated: usize,
    pub kinetic_energy: f32,
}

impl StepReport {
    pub fn is_settled(&self, threshold: f32) -> bool {
        self.kinetic_energy <= threshold
    }
}

#[derive(Debug, Default)]
pub struct PhysicsSimulator {
    config: PhysicsConfig,
    state: SimulationState,
    ticks: u64,
}

impl PhysicsSimulator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            state: SimulationState::Idle,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn start(&mut self) {
        self.state = SimulationState::Running;
    }

    pub fn stop(&mut self) {
        self.state = SimulationState::Idle;
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimulationState::Running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances the layout by one step. Does nothing while idle.
    ///
    /// With an active lens only the relevant nodes are simulated.
    pub fn tick(&mut self, model: &mut GraphModel, lens: Option<&LensContext>) -> Option<StepReport> {
        if !self.is_running() {
            return None;
        }
        let relevant = lens.filter(|l| l.is_active()).map(|l| l.relevant());
        let (layout, scene) = model.physics_view();
        let report = step(&self.config, layout, &scene, relevant);
        self.ticks += 1;
        trace!(
            "Tick {}: {} bodies, energy {:.3}",
            self.ticks,
            report.simulated,
            report.kinetic_energy
        );
        Some(report)
    }
}

struct Body<'a> {
    key: &'a NodeKey,
    position: Pos2,
    radius: f32,
    fixed: bool,
}

/// One integration step over `layout`.
///
/// Nodes outside `relevant` (when given) are stopped and left out. Nodes
/// without a finite position are skipped.
pub fn step(
    config: &PhysicsConfig,
    layout: &mut Layout,
    scene: &SceneView<'_>,
    relevant: Option<&HashSet<NodeKey>>,
) -> StepReport {
    let mut bodies: Vec<Body<'_>> = Vec::new();
    let mut slots: HashMap<&NodeKey, usize> = HashMap::new();

    for node in scene.nodes() {
        let key = &node.key;
        if relevant.is_some_and(|set| !set.contains(key)) {
            layout.stop(key);
            continue;
        }
        let Some(position) = layout.position(key).filter(|p| p.is_finite()) else {
            continue;
        };
        slots.insert(key, bodies.len());
        bodies.push(Body {
            key,
            position,
            radius: config.radius(key.kind),
            fixed: scene.is_fixed(key),
        });
    }

    let n = bodies.len();
    let mut forces = vec![Vec2::ZERO; n];

    // repulsion and collision
    for i in 0..n {
        for j in (i + 1)..n {
            let delta = bodies[i].position - bodies[j].position;
            let dist = delta.length();
            let dir = if dist > COINCIDENT {
                delta / dist
            } else {
                Vec2::angled((i * n + j) as f32 * GOLDEN_ANGLE)
            };

            let d = dist.max(config.min_distance);
            let mut push = config.repulsion / (d * d);
            let contact = bodies[i].radius + bodies[j].radius + config.collision_padding;
            if dist < contact {
                push += (contact - dist) * config.collision_strength;
            }

            let force = dir * push;
            if !bodies[i].fixed {
                forces[i] += force;
            }
            if !bodies[j].fixed {
                forces[j] -= force;
            }
        }
    }

    // springs
    for edge in scene.edges() {
        let (Some(&i), Some(&j)) = (slots.get(edge.a()), slots.get(edge.b())) else {
            continue;
        };
        let delta = bodies[j].position - bodies[i].position;
        let dist = delta.length();
        if dist <= COINCIDENT {
            continue;
        }
        let (rest, stiffness) = config.spring(edge.kind());
        let force = delta / dist * ((dist - rest) * stiffness);
        if !bodies[i].fixed {
            forces[i] += force;
        }
        if !bodies[j].fixed {
            forces[j] -= force;
        }
    }

    let mut energy = 0.0;
    for (body, force) in bodies.iter().zip(forces) {
        if body.fixed {
            layout.stop(body.key);
            continue;
        }
        let gravity = -body.position.to_vec2() * config.center_gravity;
        let mut velocity = cap_speed(
            (layout.velocity(body.key) + force + gravity) * config.damping,
            config.max_speed,
        );
        if !velocity.is_finite() {
            velocity = Vec2::ZERO;
        }
        let position = body.position + velocity;
        if position.is_finite() {
            layout.advance(body.key, position, velocity);
            energy += velocity.length_sq();
        }
    }

    StepReport {
        simulated: n,
        kinetic_energy: energy,
    }
}

fn cap_speed(velocity: Vec2, max: f32) -> Vec2 {
    let speed = velocity.length();
    if speed > max && speed > f32::EPSILON {
        velocity * (max / speed)
    } else {
        velocity
    }
}
