//! Positional state shared by every simulated entity.

use stagehop_core::{Aabb, Layer};

/// Rectangle, velocity, liveness and owning layer of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicBody {
    /// Current hitbox in world pixels.
    pub bounds: Aabb,
    /// Horizontal velocity in pixels per tick.
    pub vx: f32,
    /// Vertical velocity in pixels per tick; positive values fall.
    pub vy: f32,
    /// Cleared once the entity should leave its collection.
    pub alive: bool,
    /// Layer the entity belongs to.
    pub layer: Layer,
}

impl KinematicBody {
    /// Creates a resting, living body.
    #[must_use]
    pub const fn new(bounds: Aabb, layer: Layer) -> Self {
        Self {
            bounds,
            vx: 0.0,
            vy: 0.0,
            alive: true,
            layer,
        }
    }

    /// Returns the body moving with the provided velocity.
    #[must_use]
    pub const fn with_velocity(self, vx: f32, vy: f32) -> Self {
        Self { vx, vy, ..self }
    }

    /// Marks the body for removal.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Reports whether both bodies are alive and overlap.
    #[must_use]
    pub fn touches(&self, other: &KinematicBody) -> bool {
        self.alive && other.alive && self.bounds.intersects(&other.bounds)
    }
}
