use stagehop_core::{
    Aabb, Event, Layer, ProjectileId, ProjectileSnapshot, Timestamp, FIREBALL_LIFETIME,
};

use crate::{
    body::KinematicBody,
    collision::{CollisionResolver, Landing, VerticalProfile},
};

const FIREBALL_SIZE: f32 = 8.0;
const FIREBALL_SPEED: f32 = 4.0;
const FIREBALL_BOUNCE: f32 = -5.0;

/// Bouncing fireball thrown by the player.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    id: ProjectileId,
    body: KinematicBody,
    expires_at: Timestamp,
}

impl Projectile {
    /// Launches a fireball from the top-right corner of `thrower`.
    ///
    /// Fireballs always travel toward increasing x, whichever way the thrower faces.
    pub(crate) fn launch(id: ProjectileId, thrower: Aabb, layer: Layer, now: Timestamp) -> Self {
        let bounds = Aabb::new(thrower.right(), thrower.y, FIREBALL_SIZE, FIREBALL_SIZE);
        Self {
            id,
            body: KinematicBody::new(bounds, layer).with_velocity(FIREBALL_SPEED, 0.0),
            expires_at: now.saturating_add(FIREBALL_LIFETIME),
        }
    }

    pub(crate) const fn body(&self) -> &KinematicBody {
        &self.body
    }

    pub(crate) const fn is_alive(&self) -> bool {
        self.body.alive
    }

    pub(crate) const fn layer(&self) -> Layer {
        self.body.layer
    }

    /// Bounces the fireball along for one tick.
    pub(crate) fn update(&mut self, resolver: &CollisionResolver<'_>) {
        if !self.body.alive {
            return;
        }
        let _ = resolver.resolve_vertical(
            &mut self.body,
            VerticalProfile::falling(Landing::Rebound(FIREBALL_BOUNCE)),
        );
        resolver.resolve_patrol(&mut self.body);
    }

    /// Retires the fireball once its lifetime ends, whichever layer it was left on.
    pub(crate) fn expire(&mut self, now: Timestamp, out_events: &mut Vec<Event>) {
        if self.body.alive && now >= self.expires_at {
            self.body.kill();
            out_events.push(Event::ProjectileExpired {
                projectile: self.id,
            });
        }
    }

    pub(crate) const fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            bounds: self.body.bounds,
            vx: self.body.vx,
            expires_at: self.expires_at,
        }
    }
}
