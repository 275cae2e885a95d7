//! Axis-separated collision resolution against the tile grid.
//!
//! Every body resolves its vertical motion and its horizontal motion in two
//! independent passes. All probes sample the grid at the body's position before
//! the move, so a fast body may sink into a tile for a tick before landing.

use stagehop_core::{
    Aabb, FAST_FALL_BONUS, GRAVITY, HEAD_BUMP_DAMPING, MAX_FALL_SPEED, TILE_SIZE,
};

use crate::{body::KinematicBody, grid::TileGrid};

/// Inset of the player's horizontal probes from its top and bottom edges.
const PLAYER_PROBE_INSET: f32 = 2.0;
/// Inset of autonomous bodies' horizontal probes from their top and bottom edges.
const PATROL_PROBE_INSET: f32 = 1.0;
/// Offset above the head at which an upward impact is reported.
const IMPACT_LIFT: f32 = 4.0;

/// What happens to vertical velocity when a falling body lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Landing {
    /// Velocity becomes zero.
    Stop,
    /// Velocity becomes the provided upward value.
    Rebound(f32),
}

/// Per-kind parameters of the vertical pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalProfile {
    /// Fall speed at which velocity is clamped instead of accelerated.
    pub max_fall_speed: Option<f32>,
    /// Whether the fast-fall modifier is held.
    pub fast_fall: bool,
    /// Whether the head line is probed for ceilings.
    pub head_bump: bool,
    /// Landing rule.
    pub landing: Landing,
}

impl VerticalProfile {
    /// Profile of the player-controlled character.
    #[must_use]
    pub const fn player(fast_fall: bool) -> Self {
        Self {
            max_fall_speed: Some(MAX_FALL_SPEED),
            fast_fall,
            head_bump: true,
            landing: Landing::Stop,
        }
    }

    /// Profile of an autonomous body with the provided landing rule.
    #[must_use]
    pub const fn falling(landing: Landing) -> Self {
        Self {
            max_fall_speed: None,
            fast_fall: false,
            head_bump: false,
            landing,
        }
    }
}

/// Result of a vertical pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VerticalOutcome {
    /// The body was snapped onto the tile row under its feet.
    Landed,
    /// The body's head hit a ceiling; the impact point should be struck.
    HeadBump {
        /// World x of the impact point.
        x: f32,
        /// World y of the impact point.
        y: f32,
    },
    /// The body moved freely.
    Airborne,
}

/// Resolves body motion against a borrowed tile grid.
#[derive(Clone, Copy, Debug)]
pub struct CollisionResolver<'grid> {
    grid: &'grid TileGrid,
}

impl<'grid> CollisionResolver<'grid> {
    /// Creates a resolver over the provided grid.
    #[must_use]
    pub const fn new(grid: &'grid TileGrid) -> Self {
        Self { grid }
    }

    /// Reports whether solid ground lies one pixel under either foot corner.
    #[must_use]
    pub fn is_grounded(&self, bounds: &Aabb) -> bool {
        let below = bounds.bottom() + 1.0;
        self.grid.is_solid_at(bounds.x, below) || self.grid.is_solid_at(bounds.right(), below)
    }

    /// Integrates gravity and resolves vertical motion for one tick.
    pub fn resolve_vertical(
        &self,
        body: &mut KinematicBody,
        profile: VerticalProfile,
    ) -> VerticalOutcome {
        body.vy = match profile.max_fall_speed {
            Some(limit) if body.vy >= limit => limit,
            _ if profile.fast_fall && body.vy > 0.0 => body.vy + GRAVITY + FAST_FALL_BONUS,
            _ => body.vy + GRAVITY,
        };

        let bounds = body.bounds;
        let foot = bounds.bottom();
        let head = bounds.y;
        let probe = |y: f32| {
            self.grid.is_solid_at(bounds.x, y) || self.grid.is_solid_at(bounds.right(), y)
        };

        if body.vy > 0.0 && probe(foot) {
            let row = (foot / TILE_SIZE).floor();
            body.bounds.y = row * TILE_SIZE - bounds.height;
            body.vy = match profile.landing {
                Landing::Stop => 0.0,
                Landing::Rebound(velocity) => velocity,
            };
            return VerticalOutcome::Landed;
        }

        if profile.head_bump && probe(head) {
            let row = (head / TILE_SIZE).floor();
            body.bounds.y = (row + 1.0) * TILE_SIZE + 1.0;
            body.vy = -body.vy * HEAD_BUMP_DAMPING;
            return VerticalOutcome::HeadBump {
                x: bounds.right(),
                y: head - IMPACT_LIFT,
            };
        }

        body.bounds.y += body.vy;
        VerticalOutcome::Airborne
    }

    /// Walks a rectangle by `speed` in each held direction, left first.
    ///
    /// A blocked step snaps the leading edge one pixel outside the blocking tile.
    pub fn resolve_walk(&self, bounds: &mut Aabb, left: bool, right: bool, speed: f32) {
        if left {
            let edge = bounds.x - speed;
            if self.blocked(edge, bounds, PLAYER_PROBE_INSET) {
                let column = (edge / TILE_SIZE).floor();
                bounds.x = (column + 1.0) * TILE_SIZE + 1.0;
            } else {
                bounds.x = edge;
            }
        }
        if right {
            let edge = bounds.right() + speed;
            if self.blocked(edge, bounds, PLAYER_PROBE_INSET) {
                let column = (edge / TILE_SIZE).floor();
                bounds.x = column * TILE_SIZE - 1.0 - bounds.width;
            } else {
                bounds.x += speed;
            }
        }
    }

    /// Moves an autonomous body by its horizontal velocity.
    ///
    /// When the leading edge would enter a solid tile the velocity reverses and
    /// the body stays put for the tick.
    pub fn resolve_patrol(&self, body: &mut KinematicBody) {
        let edge = if body.vx < 0.0 {
            body.bounds.x + body.vx
        } else if body.vx > 0.0 {
            body.bounds.right() + body.vx
        } else {
            return;
        };

        if self.blocked(edge, &body.bounds, PATROL_PROBE_INSET) {
            body.vx = -body.vx;
        } else {
            body.bounds.x += body.vx;
        }
    }

    fn blocked(&self, edge: f32, bounds: &Aabb, inset: f32) -> bool {
        self.grid.is_solid_at(edge, bounds.y + inset)
            || self.grid.is_solid_at(edge, bounds.bottom() - inset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehop_core::Layer;

    fn floor_grid() -> TileGrid {
        TileGrid::from_rows(["0000", "0000", "1111"], 3)
    }

    #[test]
    fn falling_body_lands_on_tile_boundary_and_stops() {
        let grid = floor_grid();
        let resolver = CollisionResolver::new(&grid);
        let mut body = KinematicBody::new(Aabb::new(0.0, 40.0, 32.0, 32.0), Layer::Overworld)
            .with_velocity(0.0, 3.0);

        let outcome = resolver.resolve_vertical(&mut body, VerticalProfile::falling(Landing::Stop));

        assert_eq!(outcome, VerticalOutcome::Landed);
        assert_eq!(body.vy, 0.0);
        assert_eq!(body.bounds.bottom(), 64.0);
    }

    #[test]
    fn rebounding_body_keeps_fixed_upward_velocity() {
        let grid = floor_grid();
        let resolver = CollisionResolver::new(&grid);
        let mut body = KinematicBody::new(Aabb::new(0.0, 60.0, 8.0, 8.0), Layer::Overworld)
            .with_velocity(4.0, 2.0);

        let outcome =
            resolver.resolve_vertical(&mut body, VerticalProfile::falling(Landing::Rebound(-5.0)));

        assert_eq!(outcome, VerticalOutcome::Landed);
        assert_eq!(body.vy, -5.0);
        assert_eq!(body.bounds.bottom(), 64.0);
    }

    #[test]
    fn player_fall_speed_is_clamped() {
        let grid = TileGrid::from_rows(["0", "0"], 2);
        let resolver = CollisionResolver::new(&grid);
        let mut body = KinematicBody::new(Aabb::new(0.0, 0.0, 32.0, 32.0), Layer::Overworld)
            .with_velocity(0.0, 20.0);

        let _ = resolver.resolve_vertical(&mut body, VerticalProfile::player(false));

        assert_eq!(body.vy, MAX_FALL_SPEED);
    }

    #[test]
    fn fast_fall_adds_extra_gravity_only_while_descending() {
        let grid = TileGrid::from_rows(["0", "0", "0"], 3);
        let resolver = CollisionResolver::new(&grid);
        let mut falling = KinematicBody::new(Aabb::new(0.0, 0.0, 32.0, 32.0), Layer::Overworld)
            .with_velocity(0.0, 1.0);
        let mut rising = falling.with_velocity(0.0, -1.0);

        let _ = resolver.resolve_vertical(&mut falling, VerticalProfile::player(true));
        let _ = resolver.resolve_vertical(&mut rising, VerticalProfile::player(true));

        assert_eq!(falling.vy, 1.0 + GRAVITY + FAST_FALL_BONUS);
        assert_eq!(rising.vy, -1.0 + GRAVITY);
    }

    #[test]
    fn head_bump_snaps_below_ceiling_and_reports_impact() {
        let grid = TileGrid::from_rows(["2222", "0000", "0000"], 3);
        let resolver = CollisionResolver::new(&grid);
        let mut body = KinematicBody::new(Aabb::new(10.0, 30.0, 32.0, 32.0), Layer::Overworld)
            .with_velocity(0.0, -10.0);

        let outcome = resolver.resolve_vertical(&mut body, VerticalProfile::player(false));

        assert_eq!(outcome, VerticalOutcome::HeadBump { x: 42.0, y: 26.0 });
        assert_eq!(body.bounds.y, 33.0);
        assert!((body.vy - 7.6).abs() < 1e-5);
    }

    #[test]
    fn walking_into_a_wall_snaps_outside_it() {
        let grid = TileGrid::from_rows(["1001", "1001"], 2);
        let resolver = CollisionResolver::new(&grid);

        let mut right = Aabb::new(62.0, 10.0, 32.0, 32.0);
        resolver.resolve_walk(&mut right, false, true, 4.0);
        assert_eq!(right.right(), 95.0);

        let mut left = Aabb::new(33.0, 10.0, 32.0, 32.0);
        resolver.resolve_walk(&mut left, true, false, 4.0);
        assert_eq!(left.x, 33.0);

        let mut free = Aabb::new(40.0, 10.0, 16.0, 16.0);
        resolver.resolve_walk(&mut free, true, false, 4.0);
        assert_eq!(free.x, 36.0);
    }

    #[test]
    fn patrolling_body_reverses_without_moving() {
        let grid = TileGrid::from_rows(["1001"], 1);
        let resolver = CollisionResolver::new(&grid);
        let mut body = KinematicBody::new(Aabb::new(33.0, 0.0, 32.0, 32.0), Layer::Overworld)
            .with_velocity(-2.0, 0.0);

        resolver.resolve_patrol(&mut body);
        assert_eq!(body.vx, 2.0);
        assert_eq!(body.bounds.x, 33.0);

        resolver.resolve_patrol(&mut body);
        assert_eq!(body.vx, 2.0);
        assert_eq!(body.bounds.x, 35.0);
    }
}
