//! Player body and power state machine.

use stagehop_core::{
    Aabb, Event, InputFrame, Layer, PlayerSnapshot, PowerState, Timestamp, FLASH_DURATION,
    JUMP_VELOCITY, LARGE_PLAYER_HEIGHT, PLAYER_WALK_SPEED, SMALL_PLAYER_HEIGHT, STAR_DURATION,
    STOMP_REBOUND, TILE_SIZE,
};

use crate::{
    body::KinematicBody,
    collision::{CollisionResolver, VerticalOutcome, VerticalProfile},
};

/// Power-ups an item can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerUp {
    /// Grow to the Super tier.
    Super,
    /// Enter the Fire tier.
    Fire,
    /// Start a star invincibility window.
    Star,
}

/// The player-controlled character.
#[derive(Clone, Debug)]
pub struct Player {
    body: KinematicBody,
    power: PowerState,
    previous: PowerState,
    invincible_until: Option<Timestamp>,
    coins: u32,
    jumping: bool,
    warp_ready: bool,
}

impl Player {
    /// Spawns a small player with its top-left corner at the provided point.
    #[must_use]
    pub fn spawn(x: f32, y: f32, layer: Layer) -> Self {
        Self {
            body: KinematicBody::new(Aabb::new(x, y, TILE_SIZE, SMALL_PLAYER_HEIGHT), layer),
            power: PowerState::Default,
            previous: PowerState::Default,
            invincible_until: None,
            coins: 0,
            jumping: false,
            warp_ready: false,
        }
    }

    /// Current body.
    #[must_use]
    pub const fn body(&self) -> &KinematicBody {
        &self.body
    }

    /// Current hitbox.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.body.bounds
    }

    /// Current power state.
    #[must_use]
    pub const fn power(&self) -> PowerState {
        self.power
    }

    /// State restored when a Star or Flash window ends.
    #[must_use]
    pub const fn previous_power(&self) -> PowerState {
        self.previous
    }

    /// End of the current invincibility window.
    #[must_use]
    pub const fn invincible_until(&self) -> Option<Timestamp> {
        self.invincible_until
    }

    /// Coins collected so far.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    /// Whether the player is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.body.alive
    }

    /// Whether a warp attempt would succeed right now.
    #[must_use]
    pub const fn warp_ready(&self) -> bool {
        self.warp_ready
    }

    /// Captures an immutable view of the player.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            bounds: self.body.bounds,
            power: self.power,
            previous_power: self.previous,
            invincible_until: self.invincible_until,
            coins: self.coins,
            alive: self.body.alive,
            jumping: self.jumping,
            warp_ready: self.warp_ready,
            layer: self.body.layer,
        }
    }

    /// Whether the player may throw a fireball.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.power == PowerState::Fire
            || (self.power == PowerState::Star && self.previous == PowerState::Fire)
    }

    /// Starts a jump when standing on solid ground and not already jumping.
    pub fn try_jump(&mut self, resolver: &CollisionResolver<'_>) -> bool {
        if self.jumping || !resolver.is_grounded(&self.body.bounds) {
            return false;
        }
        self.jumping = true;
        self.body.vy = JUMP_VELOCITY;
        true
    }

    /// Runs the vertical then horizontal collision passes for one tick.
    pub fn advance(
        &mut self,
        resolver: &CollisionResolver<'_>,
        input: &InputFrame,
    ) -> VerticalOutcome {
        let outcome =
            resolver.resolve_vertical(&mut self.body, VerticalProfile::player(input.fast_fall));
        if outcome == VerticalOutcome::Landed {
            self.jumping = false;
        }
        resolver.resolve_walk(
            &mut self.body.bounds,
            input.move_left,
            input.move_right,
            PLAYER_WALK_SPEED,
        );
        outcome
    }

    /// Applies a power-up collected at `now`.
    pub fn power_up(&mut self, power_up: PowerUp, now: Timestamp, out_events: &mut Vec<Event>) {
        match power_up {
            PowerUp::Super => match self.power {
                PowerState::Super | PowerState::Fire => {}
                PowerState::Default | PowerState::Flash => {
                    self.transition(PowerState::Super, out_events);
                    self.grow();
                }
                PowerState::Star => {
                    if self.previous == PowerState::Default {
                        self.previous = PowerState::Super;
                        self.grow();
                    }
                }
            },
            PowerUp::Fire => {
                if self.power == PowerState::Star {
                    self.previous = PowerState::Fire;
                } else {
                    self.transition(PowerState::Fire, out_events);
                }
                self.grow();
            }
            PowerUp::Star => {
                match self.power {
                    PowerState::Star | PowerState::Flash => {}
                    tier => self.previous = tier,
                }
                self.transition(PowerState::Star, out_events);
                self.invincible_until = Some(now.saturating_add(STAR_DURATION));
            }
        }
    }

    /// Applies a hit taken at `now`.
    ///
    /// Hits inside an invincibility window are ignored, as are hits on a Star or
    /// Flash overlay whose window elapsed but has not been resolved yet.
    pub fn power_down(&mut self, now: Timestamp, out_events: &mut Vec<Event>) {
        if self.invincible_until.is_some_and(|until| now < until) {
            return;
        }
        match self.power {
            PowerState::Super => {
                self.previous = PowerState::Default;
                self.transition(PowerState::Flash, out_events);
                self.invincible_until = Some(now.saturating_add(FLASH_DURATION));
                self.shrink();
            }
            PowerState::Fire => {
                self.previous = PowerState::Super;
                self.transition(PowerState::Flash, out_events);
                self.invincible_until = Some(now.saturating_add(FLASH_DURATION));
            }
            PowerState::Default => {
                self.body.kill();
                tracing::info!(x = self.body.bounds.x, y = self.body.bounds.y, "player died");
                out_events.push(Event::PlayerDied);
            }
            PowerState::Star | PowerState::Flash => {}
        }
    }

    /// Ends an elapsed invincibility window, reverting Star and Flash overlays.
    pub fn resolve_invincibility(&mut self, now: Timestamp, out_events: &mut Vec<Event>) {
        let Some(until) = self.invincible_until else {
            return;
        };
        if now < until {
            return;
        }
        if matches!(self.power, PowerState::Star | PowerState::Flash) {
            self.transition(self.previous, out_events);
        }
        self.invincible_until = None;
    }

    /// Extends the invincibility window to at least `until`.
    pub fn grant_grace(&mut self, until: Timestamp) {
        self.invincible_until = Some(
            self.invincible_until
                .map_or(until, |current| current.max(until)),
        );
    }

    /// Bounces the player upward after a stomp.
    pub fn rebound(&mut self) {
        self.body.vy = STOMP_REBOUND;
    }

    /// Adds a coin to the tally and returns the new total.
    pub fn collect_coin(&mut self) -> u32 {
        self.coins = self.coins.saturating_add(1);
        self.coins
    }

    pub(crate) fn teleport(&mut self, x: f32, floor_y: f32, layer: Layer) {
        self.body.bounds.x = x;
        self.body.bounds.y = floor_y - self.body.bounds.height;
        self.body.layer = layer;
    }

    pub(crate) fn set_warp_ready(&mut self, ready: bool) {
        self.warp_ready = ready;
    }

    fn transition(&mut self, to: PowerState, out_events: &mut Vec<Event>) {
        if self.power == to {
            return;
        }
        out_events.push(Event::PowerChanged {
            from: self.power,
            to,
        });
        self.power = to;
    }

    fn grow(&mut self) {
        if self.body.bounds.height < LARGE_PLAYER_HEIGHT {
            self.body.bounds.height = LARGE_PLAYER_HEIGHT;
            self.body.bounds.y -= LARGE_PLAYER_HEIGHT - SMALL_PLAYER_HEIGHT;
        }
    }

    fn shrink(&mut self) {
        if self.body.bounds.height > SMALL_PLAYER_HEIGHT {
            self.body.bounds.height = SMALL_PLAYER_HEIGHT;
            self.body.bounds.y += LARGE_PLAYER_HEIGHT - SMALL_PLAYER_HEIGHT;
        }
    }
}
