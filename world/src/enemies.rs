use std::time::Duration;

use stagehop_core::{
    Aabb, DefeatCause, EnemyId, EnemyKind, EnemyPose, EnemySnapshot, Event, FlowerPhase, Layer,
    PowerState, Timestamp, TurtleState, SHELL_KICK_GRACE, STOMP_MARGIN, TILE_SIZE,
};

use crate::{
    body::KinematicBody,
    collision::{CollisionResolver, Landing, VerticalProfile},
    player::Player,
    projectiles::Projectile,
};

const WALK_SPEED: f32 = 2.0;
const SHELL_SPEED: f32 = 4.0;

const HIDDEN_TIME: Duration = Duration::from_millis(2_000);
const APPEAR_TIME: Duration = Duration::from_millis(1_000);
const APPEARED_TIME: Duration = Duration::from_millis(2_000);
const HIDE_TIME: Duration = Duration::from_millis(1_000);

#[derive(Clone, Copy, Debug)]
struct FlowerCycle {
    phase: FlowerPhase,
    phase_start: Option<Timestamp>,
    mouth_y: f32,
}

impl FlowerCycle {
    fn advance(&mut self, bounds: &mut Aabb, now: Timestamp) {
        let start = *self.phase_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        let bottom = self.mouth_y;
        let top = bottom - TILE_SIZE;
        let progress = |length: Duration| (elapsed.as_secs_f32() / length.as_secs_f32()).min(1.0);

        match self.phase {
            FlowerPhase::Hidden => {
                bounds.y = bottom;
                if elapsed >= HIDDEN_TIME {
                    self.enter(FlowerPhase::Appearing, now);
                }
            }
            FlowerPhase::Appearing => {
                bounds.y = bottom - TILE_SIZE * progress(APPEAR_TIME);
                if elapsed >= APPEAR_TIME {
                    self.enter(FlowerPhase::Appeared, now);
                    bounds.y = top;
                }
            }
            FlowerPhase::Appeared => {
                bounds.y = top;
                if elapsed >= APPEARED_TIME {
                    self.enter(FlowerPhase::Hiding, now);
                }
            }
            FlowerPhase::Hiding => {
                bounds.y = top + TILE_SIZE * progress(HIDE_TIME);
                if elapsed >= HIDE_TIME {
                    self.enter(FlowerPhase::Hidden, now);
                    bounds.y = bottom;
                }
            }
        }
    }

    fn enter(&mut self, phase: FlowerPhase, now: Timestamp) {
        self.phase = phase;
        self.phase_start = Some(now);
    }
}

#[derive(Clone, Copy, Debug)]
enum Behavior {
    Walker,
    Turtle(TurtleState),
    Flower(FlowerCycle),
}

/// Enemy body plus its kind-specific state.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    id: EnemyId,
    body: KinematicBody,
    behavior: Behavior,
}

impl Enemy {
    /// Spawns an enemy on the cell whose top-left corner is given.
    ///
    /// A flower's cell sits directly above the mouth of its pipe.
    pub(crate) fn spawn(id: EnemyId, kind: EnemyKind, x: f32, y: f32, layer: Layer) -> Self {
        let body = KinematicBody::new(Aabb::new(x, y, TILE_SIZE, TILE_SIZE), layer);
        let behavior = match kind {
            EnemyKind::Walker => Behavior::Walker,
            EnemyKind::Turtle => Behavior::Turtle(TurtleState::Walk),
            EnemyKind::Flower => {
                return Self::flower(id, x + TILE_SIZE / 2.0, y + TILE_SIZE, layer);
            }
        };
        Self {
            id,
            body: body.with_velocity(-WALK_SPEED, 0.0),
            behavior,
        }
    }

    /// Plants a hidden flower centred on `center_x` with its top at the pipe mouth.
    fn flower(id: EnemyId, center_x: f32, mouth_y: f32, layer: Layer) -> Self {
        let bounds = Aabb::new(center_x - TILE_SIZE / 2.0, mouth_y, TILE_SIZE, TILE_SIZE);
        Self {
            id,
            body: KinematicBody::new(bounds, layer),
            behavior: Behavior::Flower(FlowerCycle {
                phase: FlowerPhase::Hidden,
                phase_start: None,
                mouth_y,
            }),
        }
    }

    pub(crate) const fn is_alive(&self) -> bool {
        self.body.alive
    }

    pub(crate) const fn layer(&self) -> Layer {
        self.body.layer
    }

    const fn kind(&self) -> EnemyKind {
        match self.behavior {
            Behavior::Walker => EnemyKind::Walker,
            Behavior::Turtle(_) => EnemyKind::Turtle,
            Behavior::Flower(_) => EnemyKind::Flower,
        }
    }

    fn is_retracted(&self) -> bool {
        matches!(
            self.behavior,
            Behavior::Flower(FlowerCycle {
                phase: FlowerPhase::Hidden,
                ..
            })
        )
    }

    /// Moves the enemy for one tick.
    pub(crate) fn update(&mut self, resolver: &CollisionResolver<'_>, now: Timestamp) {
        if !self.body.alive {
            return;
        }
        match &mut self.behavior {
            Behavior::Walker | Behavior::Turtle(_) => {
                resolver.resolve_patrol(&mut self.body);
                let _ = resolver
                    .resolve_vertical(&mut self.body, VerticalProfile::falling(Landing::Stop));
            }
            Behavior::Flower(cycle) => cycle.advance(&mut self.body.bounds, now),
        }
    }

    /// Resolves contact with the player.
    pub(crate) fn touch_player(
        &mut self,
        player: &mut Player,
        now: Timestamp,
        out_events: &mut Vec<Event>,
    ) {
        if self.is_retracted() || !self.body.touches(player.body()) {
            return;
        }
        if player.power() == PowerState::Star {
            self.defeat(DefeatCause::Star, out_events);
            return;
        }

        let stomped = player.bounds().bottom() <= self.body.bounds.y + STOMP_MARGIN;
        match self.behavior {
            Behavior::Turtle(state) if stomped => {
                let next = match state {
                    TurtleState::Walk | TurtleState::Kicked => {
                        self.body.vx = 0.0;
                        TurtleState::Stamped
                    }
                    TurtleState::Stamped => self.kick(player, now),
                };
                self.set_shell(next, out_events);
                player.rebound();
            }
            Behavior::Turtle(TurtleState::Stamped) => {
                let next = self.kick(player, now);
                self.set_shell(next, out_events);
            }
            _ if stomped => {
                self.defeat(DefeatCause::Stomp, out_events);
                player.rebound();
            }
            _ => player.power_down(now, out_events),
        }
    }

    /// Resolves contact with a fireball; the fireball survives the hit.
    pub(crate) fn touch_projectile(
        &mut self,
        projectile: &Projectile,
        out_events: &mut Vec<Event>,
    ) {
        if self.is_retracted() || !self.body.touches(projectile.body()) {
            return;
        }
        self.defeat(DefeatCause::Projectile, out_events);
    }

    fn kick(&mut self, player: &mut Player, now: Timestamp) -> TurtleState {
        self.body.vx = if player.bounds().x > self.body.bounds.x {
            -SHELL_SPEED
        } else {
            SHELL_SPEED
        };
        player.grant_grace(now.saturating_add(SHELL_KICK_GRACE));
        TurtleState::Kicked
    }

    fn set_shell(&mut self, state: TurtleState, out_events: &mut Vec<Event>) {
        self.behavior = Behavior::Turtle(state);
        out_events.push(Event::ShellChanged {
            enemy: self.id,
            state,
        });
    }

    fn defeat(&mut self, cause: DefeatCause, out_events: &mut Vec<Event>) {
        self.body.kill();
        out_events.push(Event::EnemyDefeated {
            enemy: self.id,
            kind: self.kind(),
            cause,
        });
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        let pose = match self.behavior {
            Behavior::Walker => EnemyPose::Walker,
            Behavior::Turtle(state) => EnemyPose::Turtle(state),
            Behavior::Flower(cycle) => EnemyPose::Flower {
                phase: cycle.phase,
                mouth_y: cycle.mouth_y,
            },
        };
        EnemySnapshot {
            id: self.id,
            bounds: self.body.bounds,
            vx: self.body.vx,
            pose,
            layer: self.body.layer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grid::TileGrid, player::PowerUp};

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    #[test]
    fn flower_cycles_through_its_phases() {
        let grid = TileGrid::from_rows(["00", "FF"], 2);
        let resolver = CollisionResolver::new(&grid);
        let mut flower = Enemy::flower(EnemyId::new(0), 32.0, 32.0, Layer::Overworld);
        let phase = |enemy: &Enemy| match enemy.snapshot().pose {
            EnemyPose::Flower { phase, .. } => phase,
            other => panic!("unexpected pose {other:?}"),
        };

        flower.update(&resolver, at(1_000));
        assert_eq!(phase(&flower), FlowerPhase::Hidden);
        flower.update(&resolver, at(3_000));
        assert_eq!(phase(&flower), FlowerPhase::Appearing);
        flower.update(&resolver, at(3_500));
        assert_eq!(flower.snapshot().bounds.y, 16.0);
        flower.update(&resolver, at(4_000));
        assert_eq!(phase(&flower), FlowerPhase::Appeared);
        assert_eq!(flower.snapshot().bounds.y, 0.0);
        flower.update(&resolver, at(6_000));
        assert_eq!(phase(&flower), FlowerPhase::Hiding);
        flower.update(&resolver, at(7_000));
        assert_eq!(phase(&flower), FlowerPhase::Hidden);
        assert_eq!(flower.snapshot().bounds.y, 32.0);
    }

    #[test]
    fn hidden_flower_ignores_contact() {
        let mut flower = Enemy::flower(EnemyId::new(0), 48.0, 64.0, Layer::Overworld);
        let mut player = Player::spawn(32.0, 50.0, Layer::Overworld);
        let mut events = Vec::new();
        flower.touch_player(&mut player, at(0), &mut events);
        assert!(events.is_empty());
        assert!(player.is_alive());
    }

    #[test]
    fn side_contact_with_walker_hurts_player() {
        let mut walker = Enemy::spawn(
            EnemyId::new(3),
            EnemyKind::Walker,
            40.0,
            64.0,
            Layer::Overworld,
        );
        let mut player = Player::spawn(20.0, 64.0, Layer::Overworld);
        let mut events = Vec::new();
        walker.touch_player(&mut player, at(0), &mut events);
        assert!(walker.is_alive());
        assert!(!player.is_alive());
        assert_eq!(events, vec![Event::PlayerDied]);
    }

    #[test]
    fn stomp_defeats_walker_and_bounces_player() {
        let mut walker = Enemy::spawn(
            EnemyId::new(3),
            EnemyKind::Walker,
            40.0,
            64.0,
            Layer::Overworld,
        );
        let mut player = Player::spawn(40.0, 40.0, Layer::Overworld);
        let mut events = Vec::new();
        walker.touch_player(&mut player, at(0), &mut events);
        assert!(!walker.is_alive());
        assert_eq!(player.body().vy, -10.0);
        assert_eq!(
            events,
            vec![Event::EnemyDefeated {
                enemy: EnemyId::new(3),
                kind: EnemyKind::Walker,
                cause: DefeatCause::Stomp,
            }]
        );
    }

    fn shell(state: TurtleState) -> Enemy {
        let mut turtle = Enemy::spawn(
            EnemyId::new(5),
            EnemyKind::Turtle,
            40.0,
            64.0,
            Layer::Overworld,
        );
        turtle.behavior = Behavior::Turtle(state);
        turtle.body.vx = match state {
            TurtleState::Kicked => -SHELL_SPEED,
            TurtleState::Walk | TurtleState::Stamped => 0.0,
        };
        turtle
    }

    fn pose(enemy: &Enemy) -> EnemyPose {
        enemy.snapshot().pose
    }

    #[test]
    fn flower_spawns_hidden_above_its_pipe_mouth() {
        let flower = Enemy::spawn(
            EnemyId::new(1),
            EnemyKind::Flower,
            32.0,
            32.0,
            Layer::Underground,
        );
        let snapshot = flower.snapshot();
        assert_eq!(
            snapshot.pose,
            EnemyPose::Flower {
                phase: FlowerPhase::Hidden,
                mouth_y: 64.0,
            }
        );
        assert_eq!((snapshot.bounds.x, snapshot.bounds.y), (32.0, 64.0));
        assert_eq!(snapshot.layer, Layer::Underground);
    }

    #[test]
    fn star_contact_defeats_any_enemy() {
        let mut walker = Enemy::spawn(
            EnemyId::new(3),
            EnemyKind::Walker,
            40.0,
            64.0,
            Layer::Overworld,
        );
        let mut player = Player::spawn(20.0, 64.0, Layer::Overworld);
        player.power_up(PowerUp::Star, at(0), &mut Vec::new());

        let mut events = Vec::new();
        walker.touch_player(&mut player, at(100), &mut events);
        assert!(!walker.is_alive());
        assert!(player.is_alive());
        assert_eq!(player.power(), PowerState::Star);
        assert_eq!(
            events,
            vec![Event::EnemyDefeated {
                enemy: EnemyId::new(3),
                kind: EnemyKind::Walker,
                cause: DefeatCause::Star,
            }]
        );
    }

    #[test]
    fn side_contact_with_kicked_shell_powers_player_down() {
        let mut turtle = shell(TurtleState::Kicked);
        let mut player = Player::spawn(20.0, 64.0, Layer::Overworld);
        let mut events = Vec::new();
        turtle.touch_player(&mut player, at(0), &mut events);
        assert!(!player.is_alive());
        assert!(turtle.is_alive());
        assert_eq!(pose(&turtle), EnemyPose::Turtle(TurtleState::Kicked));
        assert_eq!(events, vec![Event::PlayerDied]);
    }

    #[test]
    fn stomping_kicked_shell_stops_it() {
        let mut turtle = shell(TurtleState::Kicked);
        let mut player = Player::spawn(40.0, 40.0, Layer::Overworld);
        let mut events = Vec::new();
        turtle.touch_player(&mut player, at(0), &mut events);
        assert!(player.is_alive());
        assert_eq!(player.body().vy, -10.0);
        assert_eq!(pose(&turtle), EnemyPose::Turtle(TurtleState::Stamped));
        assert_eq!(turtle.snapshot().vx, 0.0);
        assert_eq!(
            events,
            vec![Event::ShellChanged {
                enemy: EnemyId::new(5),
                state: TurtleState::Stamped,
            }]
        );
    }

    #[test]
    fn side_contact_with_stamped_shell_kicks_it_away() {
        let mut turtle = shell(TurtleState::Stamped);
        let mut player = Player::spawn(20.0, 64.0, Layer::Overworld);
        let mut events = Vec::new();
        turtle.touch_player(&mut player, at(100), &mut events);
        assert!(player.is_alive());
        assert_eq!(pose(&turtle), EnemyPose::Turtle(TurtleState::Kicked));
        assert_eq!(turtle.snapshot().vx, 4.0);
        assert_eq!(player.snapshot().invincible_until, Some(at(900)));
        assert_eq!(
            events,
            vec![Event::ShellChanged {
                enemy: EnemyId::new(5),
                state: TurtleState::Kicked,
            }]
        );

        let mut turtle = shell(TurtleState::Stamped);
        let mut player = Player::spawn(60.0, 64.0, Layer::Overworld);
        turtle.touch_player(&mut player, at(100), &mut Vec::new());
        assert_eq!(turtle.snapshot().vx, -4.0);
    }
}
