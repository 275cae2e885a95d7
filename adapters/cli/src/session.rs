use std::time::Duration;

use glam::Vec2;
use serde::Serialize;
use stagehop_core::{
    Command, EnemyPose, Event, HeldButtons, Layer, PlayerSnapshot, Timestamp, TurtleState,
    TILE_SIZE,
};
use stagehop_rendering::{
    enemy_color, item_color, palette, player_color, terrain_color, Scene, SceneRect,
};
use stagehop_system_controls::Controls;
use stagehop_world::{self as world, query, World};

/// Longest real frame fed into the accumulator, keeping a stalled window from
/// replaying a burst of ticks.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);
const SHELL_HIGHLIGHT: f32 = 0.4;

/// Running counts of notable world events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct EventTally {
    jumps: u32,
    blocks_broken: u32,
    items_released: u32,
    items_collected: u32,
    enemies_defeated: u32,
    fireballs: u32,
    warps: u32,
    deaths: u32,
}

impl EventTally {
    fn record(&mut self, event: &Event) {
        let counter = match event {
            Event::PlayerJumped => &mut self.jumps,
            Event::BlockBroken { .. } => &mut self.blocks_broken,
            Event::ItemReleased { .. } => &mut self.items_released,
            Event::ItemCollected { .. } => &mut self.items_collected,
            Event::EnemyDefeated { .. } => &mut self.enemies_defeated,
            Event::ProjectileFired { .. } => &mut self.fireballs,
            Event::PlayerWarped { .. } => &mut self.warps,
            Event::PlayerDied => &mut self.deaths,
            _ => return,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Summary printed after a headless run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct HeadlessReport {
    ticks: u64,
    elapsed_ms: u64,
    active_layer: Layer,
    goal_reached: bool,
    enemies_remaining: usize,
    player: PlayerSnapshot,
    events: EventTally,
}

/// Drives the world at a fixed tick rate from variable-length frames.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    controls: Controls,
    pending: Vec<Event>,
    tick_interval: Duration,
    accumulator: Duration,
    elapsed: Duration,
    ticks: u64,
    end_frame_due: bool,
    goal_reached: bool,
    tally: EventTally,
}

impl Session {
    /// Wraps a freshly built world; `loaded` holds the events produced while building it.
    pub(crate) fn new(world: World, loaded: Vec<Event>, tick_interval: Duration) -> Self {
        let mut session = Self {
            world,
            controls: Controls::default(),
            pending: Vec::new(),
            tick_interval,
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            ticks: 0,
            end_frame_due: false,
            goal_reached: false,
            tally: EventTally::default(),
        };
        session.absorb(loaded);
        session
    }

    fn now(&self) -> Timestamp {
        Timestamp::ZERO.saturating_add(self.elapsed)
    }

    /// Feeds a real frame delta into the accumulator and runs every tick it covers.
    ///
    /// Returns the number of ticks simulated.
    pub(crate) fn advance(&mut self, frame: Duration, held: HeldButtons) -> u32 {
        self.accumulator += frame.min(MAX_FRAME_DELTA);
        let mut ticks = 0;
        while self.accumulator >= self.tick_interval {
            self.accumulator -= self.tick_interval;
            self.step(held);
            ticks += 1;
        }
        ticks
    }

    /// Runs one simulation tick, closing the previous frame first.
    pub(crate) fn step(&mut self, held: HeldButtons) {
        if self.end_frame_due {
            let now = self.now();
            self.apply(Command::EndFrame { now });
        }
        self.elapsed += self.tick_interval;
        let input = self.controls.handle(&self.pending, held);
        self.pending.clear();
        let now = self.now();
        self.apply(Command::Tick { now, input });
        self.ticks += 1;
        self.end_frame_due = true;
    }

    fn apply(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.absorb(events);
    }

    fn absorb(&mut self, events: Vec<Event>) {
        for event in &events {
            self.tally.record(event);
            match event {
                Event::GoalReached => self.goal_reached = true,
                Event::StageLoaded { .. } => self.goal_reached = false,
                _ => {}
            }
        }
        self.pending.extend(events);
    }

    /// Rebuilds `scene` from the current world state.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        let world = &self.world;
        let now = query::now(world);
        let camera = query::camera(world).offset();
        scene.camera = Vec2::new(camera.x, camera.y);
        scene.clear();

        for tile in query::visible_tiles(world) {
            if let Some(color) = terrain_color(tile.terrain) {
                scene.push(SceneRect::new(
                    tile.cell.left(),
                    tile.cell.top(),
                    TILE_SIZE,
                    TILE_SIZE,
                    color,
                ));
            }
        }

        if let Some(goal) = query::goal(world) {
            scene.push(SceneRect::new(
                goal.x,
                goal.y,
                goal.width,
                goal.height,
                palette::GOAL,
            ));
        }

        let player = query::player(world);
        if player.alive {
            if let Some(color) = player_color(player.power, now) {
                let bounds = player.bounds;
                scene.push(SceneRect::new(
                    bounds.x,
                    bounds.y,
                    bounds.width,
                    bounds.height,
                    color,
                ));
            }
        }

        for enemy in query::enemies(world) {
            let bounds = enemy.bounds;
            let color = enemy_color(enemy.kind());
            let rect = SceneRect::new(bounds.x, bounds.y, bounds.width, bounds.height, color);
            match enemy.pose {
                EnemyPose::Flower { mouth_y, .. } => {
                    if let Some(visible) = rect.clipped_above(mouth_y) {
                        scene.push(visible);
                    }
                }
                EnemyPose::Turtle(TurtleState::Stamped | TurtleState::Kicked) => {
                    scene.push(SceneRect {
                        color: color.lighten(SHELL_HIGHLIGHT),
                        ..rect
                    });
                }
                EnemyPose::Walker | EnemyPose::Turtle(TurtleState::Walk) => scene.push(rect),
            }
        }

        for item in query::items(world) {
            let bounds = item.bounds;
            scene.push(SceneRect::new(
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                item_color(item.kind),
            ));
        }

        for projectile in query::projectiles(world) {
            let bounds = projectile.bounds;
            scene.push(SceneRect::new(
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                palette::FIREBALL,
            ));
        }

        scene.coins = player.coins;
        scene.status = if !player.alive {
            Some("GAME OVER".to_owned())
        } else if self.goal_reached {
            Some("GOAL!".to_owned())
        } else {
            None
        };
    }

    /// Summarises the run so far.
    pub(crate) fn report(&self) -> HeadlessReport {
        HeadlessReport {
            ticks: self.ticks,
            elapsed_ms: self.now().as_millis(),
            active_layer: query::active_layer(&self.world),
            goal_reached: self.goal_reached,
            enemies_remaining: query::enemies(&self.world).len(),
            player: query::player(&self.world),
            events: self.tally,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehop_core::PowerState;
    use stagehop_rendering::Viewport;

    fn session(stage: &str, tick_interval: Duration) -> Session {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::LoadStage {
                source: stage.to_owned(),
            },
            &mut events,
        );
        Session::new(world, events, tick_interval)
    }

    fn scene() -> Scene {
        Scene::new(Viewport::new(1024.0, 512.0).expect("valid viewport"))
    }

    #[test]
    fn accumulator_runs_whole_ticks_only() {
        let mut session = session("S0\n11\n", Duration::from_millis(20));
        assert_eq!(session.advance(Duration::from_millis(50), HeldButtons::default()), 2);
        assert_eq!(session.advance(Duration::from_millis(10), HeldButtons::default()), 1);
        assert_eq!(session.advance(Duration::from_millis(5), HeldButtons::default()), 0);
        assert_eq!(session.report().ticks, 3);
        assert_eq!(session.report().elapsed_ms, 60);
    }

    #[test]
    fn stalled_frames_are_capped() {
        let mut session = session("S0\n11\n", Duration::from_millis(10));
        let ticks = session.advance(Duration::from_secs(5), HeldButtons::default());
        assert_eq!(ticks, 25);
    }

    #[test]
    fn held_jump_is_counted_once() {
        let mut session = session("S000\n1111\n", Duration::from_millis(16));
        let held = HeldButtons {
            jump: true,
            ..HeldButtons::default()
        };
        session.step(HeldButtons::default());
        for _ in 0..90 {
            session.step(held);
        }
        let report = session.report();
        assert_eq!(report.events.jumps, 1);
        assert_eq!(report.player.power, PowerState::Default);
    }

    #[test]
    fn scene_holds_terrain_player_and_coin_tally() {
        let session = session("S04\n111\n", Duration::from_millis(16));
        let mut scene = scene();
        session.populate_scene(&mut scene);

        let ground = scene
            .rects
            .iter()
            .filter(|rect| rect.color == palette::GROUND)
            .count();
        assert_eq!(ground, 3);
        assert!(scene.rects.iter().any(|rect| rect.color == palette::PLAYER));
        assert!(scene.rects.iter().any(|rect| rect.color == palette::COIN));
        assert_eq!(scene.coins, 0);
        assert_eq!(scene.status, None);
    }

    #[test]
    fn hidden_flower_is_not_drawn() {
        let session = session("S0000\n00FF0\n00FF0\n11111\n", Duration::from_millis(16));
        let mut scene = scene();
        session.populate_scene(&mut scene);
        assert!(!scene.rects.iter().any(|rect| rect.color == palette::FLOWER));
        assert!(scene.rects.iter().any(|rect| rect.color == palette::PIPE));
    }

    #[test]
    fn death_is_reported_in_the_scene() {
        let mut session = session("S0M\n111\n", Duration::from_millis(16));
        for _ in 0..60 {
            session.step(HeldButtons::default());
        }
        let mut scene = scene();
        session.populate_scene(&mut scene);
        assert_eq!(scene.status.as_deref(), Some("GAME OVER"));
        assert_eq!(session.report().events.deaths, 1);
    }
}
