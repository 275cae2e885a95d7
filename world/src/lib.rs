#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Stagehop.

pub mod body;
pub mod camera;
pub mod collision;
pub mod grid;
pub mod player;
pub mod stage;
pub mod warp;

mod enemies;
mod items;
mod population;
mod projectiles;

use stagehop_core::{
    Command, Event, InputFrame, Layer, PipeId, PipeKind, Timestamp, TILE_SIZE, WELCOME_BANNER,
};

pub use body::KinematicBody;
pub use camera::Camera;
pub use collision::CollisionResolver;
pub use grid::TileGrid;
pub use player::{Player, PowerUp};
pub use stage::Stage;
pub use warp::{Pipe, WarpGraph};

use collision::VerticalOutcome;
use enemies::Enemy;
use grid::Strike;
use items::Item;
use population::{Goal, Identities};
use projectiles::Projectile;

const DEFAULT_VIEWPORT_WIDTH: f32 = 1024.0;
const DEFAULT_VIEWPORT_HEIGHT: f32 = 512.0;

/// Represents the authoritative Stagehop world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    stage: Stage,
    grid: TileGrid,
    warps: WarpGraph,
    player: Player,
    enemies: Vec<Enemy>,
    items: Vec<Item>,
    projectiles: Vec<Projectile>,
    goal: Option<Goal>,
    camera: Camera,
    ids: Identities,
    now: Timestamp,
}

impl World {
    /// Creates an empty world with the default viewport, ready for a stage.
    #[must_use]
    pub fn new() -> Self {
        let mut world = Self {
            banner: WELCOME_BANNER,
            stage: Stage::default(),
            grid: TileGrid::default(),
            warps: WarpGraph::default(),
            player: Player::spawn(0.0, 0.0, Layer::Overworld),
            enemies: Vec::new(),
            items: Vec::new(),
            projectiles: Vec::new(),
            goal: None,
            camera: Camera::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            ids: Identities::default(),
            now: Timestamp::ZERO,
        };
        world.load(Stage::default(), &mut Vec::new());
        world
    }

    fn load(&mut self, stage: Stage, out_events: &mut Vec<Event>) {
        let mut grid = stage.grid();
        let warps = WarpGraph::discover(&stage, &grid);
        let mut ids = Identities::default();
        let population = population::populate(&grid, &warps, &mut ids);

        let layer = population.player.body().layer;
        grid.set_active_layer(layer);
        self.camera.show_layer(layer, grid.underground_row());
        self.camera
            .follow(population.player.bounds().center_x(), grid.width());

        tracing::info!(
            columns = grid.columns(),
            rows = grid.rows(),
            underground_row = grid.underground_row(),
            enemies = population.enemies.len(),
            items = population.items.len(),
            pipes = warps.pipes().len(),
            "stage loaded"
        );
        out_events.push(Event::StageLoaded {
            columns: grid.columns(),
            rows: grid.rows(),
            underground_row: grid.underground_row(),
        });

        self.stage = stage;
        self.grid = grid;
        self.warps = warps;
        self.player = population.player;
        self.enemies = population.enemies;
        self.items = population.items;
        self.projectiles.clear();
        self.goal = population.goal;
        self.ids = ids;
    }

    fn tick(&mut self, now: Timestamp, input: InputFrame, out_events: &mut Vec<Event>) {
        self.now = now;
        out_events.push(Event::TimeAdvanced { now });

        if self.player.is_alive() {
            self.handle_input(&input, now, out_events);
            let outcome = self
                .player
                .advance(&CollisionResolver::new(&self.grid), &input);
            if let VerticalOutcome::HeadBump { x, y } = outcome {
                self.strike(x, y, out_events);
            }
        }

        let active = self.grid.active_layer();
        let resolver = CollisionResolver::new(&self.grid);

        for enemy in self
            .enemies
            .iter_mut()
            .filter(|enemy| enemy.layer() == active)
        {
            enemy.update(&resolver, now);
            enemy.touch_player(&mut self.player, now, out_events);
            for projectile in &self.projectiles {
                enemy.touch_projectile(projectile, out_events);
            }
        }
        self.enemies.retain(Enemy::is_alive);

        for item in self.items.iter_mut().filter(|item| item.layer() == active) {
            item.update(&resolver);
            item.touch_player(&mut self.player, now, out_events);
        }
        self.items.retain(Item::is_alive);

        for projectile in &mut self.projectiles {
            if projectile.layer() == active {
                projectile.update(&resolver);
            }
            projectile.expire(now, out_events);
        }
        self.projectiles.retain(Projectile::is_alive);

        if let Some(goal) = self.goal.as_mut().filter(|goal| goal.layer() == active) {
            goal.touch_player(&self.player, out_events);
        }

        self.camera
            .follow(self.player.bounds().center_x(), self.grid.width());
        let ready = self.player.is_alive() && self.warp_route().is_some();
        self.player.set_warp_ready(ready);
    }

    fn handle_input(&mut self, input: &InputFrame, now: Timestamp, out_events: &mut Vec<Event>) {
        if input.jump && self.player.try_jump(&CollisionResolver::new(&self.grid)) {
            out_events.push(Event::PlayerJumped);
        }
        if input.warp {
            self.warp(out_events);
        }
        if input.fire && self.player.can_fire() {
            let projectile = self.ids.next_projectile();
            self.projectiles.push(Projectile::launch(
                projectile,
                self.player.bounds(),
                self.grid.active_layer(),
                now,
            ));
            out_events.push(Event::ProjectileFired { projectile });
        }
    }

    fn strike(&mut self, x: f32, y: f32, out_events: &mut Vec<Event>) {
        let Some(cell) = self.grid.cell_at(x, y) else {
            return;
        };
        match self.grid.strike(cell) {
            Some(Strike::Broke) => out_events.push(Event::BlockBroken { cell }),
            Some(Strike::Opened(Some(kind))) => {
                let item = self.ids.next_item();
                self.items.push(Item::spawn(
                    item,
                    kind,
                    cell.left(),
                    cell.top() - TILE_SIZE,
                    self.grid.layer_of_row(cell.row()),
                ));
                out_events.push(Event::ItemReleased { item, kind, cell });
            }
            Some(Strike::Opened(None)) | None => {}
        }
    }

    fn warp_route(&self) -> Option<(PipeId, PipeId)> {
        let bounds = self.player.bounds();
        if !CollisionResolver::new(&self.grid).is_grounded(&bounds) {
            return None;
        }
        let foot = bounds.bottom();
        let on_warp = [bounds.x, bounds.right()]
            .into_iter()
            .any(|x| self.grid.pipe_kind_at(x, foot) == PipeKind::Warp);
        if !on_warp {
            return None;
        }
        let entry = self
            .warps
            .entry_under(foot, bounds.center_x(), self.grid.active_layer())?;
        let exit = self.warps.destination(entry.id())?;
        Some((entry.id(), exit.id()))
    }

    fn warp(&mut self, out_events: &mut Vec<Event>) {
        let Some((from, to)) = self.warp_route() else {
            return;
        };
        let Some(exit) = self.warps.pipe(to).copied() else {
            return;
        };
        let layer = exit.layer();
        self.player
            .teleport(exit.bounds().x, exit.bounds().y, layer);
        self.grid.set_active_layer(layer);
        self.camera.show_layer(layer, self.grid.underground_row());
        tracing::info!(from = from.get(), to = to.get(), ?layer, "player warped");
        out_events.push(Event::PlayerWarped { from, to, layer });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadStage { source } => world.load(Stage::parse(&source), out_events),
        Command::ConfigureViewport { width, height } => {
            world.camera.resize(width, height);
            world
                .camera
                .follow(world.player.bounds().center_x(), world.grid.width());
        }
        Command::Tick { now, input } => world.tick(now, input, out_events),
        Command::EndFrame { now } => {
            world.now = world.now.max(now);
            world.player.resolve_invincibility(now, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use stagehop_core::{
        Aabb, CellCoord, EnemySnapshot, ItemSnapshot, Layer, PipeSnapshot, PlayerSnapshot,
        ProjectileSnapshot, TileSnapshot, Timestamp, TILE_SIZE,
    };

    use super::{Camera, Stage, TileGrid, WarpGraph, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the parsed stage text.
    #[must_use]
    pub fn stage(world: &World) -> &Stage {
        &world.stage
    }

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Provides read-only access to the discovered pipes and their warp links.
    #[must_use]
    pub fn warp_graph(world: &World) -> &WarpGraph {
        &world.warps
    }

    /// Layer currently simulated and rendered.
    #[must_use]
    pub fn active_layer(world: &World) -> Layer {
        world.grid.active_layer()
    }

    /// Clock reading of the most recent tick or frame.
    #[must_use]
    pub fn now(world: &World) -> Timestamp {
        world.now
    }

    /// Captures the player's state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures the enemies of the active layer in spawn order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        let active = world.grid.active_layer();
        world
            .enemies
            .iter()
            .filter(|enemy| enemy.layer() == active)
            .map(|enemy| enemy.snapshot())
            .collect()
    }

    /// Captures the items of the active layer in spawn order.
    #[must_use]
    pub fn items(world: &World) -> Vec<ItemSnapshot> {
        let active = world.grid.active_layer();
        world
            .items
            .iter()
            .filter(|item| item.layer() == active)
            .map(|item| item.snapshot())
            .collect()
    }

    /// Captures the live fireballs of the active layer in launch order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        let active = world.grid.active_layer();
        world
            .projectiles
            .iter()
            .filter(|projectile| projectile.layer() == active)
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Captures the pipes of the active layer in discovery order.
    #[must_use]
    pub fn pipes(world: &World) -> Vec<PipeSnapshot> {
        let active = world.grid.active_layer();
        world
            .warps
            .pipes()
            .iter()
            .filter(|pipe| pipe.layer() == active)
            .map(|pipe| pipe.snapshot())
            .collect()
    }

    /// Goal pole area when it belongs to the active layer.
    #[must_use]
    pub fn goal(world: &World) -> Option<Aabb> {
        let active = world.grid.active_layer();
        world
            .goal
            .filter(|goal| goal.layer() == active)
            .map(|goal| goal.bounds())
    }

    /// Provides read-only access to the camera.
    #[must_use]
    pub fn camera(world: &World) -> &Camera {
        &world.camera
    }

    /// Solid cells of the active layer that fall inside the camera's horizontal span.
    #[must_use]
    pub fn visible_tiles(world: &World) -> Vec<TileSnapshot> {
        let grid = &world.grid;
        let camera = world.camera.offset();
        let first_column = (camera.x / TILE_SIZE).floor().max(0.0) as u32;
        let last_column = (((camera.x + world.camera.width()) / TILE_SIZE).ceil().max(0.0)
            as u32)
            .min(grid.columns());

        let mut tiles = Vec::new();
        for row in grid.row_range(grid.active_layer()) {
            for column in first_column..last_column {
                let cell = CellCoord::new(column, row);
                let terrain = grid.terrain_at(cell);
                if terrain.is_solid() {
                    tiles.push(TileSnapshot { cell, terrain });
                }
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehop_core::{Aabb, DefeatCause, EnemyKind, PowerState};

    fn loaded(source: &str) -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LoadStage {
                source: source.to_owned(),
            },
            &mut events,
        );
        (world, events)
    }

    #[test]
    fn new_world_is_empty() {
        let world = World::new();
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::tile_grid(&world).columns(), 0);
        assert!(query::enemies(&world).is_empty());
        assert_eq!(query::player(&world).power, PowerState::Default);
    }

    #[test]
    fn load_reports_dimensions_and_spawns_markers() {
        let (world, events) = loaded("0000G\n0S4M0\n11111\n*\n11111\n");
        assert_eq!(
            events,
            vec![Event::StageLoaded {
                columns: 5,
                rows: 4,
                underground_row: 3,
            }]
        );
        let player = query::player(&world);
        assert_eq!(player.bounds.x, 32.0);
        assert_eq!(player.bounds.y, 32.0);
        assert_eq!(player.layer, Layer::Overworld);
        assert_eq!(query::items(&world).len(), 1);
        assert_eq!(query::enemies(&world).len(), 1);
        let goal = query::goal(&world).expect("goal spawned");
        assert_eq!(goal.bottom(), 32.0);
        assert_eq!(goal.height, 224.0);
    }

    #[test]
    fn missing_start_marker_spawns_at_origin() {
        let (world, _) = loaded("000\n111\n");
        let player = query::player(&world);
        assert_eq!((player.bounds.x, player.bounds.y), (0.0, 0.0));
    }

    #[test]
    fn visible_tiles_cover_only_the_active_layer() {
        let (world, _) = loaded("S00\n121\n*\n111\n");
        let tiles = query::visible_tiles(&world);
        assert_eq!(tiles.len(), 3);
        assert!(tiles.iter().all(|tile| tile.cell.row() == 1));
    }

    #[test]
    fn fireball_defeats_enemy_before_expiring_on_the_same_tick() {
        let (mut world, _) = loaded("0000000S\n00000000\n11111111\n");
        let projectile = world.ids.next_projectile();
        world.projectiles.push(Projectile::launch(
            projectile,
            Aabb::new(0.0, 32.0, 32.0, 32.0),
            Layer::Overworld,
            Timestamp::ZERO,
        ));
        let enemy = world.ids.next_enemy();
        world.enemies.push(Enemy::spawn(
            enemy,
            EnemyKind::Walker,
            32.0,
            32.0,
            Layer::Overworld,
        ));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                now: Timestamp::from_millis(5_000),
                input: InputFrame::default(),
            },
            &mut events,
        );

        let defeated = events
            .iter()
            .position(|event| {
                *event
                    == Event::EnemyDefeated {
                        enemy,
                        kind: EnemyKind::Walker,
                        cause: DefeatCause::Projectile,
                    }
            })
            .expect("walker defeated by the fireball");
        let expired = events
            .iter()
            .position(|event| *event == Event::ProjectileExpired { projectile })
            .expect("fireball expired");
        assert!(defeated < expired);
        assert!(query::enemies(&world).is_empty());
        assert!(query::projectiles(&world).is_empty());
    }

    #[test]
    fn fireball_left_behind_by_a_warp_still_expires() {
        let (mut world, _) = loaded(
            "1000000001\n1000S00001\n1000W!0001\n1000IW0001\n1111111111\n*\n\
             1000000001\n1000W!0001\n1000WO0001\n1111111111\n",
        );
        world
            .player
            .power_up(PowerUp::Fire, Timestamp::ZERO, &mut Vec::new());

        let tick = |world: &mut World, millis: u64, input: InputFrame| {
            let mut events = Vec::new();
            apply(
                world,
                Command::Tick {
                    now: Timestamp::from_millis(millis),
                    input,
                },
                &mut events,
            );
            events
        };

        let fired = tick(
            &mut world,
            16,
            InputFrame {
                fire: true,
                ..InputFrame::default()
            },
        );
        let projectile = fired
            .iter()
            .find_map(|event| match event {
                Event::ProjectileFired { projectile } => Some(*projectile),
                _ => None,
            })
            .expect("fireball launched");

        let warped = tick(
            &mut world,
            32,
            InputFrame {
                warp: true,
                ..InputFrame::default()
            },
        );
        assert!(warped
            .iter()
            .any(|event| matches!(event, Event::PlayerWarped { .. })));
        assert_eq!(query::active_layer(&world), Layer::Underground);
        assert_eq!(world.projectiles.len(), 1);
        assert!(query::projectiles(&world).is_empty());

        let late = tick(&mut world, 9_600, InputFrame::default());
        assert!(late.contains(&Event::ProjectileExpired { projectile }));
        assert!(world.projectiles.is_empty());
    }
}
