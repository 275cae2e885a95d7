use stagehop_core::{
    Aabb, CellCoord, EnemyId, EnemyKind, Event, ItemId, ItemKind, Layer, PipeKind, ProjectileId,
    Terrain, TILE_SIZE,
};

use crate::{
    enemies::Enemy, grid::TileGrid, items::Item, player::Player, warp::WarpGraph,
};

/// Number of tiles the goal pole rises above its marker cell.
const GOAL_RISE_TILES: f32 = 6.0;
const GOAL_HEIGHT_TILES: f32 = 7.0;

/// Monotonic id counters for spawned entities.
#[derive(Clone, Debug, Default)]
pub(crate) struct Identities {
    enemies: u32,
    items: u32,
    projectiles: u32,
}

impl Identities {
    pub(crate) fn next_enemy(&mut self) -> EnemyId {
        let id = EnemyId::new(self.enemies);
        self.enemies = self.enemies.saturating_add(1);
        id
    }

    pub(crate) fn next_item(&mut self) -> ItemId {
        let id = ItemId::new(self.items);
        self.items = self.items.saturating_add(1);
        id
    }

    pub(crate) fn next_projectile(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.projectiles);
        self.projectiles = self.projectiles.saturating_add(1);
        id
    }
}

/// Flag pole that ends the stage when touched.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Goal {
    bounds: Aabb,
    layer: Layer,
    reached: bool,
}

impl Goal {
    fn at(cell: CellCoord, layer: Layer) -> Self {
        Self {
            bounds: Aabb::new(
                cell.left(),
                cell.top() - GOAL_RISE_TILES * TILE_SIZE,
                TILE_SIZE,
                GOAL_HEIGHT_TILES * TILE_SIZE,
            ),
            layer,
            reached: false,
        }
    }

    pub(crate) const fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub(crate) const fn layer(&self) -> Layer {
        self.layer
    }

    /// Emits `GoalReached` the first time the player overlaps the pole.
    pub(crate) fn touch_player(&mut self, player: &Player, out_events: &mut Vec<Event>) {
        if self.reached || !player.is_alive() || !self.bounds.intersects(&player.bounds()) {
            return;
        }
        self.reached = true;
        tracing::info!(coins = player.coins(), "goal reached");
        out_events.push(Event::GoalReached);
    }
}

/// Entities spawned from the marker cells of a freshly loaded stage.
#[derive(Debug)]
pub(crate) struct Population {
    pub(crate) player: Player,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) items: Vec<Item>,
    pub(crate) goal: Option<Goal>,
}

/// Spawns the player, enemies, static coins, the goal and pipe flowers.
///
/// Cells are scanned row by row; a later start or goal marker replaces an
/// earlier one. Without a start marker the player appears at the origin.
pub(crate) fn populate(grid: &TileGrid, warps: &WarpGraph, ids: &mut Identities) -> Population {
    let mut player = None;
    let mut enemies = Vec::new();
    let mut items = Vec::new();
    let mut goal = None;

    for row in 0..grid.rows() {
        let layer = grid.layer_of_row(row);
        for column in 0..grid.columns() {
            let cell = CellCoord::new(column, row);
            let class = grid.class_at(cell);
            match class.terrain {
                Terrain::Coin => items.push(Item::spawn(
                    ids.next_item(),
                    ItemKind::Coin,
                    cell.left(),
                    cell.top(),
                    layer,
                )),
                Terrain::EnemySpawn => {
                    if let Some(kind) = class.enemy {
                        enemies.push(Enemy::spawn(
                            ids.next_enemy(),
                            kind,
                            cell.left(),
                            cell.top(),
                            layer,
                        ));
                    }
                }
                Terrain::Goal => goal = Some(Goal::at(cell, layer)),
                Terrain::Start => player = Some(Player::spawn(cell.left(), cell.top(), layer)),
                _ => {}
            }
        }
    }

    for pipe in warps.pipes() {
        if pipe.kind() == PipeKind::Flower {
            let bounds = pipe.bounds();
            enemies.push(Enemy::spawn(
                ids.next_enemy(),
                EnemyKind::Flower,
                bounds.center_x() - TILE_SIZE / 2.0,
                bounds.y - TILE_SIZE,
                pipe.layer(),
            ));
        }
    }

    Population {
        player: player.unwrap_or_else(|| Player::spawn(0.0, 0.0, Layer::Overworld)),
        enemies,
        items,
        goal,
    }
}
