#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stagehop engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Adapters read immutable snapshots such as
//! [`PlayerSnapshot`] to present the simulation without touching its state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Stagehop.";

/// Side length of a square stage tile measured in world pixels.
pub const TILE_SIZE: f32 = 32.0;

/// Downward acceleration applied to every falling body once per tick.
pub const GRAVITY: f32 = 0.5;

/// Fall speed at which the player's vertical velocity stops growing.
pub const MAX_FALL_SPEED: f32 = 15.0;

/// Additional gravity applied while the fast-fall button is held during a fall.
pub const FAST_FALL_BONUS: f32 = 0.5;

/// Vertical velocity assigned to the player when a jump begins.
pub const JUMP_VELOCITY: f32 = -15.0;

/// Horizontal distance the player covers per tick while a direction is held.
pub const PLAYER_WALK_SPEED: f32 = 4.0;

/// Fraction of upward speed kept (and reversed) after the player's head hits a tile.
pub const HEAD_BUMP_DAMPING: f32 = 0.8;

/// Vertical velocity given to the player after stomping an enemy.
pub const STOMP_REBOUND: f32 = -10.0;

/// Tolerance, in pixels, below an enemy's top edge that still counts as a stomp.
pub const STOMP_MARGIN: f32 = 10.0;

/// Height of the player hitbox in the small power tiers.
pub const SMALL_PLAYER_HEIGHT: f32 = 32.0;

/// Height of the player hitbox in the grown power tiers.
pub const LARGE_PLAYER_HEIGHT: f32 = 64.0;

/// How long a star keeps the player invincible.
pub const STAR_DURATION: Duration = Duration::from_millis(5_000);

/// How long the damage flash lasts after a power-down.
pub const FLASH_DURATION: Duration = Duration::from_millis(1_500);

/// Grace window granted after kicking a turtle shell.
pub const SHELL_KICK_GRACE: Duration = Duration::from_millis(800);

/// Lifetime of a fireball before it expires.
pub const FIREBALL_LIFETIME: Duration = Duration::from_millis(5_000);

/// Describes how the player wants to move during a single simulation tick.
///
/// `move_left`, `move_right` and `fast_fall` mirror buttons held this tick,
/// while `jump`, `warp` and `fire` are discrete presses that only appear on
/// the tick a button goes down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Walk toward decreasing x while held.
    pub move_left: bool,
    /// Walk toward increasing x while held.
    pub move_right: bool,
    /// Fall faster while held and already descending.
    pub fast_fall: bool,
    /// Request a jump on this tick.
    pub jump: bool,
    /// Request a pipe warp on this tick.
    pub warp: bool,
    /// Request a fireball on this tick.
    pub fire: bool,
}

/// Logical buttons an input adapter reports as physically held during a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeldButtons {
    /// Left movement button.
    pub left: bool,
    /// Right movement button.
    pub right: bool,
    /// Fast-fall modifier button.
    pub fast_fall: bool,
    /// Jump button.
    pub jump: bool,
    /// Warp button.
    pub warp: bool,
    /// Fire button.
    pub fire: bool,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the current stage with one parsed from the provided source text.
    LoadStage {
        /// Raw stage text, one grid row per line.
        source: String,
    },
    /// Configures the size of the visible window used for camera following.
    ConfigureViewport {
        /// Visible width measured in world pixels.
        width: f32,
        /// Visible height measured in world pixels.
        height: f32,
    },
    /// Advances the simulation by one fixed tick.
    Tick {
        /// Monotonic clock reading for the tick.
        now: Timestamp,
        /// Player intent sampled for the tick.
        input: InputFrame,
    },
    /// Closes a rendered frame, resolving expired invincibility windows.
    EndFrame {
        /// Monotonic clock reading taken after the frame was presented.
        now: Timestamp,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a stage was loaded and entities were spawned.
    StageLoaded {
        /// Number of tile columns in the stage.
        columns: u32,
        /// Number of tile rows in the stage.
        rows: u32,
        /// First row that belongs to the underground layer.
        underground_row: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Clock reading of the tick that started.
        now: Timestamp,
    },
    /// Reports that the player left the ground.
    PlayerJumped,
    /// Reports that a breakable block was destroyed from below.
    BlockBroken {
        /// Cell that turned empty.
        cell: CellCoord,
    },
    /// Reports that an item box released its content.
    ItemReleased {
        /// Identifier assigned to the spawned item.
        item: ItemId,
        /// Kind of item that emerged.
        kind: ItemKind,
        /// Item box cell that was struck.
        cell: CellCoord,
    },
    /// Reports that the player picked up an item.
    ItemCollected {
        /// Identifier of the consumed item.
        item: ItemId,
        /// Kind of item consumed.
        kind: ItemKind,
    },
    /// Reports the player's new coin total.
    CoinsChanged {
        /// Coins collected so far.
        total: u32,
    },
    /// Reports a change of the player's power state.
    PowerChanged {
        /// State before the transition.
        from: PowerState,
        /// State after the transition.
        to: PowerState,
    },
    /// Reports that the player was hit while in the smallest tier.
    PlayerDied,
    /// Reports that an enemy was removed from play.
    EnemyDefeated {
        /// Identifier of the defeated enemy.
        enemy: EnemyId,
        /// Kind of the defeated enemy.
        kind: EnemyKind,
        /// What defeated it.
        cause: DefeatCause,
    },
    /// Reports that a turtle changed its shell state.
    ShellChanged {
        /// Identifier of the turtle.
        enemy: EnemyId,
        /// State the turtle entered.
        state: TurtleState,
    },
    /// Reports that the player launched a fireball.
    ProjectileFired {
        /// Identifier of the new fireball.
        projectile: ProjectileId,
    },
    /// Reports that a fireball ran out of time.
    ProjectileExpired {
        /// Identifier of the removed fireball.
        projectile: ProjectileId,
    },
    /// Reports that the player travelled through a warp pipe pair.
    PlayerWarped {
        /// Pipe the player entered.
        from: PipeId,
        /// Pipe the player emerged from.
        to: PipeId,
        /// Layer that became active.
        layer: Layer,
    },
    /// Reports that the player touched the goal pole.
    GoalReached,
}

/// Reasons an enemy can be defeated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefeatCause {
    /// The player landed on top of the enemy.
    Stomp,
    /// A fireball touched the enemy.
    Projectile,
    /// The player touched the enemy while star-powered.
    Star,
}

/// Monotonic simulation clock reading measured in milliseconds since start.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Clock reading at the start of a session.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a millisecond count.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds elapsed since the start of the session.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp `duration` after `self`, saturating at the maximum.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed between `earlier` and `self`, or zero if `earlier` is later.
    #[must_use]
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Location of a single stage cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// World-space x coordinate of the cell's left edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.column as f32 * TILE_SIZE
    }

    /// World-space y coordinate of the cell's top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.row as f32 * TILE_SIZE
    }
}

/// Axis-aligned rectangle in world pixels. `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Aabb {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal center.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Reports whether the rectangles share interior area.
    ///
    /// Rectangles that merely touch along an edge do not intersect, and empty
    /// rectangles never intersect anything.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 || other.width <= 0.0 || other.height <= 0.0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Vertical half of a stage that is simulated and drawn at a given moment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Rows above the underground marker.
    #[default]
    Overworld,
    /// Rows at or below the underground marker.
    Underground,
}

/// Terrain classification of a stage cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open air.
    #[default]
    Empty,
    /// Indestructible ground.
    Ground,
    /// Block that breaks when struck from below.
    Block,
    /// Box that releases an item when struck from below.
    ItemBox,
    /// Marker for a static coin spawn.
    Coin,
    /// Marker for the goal pole.
    Goal,
    /// Marker for the player's spawn point.
    Start,
    /// Marker for an enemy spawn.
    EnemySpawn,
    /// Part of a pipe.
    Pipe,
}

impl Terrain {
    /// Reports whether bodies collide with this terrain.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Ground | Self::Block | Self::ItemBox | Self::Pipe)
    }
}

/// Pipe classification of a stage cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipeKind {
    /// Decorative pipe; solid terrain only.
    #[default]
    Normal,
    /// Pipe that may be linked to another pipe for travel.
    Warp,
    /// Pipe that houses a flower enemy.
    Flower,
}

/// Enemy kinds that can appear in a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Plain walker that reverses at walls.
    Walker,
    /// Turtle that retreats into a kickable shell.
    Turtle,
    /// Pipe-dwelling flower that rises and hides on a timer.
    Flower,
}

/// Pickup kinds that can appear in a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Adds one coin.
    Coin,
    /// Grows the player to the Super tier.
    Mushroom,
    /// Grants timed invincibility.
    Star,
    /// Grants the Fire tier.
    FireFlower,
}

/// The four independent classifications derived from a stage character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileClass {
    /// Terrain kind, which alone decides solidity.
    pub terrain: Terrain,
    /// Item released when the cell is struck, if any.
    pub boxed: Option<ItemKind>,
    /// Enemy spawned from the cell, if any.
    pub enemy: Option<EnemyKind>,
    /// Pipe classification.
    pub pipe: PipeKind,
}

/// Power level automaton states of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    /// Small, one hit from death.
    #[default]
    Default,
    /// Grown.
    Super,
    /// Grown and able to throw fireballs.
    Fire,
    /// Invincible overlay on top of a remembered tier.
    Star,
    /// Short transitional window after taking damage.
    Flash,
}

/// Shell states of a turtle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurtleState {
    /// Walking like a plain enemy.
    Walk,
    /// Resting inside its shell.
    Stamped,
    /// Sliding shell.
    Kicked,
}

/// Phases of a flower's emerge cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowerPhase {
    /// Fully retracted inside the pipe.
    Hidden,
    /// Rising out of the pipe.
    Appearing,
    /// Fully risen.
    Appeared,
    /// Sinking back into the pipe.
    Hiding,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a fireball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle of a pipe: its index in discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipeId(u32);

impl PipeId {
    /// Creates a new pipe handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the pipe in the discovery-ordered collection.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    /// Current hitbox.
    pub bounds: Aabb,
    /// Current power state.
    pub power: PowerState,
    /// State restored when a Star or Flash window ends.
    pub previous_power: PowerState,
    /// End of the current invincibility window, if any.
    pub invincible_until: Option<Timestamp>,
    /// Coins collected so far.
    pub coins: u32,
    /// Whether the player is still alive.
    pub alive: bool,
    /// Whether the player is mid-jump.
    pub jumping: bool,
    /// Whether a warp attempt would currently succeed.
    pub warp_ready: bool,
    /// Layer the player occupies.
    pub layer: Layer,
}

/// Kind-specific pose of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum EnemyPose {
    /// Plain walker.
    Walker,
    /// Turtle with its shell state.
    Turtle(TurtleState),
    /// Flower with its phase and the pipe mouth it hides below.
    Flower {
        /// Current phase of the emerge cycle.
        phase: FlowerPhase,
        /// World y of the pipe mouth; nothing below it is visible.
        mouth_y: f32,
    },
}

/// Immutable representation of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Current hitbox.
    pub bounds: Aabb,
    /// Horizontal velocity.
    pub vx: f32,
    /// Kind-specific pose.
    pub pose: EnemyPose,
    /// Layer the enemy belongs to.
    pub layer: Layer,
}

impl EnemySnapshot {
    /// Kind of enemy described by the snapshot.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        match self.pose {
            EnemyPose::Walker => EnemyKind::Walker,
            EnemyPose::Turtle(_) => EnemyKind::Turtle,
            EnemyPose::Flower { .. } => EnemyKind::Flower,
        }
    }
}

/// Immutable representation of a single item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ItemSnapshot {
    /// Identifier of the item.
    pub id: ItemId,
    /// Kind of the item.
    pub kind: ItemKind,
    /// Current hitbox.
    pub bounds: Aabb,
    /// Layer the item belongs to.
    pub layer: Layer,
}

/// Immutable representation of a single fireball.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProjectileSnapshot {
    /// Identifier of the fireball.
    pub id: ProjectileId,
    /// Current hitbox.
    pub bounds: Aabb,
    /// Horizontal velocity.
    pub vx: f32,
    /// Moment the fireball disappears.
    pub expires_at: Timestamp,
}

/// Warp metadata attached to a warp pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WarpGate {
    /// Character linking this pipe to its partner.
    pub anchor: Option<char>,
    /// Whether the player may enter from this pipe.
    pub can_enter: bool,
    /// Whether the player may emerge from this pipe.
    pub can_exit: bool,
    /// Partner pipe, once paired.
    pub pair: Option<PipeId>,
}

/// Immutable representation of a single pipe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PipeSnapshot {
    /// Handle of the pipe.
    pub id: PipeId,
    /// Area covered by the pipe.
    pub bounds: Aabb,
    /// Pipe classification.
    pub kind: PipeKind,
    /// Warp metadata for warp pipes.
    pub warp: Option<WarpGate>,
    /// Layer the pipe belongs to.
    pub layer: Layer,
}

/// Terrain of a single visible cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSnapshot {
    /// Location of the cell.
    pub cell: CellCoord,
    /// Terrain at the cell.
    pub terrain: Terrain,
}

/// World-space offset subtracted from positions before drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CameraOffset {
    /// Horizontal offset in world pixels.
    pub x: f32,
    /// Vertical offset in world pixels.
    pub y: f32,
}
