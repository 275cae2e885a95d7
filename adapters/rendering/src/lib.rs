#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Stagehop adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use stagehop_core::{EnemyKind, HeldButtons, ItemKind, PowerState, Terrain, Timestamp};
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Fixed colors used for every drawable in a Stagehop scene.
pub mod palette {
    use super::Color;

    /// Sky behind the stage.
    pub const SKY: Color = Color::from_rgb_u8(0, 0, 255);
    /// Ground tiles.
    pub const GROUND: Color = Color::from_rgb_u8(100, 60, 20);
    /// Breakable blocks.
    pub const BLOCK: Color = Color::from_rgb_u8(150, 150, 150);
    /// Item boxes.
    pub const ITEM_BOX: Color = Color::from_rgb_u8(255, 200, 0);
    /// Pipe cells.
    pub const PIPE: Color = Color::from_rgb_u8(180, 255, 100);
    /// Goal pole.
    pub const GOAL: Color = Color::from_rgb_u8(240, 240, 240);
    /// Small player.
    pub const PLAYER: Color = Color::from_rgb_u8(220, 40, 40);
    /// Player carrying fire power.
    pub const PLAYER_FIRE: Color = Color::from_rgb_u8(255, 140, 60);
    /// Player under a star.
    pub const PLAYER_STAR: Color = Color::from_rgb_u8(255, 240, 120);
    /// Walker enemies.
    pub const WALKER: Color = Color::from_rgb_u8(140, 80, 40);
    /// Turtle enemies and their shells.
    pub const TURTLE: Color = Color::from_rgb_u8(40, 170, 60);
    /// Pipe flowers.
    pub const FLOWER: Color = Color::from_rgb_u8(230, 60, 120);
    /// Coins.
    pub const COIN: Color = Color::from_rgb_u8(255, 215, 0);
    /// Mushrooms.
    pub const MUSHROOM: Color = Color::from_rgb_u8(200, 30, 30);
    /// Stars.
    pub const STAR: Color = Color::from_rgb_u8(255, 255, 80);
    /// Fire flowers.
    pub const FIRE_FLOWER: Color = Color::from_rgb_u8(255, 110, 0);
    /// Fireballs.
    pub const FIREBALL: Color = Color::from_rgb_u8(255, 80, 0);
    /// Heads-up text.
    pub const HUD_TEXT: Color = Color::from_rgb_u8(255, 255, 255);
}

/// Color of a terrain cell, or `None` when the cell is not drawn.
#[must_use]
pub const fn terrain_color(terrain: Terrain) -> Option<Color> {
    match terrain {
        Terrain::Ground => Some(palette::GROUND),
        Terrain::Block => Some(palette::BLOCK),
        Terrain::ItemBox => Some(palette::ITEM_BOX),
        Terrain::Pipe => Some(palette::PIPE),
        Terrain::Empty
        | Terrain::Coin
        | Terrain::Goal
        | Terrain::Start
        | Terrain::EnemySpawn => None,
    }
}

/// Color of the player at `now`.
///
/// A flashing player blinks out on odd milliseconds.
#[must_use]
pub const fn player_color(power: PowerState, now: Timestamp) -> Option<Color> {
    match power {
        PowerState::Default | PowerState::Super => Some(palette::PLAYER),
        PowerState::Fire => Some(palette::PLAYER_FIRE),
        PowerState::Star => Some(palette::PLAYER_STAR),
        PowerState::Flash => {
            if now.as_millis() % 2 == 1 {
                None
            } else {
                Some(palette::PLAYER)
            }
        }
    }
}

/// Color of an enemy kind.
#[must_use]
pub const fn enemy_color(kind: EnemyKind) -> Color {
    match kind {
        EnemyKind::Walker => palette::WALKER,
        EnemyKind::Turtle => palette::TURTLE,
        EnemyKind::Flower => palette::FLOWER,
    }
}

/// Color of an item kind.
#[must_use]
pub const fn item_color(kind: ItemKind) -> Color {
    match kind {
        ItemKind::Coin => palette::COIN,
        ItemKind::Mushroom => palette::MUSHROOM,
        ItemKind::Star => palette::STAR,
        ItemKind::FireFlower => palette::FIRE_FLOWER,
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Logical buttons held while the frame was captured.
    pub buttons: HeldButtons,
}

/// Size of the visible window in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    size: Vec2,
}

impl Viewport {
    /// Creates a viewport, rejecting non-positive or non-finite dimensions.
    pub fn new(width: f32, height: f32) -> Result<Self, RenderingError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(RenderingError::InvalidViewport { width, height });
        }
        Ok(Self {
            size: Vec2::new(width, height),
        })
    }

    /// Visible width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    /// Visible height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.size.y
    }
}

/// Filled rectangle positioned in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneRect {
    /// World position of the top-left corner.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
    /// Fill color.
    pub color: Color,
}

impl SceneRect {
    /// Creates a new rectangle descriptor.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: Color) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            color,
        }
    }

    /// Returns the part of the rectangle above `clip_bottom`, if any.
    #[must_use]
    pub fn clipped_above(self, clip_bottom: f32) -> Option<Self> {
        if self.position.y >= clip_bottom {
            return None;
        }
        let visible = (clip_bottom - self.position.y).min(self.size.y);
        if visible <= 0.0 {
            return None;
        }
        Some(Self {
            size: Vec2::new(self.size.x, visible),
            ..self
        })
    }
}

/// Scene description: world rectangles seen through a camera plus the coin tally.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// World offset subtracted from every rectangle before drawing.
    pub camera: Vec2,
    /// Visible window.
    pub viewport: Viewport,
    /// Rectangles in draw order.
    pub rects: Vec<SceneRect>,
    /// Coins collected so far.
    pub coins: u32,
    /// Optional status line shown under the coin tally.
    pub status: Option<String>,
}

impl Scene {
    /// Creates an empty scene looking through `viewport` at the world origin.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            camera: Vec2::ZERO,
            viewport,
            rects: Vec::new(),
            coins: 0,
            status: None,
        }
    }

    /// Removes every rectangle while keeping the camera and viewport.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Appends a rectangle to the draw list.
    pub fn push(&mut self, rect: SceneRect) {
        self.rects.push(rect);
    }

    /// Translates a world position into screen space.
    #[must_use]
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world - self.camera
    }

    /// Screen-space rectangles overlapping the viewport, in draw order.
    pub fn visible_rects(&self) -> impl Iterator<Item = SceneRect> + '_ {
        let width = self.viewport.width();
        let height = self.viewport.height();
        self.rects
            .iter()
            .map(|rect| SceneRect {
                position: self.to_screen(rect.position),
                ..*rect
            })
            .filter(move |rect| {
                rect.position.x + rect.size.x >= 0.0
                    && rect.position.x <= width
                    && rect.position.y + rect.size.y >= 0.0
                    && rect.position.y <= height
            })
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Stagehop scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the real frame delta and the
    /// buttons held during the frame, and rebuilds the scene before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RenderingError {
    /// Viewport dimensions must be positive and finite.
    #[error("viewport must have a positive size (received {width}x{height})")]
    InvalidViewport {
        /// Provided width.
        width: f32,
        /// Provided height.
        height: f32,
    },
}
