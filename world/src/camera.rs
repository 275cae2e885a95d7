//! Viewport following the player.

use stagehop_core::{CameraOffset, Layer, TILE_SIZE};

/// Visible window and the world offset subtracted before drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    offset: CameraOffset,
    width: f32,
    height: f32,
}

impl Camera {
    /// Creates a camera with the provided viewport size at the world origin.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            offset: CameraOffset { x: 0.0, y: 0.0 },
            width,
            height,
        }
    }

    /// Current world offset.
    #[must_use]
    pub const fn offset(&self) -> CameraOffset {
        self.offset
    }

    /// Visible width in world pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Visible height in world pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    pub(crate) fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Centres the viewport on `focus_x`, keeping it inside `[0, stage_width]`.
    pub(crate) fn follow(&mut self, focus_x: f32, stage_width: f32) {
        self.offset.x = (focus_x - self.width / 2.0)
            .min(stage_width - self.width)
            .max(0.0);
    }

    /// Moves the viewport vertically to the top of `layer`.
    pub(crate) fn show_layer(&mut self, layer: Layer, underground_row: u32) {
        self.offset.y = match layer {
            Layer::Overworld => 0.0,
            Layer::Underground => underground_row as f32 * TILE_SIZE,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_clamps_to_stage_edges() {
        let mut camera = Camera::new(1024.0, 512.0);
        camera.follow(100.0, 4096.0);
        assert_eq!(camera.offset().x, 0.0);
        camera.follow(2000.0, 4096.0);
        assert_eq!(camera.offset().x, 1488.0);
        camera.follow(4000.0, 4096.0);
        assert_eq!(camera.offset().x, 3072.0);
    }

    #[test]
    fn narrow_stage_pins_camera_to_origin() {
        let mut camera = Camera::new(1024.0, 512.0);
        camera.follow(600.0, 320.0);
        assert_eq!(camera.offset().x, 0.0);
    }

    #[test]
    fn underground_layer_shifts_vertically() {
        let mut camera = Camera::new(1024.0, 512.0);
        camera.show_layer(Layer::Underground, 16);
        assert_eq!(camera.offset().y, 512.0);
        camera.show_layer(Layer::Overworld, 16);
        assert_eq!(camera.offset().y, 0.0);
    }
}
