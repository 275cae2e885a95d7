#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Stagehop.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Every drawable arrives as a filled rectangle in world coordinates; the
//! adapter only subtracts the camera offset and draws.

use anyhow::Result;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use stagehop_core::HeldButtons;
use stagehop_rendering::{
    palette, Color, FrameInput, Presentation, RenderingBackend, Scene, SceneRect,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const HUD_FONT_SIZE: f32 = 28.0;
const HUD_MARGIN: f32 = 12.0;

/// Samples the logical buttons from a key-state oracle.
///
/// `A`/`Left` and `D`/`Right` walk, `M`/`Down` both fast-falls and requests a
/// warp, `Space` jumps and `N`/`J` throws a fireball.
#[must_use]
pub fn held_buttons<F>(is_down: F) -> HeldButtons
where
    F: Fn(KeyCode) -> bool,
{
    let any = |keys: &[KeyCode]| keys.iter().any(|key| is_down(*key));
    let down = any(&[KeyCode::M, KeyCode::Down]);

    HeldButtons {
        left: any(&[KeyCode::A, KeyCode::Left]),
        right: any(&[KeyCode::D, KeyCode::Right]),
        fast_fall: down,
        jump: any(&[KeyCode::Space]),
        warp: down,
        fire: any(&[KeyCode::N, KeyCode::J]),
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, frame: Duration, render: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.render_accum += render;

        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let avg_render = self.render_accum / self.frames;

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.render_accum = Duration::ZERO;
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_render,
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: scene.viewport.width().round() as i32,
            window_height: scene.viewport.height().round() as i32,
            window_resizable: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                if is_key_pressed(KeyCode::Escape) {
                    tracing::info!("quit requested");
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = FrameInput {
                    buttons: held_buttons(is_key_down),
                };

                update_scene(frame_dt, frame_input, &mut scene);

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                for rect in scene.visible_rects() {
                    draw_rect(rect);
                }
                draw_hud(&scene);
                let render_duration = render_start.elapsed();

                if let Some(metrics) = fps_counter.record_frame(frame_dt, render_duration) {
                    if show_fps {
                        tracing::info!(
                            fps = format_args!("{:.2}", metrics.per_second),
                            trailing_fps = format_args!("{:.2}", metrics.trailing_ten_seconds),
                            render_ms = metrics.avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn draw_rect(rect: SceneRect) {
    macroquad::shapes::draw_rectangle(
        rect.position.x,
        rect.position.y,
        rect.size.x,
        rect.size.y,
        to_macroquad_color(rect.color),
    );
}

fn draw_hud(scene: &Scene) {
    let color = to_macroquad_color(palette::HUD_TEXT);
    let coins = format!("COINS {}", scene.coins);
    let _ = macroquad::text::draw_text(
        &coins,
        HUD_MARGIN,
        HUD_MARGIN + HUD_FONT_SIZE,
        HUD_FONT_SIZE,
        color,
    );
    if let Some(status) = &scene.status {
        let _ = macroquad::text::draw_text(
            status,
            HUD_MARGIN,
            HUD_MARGIN + HUD_FONT_SIZE * 2.0,
            HUD_FONT_SIZE,
            color,
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
