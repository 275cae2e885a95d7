#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Stagehop experience.

mod session;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stagehop_core::HeldButtons;
use stagehop_rendering::{palette, Presentation, RenderingBackend, Scene, Viewport};
use stagehop_rendering_macroquad::MacroquadBackend;
use stagehop_system_bootstrap::{Bootstrap, StageSource};
use tracing_subscriber::EnvFilter;

use crate::{session::Session, settings::Settings};

/// Side-scrolling platformer simulation.
#[derive(Debug, Parser)]
#[command(name = "stagehop", version, about)]
struct CliArgs {
    /// Stage file to play; the bundled demo stage is used when omitted.
    stage: Option<PathBuf>,
    /// TOML settings file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Run the given number of ticks without a window and print a JSON summary.
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,
    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,
    /// Render as fast as possible instead of waiting for the display refresh.
    #[arg(long)]
    no_vsync: bool,
}

/// Entry point for the Stagehop command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;

    let bootstrap = Bootstrap;
    let source = args
        .stage
        .clone()
        .map_or(StageSource::Demo, StageSource::File);
    let mut events = Vec::new();
    let world = bootstrap.build_world(
        bootstrap.stage_text(&source),
        settings.window.width as f32,
        settings.window.height as f32,
        &mut events,
    );
    tracing::info!("{}", bootstrap.welcome_banner(&world));

    let session = Session::new(world, events, settings.tick_interval());
    match args.headless {
        Some(ticks) => run_headless(session, ticks),
        None => run_windowed(session, &settings, &args),
    }
}

fn run_headless(mut session: Session, ticks: u64) -> Result<()> {
    for _ in 0..ticks {
        session.step(HeldButtons::default());
    }
    let report =
        serde_json::to_string_pretty(&session.report()).context("failed to encode report")?;
    println!("{report}");
    Ok(())
}

fn run_windowed(mut session: Session, settings: &Settings, args: &CliArgs) -> Result<()> {
    let viewport = Viewport::new(
        settings.window.width as f32,
        settings.window.height as f32,
    )
    .context("invalid window size")?;
    let mut scene = Scene::new(viewport);
    session.populate_scene(&mut scene);

    let presentation = Presentation::new(settings.window.title.clone(), palette::SKY, scene);
    MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps)
        .run(presentation, move |frame, input, scene| {
            let _ = session.advance(frame, input.buttons);
            session.populate_scene(scene);
        })
}
