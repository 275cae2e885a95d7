#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Stagehop world from stage text.

use std::{
    fs,
    path::{Path, PathBuf},
};

use stagehop_core::{Command, Event};
use stagehop_world::{self as world, query, World};

/// Stage bundled with the binary, used when no stage file is requested.
pub const DEMO_STAGE: &str = include_str!("../stages/demo.map");

/// Errors raised while reading a stage file.
#[derive(Debug, thiserror::Error)]
pub enum StageLoadError {
    /// The stage file could not be read.
    #[error("failed to read stage file {path}")]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Where stage text should come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StageSource {
    /// The bundled demo stage.
    #[default]
    Demo,
    /// A stage file on disk.
    File(PathBuf),
}

/// Produces ready-to-run worlds and the data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Reads the stage text stored at `path`.
    pub fn read_stage(&self, path: &Path) -> Result<String, StageLoadError> {
        fs::read_to_string(path).map_err(|source| StageLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the stage text for `source`.
    ///
    /// A stage file that cannot be read is logged and replaced by an empty stage.
    #[must_use]
    pub fn stage_text(&self, source: &StageSource) -> String {
        match source {
            StageSource::Demo => DEMO_STAGE.to_owned(),
            StageSource::File(path) => self.read_stage(path).unwrap_or_else(|error| {
                tracing::warn!(%error, "continuing with an empty stage");
                String::new()
            }),
        }
    }

    /// Builds a world running `stage` inside a viewport of the given size.
    ///
    /// Events produced while loading are appended to `out_events`.
    #[must_use]
    pub fn build_world(
        &self,
        stage: String,
        viewport_width: f32,
        viewport_height: f32,
        out_events: &mut Vec<Event>,
    ) -> World {
        let mut world = World::new();
        world::apply(&mut world, Command::LoadStage { source: stage }, out_events);
        world::apply(
            &mut world,
            Command::ConfigureViewport {
                width: viewport_width,
                height: viewport_height,
            },
            out_events,
        );
        world
    }

    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_stage_has_both_layers() {
        let mut events = Vec::new();
        let world = Bootstrap.build_world(DEMO_STAGE.to_owned(), 1024.0, 512.0, &mut events);
        let grid = query::tile_grid(&world);
        assert_eq!(grid.underground_row(), 16);
        assert!(grid.rows() > grid.underground_row());
        assert!(matches!(events.first(), Some(Event::StageLoaded { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_an_empty_stage() {
        let source = StageSource::File(PathBuf::from("definitely/not/here.map"));
        assert_eq!(Bootstrap.stage_text(&source), "");
    }
}
