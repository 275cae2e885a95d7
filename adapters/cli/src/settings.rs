use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

/// Errors raised while loading the settings file.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}")]
    Io {
        /// Requested path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid TOML for [`Settings`].
    #[error("failed to parse settings file {path}")]
    Parse {
        /// Requested path.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// The simulation tick rate must be positive.
    #[error("simulation.tick_rate_hz must be positive")]
    ZeroTickRate,
}

/// Window configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct WindowSettings {
    /// Window width in pixels.
    pub(crate) width: u32,
    /// Window height in pixels.
    pub(crate) height: u32,
    /// Window title.
    pub(crate) title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 512,
            title: "Stagehop".to_owned(),
        }
    }
}

/// Simulation pacing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct SimulationSettings {
    /// Fixed simulation ticks per second.
    pub(crate) tick_rate_hz: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self { tick_rate_hz: 60 }
    }
}

/// Settings loaded from an optional TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Window configuration.
    pub(crate) window: WindowSettings,
    /// Simulation pacing.
    pub(crate) simulation: SimulationSettings,
}

impl Settings {
    /// Loads settings from `path`, or returns the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if settings.simulation.tick_rate_hz == 0 {
            return Err(SettingsError::ZeroTickRate);
        }
        Ok(settings)
    }

    /// Duration of one simulation tick.
    pub(crate) fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.simulation.tick_rate_hz.max(1)
    }
}
