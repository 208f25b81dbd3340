//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bfsviz/bfsviz.toml`
//! 3. Environment variables: `BFSVIZ_*` prefix, `__` between nested keys
//!    (e.g. `BFSVIZ_PACING__DECAY=0.9`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::storyboard::Pacing;
use crate::application::ApplicationError;
use crate::domain::Layout;

/// Unified configuration for bfsviz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory searched for `<name>.toml` scenes
    pub scene_dir: PathBuf,
    /// Grid used when building level scenes
    pub layout: Layout,
    /// Storyboard speed-up curve
    pub pacing: Pacing,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scene_dir: default_scene_dir(),
            layout: Layout::default(),
            pacing: Pacing::default(),
        }
    }
}

fn default_scene_dir() -> PathBuf {
    global_config_dir()
        .map(|dir| dir.join("scenes"))
        .unwrap_or_else(|| PathBuf::from("~/.config/bfsviz/scenes"))
}

/// Get the XDG config directory for bfsviz.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bfsviz").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bfsviz.toml"))
}

impl Settings {
    /// Load defaults, the global config file and `BFSVIZ_*` overrides.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), Self::env_source())
    }

    /// Layered load with an explicit config file and env source.
    ///
    /// A missing file is skipped; a malformed one is an error.
    pub fn load_from(path: Option<&Path>, env: Environment) -> Result<Self, ApplicationError> {
        let mut current = match path {
            Some(path) if path.exists() => {
                debug!("load: config file {}", path.display());
                Self::from_file(path)?
            }
            _ => Self::default(),
        };

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();

        Ok(current)
    }

    /// `BFSVIZ_` prefix, `__` between nested keys.
    pub fn env_source() -> Environment {
        Environment::with_prefix("BFSVIZ")
            .prefix_separator("_")
            .separator("__")
    }

    /// Missing keys keep their defaults.
    fn from_file(path: &Path) -> Result<Self, ApplicationError> {
        let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
            message: format!("read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| ApplicationError::Config {
            message: format!("parse {}: {}", path.display(), e),
        })
    }

    /// Env vars replace values, they are explicit user overrides.
    fn apply_env_overrides(
        mut settings: Self,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "scene_dir")? {
            settings.scene_dir = PathBuf::from(val);
        }
        if let Some(val) = env_value(&config, "layout.x_step")? {
            settings.layout.x_step = val;
        }
        if let Some(val) = env_value(&config, "layout.y_spacing")? {
            settings.layout.y_spacing = val;
        }
        if let Some(val) = env_value(&config, "pacing.warmup_nodes")? {
            settings.pacing.warmup_nodes = val;
        }
        if let Some(val) = env_value(&config, "pacing.warmup_factor")? {
            settings.pacing.warmup_factor = val;
        }
        if let Some(val) = env_value(&config, "pacing.decay")? {
            settings.pacing.decay = val;
        }
        if let Some(val) = env_value(&config, "pacing.floor")? {
            settings.pacing.floor = val;
        }

        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.scene_dir.to_string_lossy().into_owned();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.scene_dir = PathBuf::from(expanded);
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bfsviz configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bfsviz/bfsviz.toml
#   Env:    BFSVIZ_* environment variables, e.g. BFSVIZ_PACING__DECAY=0.9

# Directory searched for <name>.toml scenes
# scene_dir = "~/.config/bfsviz/scenes"

[layout]
# Distance between levels on the x axis
# x_step = 1.4

# Sibling distance on the y axis when a level has no range hint
# y_spacing = 0.5

[pacing]
# Nodes revealed at the slow warmup pace
# warmup_nodes = 4

# Time multiplier during warmup
# warmup_factor = 5.0

# Per-node multiplier after warmup, never below floor
# decay = 0.8
# floor = 0.05
"#
        .to_string()
    }
}

/// Absent keys are `None`; unparsable values are errors.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
