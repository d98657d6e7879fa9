use crate::fireworks::FireworksConfig;
use crate::render::{ColorMode, RenderMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid [fireworks] settings: {0}")]
    Fireworks(String),
}

/// User configuration loaded from config file.
/// All fields are optional. CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Routine JSON file
    pub routine: Option<PathBuf>,
    /// Default render mode
    pub render: Option<RenderModeConfig>,
    /// Default color mode
    pub color: Option<ColorModeConfig>,
    /// Target FPS (1-120)
    pub fps: Option<u32>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Skip fetching the joke and trivia
    pub offline: Option<bool>,
    /// When the trivia answer appears, e.g. "7:20 AM"
    pub trivia_reveal: Option<String>,
    /// Color quantization step (0 = off, 4/8/16 = coarser colors for less output)
    pub color_quant: Option<u8>,
    /// Fireworks tuning
    pub fireworks: Option<FireworksConfig>,
}

/// Render mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderModeConfig {
    Braille,
    HalfBlock,
}

impl From<RenderModeConfig> for RenderMode {
    fn from(c: RenderModeConfig) -> Self {
        match c {
            RenderModeConfig::Braille => RenderMode::Braille,
            RenderModeConfig::HalfBlock => RenderMode::HalfBlock,
        }
    }
}

/// Color mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModeConfig {
    Mono,
    Ansi16,
    Ansi256,
    TrueColor,
}

impl From<ColorModeConfig> for ColorMode {
    fn from(c: ColorModeConfig) -> Self {
        match c {
            ColorModeConfig::Mono => ColorMode::Mono,
            ColorModeConfig::Ansi16 => ColorMode::Ansi16,
            ColorModeConfig::Ansi256 => ColorMode::Ansi256,
            ColorModeConfig::TrueColor => ColorMode::TrueColor,
        }
    }
}

impl Config {
    /// Routine file with a leading `~` expanded to the home directory.
    pub fn routine_path(&self) -> Option<PathBuf> {
        self.routine.as_deref().map(expand_home)
    }

    /// Fireworks settings, falling back to defaults when the table is invalid.
    pub fn fireworks(&self) -> FireworksConfig {
        let Some(fireworks) = self.fireworks.clone() else {
            return FireworksConfig::default();
        };
        match fireworks.validate() {
            Ok(()) => fireworks,
            Err(e) => {
                tracing::warn!(error = %e, "using default fireworks settings");
                FireworksConfig::default()
            }
        }
    }
}

/// Replace a leading `~` component with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Get the config file path: ~/.config/daybreak/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("daybreak").join("config.toml"))
}

/// Parse a config file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from file. Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "config loaded");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring config file");
            Config::default()
        }
    }
}

/// Write the commented default config unless one already exists.
pub fn init_config() -> anyhow::Result<PathBuf> {
    let path = config_path().ok_or_else(|| anyhow::anyhow!("no config directory on this platform"))?;
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, default_config_string())?;
    Ok(path)
}

/// Generate a default config file with all options commented out
pub fn default_config_string() -> String {
    r#"# daybreak configuration
# Use --show-config to see the active config file path.
# CLI flags override these settings.

# Routine JSON file ({"morningRoutine": [{"time": "7:05 AM", "icon": "🪥", "activity": "Brush teeth"}]})
# routine = "~/morning-routine.json"

# Render mode for the fireworks: braille, half-block
# render = "braille"

# Color mode: mono, ansi16, ansi256, true-color
# color = "true-color"

# Target FPS (1-120)
# fps = 30

# Hide status bar
# clean = false

# Skip fetching the joke and trivia question
# offline = false

# When the trivia answer is revealed
# trivia_reveal = "7:20 AM"

# Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
# color_quant = 0

# [fireworks]
# max_particles = 200
# spawn_probability = 0.2
# gravity = 0.02
# particle_radius = 3.0
# burst_size_range = [30, 50]
# speed_range = [1.0, 4.0]
# decay_range = [0.01, 0.025]
"#
    .to_string()
}
