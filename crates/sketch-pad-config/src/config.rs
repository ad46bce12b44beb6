/// Engine configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::HexColor;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "SKETCH_PAD_CONFIG";

const CONFIG_FILE_NAME: &str = "sketch-pad.json";

/// Tool names accepted for `default_tool`.
pub const TOOL_NAMES: [&str; 6] = ["select", "rect", "ellipse", "diamond", "brush", "eraser"];

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max number of undo steps kept; the oldest are dropped beyond this.
    pub max_history_depth: usize,
    /// How many notification passes a single transaction may trigger
    /// before the reactions are considered to be looping.
    pub max_reaction_passes: usize,
    pub stroke_color: HexColor,
    pub fill_color: HexColor,
    pub stroke_width: f64,
    pub opacity: f64,
    /// Stroke width of eraser strokes.
    pub eraser_width: f64,
    /// Tool selected in a fresh document.
    pub default_tool: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_depth: 100,
            max_reaction_passes: 16,
            stroke_color: HexColor::BLACK,
            fill_color: HexColor::TRANSPARENT,
            stroke_width: 2.0,
            opacity: 1.0,
            eraser_width: 20.0,
            default_tool: "select".to_string(),
        }
    }
}

impl EngineConfig {
    /// Returns the config file path.
    ///
    /// Resolution order:
    /// 1. `SKETCH_PAD_CONFIG` environment variable
    /// 2. `sketch-pad/sketch-pad.json` under the platform config directory
    /// 3. `sketch-pad.json` in the working directory
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|d| d.join("sketch-pad").join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (unreadable file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e:#}", path.display());
            }
            return config;
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                // Keep the broken file untouched so the user can fix it.
                tracing::warn!("Falling back to default config: {e:#}");
                Self::default()
            }
        }
    }

    /// Loads and sanitizes config from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let mut config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        config.sanitize();
        Ok(config)
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the disk write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config at {}", path.display()))
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        self.max_history_depth = self.max_history_depth.clamp(1, 10_000);
        self.max_reaction_passes = self.max_reaction_passes.clamp(1, 1_000);

        self.stroke_width = finite_or(self.stroke_width, defaults.stroke_width).clamp(0.0, 512.0);
        self.opacity = finite_or(self.opacity, defaults.opacity).clamp(0.0, 1.0);
        self.eraser_width = finite_or(self.eraser_width, defaults.eraser_width).clamp(1.0, 512.0);

        if !TOOL_NAMES.contains(&self.default_tool.as_str()) {
            tracing::warn!("Unknown default tool {:?}, using select", self.default_tool);
            self.default_tool = defaults.default_tool;
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
