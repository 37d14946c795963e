//! Configuration loading and command-line overrides

use anyhow::{Context, Result};
use heatmap_decoder::HeatmapConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Replay a captured byte stream instead of opening the serial port
    pub replay: Option<PathBuf>,
    /// Delay between replayed chunks, in milliseconds
    pub replay_pace_ms: Option<u64>,
    /// Use the built-in simulated sensor board
    #[serde(default)]
    pub simulate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,
    /// Monitor mode: print JSON lines instead of text
    #[serde(default)]
    pub json: bool,
    /// Stop after this many seconds
    pub duration_secs: Option<u64>,
    /// Terminal heatmap width in characters
    #[serde(default = "default_width")]
    pub width: usize,
}

fn default_width() -> usize {
    60
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            json: false,
            duration_secs: None,
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Heatmap,
    Monitor,
}

/// Values given on the command line; each one overrides the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub grid: Option<usize>,
    pub interval: Option<u64>,
    pub alpha: Option<f64>,
    pub fixed: Option<(f64, f64)>,
    pub title: Option<String>,
    pub replay: Option<PathBuf>,
    pub simulate: bool,
    pub monitor: bool,
    pub json: bool,
    pub duration: Option<u64>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

impl AppConfig {
    /// Apply command-line overrides, then validate the result
    pub fn merge(mut self, overrides: Overrides) -> Result<Self> {
        let heatmap = &mut self.heatmap;
        if let Some(port) = overrides.port {
            heatmap.port = Some(port);
        }
        if let Some(baud) = overrides.baud {
            heatmap.baud = baud;
        }
        if let Some(grid) = overrides.grid {
            heatmap.grid_size = grid;
        }
        if let Some(interval) = overrides.interval {
            heatmap.interval_ms = interval;
        }
        if let Some(alpha) = overrides.alpha {
            heatmap.alpha = alpha;
        }
        if let Some((vmin, vmax)) = overrides.fixed {
            heatmap.fixed_range = Some([vmin, vmax]);
        }
        if let Some(title) = overrides.title {
            heatmap.title = title;
        }

        if overrides.replay.is_some() {
            self.input.replay = overrides.replay;
        }
        self.input.simulate |= overrides.simulate;

        if overrides.monitor {
            self.output.mode = OutputMode::Monitor;
        }
        self.output.json |= overrides.json;
        if overrides.duration.is_some() {
            self.output.duration_secs = overrides.duration;
        }

        self.heatmap
            .validate()
            .context("Invalid heatmap configuration")?;
        if self.output.width == 0 {
            anyhow::bail!("Output width must be positive");
        }
        Ok(self)
    }
}
