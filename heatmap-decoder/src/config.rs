//! Heatmap configuration types
//!
//! This module defines the configuration shared by the acquisition side and
//! the render side. Argument parsing and file loading live in the application
//! layer (heatmap-cli); the library only consumes the resulting values.

use crate::types::{HeatmapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the acquisition and render pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Serial port identifier (e.g. "/dev/ttyUSB0", "COM4")
    #[serde(default)]
    pub port: Option<String>,

    /// Serial baud rate (default: 115200)
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Interpolation grid resolution N (N×N samples, default: 80)
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,

    /// Render interval in milliseconds (default: 100ms)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// EMA smoothing coefficient in (0, 1] (default: 0.3)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Optional fixed colour range `[vmin, vmax]` in °C
    #[serde(default)]
    pub fixed_range: Option<[f64; 2]>,

    /// Display title
    #[serde(default = "default_title")]
    pub title: String,

    /// Byte source read timeout in milliseconds (default: 100ms)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Maximum bytes requested per read (default: 256)
    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,

    /// Optional: warn when a sensor has not reported for this long
    #[serde(default)]
    pub stale_after_ms: Option<u64>,
}

fn default_baud() -> u32 {
    115_200
}

fn default_grid_size() -> usize {
    80
}

fn default_interval_ms() -> u64 {
    100
}

fn default_alpha() -> f64 {
    0.3
}

fn default_title() -> String {
    "Thermal map - 4x DS18B20 (bilinear)".to_string()
}

fn default_read_timeout_ms() -> u64 {
    100
}

fn default_read_chunk() -> usize {
    256
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            grid_size: default_grid_size(),
            interval_ms: default_interval_ms(),
            alpha: default_alpha(),
            fixed_range: None,
            title: default_title(),
            read_timeout_ms: default_read_timeout_ms(),
            read_chunk: default_read_chunk(),
            stale_after_ms: None,
        }
    }
}

impl HeatmapConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the serial port
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Builder method: set the baud rate
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Builder method: set the grid resolution
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Builder method: set the render interval
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Builder method: set the EMA coefficient
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method: pin the colour range
    pub fn with_fixed_range(mut self, vmin: f64, vmax: f64) -> Self {
        self.fixed_range = Some([vmin, vmax]);
        self
    }

    /// Builder method: set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder method: enable staleness warnings
    pub fn with_stale_after_ms(mut self, stale_after_ms: u64) -> Self {
        self.stale_after_ms = Some(stale_after_ms);
        self
    }

    /// Fixed range as a tuple, if configured
    pub fn fixed_range(&self) -> Option<(f64, f64)> {
        self.fixed_range.map(|[vmin, vmax]| (vmin, vmax))
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn stale_after(&self) -> Option<chrono::Duration> {
        self.stale_after_ms
            .and_then(|ms| i64::try_from(ms).ok())
            .map(chrono::Duration::milliseconds)
    }

    /// Check that all values are within their documented domains
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(HeatmapError::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.grid_size == 0 {
            return Err(HeatmapError::InvalidConfig(
                "grid_size must be at least 1".to_string(),
            ));
        }
        if self.interval_ms == 0 {
            return Err(HeatmapError::InvalidConfig(
                "interval_ms must be positive".to_string(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(HeatmapError::InvalidConfig(
                "read_timeout_ms must be positive".to_string(),
            ));
        }
        if self.read_chunk == 0 {
            return Err(HeatmapError::InvalidConfig(
                "read_chunk must be positive".to_string(),
            ));
        }
        if let Some([vmin, vmax]) = self.fixed_range {
            if !vmin.is_finite() || !vmax.is_finite() || vmin >= vmax {
                return Err(HeatmapError::InvalidConfig(format!(
                    "fixed range must satisfy vmin < vmax, got [{}, {}]",
                    vmin, vmax
                )));
            }
        }
        Ok(())
    }
}
