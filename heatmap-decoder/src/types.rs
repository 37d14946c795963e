//! Core types for the heatmap decoder library
//!
//! This module defines the fundamental types shared by the decoder, the reading
//! store and the render side: decoded readings, store snapshots and the library
//! error type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, HeatmapError>;

/// Number of sensors on the wire (fixed corner topology)
pub const SENSOR_COUNT: usize = 4;

/// A single reading decoded from one 3-byte wire frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor index in `0..4`
    pub index: usize,
    /// Temperature in °C (wire resolution is 0.1 °C)
    pub temperature: f64,
}

impl SensorReading {
    pub fn new(index: usize, temperature: f64) -> Self {
        Self { index, temperature }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}: {:.1}°C", self.index, self.temperature)
    }
}

/// Errors that can occur in the decoding pipeline
#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid sensor index: {0} (expected 0..4)")]
    InvalidSensorIndex(usize),

    #[error("Not all sensors have reported yet")]
    NotReady,

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One sensor's state as seen in a [`Snapshot`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotReading {
    /// Latest smoothed value, `None` until the first frame arrives
    pub value: Option<f64>,
    /// Wall-clock time of the last accepted frame
    pub updated_at: Option<Timestamp>,
    /// Number of frames accepted for this sensor
    pub samples: u64,
}

/// A consistent copy of all four sensor slots taken at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub slots: [SlotReading; SENSOR_COUNT],
}

impl Snapshot {
    /// Smoothed value for one sensor (None if unset or out of range)
    pub fn value(&self, index: usize) -> Option<f64> {
        self.slots.get(index).and_then(|slot| slot.value)
    }

    /// All four values as an array of options, in index order
    pub fn values(&self) -> [Option<f64>; SENSOR_COUNT] {
        self.slots.map(|slot| slot.value)
    }

    /// True once every sensor has reported at least once
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|slot| slot.value.is_some())
    }

    /// Corner values for interpolation, available only when all four are set
    pub fn corner_values(&self) -> Option<[f64; SENSOR_COUNT]> {
        let [a, b, c, d] = self.values();
        Some([a?, b?, c?, d?])
    }

    /// Sensors whose last update is older than `max_age` at time `now`
    ///
    /// Sensors that never reported are not considered stale; they are unset.
    pub fn stale_sensors(&self, now: Timestamp, max_age: Duration) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot.updated_at {
                Some(at) if now - at > max_age => Some(index),
                _ => None,
            })
            .collect()
    }
}

/// Format an optional temperature the way labels show it
pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}°C", v),
        None => "--.-°C".to_string(),
    }
}
