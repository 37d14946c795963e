//! Consolidated four-sensor monitor
//!
//! Collects raw (unsmoothed) readings and reports one consolidated line each
//! time every sensor has delivered a fresh value since the previous report.

use crate::types::{format_temperature, SensorReading, Timestamp, SENSOR_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bitmask with one bit set per sensor
const ALL_UPDATED: u8 = (1 << SENSOR_COUNT) - 1;

/// One consolidated report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedReading {
    pub timestamp: Timestamp,
    /// Latest raw temperature per sensor in index order
    pub temperatures: [Option<f64>; SENSOR_COUNT],
}

impl fmt::Display for ConsolidatedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, value) in self.temperatures.iter().enumerate() {
            if index > 0 {
                write!(f, " | ")?;
            }
            let text = match value {
                Some(_) => format_temperature(*value),
                None => "--".to_string(),
            };
            write!(f, "S{}={}", index, text)?;
        }
        Ok(())
    }
}

/// Tracks which sensors updated since the last report
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedMonitor {
    last: [Option<f64>; SENSOR_COUNT],
    updated_mask: u8,
}

impl ConsolidatedMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading; returns a report once all four have been refreshed
    pub fn observe(
        &mut self,
        reading: &SensorReading,
        at: Timestamp,
    ) -> Option<ConsolidatedReading> {
        if reading.index >= SENSOR_COUNT {
            return None;
        }
        self.last[reading.index] = Some(reading.temperature);
        self.updated_mask |= 1 << reading.index;

        if self.updated_mask != ALL_UPDATED {
            return None;
        }
        self.updated_mask = 0;
        Some(ConsolidatedReading {
            timestamp: at,
            temperatures: self.last,
        })
    }

    /// Sensors refreshed since the last report, as a bitmask
    pub fn pending_mask(&self) -> u8 {
        self.updated_mask
    }
}
