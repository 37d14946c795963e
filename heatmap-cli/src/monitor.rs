//! Monitor mode: one consolidated line per complete set of readings

use anyhow::Result;
use chrono::Utc;
use heatmap_decoder::{ConsolidatedMonitor, ConsolidatedReading, SensorReading};
use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Output format for consolidated lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Text,
    Json,
}

pub fn format_line(reading: &ConsolidatedReading, format: LineFormat) -> Result<String> {
    Ok(match format {
        LineFormat::Text => reading.to_string(),
        LineFormat::Json => serde_json::to_string(reading)?,
    })
}

/// Print consolidated lines until the channel closes or `deadline` passes;
/// returns the number of lines written
pub fn run_monitor<W: Write>(
    readings: &Receiver<SensorReading>,
    out: &mut W,
    format: LineFormat,
    poll: Duration,
    deadline: Option<Instant>,
) -> Result<u64> {
    let mut monitor = ConsolidatedMonitor::new();
    let mut lines = 0u64;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        match readings.recv_timeout(poll) {
            Ok(reading) => {
                if let Some(report) = monitor.observe(&reading, Utc::now()) {
                    writeln!(out, "{}", format_line(&report, format)?)?;
                    out.flush()?;
                    lines += 1;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(lines)
}
