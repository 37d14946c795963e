//! Standalone capture decoder tool
//!
//! Decodes a raw UART capture (the byte stream as received from the sensor
//! board) and prints every reading plus per-sensor statistics.
//!
//! Usage:
//!   decode_capture <capture.bin> [--alpha <a>] [--limit <count>]
//!
//! Example:
//!   cargo run --example decode_capture -- uart_dump.bin --alpha 0.3 --limit 50

use heatmap_decoder::{ByteSource, FrameDecoder, ReadingStore, ReplaySource, SENSOR_COUNT};
use std::env;
use std::path::PathBuf;

#[derive(Default, Clone, Copy)]
struct SensorStats {
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl SensorStats {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <capture.bin> [--alpha <a>] [--limit <count>]", args[0]);
        std::process::exit(1);
    }

    let capture = PathBuf::from(&args[1]);
    let mut alpha = 0.3;
    let mut limit: Option<usize> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--alpha" => {
                i += 1;
                if i < args.len() {
                    alpha = args[i].parse()?;
                }
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    println!("=== UART Capture Decoder ===");
    println!("Capture: {:?}", capture);
    println!("EMA alpha: {}", alpha);
    println!();

    let mut source = ReplaySource::open(&capture)?;
    let store = ReadingStore::new(alpha)?;
    let mut decoder = FrameDecoder::new();
    let mut per_sensor = [SensorStats::default(); SENSOR_COUNT];
    let mut printed = 0usize;
    let mut buf = [0u8; 256];

    while !source.is_exhausted() {
        let n = source.read(&mut buf)?;
        for reading in decoder.feed(&buf[..n]) {
            let smoothed = store.update(reading.index, reading.temperature)?;
            per_sensor[reading.index].record(reading.temperature);

            if limit.map_or(true, |max| printed < max) {
                println!("{:<16} (smoothed {:.2}°C)", reading.to_string(), smoothed);
                printed += 1;
            }
        }
    }
    source.close();

    let stats = decoder.stats();
    println!("\n=== DECODING SUMMARY ===");
    println!("Bytes consumed: {}", stats.bytes_consumed);
    println!("Frames decoded: {}", stats.frames_decoded);
    println!("Bytes discarded (resync): {}", stats.bytes_discarded);
    for (index, s) in per_sensor.iter().enumerate() {
        match (s.min, s.max) {
            (Some(min), Some(max)) => println!(
                "  S{}: {} readings, min {:.1}°C, max {:.1}°C",
                index, s.count, min, max
            ),
            _ => println!("  S{}: no readings", index),
        }
    }

    Ok(())
}
