//! Heatmap Decoder Library
//!
//! Decodes the 4-sensor UART temperature protocol and turns the readings into
//! an interpolated 2D field for display.
//!
//! # Architecture
//!
//! Data flows in one direction:
//! - A [`ByteSource`] (serial port, replayed capture, simulator) yields raw bytes
//! - The [`FrameDecoder`] reassembles 3-byte frames into [`SensorReading`]s
//! - The [`ReadingStore`] applies per-sensor exponential smoothing
//! - On every render tick, [`HeatmapView`] interpolates a [`Grid`] and picks a
//!   colour range with [`ColorScale`]
//!
//! Acquisition runs on its own thread ([`AcquisitionLoop`]) and shares only the
//! store with the render side.
//!
//! The library does NOT:
//! - Parse command-line arguments or config files
//! - Draw anything (see [`RenderSink`])
//!
//! All of that lives in the application layer (heatmap-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use heatmap_decoder::{AcquisitionLoop, HeatmapConfig, ReadingStore, SerialSource};
//! use std::sync::Arc;
//!
//! let config = HeatmapConfig::new().with_port("/dev/ttyUSB0");
//! let store = Arc::new(ReadingStore::new(config.alpha).unwrap());
//!
//! let source = SerialSource::open("/dev/ttyUSB0", config.baud, config.read_timeout()).unwrap();
//! let handle = AcquisitionLoop::new(source, Arc::clone(&store), config.read_chunk)
//!     .spawn()
//!     .unwrap();
//!
//! // ... render from store.snapshot() ...
//!
//! let report = handle.shutdown();
//! println!("Stopped: {}", report.exit);
//! ```

// Public modules
pub mod acquisition;
pub mod color_scale;
pub mod config;
pub mod interpolate;
pub mod monitor;
pub mod protocol;
pub mod render;
pub mod source;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use acquisition::{AcquisitionHandle, AcquisitionLoop, AcquisitionReport, ExitReason};
pub use color_scale::{ColorScale, DisplayRange, RangeUpdate};
pub use config::HeatmapConfig;
pub use interpolate::{interpolate, interpolate_snapshot, Corner, CornerLayout, Grid};
pub use monitor::{ConsolidatedMonitor, ConsolidatedReading};
pub use protocol::{DecoderState, DecoderStats, FrameDecoder};
pub use render::{run_render_loop, HeatmapView, RenderFrame, RenderSink, SensorLabel};
pub use source::{ByteSource, ReplaySource, SerialSource, SimulatedSource};
pub use store::ReadingStore;
pub use types::{
    format_temperature, HeatmapError, Result, SensorReading, SlotReading, Snapshot, Timestamp,
    SENSOR_COUNT,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
