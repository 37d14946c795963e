//! Render tick and renderer sink interface
//!
//! The render side runs on its own fixed cadence, independent of acquisition.
//! Each tick takes a store snapshot, and once all four sensors have reported,
//! interpolates the grid and computes the colour range. Drawing itself is
//! delegated to a [`RenderSink`] supplied by the application.

use crate::color_scale::{ColorScale, RangeUpdate};
use crate::config::HeatmapConfig;
use crate::interpolate::{interpolate_with_layout, CornerLayout, Grid};
use crate::store::ReadingStore;
use crate::types::{Result, Snapshot, Timestamp, SENSOR_COUNT};
use chrono::Utc;
use std::thread;
use std::time::Instant;

/// Labelled value for one sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorLabel {
    pub label: String,
    pub value: Option<f64>,
    /// Sensor has reported before but not within the staleness window
    pub stale: bool,
}

/// Everything a renderer needs for one tick
#[derive(Debug, Clone)]
pub struct RenderFrame {
    /// Interpolated field; `None` until all four sensors have reported
    pub grid: Option<Grid>,
    /// Colour range for this tick; `None` whenever `grid` is `None`
    pub range: Option<RangeUpdate>,
    pub labels: [SensorLabel; SENSOR_COUNT],
}

impl RenderFrame {
    pub fn is_ready(&self) -> bool {
        self.grid.is_some()
    }
}

/// Consumer of render frames (window, terminal, test recorder...)
pub trait RenderSink {
    /// Draw one frame
    fn render(&mut self, frame: &RenderFrame) -> Result<()>;

    /// False once the display has been closed
    fn is_open(&self) -> bool;
}

/// Per-tick render state: colour-scale hysteresis and stale tracking
#[derive(Debug, Clone)]
pub struct HeatmapView {
    layout: CornerLayout,
    scale: ColorScale,
    grid_size: usize,
    stale_after: Option<chrono::Duration>,
    stale: [bool; SENSOR_COUNT],
}

impl HeatmapView {
    pub fn new(config: &HeatmapConfig) -> Self {
        Self {
            layout: CornerLayout::STANDARD,
            scale: ColorScale::from_override(config.fixed_range()),
            grid_size: config.grid_size,
            stale_after: config.stale_after(),
            stale: [false; SENSOR_COUNT],
        }
    }

    /// Build the frame for one snapshot taken at `now`
    pub fn tick(&mut self, snapshot: &Snapshot, now: Timestamp) -> Result<RenderFrame> {
        self.update_staleness(snapshot, now);

        let labels = std::array::from_fn(|index| SensorLabel {
            label: self.layout.label(index),
            value: snapshot.value(index),
            stale: self.stale[index],
        });

        let (grid, range) = match snapshot.corner_values() {
            Some(values) => {
                let grid = interpolate_with_layout(&self.layout, &values, self.grid_size)?;
                let range = self.scale.compute_range(&values);
                (Some(grid), Some(range))
            }
            None => (None, None),
        };

        Ok(RenderFrame {
            grid,
            range,
            labels,
        })
    }

    fn update_staleness(&mut self, snapshot: &Snapshot, now: Timestamp) {
        let Some(max_age) = self.stale_after else {
            return;
        };

        let stale_now = snapshot.stale_sensors(now, max_age);
        for index in 0..SENSOR_COUNT {
            let is_stale = stale_now.contains(&index);
            if is_stale && !self.stale[index] {
                log::warn!(
                    "Sensor {} has not reported for over {} ms",
                    self.layout.label(index),
                    max_age.num_milliseconds()
                );
            } else if !is_stale && self.stale[index] {
                log::info!("Sensor {} reporting again", self.layout.label(index));
            }
            self.stale[index] = is_stale;
        }
    }
}

/// Drive `sink` at the configured interval until it closes or `keep_running`
/// returns false; returns the number of frames rendered
pub fn run_render_loop<K: RenderSink>(
    store: &ReadingStore,
    sink: &mut K,
    config: &HeatmapConfig,
    mut keep_running: impl FnMut() -> bool,
) -> Result<u64> {
    let interval = config.render_interval();
    let mut view = HeatmapView::new(config);
    let mut frames = 0u64;

    while sink.is_open() && keep_running() {
        let started = Instant::now();

        let frame = view.tick(&store.snapshot(), Utc::now())?;
        sink.render(&frame)?;
        frames += 1;

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    log::debug!("Render loop finished after {} frames", frames);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<RenderFrame>,
        limit: usize,
    }

    impl RenderSink for RecordingSink {
        fn render(&mut self, frame: &RenderFrame) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.frames.len() < self.limit
        }
    }

    fn config() -> HeatmapConfig {
        HeatmapConfig::new().with_grid_size(5).with_interval_ms(1)
    }

    #[test]
    fn test_tick_skips_grid_until_ready() {
        let store = ReadingStore::new(0.3).unwrap();
        let mut view = HeatmapView::new(&config());

        store.update(0, 20.0).unwrap();
        let frame = view.tick(&store.snapshot(), Utc::now()).unwrap();
        assert!(!frame.is_ready());
        assert!(frame.range.is_none());
        assert_eq!(frame.labels[0].value, Some(20.0));
        assert_eq!(frame.labels[1].value, None);
        assert_eq!(frame.labels[3].label, "S3");

        for index in 1..SENSOR_COUNT {
            store.update(index, 20.0).unwrap();
        }
        let frame = view.tick(&store.snapshot(), Utc::now()).unwrap();
        let grid = frame.grid.as_ref().unwrap();
        assert_eq!(grid.dim(), (5, 5));
        let range = frame.range.unwrap();
        assert!(range.changed);
        assert_eq!(range.range.vmin, 19.0);

        // Same readings again: range is stable
        let frame = view.tick(&store.snapshot(), Utc::now()).unwrap();
        assert!(!frame.range.unwrap().changed);
    }

    #[test]
    fn test_stale_labels() {
        let store = ReadingStore::new(1.0).unwrap();
        let mut view = HeatmapView::new(&config().with_stale_after_ms(1000));
        let now = Utc::now();

        store.update_at(0, 20.0, now - chrono::Duration::seconds(5)).unwrap();
        store.update_at(1, 21.0, now).unwrap();

        let frame = view.tick(&store.snapshot(), now).unwrap();
        assert!(frame.labels[0].stale);
        assert!(!frame.labels[1].stale);
        assert!(!frame.labels[2].stale);

        store.update_at(0, 20.5, now).unwrap();
        let frame = view.tick(&store.snapshot(), now).unwrap();
        assert!(!frame.labels[0].stale);
    }

    #[test]
    fn test_render_loop_runs_until_sink_closes() {
        let store = ReadingStore::new(0.3).unwrap();
        for index in 0..SENSOR_COUNT {
            store.update(index, 10.0 * index as f64).unwrap();
        }
        let mut sink = RecordingSink {
            limit: 3,
            ..Default::default()
        };

        let frames = run_render_loop(&store, &mut sink, &config(), || true).unwrap();
        assert_eq!(frames, 3);
        assert!(sink.frames.iter().all(RenderFrame::is_ready));
        assert_eq!(sink.frames[0].grid.as_ref().unwrap()[[2, 2]], 15.0);
    }

    #[test]
    fn test_render_loop_honours_keep_running() {
        let store = ReadingStore::new(0.3).unwrap();
        let mut sink = RecordingSink {
            limit: 100,
            ..Default::default()
        };
        let mut remaining = 2;
        let frames = run_render_loop(&store, &mut sink, &config(), || {
            remaining -= 1;
            remaining >= 0
        })
        .unwrap();
        assert_eq!(frames, 2);
        assert!(!sink.frames[0].is_ready());
    }
}
