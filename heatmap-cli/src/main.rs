//! Thermal Heatmap CLI Application
//!
//! This is the command-line front end for the heatmap decoder library.
//! It adds:
//! - Argument parsing and config file loading
//! - Byte source selection (serial port, replayed capture, simulator)
//! - A terminal heatmap renderer
//! - A monitor mode printing one line per complete set of readings

use anyhow::{Context, Result};
use clap::Parser;
use heatmap_decoder::{
    run_render_loop, AcquisitionHandle, AcquisitionLoop, ByteSource, ExitReason, ReadingStore,
    ReplaySource, SensorReading, SerialSource, SimulatedSource,
};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod config;
mod monitor;
mod terminal;

use config::{AppConfig, OutputMode, Overrides};
use monitor::LineFormat;
use terminal::TerminalRenderer;

/// Thermal Heatmap - live 2x2 heatmap from four UART temperature sensors
#[derive(Parser, Debug)]
#[command(name = "heatmap")]
#[command(about = "Live bilinear heatmap for 4x DS18B20 sensors over UART", long_about = None)]
#[command(version)]
struct Args {
    /// Serial port (e.g. COM4, /dev/ttyUSB0)
    #[arg(short, long, value_name = "PORT")]
    port: Option<String>,

    /// Baud rate (default: 115200)
    #[arg(long, value_name = "BAUD")]
    baud: Option<u32>,

    /// Interpolation grid resolution (default: 80)
    #[arg(long, value_name = "N")]
    grid: Option<usize>,

    /// Render interval in ms (default: 100)
    #[arg(long, value_name = "MS")]
    interval: Option<u64>,

    /// EMA alpha in (0, 1]; higher reacts faster (default: 0.3)
    #[arg(long, value_name = "ALPHA")]
    alpha: Option<f64>,

    /// Fixed temperature range in °C, e.g. --fixed 15 60
    #[arg(long, num_args = 2, value_names = ["VMIN", "VMAX"], allow_negative_numbers = true)]
    fixed: Option<Vec<f64>>,

    /// Display title
    #[arg(long)]
    title: Option<String>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replay a captured raw byte stream instead of a serial port
    #[arg(long, value_name = "FILE", conflicts_with = "simulate")]
    replay: Option<PathBuf>,

    /// Use a simulated sensor board instead of a serial port
    #[arg(long)]
    simulate: bool,

    /// Print one line per complete set of readings instead of the heatmap
    #[arg(short, long)]
    monitor: bool,

    /// Monitor mode: print JSON lines
    #[arg(long)]
    json: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port.clone(),
            baud: self.baud,
            grid: self.grid,
            interval: self.interval,
            alpha: self.alpha,
            fixed: self.fixed.as_deref().and_then(|v| match v {
                [vmin, vmax] => Some((*vmin, *vmax)),
                _ => None,
            }),
            title: self.title.clone(),
            replay: self.replay.clone(),
            simulate: self.simulate,
            monitor: self.monitor,
            json: self.json,
            duration: self.duration,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Thermal Heatmap CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", heatmap_decoder::VERSION);

    let base = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let app = base.merge(args.overrides())?;
    log::debug!("Effective configuration: {:?}", app);

    let deadline = app
        .output
        .duration_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let store = Arc::new(ReadingStore::new(app.heatmap.alpha)?);

    match app.output.mode {
        OutputMode::Heatmap => heatmap_mode(&app, store, deadline),
        OutputMode::Monitor => monitor_mode(&app, store, deadline),
    }
}

/// Open the configured byte source
fn open_source(app: &AppConfig) -> Result<Box<dyn ByteSource>> {
    let heatmap = &app.heatmap;

    if let Some(path) = &app.input.replay {
        let mut source = ReplaySource::open(path)
            .with_context(|| format!("Failed to open capture file: {:?}", path))?;
        if let Some(ms) = app.input.replay_pace_ms {
            source = source.with_pace(Duration::from_millis(ms));
        }
        return Ok(Box::new(source));
    }

    if app.input.simulate {
        return Ok(Box::new(SimulatedSource::new(heatmap.render_interval())));
    }

    let port = heatmap
        .port
        .as_deref()
        .context("No input specified: use --port, --replay or --simulate")?;
    let source = SerialSource::open(port, heatmap.baud, heatmap.read_timeout())
        .with_context(|| format!("Failed to open {}", port))?;
    Ok(Box::new(source))
}

fn spawn_acquisition(
    source: Box<dyn ByteSource>,
    store: &Arc<ReadingStore>,
    app: &AppConfig,
    readings: Option<mpsc::Sender<SensorReading>>,
) -> Result<AcquisitionHandle> {
    let mut acquisition =
        AcquisitionLoop::new(source, Arc::clone(store), app.heatmap.read_chunk);
    if let Some(tx) = readings {
        acquisition = acquisition.with_reading_channel(tx);
    }
    acquisition
        .spawn()
        .context("Failed to start acquisition thread")
}

/// Heatmap mode - render the interpolated field until the display closes
fn heatmap_mode(
    app: &AppConfig,
    store: Arc<ReadingStore>,
    deadline: Option<Instant>,
) -> Result<()> {
    // A source that fails to open leaves the display running without data
    let handle = match open_source(app) {
        Ok(source) => Some(spawn_acquisition(source, &store, app, None)?),
        Err(e) => {
            log::error!("{:#}", e);
            None
        }
    };

    let title = app.heatmap.title.clone();
    let mut renderer =
        TerminalRenderer::new(io::stdout(), title, app.output.width).with_deadline(deadline);

    let mut final_frame_drawn = false;
    let frames = run_render_loop(&store, &mut renderer, &app.heatmap, || {
        let exit = handle.as_ref().and_then(AcquisitionHandle::exit_reason);
        keep_rendering(exit, &mut final_frame_drawn)
    })?;
    log::debug!("Rendered {} frames", frames);

    if let Some(handle) = handle {
        let report = handle.shutdown();
        log::info!(
            "Acquisition {}: {} frames decoded, {} bytes discarded",
            report.exit,
            report.stats.frames_decoded,
            report.stats.bytes_discarded
        );
    }
    Ok(())
}

/// Render liveness for a given acquisition state
///
/// Only the end of a replayed capture stops the display, after one final
/// frame. A failed transport leaves the last values on screen until the
/// deadline or the sink closes.
fn keep_rendering(exit: Option<&ExitReason>, final_frame_drawn: &mut bool) -> bool {
    match exit {
        Some(ExitReason::SourceExhausted) => !std::mem::replace(final_frame_drawn, true),
        _ => true,
    }
}

/// Monitor mode - print consolidated readings as they complete
fn monitor_mode(
    app: &AppConfig,
    store: Arc<ReadingStore>,
    deadline: Option<Instant>,
) -> Result<()> {
    let source = open_source(app)?;
    let (tx, rx) = mpsc::channel();
    let handle = spawn_acquisition(source, &store, app, Some(tx))?;

    let format = if app.output.json {
        LineFormat::Json
    } else {
        LineFormat::Text
    };
    let mut stdout = io::stdout().lock();
    let lines = monitor::run_monitor(
        &rx,
        &mut stdout,
        format,
        app.heatmap.render_interval(),
        deadline,
    )?;

    let report = handle.shutdown();
    log::info!(
        "Monitor finished ({}): {} lines, {} frames decoded",
        report.exit,
        lines,
        report.stats.frames_decoded
    );
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
