//! Byte sources feeding the acquisition loop
//!
//! Each source implements the [`ByteSource`] trait. A read returns as soon as
//! some bytes are available or the read timeout expires; a timeout is a
//! zero-length read, never an error.

use crate::protocol::{encode_frame, FRAME_LEN};
use crate::types::{Result, SENSOR_COUNT};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Common trait for all byte sources
pub trait ByteSource: Send {
    /// Read up to `buf.len()` bytes, returning `Ok(0)` on timeout
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the underlying transport
    fn close(&mut self) {}

    /// True once the source can never produce more bytes
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Short description for log messages
    fn describe(&self) -> String;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// UART source backed by the `serialport` crate
pub struct SerialSource {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialSource {
    /// Open a serial port with the given baud rate and read timeout
    pub fn open(name: &str, baud: u32, timeout: Duration) -> Result<Self> {
        log::info!("Opening serial port {} @ {} baud", name, baud);

        let port = serialport::new(name, baud).timeout(timeout).open()?;

        log::info!("Serial port {} opened", name);
        Ok(Self {
            name: name.to_string(),
            port: Some(port),
        })
    }
}

impl ByteSource for SerialSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port closed"))?;

        match port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!("Closed serial port {}", self.name);
        }
    }

    fn describe(&self) -> String {
        format!("serial port {}", self.name)
    }
}

/// Replays a captured raw byte stream
pub struct ReplaySource<R> {
    reader: R,
    label: String,
    pace: Option<Duration>,
    exhausted: bool,
}

impl<R: Read + Send> ReplaySource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            pace: None,
            exhausted: false,
        }
    }

    /// Sleep this long before every read, to mimic a live link
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

impl ReplaySource<BufReader<File>> {
    /// Replay a capture file
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Opening capture file: {:?}", path);
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: Read + Send> ByteSource for ReplaySource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.exhausted {
            return Ok(0);
        }
        if let Some(pace) = self.pace {
            thread::sleep(pace);
        }

        let n = match self.reader.read(buf) {
            Ok(n) => n,
            // Only a real end of stream marks the capture exhausted
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e),
        };
        if n == 0 && !buf.is_empty() {
            log::debug!("Capture {} fully replayed", self.label);
            self.exhausted = true;
        }
        Ok(n)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn describe(&self) -> String {
        format!("capture {}", self.label)
    }
}

/// Synthetic sensor board for running without hardware
///
/// Produces one frame per sensor per cycle, each temperature following a slow
/// sine around a per-corner baseline, with a noise byte between cycles to
/// exercise resynchronisation.
pub struct SimulatedSource {
    cycle: u64,
    pending: Vec<u8>,
    interval: Duration,
}

/// Corner baselines in °C
const SIM_BASELINES: [f64; SENSOR_COUNT] = [21.0, 23.5, 27.0, 24.0];

/// Byte inserted between cycles; never a valid address
const SIM_NOISE_BYTE: u8 = 0x55;

impl SimulatedSource {
    /// Emit one full cycle of frames every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            cycle: 0,
            pending: Vec::new(),
            interval,
        }
    }

    /// Temperature of a sensor at a given cycle
    pub fn temperature_at(index: usize, cycle: u64) -> f64 {
        let phase = cycle as f64 / 20.0 + index as f64 * std::f64::consts::FRAC_PI_2;
        SIM_BASELINES[index % SENSOR_COUNT] + 1.5 * phase.sin()
    }

    fn refill(&mut self) {
        self.pending.reserve(SENSOR_COUNT * FRAME_LEN + 1);
        for index in 0..SENSOR_COUNT {
            let temperature = Self::temperature_at(index, self.cycle);
            if let Some(frame) = encode_frame(index, temperature) {
                self.pending.extend_from_slice(&frame);
            }
        }
        self.pending.push(SIM_NOISE_BYTE);
        self.cycle += 1;
    }
}

impl ByteSource for SimulatedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            thread::sleep(self.interval);
            self.refill();
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn describe(&self) -> String {
        "simulated sensor board".to_string()
    }
}
