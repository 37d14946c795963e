//! Background acquisition loop
//!
//! Reads the byte source on its own thread, pushes every byte through a
//! [`FrameDecoder`] and applies decoded readings to the shared
//! [`ReadingStore`]. The loop checks a stop flag after every read, so with a
//! bounded read timeout it exits within one timeout interval of a stop
//! request. Transport failures end the loop but never the process: the store
//! keeps its last values and the failure is returned in the report.

use crate::protocol::{DecoderStats, FrameDecoder};
use crate::source::ByteSource;
use crate::store::ReadingStore;
use crate::types::SensorReading;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

/// Why the acquisition loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Stop was requested
    Cancelled,
    /// The source has no more data (replayed capture ended)
    SourceExhausted,
    /// The transport reported an error
    TransportFailed(String),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Cancelled => write!(f, "cancelled"),
            ExitReason::SourceExhausted => write!(f, "source exhausted"),
            ExitReason::TransportFailed(msg) => write!(f, "transport failed: {}", msg),
        }
    }
}

/// Summary returned when the loop finishes
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionReport {
    pub exit: ExitReason,
    pub stats: DecoderStats,
    /// Readings the store rejected (never expected with a valid decoder)
    pub rejected: u64,
}

/// Acquisition loop state, usable on the current thread or spawned
pub struct AcquisitionLoop<S: ByteSource> {
    source: S,
    store: Arc<ReadingStore>,
    decoder: FrameDecoder,
    chunk_size: usize,
    readings_tx: Option<Sender<SensorReading>>,
}

impl<S: ByteSource> AcquisitionLoop<S> {
    pub fn new(source: S, store: Arc<ReadingStore>, chunk_size: usize) -> Self {
        Self {
            source,
            store,
            decoder: FrameDecoder::new(),
            chunk_size: chunk_size.max(1),
            readings_tx: None,
        }
    }

    /// Also forward every decoded raw reading to `tx`
    pub fn with_reading_channel(mut self, tx: Sender<SensorReading>) -> Self {
        self.readings_tx = Some(tx);
        self
    }

    /// Run until stopped, exhausted or failed; always closes the source
    pub fn run(mut self, stop: &AtomicBool) -> AcquisitionReport {
        log::info!("Acquisition started on {}", self.source.describe());

        let mut buf = vec![0u8; self.chunk_size];
        let mut rejected = 0u64;

        let exit = loop {
            if stop.load(Ordering::Relaxed) {
                break ExitReason::Cancelled;
            }

            let n = match self.source.read(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    log::error!("Read from {} failed: {}", self.source.describe(), e);
                    break ExitReason::TransportFailed(e.to_string());
                }
            };

            for reading in self.decoder.feed(&buf[..n]) {
                if let Err(e) = self.store.update(reading.index, reading.temperature) {
                    log::warn!("Dropping reading {}: {}", reading, e);
                    rejected += 1;
                    continue;
                }
                // A dropped receiver only means nobody is listening anymore
                let receiver_gone = match &self.readings_tx {
                    Some(tx) => tx.send(reading).is_err(),
                    None => false,
                };
                if receiver_gone {
                    log::debug!("Reading channel closed");
                    self.readings_tx = None;
                }
            }

            if n == 0 && self.source.is_exhausted() {
                break ExitReason::SourceExhausted;
            }
        };

        self.source.close();
        let stats = self.decoder.stats();
        log::info!(
            "Acquisition stopped ({}): {} frames, {} bytes, {} discarded",
            exit,
            stats.frames_decoded,
            stats.bytes_consumed,
            stats.bytes_discarded
        );

        AcquisitionReport {
            exit,
            stats,
            rejected,
        }
    }
}

impl<S: ByteSource + 'static> AcquisitionLoop<S> {
    /// Run the loop on a background thread
    pub fn spawn(self) -> std::io::Result<AcquisitionHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let exit = Arc::new(OnceLock::new());

        let thread = {
            let stop = Arc::clone(&stop);
            let exit = Arc::clone(&exit);
            thread::Builder::new()
                .name("acquisition".to_string())
                .spawn(move || {
                    let report = self.run(&stop);
                    let _ = exit.set(report.exit.clone());
                    report
                })?
        };

        Ok(AcquisitionHandle { stop, exit, thread })
    }
}

/// Handle to a spawned acquisition loop
pub struct AcquisitionHandle {
    stop: Arc<AtomicBool>,
    exit: Arc<OnceLock<ExitReason>>,
    thread: JoinHandle<AcquisitionReport>,
}

impl AcquisitionHandle {
    /// Request the loop to stop after its current read
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// True once the loop has exited for any reason
    pub fn is_finished(&self) -> bool {
        self.exit.get().is_some()
    }

    /// Why the loop exited, once it has
    pub fn exit_reason(&self) -> Option<&ExitReason> {
        self.exit.get()
    }

    /// Stop the loop and wait for its report
    pub fn shutdown(self) -> AcquisitionReport {
        self.stop();
        self.join()
    }

    /// Wait for the loop to exit on its own
    pub fn join(self) -> AcquisitionReport {
        match self.thread.join() {
            Ok(report) => report,
            Err(_) => AcquisitionReport {
                exit: ExitReason::TransportFailed("acquisition thread panicked".to_string()),
                stats: DecoderStats::default(),
                rejected: 0,
            },
        }
    }
}
