//! Standalone driver and the drive-mode switch.
//!
//! Without a host capture engine nothing calls the adapter, so
//! [`StandaloneDriver`] runs a fixed-interval tokio task that feeds it a
//! silent mic frame and publishes whatever comes back on a bounded channel.
//!
//! [`DriveMode`] owns the one [`SupplyAdapter`]: either the host callback
//! reaches it through `DriveMode::Host`, or the driver task holds it. Moving
//! between the two hands the adapter over, so both can never pull at once.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use flume::{Receiver, Sender, TrySendError};
use serde::Serialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    audio::{
        adapter::{BufferRequest, SupplyAdapter},
        constants::{DEFAULT_FRAME_MS, DEFAULT_SINK_CAPACITY, ERROR_LOG_EVERY},
        format::AudioFormat,
        frame::Frame,
    },
    common::AudioError,
};

/// Ticks between debug level reports.
const LEVEL_REPORT_TICKS: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub interval: Duration,
    /// Audio per pull; normally equal to `interval`.
    pub frame_duration: Duration,
    /// Frames buffered towards the downstream consumer before dropping.
    pub sink_capacity: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_FRAME_MS),
            frame_duration: Duration::from_millis(DEFAULT_FRAME_MS),
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

/// One frame produced by the standalone driver.
#[derive(Debug, Clone)]
pub struct PublishedFrame {
    pub sequence: u64,
    pub frame: Frame,
    /// Supplier timestamp in nanoseconds, or 0.
    pub timestamp_ns: u64,
}

#[derive(Debug, Default)]
struct DriverCounters {
    ticks: AtomicU64,
    frames_published: AtomicU64,
    frames_dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub ticks: u64,
    pub frames_published: u64,
    pub frames_dropped: u64,
}

pub struct StandaloneDriver {
    cancel: CancellationToken,
    task: JoinHandle<SupplyAdapter>,
    counters: Arc<DriverCounters>,
    format: AudioFormat,
}

impl StandaloneDriver {
    /// Spawns the driver task on the current tokio runtime. The adapter
    /// should already be started.
    pub fn spawn(
        adapter: SupplyAdapter,
        format: AudioFormat,
        options: DriverOptions,
    ) -> (Self, Receiver<PublishedFrame>) {
        let (tx, rx) = flume::bounded(options.sink_capacity.max(1));
        let cancel = CancellationToken::new();
        let counters = Arc::new(DriverCounters::default());

        let interval = options.interval.max(Duration::from_millis(1));
        let requested = format.bytes_for_millis(options.frame_duration.as_millis() as u64);

        info!(
            "StandaloneDriver: {} bytes every {:?} ({})",
            requested, interval, format
        );

        let task = tokio::spawn(
            drive_loop(
                adapter,
                format,
                interval,
                requested,
                tx,
                counters.clone(),
                cancel.clone(),
            )
            .instrument(info_span!("standalone_driver")),
        );

        (
            Self {
                cancel,
                task,
                counters,
                format,
            },
            rx,
        )
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            frames_published: self.counters.frames_published.load(Ordering::Relaxed),
            frames_dropped: self.counters.frames_dropped.load(Ordering::Relaxed),
        }
    }

    /// Token that stops the driver when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the task and hands the adapter back once the loop exits.
    pub async fn stop(self) -> Result<SupplyAdapter, AudioError> {
        self.cancel.cancel();
        let adapter = self.task.await?;
        debug!("StandaloneDriver: stopped");
        Ok(adapter)
    }
}

async fn drive_loop(
    mut adapter: SupplyAdapter,
    format: AudioFormat,
    period: Duration,
    requested: usize,
    tx: Sender<PublishedFrame>,
    counters: Arc<DriverCounters>,
    cancel: CancellationToken,
) -> SupplyAdapter {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let silence = format.encoding().silence_byte();
    let mut buffer = Vec::with_capacity(requested);
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let tick = counters.ticks.fetch_add(1, Ordering::Relaxed) + 1;

                buffer.clear();
                buffer.resize(requested, silence);
                let request = BufferRequest::new(&format, requested);
                let timestamp_ns = adapter.on_buffer_request(&mut buffer, &request);

                let published = PublishedFrame {
                    sequence,
                    frame: Frame::copy_from_slice(&buffer),
                    timestamp_ns,
                };
                sequence += 1;

                match tx.try_send(published) {
                    Ok(()) => {
                        counters.frames_published.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                        let dropped = counters.frames_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        if dropped == 1 || dropped % ERROR_LOG_EVERY == 0 {
                            warn!("StandaloneDriver: sink not draining, {} frame(s) dropped", dropped);
                        }
                    }
                }

                if tick % LEVEL_REPORT_TICKS == 0 {
                    let stats = adapter.stats();
                    debug!(
                        "StandaloneDriver: tick {} peak {:.3} rms {:.3}",
                        tick, stats.last_level.peak, stats.last_level.rms
                    );
                }
            }
        }
    }

    adapter
}

// ─── DriveMode ───────────────────────────────────────────────────────────────

/// Who is currently pulling frames from the adapter.
pub enum DriveMode {
    /// A host capture engine calls [`DriveMode::on_buffer_request`].
    Host(SupplyAdapter),
    /// The standalone driver task owns the adapter.
    Standalone(StandaloneDriver),
}

impl DriveMode {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::Standalone(_) => "standalone",
        }
    }

    /// Host pull path. In standalone mode the host's buffer is left untouched
    /// and 0 is returned.
    pub fn on_buffer_request(&mut self, buffer: &mut Vec<u8>, request: &BufferRequest) -> u64 {
        match self {
            Self::Host(adapter) => adapter.on_buffer_request(buffer, request),
            Self::Standalone(_) => 0,
        }
    }

    /// Switches to standalone driving. Returns the frame receiver when a new
    /// driver was spawned.
    pub fn into_standalone(
        self,
        format: AudioFormat,
        options: DriverOptions,
    ) -> (Self, Option<Receiver<PublishedFrame>>) {
        match self {
            Self::Host(adapter) => {
                let (driver, rx) = StandaloneDriver::spawn(adapter, format, options);
                (Self::Standalone(driver), Some(rx))
            }
            standalone @ Self::Standalone(_) => (standalone, None),
        }
    }

    /// Switches back to host driving, stopping the driver task if any.
    pub async fn into_host(self) -> Result<Self, AudioError> {
        match self {
            Self::Host(adapter) => Ok(Self::Host(adapter)),
            Self::Standalone(driver) => Ok(Self::Host(driver.stop().await?)),
        }
    }

    /// Stops whichever side is driving and returns the adapter.
    pub async fn shutdown(self) -> Result<SupplyAdapter, AudioError> {
        let mut adapter = match self {
            Self::Host(adapter) => adapter,
            Self::Standalone(driver) => driver.stop().await?,
        };
        adapter.stop();
        Ok(adapter)
    }
}
