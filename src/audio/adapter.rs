//! `SupplyAdapter`: the host's per-frame pull callback.

use tracing::{debug, warn};

use crate::{
    audio::{
        format::{AudioFormat, SampleEncoding},
        mix::{MixerStats, MixingEngine},
    },
    common::AudioError,
};

/// Arguments the host passes with every buffer pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRequest {
    pub requested_bytes: usize,
    pub encoding: SampleEncoding,
    pub channel_count: u8,
    pub sample_rate_hz: u32,
    /// Bytes the host actually captured into the buffer.
    pub bytes_captured: usize,
    pub capture_timestamp_ns: u64,
}

impl BufferRequest {
    pub fn new(format: &AudioFormat, requested_bytes: usize) -> Self {
        Self {
            requested_bytes,
            encoding: format.encoding(),
            channel_count: format.channel_count(),
            sample_rate_hz: format.sample_rate_hz(),
            bytes_captured: requested_bytes,
            capture_timestamp_ns: 0,
        }
    }

    pub fn format(&self) -> Result<AudioFormat, AudioError> {
        AudioFormat::new(self.encoding, self.channel_count, self.sample_rate_hz)
    }
}

/// Forwards host pulls to a [`MixingEngine`] and writes the result back into
/// the host's buffer at exactly the requested length.
pub struct SupplyAdapter {
    engine: MixingEngine,
    invalid_requests: u64,
}

impl SupplyAdapter {
    pub fn new(engine: MixingEngine) -> Self {
        Self {
            engine,
            invalid_requests: 0,
        }
    }

    pub fn start(&mut self) -> Result<(), AudioError> {
        self.engine.start()
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn engine(&self) -> &MixingEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MixingEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> MixingEngine {
        self.engine
    }

    pub fn stats(&self) -> MixerStats {
        self.engine.stats()
    }

    /// Host pull callback.
    ///
    /// On return `buffer` holds either the host's untouched capture or exactly
    /// `request.requested_bytes` of mixed audio. Returns the supplier's
    /// capture timestamp in nanoseconds, falling back to the host's own
    /// `capture_timestamp_ns` when the supplier has none. Returns 0 when the
    /// buffer was left untouched.
    pub fn on_buffer_request(&mut self, buffer: &mut Vec<u8>, request: &BufferRequest) -> u64 {
        let format = match request.format() {
            Ok(format) => format,
            Err(e) => {
                self.invalid_requests += 1;
                if self.invalid_requests == 1 {
                    warn!("SupplyAdapter: ignoring pull with {}", e);
                }
                return 0;
            }
        };

        let captured = request.bytes_captured.min(buffer.len());
        let Some(frame) =
            self.engine
                .on_frame_request(&buffer[..captured], &format, request.requested_bytes)
        else {
            return 0;
        };

        if frame.len() != request.requested_bytes {
            debug!(
                "SupplyAdapter: engine returned {} of {} bytes",
                frame.len(),
                request.requested_bytes
            );
        }
        buffer.clear();
        buffer.extend_from_slice(&frame);
        buffer.resize(request.requested_bytes, format.encoding().silence_byte());

        match self.engine.capture_timestamp() {
            0 => request.capture_timestamp_ns,
            ts => ts,
        }
    }
}
