//! `MixingEngine`: combines one supplier with the live mic frame.
//!
//! Runs entirely on the pull path. Every failure is downgraded to a silence
//! frame of the requested length plus an error counter increment; nothing
//! propagates back to the host callback.

use std::{
    borrow::Cow,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, atomic::Ordering},
};

use tracing::{debug, info, warn};

use super::{
    policy::MixPolicy,
    stats::{MixerCounters, MixerStats},
};
use crate::{
    audio::{
        codec,
        constants::ERROR_LOG_EVERY,
        format::AudioFormat,
        frame::Frame,
        level,
        source::{FrameSupplier, Supplier, queued::fit_to_len},
    },
    common::AudioError,
};

/// Mixer construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerOptions {
    pub mic_gain: f32,
    pub custom_gain: f32,
    pub policy: MixPolicy,
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self {
            mic_gain: 1.0,
            custom_gain: 1.0,
            policy: MixPolicy::Additive,
        }
    }
}

pub struct MixingEngine {
    supplier: Supplier,
    options: MixerOptions,
    counters: Arc<MixerCounters>,
}

impl MixingEngine {
    pub fn new(supplier: impl Into<Supplier>, options: MixerOptions) -> Self {
        Self {
            supplier: supplier.into(),
            options,
            counters: Arc::new(MixerCounters::default()),
        }
    }

    /// Starts the supplier and activates mixing.
    pub fn start(&mut self) -> Result<(), AudioError> {
        self.supplier.start()?;
        self.counters.active.store(true, Ordering::Relaxed);
        info!(
            "MixingEngine: started {} supplier ({} policy)",
            self.supplier.kind(),
            self.options.policy
        );
        Ok(())
    }

    /// Deactivates mixing and stops the supplier. Idempotent.
    pub fn stop(&mut self) {
        self.counters.active.store(false, Ordering::Relaxed);
        self.supplier.stop();
    }

    /// Toggles mixing without touching the supplier.
    pub fn set_active(&self, active: bool) {
        self.counters.active.store(active, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.counters.active.load(Ordering::Relaxed)
    }

    pub fn options(&self) -> MixerOptions {
        self.options
    }

    pub fn set_policy(&mut self, policy: MixPolicy) {
        self.options.policy = policy;
    }

    pub fn set_mic_gain(&mut self, gain: f32) {
        self.options.mic_gain = gain.max(0.0);
    }

    pub fn set_custom_gain(&mut self, gain: f32) {
        self.options.custom_gain = gain.max(0.0);
    }

    pub fn supplier(&self) -> &Supplier {
        &self.supplier
    }

    pub fn supplier_mut(&mut self) -> &mut Supplier {
        &mut self.supplier
    }

    pub fn stats(&self) -> MixerStats {
        self.counters.snapshot()
    }

    /// Timestamp of the supplier's most recent frame, or 0.
    pub fn capture_timestamp(&self) -> u64 {
        self.supplier.capture_timestamp()
    }

    /// Produces the frame to hand back to the host, or `None` to keep the
    /// host's own mic frame.
    pub fn on_frame_request(
        &mut self,
        mic: &[u8],
        format: &AudioFormat,
        requested_bytes: usize,
    ) -> Option<Frame> {
        if !self.is_active() {
            return None;
        }
        MixerCounters::bump(&self.counters.frames_requested);

        let frame = match self.mix(mic, format, requested_bytes) {
            Ok(frame) => frame,
            Err(e) => {
                self.record_error(&e);
                MixerCounters::bump(&self.counters.silence_frames_generated);
                Frame::silence(requested_bytes, format.encoding())
            }
        };

        self.counters.record_level(level::analyze(&frame, format));
        Some(frame)
    }

    fn mix(
        &mut self,
        mic: &[u8],
        format: &AudioFormat,
        requested_bytes: usize,
    ) -> Result<Frame, AudioError> {
        let custom = self.pull_custom(requested_bytes, format)?;
        if custom.is_some() {
            MixerCounters::bump(&self.counters.frames_supplied_by_custom_source);
        }

        let MixerOptions {
            mic_gain,
            custom_gain,
            policy,
        } = self.options;

        let frame = match (policy, custom) {
            (MixPolicy::Additive, Some(custom)) => {
                let mic = mic_span(mic, requested_bytes, format);
                codec::mix_scaled(&mic, mic_gain, &custom, custom_gain, format)?
            }
            (MixPolicy::Replace, Some(custom)) => codec::apply_gain(&custom, custom_gain, format)?,
            (MixPolicy::Additive | MixPolicy::Replace, None) => {
                let mic = mic_span(mic, requested_bytes, format);
                codec::apply_gain(&mic, mic_gain, format)?
            }
            (MixPolicy::CustomOnly, Some(custom)) => custom,
            (MixPolicy::CustomOnly, None) => {
                MixerCounters::bump(&self.counters.silence_frames_generated);
                Frame::silence(requested_bytes, format.encoding())
            }
        };

        Ok(frame)
    }

    /// Pulls from the supplier, containing panics from caller-provided ones.
    fn pull_custom(
        &mut self,
        requested_bytes: usize,
        format: &AudioFormat,
    ) -> Result<Option<Frame>, AudioError> {
        let supplier = &mut self.supplier;
        let frame = if supplier.is_external() {
            panic::catch_unwind(AssertUnwindSafe(|| {
                supplier.provide_frame(requested_bytes, format)
            }))
            .map_err(|payload| AudioError::SupplierPanic(panic_message(payload.as_ref())))?
        } else {
            supplier.provide_frame(requested_bytes, format)
        };

        Ok(frame.map(|frame| {
            if frame.len() != requested_bytes {
                debug!(
                    "{}",
                    AudioError::BufferUnderrun {
                        requested: requested_bytes,
                        available: frame.len(),
                    }
                );
                fit_to_len(frame, requested_bytes, format)
            } else {
                frame
            }
        }))
    }

    fn record_error(&self, error: &AudioError) {
        let count = MixerCounters::bump(&self.counters.errors);
        if count == 1 || count % ERROR_LOG_EVERY == 0 {
            warn!("MixingEngine: substituted silence ({} total): {}", count, error);
        }
    }
}

/// The host's mic bytes at exactly `requested_bytes`, borrowed when the
/// host already captured that much.
fn mic_span<'a>(mic: &'a [u8], requested_bytes: usize, format: &AudioFormat) -> Cow<'a, [u8]> {
    if mic.len() == requested_bytes {
        return Cow::Borrowed(mic);
    }
    let mut owned = mic[..mic.len().min(requested_bytes)].to_vec();
    owned.resize(requested_bytes, format.encoding().silence_byte());
    Cow::Owned(owned)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
