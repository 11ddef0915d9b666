//! Receive-side audio taps.
//!
//! A tap observes decoded frames of one remote track before the host renders
//! them, and may veto playback or hand back a replacement frame. Taps are
//! observers only: nothing flows back into the supply path.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::{
    audio::{
        format::{AudioFormat, SampleEncoding},
        frame::Frame,
    },
    common::{ParticipantId, TrackId},
};

/// One received frame as reported by the host.
#[derive(Debug, Clone, Copy)]
pub struct TapFrame<'a> {
    pub participant_id: &'a ParticipantId,
    pub track_id: &'a TrackId,
    pub data: &'a [u8],
    pub bits_per_sample: u16,
    pub sample_rate_hz: u32,
    pub channel_count: u8,
    /// Sample groups in `data`.
    pub frame_count: usize,
    pub timestamp_ms: u64,
}

impl TapFrame<'_> {
    /// The frame's format, when the host reported a supported bit depth.
    pub fn format(&self) -> Option<AudioFormat> {
        let encoding = SampleEncoding::from_bits(self.bits_per_sample)?;
        AudioFormat::new(encoding, self.channel_count, self.sample_rate_hz).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TapDecision {
    /// When false the host must not render the frame.
    pub allow_playback: bool,
    pub replacement: Option<Frame>,
}

impl Default for TapDecision {
    fn default() -> Self {
        Self::allow()
    }
}

impl TapDecision {
    pub fn allow() -> Self {
        Self {
            allow_playback: true,
            replacement: None,
        }
    }

    pub fn mute() -> Self {
        Self {
            allow_playback: false,
            replacement: None,
        }
    }

    pub fn replace(frame: Frame) -> Self {
        Self {
            allow_playback: true,
            replacement: Some(frame),
        }
    }
}

pub trait AudioTap: Send + Sync {
    fn on_frame(&self, frame: &TapFrame<'_>) -> TapDecision;
}

type TapKey = (ParticipantId, TrackId);

/// Concurrent map of taps keyed by participant and track.
#[derive(Default)]
pub struct TapRegistry {
    taps: DashMap<TapKey, Arc<dyn AudioTap>>,
}

impl TapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `tap`, returning the one it replaced.
    pub fn register(
        &self,
        participant_id: ParticipantId,
        track_id: TrackId,
        tap: Arc<dyn AudioTap>,
    ) -> Option<Arc<dyn AudioTap>> {
        debug!("TapRegistry: tap on {}/{}", participant_id, track_id);
        self.taps.insert((participant_id, track_id), tap)
    }

    pub fn unregister(&self, participant_id: &ParticipantId, track_id: &TrackId) -> bool {
        self.taps
            .remove(&(participant_id.clone(), track_id.clone()))
            .is_some()
    }

    /// Drops every tap of one participant.
    pub fn unregister_participant(&self, participant_id: &ParticipantId) {
        self.taps.retain(|(p, _), _| p != participant_id);
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Runs the matching tap, if any. No tap, or a tap that panics, allows
    /// playback unchanged.
    pub fn dispatch(&self, frame: &TapFrame<'_>) -> TapDecision {
        let key = (frame.participant_id.clone(), frame.track_id.clone());
        // Clone out so the shard lock is not held across the callback.
        let Some(tap) = self.taps.get(&key).map(|entry| entry.value().clone()) else {
            return TapDecision::allow();
        };

        match panic::catch_unwind(AssertUnwindSafe(|| tap.on_frame(frame))) {
            Ok(decision) => decision,
            Err(_) => {
                warn!(
                    "TapRegistry: tap for {}/{} panicked",
                    frame.participant_id, frame.track_id
                );
                TapDecision::allow()
            }
        }
    }
}
