//! Mixer session counters and their read-only snapshot.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

use crate::audio::level::AudioLevel;

/// Counters written only by the pull path and read from anywhere.
#[derive(Debug, Default)]
pub(crate) struct MixerCounters {
    pub active: AtomicBool,
    pub frames_requested: AtomicU64,
    pub frames_supplied_by_custom_source: AtomicU64,
    pub silence_frames_generated: AtomicU64,
    pub errors: AtomicU64,
    last_peak: AtomicU32,
    last_rms: AtomicU32,
}

impl MixerCounters {
    pub fn bump(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_level(&self, level: AudioLevel) {
        self.last_peak.store(level.peak.to_bits(), Ordering::Relaxed);
        self.last_rms.store(level.rms.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MixerStats {
        MixerStats {
            is_active: self.active.load(Ordering::Relaxed),
            frames_requested: self.frames_requested.load(Ordering::Relaxed),
            frames_supplied_by_custom_source: self
                .frames_supplied_by_custom_source
                .load(Ordering::Relaxed),
            silence_frames_generated: self.silence_frames_generated.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_level: AudioLevel {
                peak: f32::from_bits(self.last_peak.load(Ordering::Relaxed)),
                rms: f32::from_bits(self.last_rms.load(Ordering::Relaxed)),
            },
        }
    }
}

/// Point-in-time copy of the mixer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerStats {
    pub is_active: bool,
    pub frames_requested: u64,
    pub frames_supplied_by_custom_source: u64,
    pub silence_frames_generated: u64,
    pub errors: u64,
    /// Level of the most recently emitted frame.
    pub last_level: AudioLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let counters = MixerCounters::default();
        assert_eq!(MixerCounters::bump(&counters.frames_requested), 1);
        assert_eq!(MixerCounters::bump(&counters.frames_requested), 2);
        counters.record_level(AudioLevel { peak: 0.5, rms: 0.25 });

        let stats = counters.snapshot();
        assert_eq!(stats.frames_requested, 2);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.last_level.peak, 0.5);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["framesRequested"], 2);
        assert_eq!(json["isActive"], false);
    }
}
