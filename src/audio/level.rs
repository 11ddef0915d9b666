//! Peak / RMS level analysis for PCM frames.

use serde::Serialize;

use crate::audio::{codec::sample, constants::SILENCE_THRESHOLD, format::AudioFormat};

/// Normalised signal level of a frame, both values in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AudioLevel {
    pub peak: f32,
    pub rms: f32,
}

impl AudioLevel {
    pub fn is_silent(&self) -> bool {
        self.peak <= SILENCE_THRESHOLD
    }
}

/// Measures peak and RMS across every sample of `bytes`. Trailing bytes that
/// do not form a whole sample are ignored.
pub fn analyze(bytes: &[u8], format: &AudioFormat) -> AudioLevel {
    let mut peak = 0f32;
    let mut sum_sq = 0f64;
    let mut count = 0usize;

    for value in sample::iter_normalized(bytes, format.encoding()) {
        let abs = value.abs().min(1.0);
        peak = peak.max(abs);
        sum_sq += (abs as f64) * (abs as f64);
        count += 1;
    }

    if count == 0 {
        return AudioLevel::default();
    }

    AudioLevel {
        peak,
        rms: (sum_sq / count as f64).sqrt() as f32,
    }
}

pub fn is_silent(bytes: &[u8], format: &AudioFormat) -> bool {
    analyze(bytes, format).is_silent()
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;
    use crate::audio::format::SampleEncoding;

    #[test]
    fn zeros_are_silent() {
        let format = AudioFormat::pcm16_mono(48_000);
        assert!(is_silent(&[0u8; 64], &format));

        let pcm8 = format.with_encoding(SampleEncoding::Pcm8);
        assert!(is_silent(&[128u8; 64], &pcm8));
        assert!(!is_silent(&[0u8; 64], &pcm8));
    }

    #[test]
    fn full_scale_square_has_unit_rms() {
        let format = AudioFormat::pcm16_mono(48_000);
        let mut raw = vec![0u8; 8];
        LittleEndian::write_i16_into(&[i16::MIN, i16::MIN, i16::MIN, i16::MIN], &mut raw);
        let level = analyze(&raw, &format);
        assert_eq!(level.peak, 1.0);
        assert!((level.rms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_frame_has_zero_level() {
        let format = AudioFormat::pcm16_mono(48_000);
        assert_eq!(analyze(&[], &format), AudioLevel::default());
    }
}
