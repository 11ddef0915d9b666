//! Sample encodings and the immutable `AudioFormat` descriptor.

use serde::{Deserialize, Serialize};

use crate::common::{AudioError, CodecError};

/// Representation of a single audio sample.
///
/// - `Pcm8`: unsigned 8-bit, centred at 128.
/// - `Pcm16`: signed 16-bit little-endian.
/// - `Float32`: IEEE-754 little-endian, nominal range `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    Pcm8,
    #[default]
    Pcm16,
    Float32,
}

impl SampleEncoding {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Pcm8 => 1,
            Self::Pcm16 => 2,
            Self::Float32 => 4,
        }
    }

    /// Byte value that encodes silence.
    pub const fn silence_byte(self) -> u8 {
        match self {
            Self::Pcm8 => 0x80,
            Self::Pcm16 | Self::Float32 => 0,
        }
    }

    pub const fn bits_per_sample(self) -> u16 {
        (self.bytes_per_sample() * 8) as u16
    }

    /// Maps a host bit depth onto an encoding. 32 bits is taken to mean float.
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::Pcm8),
            16 => Some(Self::Pcm16),
            32 => Some(Self::Float32),
            _ => None,
        }
    }
}

impl std::fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pcm8 => "pcm8",
            Self::Pcm16 => "pcm16",
            Self::Float32 => "float32",
        };
        f.write_str(name)
    }
}

/// Encoding, channel count and rate of an interleaved PCM stream.
/// Built only through [`AudioFormat::new`], so it is not deserializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AudioFormat {
    encoding: SampleEncoding,
    channel_count: u8,
    sample_rate_hz: u32,
}

impl AudioFormat {
    /// Builds a validated format. Channel count and sample rate must be non-zero.
    pub fn new(
        encoding: SampleEncoding,
        channel_count: u8,
        sample_rate_hz: u32,
    ) -> Result<Self, AudioError> {
        if channel_count == 0 {
            return Err(AudioError::ConfigMismatch(
                "channel count must be at least 1".into(),
            ));
        }
        if sample_rate_hz == 0 {
            return Err(AudioError::ConfigMismatch(
                "sample rate must be greater than zero".into(),
            ));
        }
        Ok(Self {
            encoding,
            channel_count,
            sample_rate_hz,
        })
    }

    /// 16-bit mono at `rate`.
    pub fn pcm16_mono(sample_rate_hz: u32) -> Self {
        Self {
            encoding: SampleEncoding::Pcm16,
            channel_count: 1,
            sample_rate_hz: sample_rate_hz.max(1),
        }
    }

    /// 16-bit stereo at `rate`.
    pub fn pcm16_stereo(sample_rate_hz: u32) -> Self {
        Self {
            encoding: SampleEncoding::Pcm16,
            channel_count: 2,
            sample_rate_hz: sample_rate_hz.max(1),
        }
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    pub fn channels(&self) -> usize {
        self.channel_count as usize
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.encoding.bytes_per_sample()
    }

    /// Size in bytes of one interleaved sample group (one sample per channel).
    pub fn group_size(&self) -> usize {
        self.channels() * self.bytes_per_sample()
    }

    /// Whether `len` bytes hold a whole number of sample groups.
    pub fn is_aligned(&self, len: usize) -> bool {
        len % self.group_size() == 0
    }

    pub fn check_aligned(&self, len: usize) -> Result<(), CodecError> {
        if self.is_aligned(len) {
            Ok(())
        } else {
            Err(CodecError::Misaligned {
                len,
                group: self.group_size(),
            })
        }
    }

    /// Bytes needed for `ms` milliseconds of audio.
    pub fn bytes_for_millis(&self, ms: u64) -> usize {
        let groups = self.sample_rate_hz as u64 * ms / 1000;
        groups as usize * self.group_size()
    }

    /// Duration in nanoseconds of `groups` sample groups.
    pub fn groups_to_nanos(&self, groups: u64) -> u64 {
        groups.saturating_mul(1_000_000_000) / self.sample_rate_hz as u64
    }

    pub fn with_encoding(self, encoding: SampleEncoding) -> Self {
        Self { encoding, ..self }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}ch {}Hz",
            self.encoding, self.channel_count, self.sample_rate_hz
        )
    }
}
