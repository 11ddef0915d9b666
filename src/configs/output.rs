use serde::{Deserialize, Serialize};

use crate::{
    audio::{
        constants::{DEFAULT_CHANNELS, DEFAULT_FRAME_MS, DEFAULT_SAMPLE_RATE},
        format::{AudioFormat, SampleEncoding},
    },
    common::ConfigError,
};

/// Format of the frames handed to the host or the downstream publisher.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub encoding: SampleEncoding,
    #[serde(default = "default_channels")]
    pub channels: u8,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

impl OutputConfig {
    pub fn format(&self) -> Result<AudioFormat, ConfigError> {
        AudioFormat::new(self.encoding, self.channels, self.sample_rate)
            .map_err(|e| ConfigError::Invalid(format!("[output] {}", e)))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            encoding: SampleEncoding::default(),
            channels: default_channels(),
            sample_rate: default_sample_rate(),
            frame_ms: default_frame_ms(),
        }
    }
}

fn default_channels() -> u8 {
    DEFAULT_CHANNELS
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}
