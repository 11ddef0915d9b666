use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::{
    constants::{DEFAULT_FRAME_MS, DEFAULT_SINK_CAPACITY},
    driver::DriverOptions,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DriverConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// How long the binary drives before exiting. 0 runs until Ctrl-C.
    #[serde(default)]
    pub run_for_ms: u64,
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,
}

impl DriverConfig {
    /// `frame_ms` comes from `[output]`.
    pub fn options(&self, frame_ms: u64) -> DriverOptions {
        DriverOptions {
            interval: Duration::from_millis(self.interval_ms.max(1)),
            frame_duration: Duration::from_millis(frame_ms.max(1)),
            sink_capacity: self.sink_capacity.max(1),
        }
    }

    pub fn run_for(&self) -> Option<Duration> {
        (self.run_for_ms > 0).then(|| Duration::from_millis(self.run_for_ms))
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            run_for_ms: 0,
            sink_capacity: default_sink_capacity(),
        }
    }
}

fn default_interval_ms() -> u64 {
    DEFAULT_FRAME_MS
}

fn default_sink_capacity() -> usize {
    DEFAULT_SINK_CAPACITY
}
