use serde::{Deserialize, Serialize};

use crate::audio::{
    constants::{DEFAULT_LOOP_POOL_FRAMES, DEFAULT_MAX_QUEUE_FRAMES},
    format::AudioFormat,
    source::QueueOptions,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueueConfig {
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    #[serde(default = "default_loop_pool_frames")]
    pub loop_pool_frames: usize,
    #[serde(default)]
    pub looping: bool,
}

impl QueueConfig {
    pub fn options(&self, format: AudioFormat) -> QueueOptions {
        QueueOptions::new(format)
            .max_frames(self.max_frames)
            .loop_pool_frames(self.loop_pool_frames)
            .looping(self.looping)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_frames: default_max_frames(),
            loop_pool_frames: default_loop_pool_frames(),
            looping: false,
        }
    }
}

fn default_max_frames() -> usize {
    DEFAULT_MAX_QUEUE_FRAMES
}

fn default_loop_pool_frames() -> usize {
    DEFAULT_LOOP_POOL_FRAMES
}
