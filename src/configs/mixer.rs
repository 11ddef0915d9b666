use serde::{Deserialize, Serialize};

use crate::audio::mix::{MixPolicy, MixerOptions};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MixerConfig {
    #[serde(default = "default_gain")]
    pub mic_gain: f32,
    #[serde(default = "default_gain")]
    pub custom_gain: f32,
    #[serde(default)]
    pub policy: MixPolicy,
}

impl MixerConfig {
    pub fn options(&self) -> MixerOptions {
        MixerOptions {
            mic_gain: self.mic_gain.max(0.0),
            custom_gain: self.custom_gain.max(0.0),
            policy: self.policy,
        }
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            mic_gain: default_gain(),
            custom_gain: default_gain(),
            policy: MixPolicy::default(),
        }
    }
}

fn default_gain() -> f32 {
    1.0
}
