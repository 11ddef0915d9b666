use serde::{Deserialize, Serialize};

use crate::audio::{
    constants::DEFAULT_NOISE_SEED,
    source::{FileSourceOptions, GeneratorOptions, Waveform},
};

/// Which supplier the binary feeds the mixer with.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Generator(GeneratorConfig),
    File(FileConfig),
    /// An empty push queue; only useful with a host that pushes.
    Queue,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Generator(GeneratorConfig::default())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub waveform: Waveform,
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    /// 0 or negative runs forever.
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl GeneratorConfig {
    pub fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            waveform: self.waveform,
            frequency_hz: self.frequency_hz,
            amplitude: self.amplitude,
            duration: None,
            seed: self.seed,
        }
        .with_duration_ms(self.duration_ms)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::default(),
            frequency_hz: default_frequency_hz(),
            amplitude: default_amplitude(),
            duration_ms: 0,
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileConfig {
    pub path: String,
    #[serde(default)]
    pub looping: bool,
}

impl FileConfig {
    pub fn options(&self) -> FileSourceOptions {
        FileSourceOptions::new(&self.path).looping(self.looping)
    }
}

fn default_frequency_hz() -> f32 {
    440.0
}

fn default_amplitude() -> f32 {
    0.5
}

fn default_seed() -> u64 {
    DEFAULT_NOISE_SEED
}
