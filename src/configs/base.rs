use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{common::ConfigError, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub mixer: MixerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl Config {
    /// Finds `config.toml`, falling back to `config.default.toml`.
    pub fn locate() -> Result<PathBuf, ConfigError> {
        ["config.toml", "config.default.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or(ConfigError::NotFound)
    }

    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let path = Self::locate()?;
        let config = Self::load_from(&path)?;
        Ok((config, path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let format = self.output.format()?;
        if format.bytes_for_millis(self.output.frame_ms) == 0 {
            return Err(ConfigError::Invalid(format!(
                "[output] frame_ms = {} yields an empty frame at {}",
                self.output.frame_ms, format
            )));
        }
        if let SourceConfig::File(file) = &self.source {
            if file.path.is_empty() {
                return Err(ConfigError::Invalid("[source] file path is empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{format::SampleEncoding, mix::MixPolicy, source::Waveform};

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.logging.is_none());
        assert_eq!(config.output.sample_rate, 48_000);
        assert_eq!(config.output.frame_ms, 10);
        assert_eq!(config.queue.max_frames, 50);
        assert_eq!(config.driver.interval_ms, 10);
        assert_eq!(config.mixer.policy, MixPolicy::Additive);
        assert!(matches!(config.source, SourceConfig::Generator(_)));
    }

    #[test]
    fn parses_every_table() {
        let config = Config::parse(
            r#"
            [logging]
            level = "debug"
            filters = "mixtap::audio=trace"
            file = { path = "./logs/mixtap.log", max_lines = 500 }

            [output]
            encoding = "float32"
            channels = 2
            sample_rate = 44100

            [mixer]
            mic_gain = 0.5
            policy = "custom_only"

            [queue]
            looping = true
            max_frames = 20

            [driver]
            run_for_ms = 1500

            [source]
            kind = "generator"
            waveform = "pink_noise"
            duration_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.and_then(|l| l.file).map(|f| f.max_lines), Some(500));
        let format = config.output.format().unwrap();
        assert_eq!(format.encoding(), SampleEncoding::Float32);
        assert_eq!(format.channels(), 2);
        assert_eq!(config.mixer.options().policy, MixPolicy::CustomOnly);
        assert_eq!(config.mixer.options().custom_gain, 1.0);
        assert_eq!(config.queue.options(format).max_frames, 20);
        assert_eq!(config.driver.run_for().map(|d| d.as_millis()), Some(1500));
        assert_eq!(config.driver.options(config.output.frame_ms).frame_duration.as_millis(), 10);

        let SourceConfig::Generator(generator) = config.source else {
            panic!("expected generator source");
        };
        let options = generator.options();
        assert_eq!(options.waveform, Waveform::PinkNoise);
        assert_eq!(options.duration.map(|d| d.as_millis()), Some(250));
    }

    #[test]
    fn file_and_queue_sources() {
        let config = Config::parse("[source]\nkind = \"file\"\npath = \"clip.wav\"\nlooping = true\n").unwrap();
        let SourceConfig::File(file) = config.source else {
            panic!("expected file source");
        };
        assert!(file.options().looping);

        let config = Config::parse("[source]\nkind = \"queue\"\n").unwrap();
        assert!(matches!(config.source, SourceConfig::Queue));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            Config::parse("[output]\nchannels = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("[output]\nencoding = \"pcm24\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::parse("[output]\nframe_ms = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("[source]\nkind = \"file\"\npath = \"\"\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::load_from(Path::new("/nonexistent/mixtap.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
