//! `SignalGenerator`: procedural waveforms as a frame supplier.
//!
//! Output is driven by a monotonic sample index rather than wall-clock time,
//! so the same options always produce the same bytes and a restart begins the
//! waveform again from phase zero. Noise generators use a seeded RNG for the
//! same reason.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    audio::{
        codec::sample,
        constants::{DEFAULT_NOISE_SEED, GATE_PERIOD_SECS},
        format::AudioFormat,
        frame::Frame,
        source::FrameSupplier,
    },
    common::AudioError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    /// Sign of the sine.
    Square,
    Triangle,
    /// Linear ramp from -1 to 1 each period.
    Sawtooth,
    WhiteNoise,
    PinkNoise,
    Silence,
    /// Sine for one second, silence for one second, repeating.
    GatedTone,
}

#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    pub waveform: Waveform,
    pub frequency_hz: f32,
    /// Peak amplitude in `0.0..=1.0`.
    pub amplitude: f32,
    /// Stop reporting data once this much wall-clock time has passed since
    /// `start()`. `None` runs forever.
    pub duration: Option<Duration>,
    pub seed: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency_hz: 440.0,
            amplitude: 0.5,
            duration: None,
            seed: DEFAULT_NOISE_SEED,
        }
    }
}

impl GeneratorOptions {
    pub fn tone(waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            waveform,
            frequency_hz,
            ..Self::default()
        }
    }

    /// Duration in milliseconds; zero or negative means unbounded.
    pub fn with_duration_ms(mut self, ms: i64) -> Self {
        self.duration = (ms > 0).then(|| Duration::from_millis(ms as u64));
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }
}

/// Paul Kellet's refined pink-noise filter: seven one-pole sections over white
/// noise. The coefficients are empirical tuning values.
#[derive(Debug, Default, Clone, Copy)]
struct PinkFilter {
    b: [f32; 7],
}

impl PinkFilter {
    /// Output gain that keeps the summed sections roughly inside `[-1, 1]`.
    const OUTPUT_GAIN: f32 = 0.11;

    fn next(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.055_517_9;
        b[1] = 0.99332 * b[1] + white * 0.075_075_9;
        b[2] = 0.96900 * b[2] + white * 0.153_852;
        b[3] = 0.86650 * b[3] + white * 0.310_485_6;
        b[4] = 0.55000 * b[4] + white * 0.532_952_2;
        b[5] = -0.7616 * b[5] - white * 0.016_898;
        let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115_926;
        pink * Self::OUTPUT_GAIN
    }
}

pub struct SignalGenerator {
    options: GeneratorOptions,
    sample_index: u64,
    rng: StdRng,
    pink: PinkFilter,
    started_at: Option<Instant>,
    last_timestamp_ns: u64,
}

impl SignalGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            sample_index: 0,
            rng: StdRng::seed_from_u64(options.seed),
            pink: PinkFilter::default(),
            started_at: None,
            last_timestamp_ns: 0,
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Sample groups generated since the last `start()`.
    pub fn position(&self) -> u64 {
        self.sample_index
    }

    fn reset(&mut self) {
        self.sample_index = 0;
        self.rng = StdRng::seed_from_u64(self.options.seed);
        self.pink = PinkFilter::default();
        self.last_timestamp_ns = 0;
    }

    fn sine_at(&self, phase: f64) -> f32 {
        (std::f64::consts::TAU * phase).sin() as f32
    }

    /// Next normalised value for the current sample index.
    fn next_value(&mut self, sample_rate: u32) -> f32 {
        let rate = sample_rate as f64;
        let phase = (self.sample_index as f64 * self.options.frequency_hz as f64 / rate).fract();

        match self.options.waveform {
            Waveform::Sine => self.sine_at(phase),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                let p = phase as f32;
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase as f32 - 1.0,
            Waveform::WhiteNoise => self.rng.gen_range(-1.0f32..=1.0),
            Waveform::PinkNoise => {
                let white = self.rng.gen_range(-1.0f32..=1.0);
                self.pink.next(white)
            }
            Waveform::Silence => 0.0,
            Waveform::GatedTone => {
                let second = self.sample_index / sample_rate as u64;
                if (second / GATE_PERIOD_SECS) % 2 == 0 {
                    self.sine_at(phase)
                } else {
                    0.0
                }
            }
        }
    }

    fn expired(&self) -> bool {
        match (self.options.duration, self.started_at) {
            (Some(limit), Some(started)) => started.elapsed() > limit,
            _ => false,
        }
    }
}

impl FrameSupplier for SignalGenerator {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.started_at.is_none() {
            self.reset();
            self.started_at = Some(Instant::now());
            debug!(
                "SignalGenerator: started {:?} at {}Hz",
                self.options.waveform, self.options.frequency_hz
            );
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.started_at = None;
    }

    fn has_more_data(&self) -> bool {
        self.started_at.is_some() && !self.expired()
    }

    fn provide_frame(&mut self, requested_bytes: usize, format: &AudioFormat) -> Option<Frame> {
        if requested_bytes == 0 || !self.has_more_data() {
            return None;
        }

        let encoding = format.encoding();
        let bps = format.bytes_per_sample();
        let amplitude = self.options.amplitude.clamp(0.0, 1.0);

        // Any trailing partial group stays silent.
        let mut out = vec![encoding.silence_byte(); requested_bytes];
        for group in out.chunks_exact_mut(format.group_size()) {
            let value = self.next_value(format.sample_rate_hz()) * amplitude;
            for raw in group.chunks_exact_mut(bps) {
                sample::encode(value, encoding, raw);
            }
            self.sample_index += 1;
        }

        self.last_timestamp_ns = format.groups_to_nanos(self.sample_index);
        Some(Frame::from_vec(out))
    }

    fn capture_timestamp(&self) -> u64 {
        self.last_timestamp_ns
    }
}
