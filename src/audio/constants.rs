//! Central constants for the audio pipeline.
//!
//! Tuning values used under `src/audio/**` live here so they can be adjusted
//! in one place and stay consistent across modules.

// ── Frame timing ─────────────────────────────────────────────────────────────

/// Default frame period requested by capture hosts (ms).
pub const DEFAULT_FRAME_MS: u64 = 10;

/// Default output sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default output channel count.
pub const DEFAULT_CHANNELS: u8 = 1;

// ── PCM clip boundaries ──────────────────────────────────────────────────────

pub const INT16_SCALE: f32 = 32_768.0;
pub const INT8_SCALE: f32 = 128.0;
pub const PCM8_CENTER: i16 = 128;

// ── Queued push source ───────────────────────────────────────────────────────

/// Maximum frames held in the live queue before drop-oldest kicks in.
pub const DEFAULT_MAX_QUEUE_FRAMES: usize = 50;

/// Maximum frames retained in the loop pool.
pub const DEFAULT_LOOP_POOL_FRAMES: usize = 50;

// ── File-backed source ───────────────────────────────────────────────────────

/// Decoded packets buffered between the decode thread and the pull path.
pub const DECODE_CHANNEL_PACKETS: usize = 32;

/// Read-ahead ring size in bytes: 1 MB ≈ 2.7 s of 48 kHz stereo float.
pub const READ_AHEAD_BYTES: usize = 1_024 * 1_024;

/// How long `start()` waits for the first decoded packet (ms).
pub const FIRST_PACKET_TIMEOUT_MS: u64 = 1_000;

/// Consecutive recoverable decode errors tolerated before the stream is ended.
pub const MAX_DECODE_ERRORS: usize = 16;

// ── Signal generator ─────────────────────────────────────────────────────────

/// Length of each half of a gated tone: tone on, then silence (seconds).
pub const GATE_PERIOD_SECS: u64 = 1;

/// Default seed for the noise generators.
pub const DEFAULT_NOISE_SEED: u64 = 0x5DEE_CE66D;

// ── Level analysis ───────────────────────────────────────────────────────────

/// Peak amplitude (normalised 0..1) at or below which a frame counts as silent.
/// Empirically chosen; not a correctness contract.
pub const SILENCE_THRESHOLD: f32 = 0.003;

// ── Mixing engine ────────────────────────────────────────────────────────────

/// Real-time failures are logged on the first occurrence and then once every
/// this many occurrences.
pub const ERROR_LOG_EVERY: u64 = 500;

// ── Standalone driver ────────────────────────────────────────────────────────

/// Frames buffered towards the downstream publisher.
pub const DEFAULT_SINK_CAPACITY: usize = 64;
