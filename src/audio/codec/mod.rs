//! Sample codec: pure functions over raw PCM byte spans.
//!
//! ```text
//! src/audio/codec/
//! ├── mod.rs       ← re-exports
//! ├── sample.rs    ← single-sample decode/encode to normalised f32
//! ├── convert.rs   ← encoding + channel-count repacking
//! └── gain.rs      ← gain, additive and scaled mixing with saturation
//! ```
//!
//! Nothing in here holds state: equal inputs always give equal outputs.

pub mod convert;
pub mod gain;
pub mod sample;

pub use convert::{convert, source_len_for};
pub use gain::{apply_gain, mix_additive, mix_scaled};
