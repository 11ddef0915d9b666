pub mod engine;
pub mod policy;
pub mod stats;

pub use engine::{MixerOptions, MixingEngine};
pub use policy::MixPolicy;
pub use stats::MixerStats;
