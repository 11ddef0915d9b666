pub mod adapter;
pub mod buffer;
pub mod codec;
pub mod constants;
pub mod demux;
pub mod driver;
pub mod format;
pub mod frame;
pub mod level;
pub mod mix;
pub mod source;
pub mod tap;

pub use adapter::{BufferRequest, SupplyAdapter};
pub use buffer::{FrameQueue, RingBuffer};
pub use driver::{DriveMode, DriverOptions, PublishedFrame, StandaloneDriver};
pub use format::{AudioFormat, SampleEncoding};
pub use frame::Frame;
pub use mix::{MixPolicy, MixerOptions, MixerStats, MixingEngine};
pub use source::{FrameSupplier, Supplier};
pub use tap::{AudioTap, TapDecision, TapFrame, TapRegistry};
