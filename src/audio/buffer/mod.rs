pub mod queue;
pub mod ring;

pub use queue::FrameQueue;
pub use ring::RingBuffer;
