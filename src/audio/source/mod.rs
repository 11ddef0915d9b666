//! `FrameSupplier`: the pull contract every audio source implements.
//!
//! # Module layout
//!
//! ```text
//! src/audio/source/
//! ├── mod.rs         ← FrameSupplier trait + Supplier enum
//! ├── queued.rs      ← QueuedPushSource (bounded push queue, loop pool)
//! ├── file.rs        ← FileSource (symphonia decode thread + read-ahead)
//! └── generator.rs   ← SignalGenerator (procedural waveforms)
//! ```
//!
//! # Choosing a source
//!
//! | Use case                                  | Source                 |
//! |-------------------------------------------|------------------------|
//! | Caller pushes PCM from another thread     | [`QueuedPushSource`]   |
//! | Audio file on disk (wav, mp3, flac, …)    | [`FileSource`]         |
//! | Test tones, noise, synthetic publishing   | [`SignalGenerator`]    |
//! | Anything else                             | [`Supplier::External`] |

pub mod file;
pub mod generator;
pub mod queued;

pub use file::{FileSource, FileSourceOptions};
pub use generator::{GeneratorOptions, SignalGenerator, Waveform};
pub use queued::{PushHandle, QueueOptions, QueueStats, QueuedPushSource};

use crate::{
    audio::{format::AudioFormat, frame::Frame},
    common::AudioError,
};

// ─── FrameSupplier trait ─────────────────────────────────────────────────────

/// Capability contract for anything that can feed frames to the mixer.
///
/// `provide_frame` runs on the host's real-time audio thread. Implementations
/// must return either exactly `requested_bytes` bytes or `None`, and must not
/// block on I/O.
pub trait FrameSupplier: Send {
    /// Begins supplying. Idempotent; after a prior `stop()` the read position
    /// is reset.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stops supplying and drops any buffered data. Idempotent.
    fn stop(&mut self);

    /// Whether a subsequent `provide_frame` can yield data. Pure query.
    fn has_more_data(&self) -> bool;

    /// Produces exactly `requested_bytes` bytes in `format`, or `None`.
    fn provide_frame(&mut self, requested_bytes: usize, format: &AudioFormat) -> Option<Frame>;

    /// Timestamp (ns) of the most recently provided frame, or 0 if unknown.
    fn capture_timestamp(&self) -> u64 {
        0
    }
}

impl<T: FrameSupplier + ?Sized> FrameSupplier for Box<T> {
    fn start(&mut self) -> Result<(), AudioError> {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn has_more_data(&self) -> bool {
        (**self).has_more_data()
    }

    fn provide_frame(&mut self, requested_bytes: usize, format: &AudioFormat) -> Option<Frame> {
        (**self).provide_frame(requested_bytes, format)
    }

    fn capture_timestamp(&self) -> u64 {
        (**self).capture_timestamp()
    }
}

// ─── Supplier ────────────────────────────────────────────────────────────────

/// Closed set of suppliers the mixer can own.
///
/// The built-in variants dispatch statically; only caller-provided
/// implementations go through a trait object.
pub enum Supplier {
    QueuedPush(QueuedPushSource),
    FileBacked(FileSource),
    Generator(SignalGenerator),
    External(Box<dyn FrameSupplier>),
}

impl Supplier {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueuedPush(_) => "queue",
            Self::FileBacked(_) => "file",
            Self::Generator(_) => "generator",
            Self::External(_) => "external",
        }
    }

    /// Whether a panic inside this supplier must be contained by the caller.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl FrameSupplier for Supplier {
    fn start(&mut self) -> Result<(), AudioError> {
        match self {
            Self::QueuedPush(s) => s.start(),
            Self::FileBacked(s) => s.start(),
            Self::Generator(s) => s.start(),
            Self::External(s) => s.start(),
        }
    }

    fn stop(&mut self) {
        match self {
            Self::QueuedPush(s) => s.stop(),
            Self::FileBacked(s) => s.stop(),
            Self::Generator(s) => s.stop(),
            Self::External(s) => s.stop(),
        }
    }

    fn has_more_data(&self) -> bool {
        match self {
            Self::QueuedPush(s) => s.has_more_data(),
            Self::FileBacked(s) => s.has_more_data(),
            Self::Generator(s) => s.has_more_data(),
            Self::External(s) => s.has_more_data(),
        }
    }

    fn provide_frame(&mut self, requested_bytes: usize, format: &AudioFormat) -> Option<Frame> {
        match self {
            Self::QueuedPush(s) => s.provide_frame(requested_bytes, format),
            Self::FileBacked(s) => s.provide_frame(requested_bytes, format),
            Self::Generator(s) => s.provide_frame(requested_bytes, format),
            Self::External(s) => s.provide_frame(requested_bytes, format),
        }
    }

    fn capture_timestamp(&self) -> u64 {
        match self {
            Self::QueuedPush(s) => s.capture_timestamp(),
            Self::FileBacked(s) => s.capture_timestamp(),
            Self::Generator(s) => s.capture_timestamp(),
            Self::External(s) => s.capture_timestamp(),
        }
    }
}

impl From<QueuedPushSource> for Supplier {
    fn from(source: QueuedPushSource) -> Self {
        Self::QueuedPush(source)
    }
}

impl From<FileSource> for Supplier {
    fn from(source: FileSource) -> Self {
        Self::FileBacked(source)
    }
}

impl From<SignalGenerator> for Supplier {
    fn from(source: SignalGenerator) -> Self {
        Self::Generator(source)
    }
}

impl From<Box<dyn FrameSupplier>> for Supplier {
    fn from(source: Box<dyn FrameSupplier>) -> Self {
        Self::External(source)
    }
}
