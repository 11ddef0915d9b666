use thiserror::Error;

/// Failures raised by the pure sample codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The byte span does not hold a whole number of sample groups.
    #[error("buffer of {len} bytes is not aligned to {group}-byte sample groups")]
    Misaligned { len: usize, group: usize },
    /// Two spans that must be combined sample-wise differ in length.
    #[error("cannot combine buffers of {left} and {right} bytes")]
    LengthMismatch { left: usize, right: usize },
}

/// Engine-level error taxonomy.
///
/// Only setup and teardown paths ever return these. The real-time pull path
/// downgrades every variant to silence plus a counter increment and uses the
/// `Display` output for logging.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Requested format cannot be produced from the supplier's native format.
    #[error("format mismatch: {0}")]
    ConfigMismatch(String),
    /// `start()` could not open the backing file or device.
    #[error("supplier unavailable: {0}")]
    SupplierUnavailable(String),
    /// Pushed frames were evicted because the queue was full.
    #[error("queue overflow: {dropped} frame(s) evicted")]
    QueueOverflow { dropped: u64 },
    /// A supplier produced fewer bytes than requested.
    #[error("buffer underrun: wanted {requested} bytes, got {available}")]
    BufferUnderrun { requested: usize, available: usize },
    #[error("internal conversion failure: {0}")]
    InternalConversionFailure(#[from] CodecError),
    /// A caller-provided supplier panicked inside `provide_frame`.
    #[error("supplier panicked: {0}")]
    SupplierPanic(String),
    #[error("driver task failed: {0}")]
    Driver(#[from] tokio::task::JoinError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config.toml or config.default.toml not found")]
    NotFound,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
