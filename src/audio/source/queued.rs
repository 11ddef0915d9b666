//! `QueuedPushSource`: a frame supplier fed by caller-pushed PCM.
//!
//! A producer thread pushes byte spans through a [`PushHandle`]; the real-time
//! thread pulls fixed-size frames through [`FrameSupplier::provide_frame`].
//! The two sides share only the queue state behind a `parking_lot` mutex whose
//! critical sections are a deque push/pop or one frame's worth of memcpy.
//!
//! With looping enabled every pushed frame is also kept in a bounded loop
//! pool, which is replayed in push order whenever the live queue runs dry.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        buffer::FrameQueue,
        codec,
        constants::{DEFAULT_LOOP_POOL_FRAMES, DEFAULT_MAX_QUEUE_FRAMES, ERROR_LOG_EVERY},
        format::AudioFormat,
        frame::{Frame, FrameAssembler},
        source::FrameSupplier,
    },
    common::AudioError,
};

/// Construction parameters for a [`QueuedPushSource`].
#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    /// Format of the bytes callers push.
    pub format: AudioFormat,
    pub max_frames: usize,
    /// Capped at `max_frames` so a replayed pool always fits the live queue.
    pub loop_pool_frames: usize,
    pub looping: bool,
}

impl QueueOptions {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            max_frames: DEFAULT_MAX_QUEUE_FRAMES,
            loop_pool_frames: DEFAULT_LOOP_POOL_FRAMES,
            looping: false,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn loop_pool_frames(mut self, loop_pool_frames: usize) -> Self {
        self.loop_pool_frames = loop_pool_frames;
        self
    }
}

/// Snapshot of push/pull counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pushed: u64,
    pub provided: u64,
    pub queue_overflows: u64,
    pub buffer_errors: u64,
    /// Pushes refused because the source had been stopped.
    pub rejected: u64,
}

#[derive(Default)]
struct Counters {
    pushed: AtomicU64,
    provided: AtomicU64,
    queue_overflows: AtomicU64,
    buffer_errors: AtomicU64,
    rejected: AtomicU64,
}

/// Pushes are accepted before the first start (preloading) and while running.
/// Once stopped, pushes are refused until the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

struct QueueState {
    phase: Phase,
    queue: FrameQueue,
    loop_pool: Option<FrameQueue>,
    /// Unread tail of the frame being consumed.
    current: Option<Bytes>,
}

impl QueueState {
    /// Next span to copy from: the partial frame first, then the live queue,
    /// then a replay of the loop pool.
    fn next_span(&mut self) -> Option<Bytes> {
        if let Some(span) = self.current.take() {
            return Some(span);
        }
        if let Some(frame) = self.queue.pop_front() {
            return Some(frame.into_bytes());
        }
        let pool = self.loop_pool.as_ref().filter(|p| !p.is_empty())?;
        self.queue.refill_from(pool);
        self.queue.pop_front().map(Frame::into_bytes)
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
        if let Some(pool) = self.loop_pool.as_mut() {
            pool.clear();
        }
    }
}

struct QueueShared {
    format: AudioFormat,
    state: Mutex<QueueState>,
    counters: Counters,
}

impl QueueShared {
    fn push(&self, frame: Frame) {
        if frame.is_empty() {
            return;
        }

        let evicted = {
            let mut state = self.state.lock();
            if state.phase == Phase::Stopped {
                drop(state);
                let rejected = self.counters.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                if rejected == 1 || rejected % ERROR_LOG_EVERY == 0 {
                    debug!("QueuedPushSource: {} push(es) refused while stopped", rejected);
                }
                return;
            }
            if let Some(pool) = state.loop_pool.as_mut() {
                pool.push(frame.clone());
            }
            state.queue.push(frame)
        };

        self.counters.pushed.fetch_add(1, Ordering::Relaxed);
        if evicted.is_some() {
            let dropped = self.counters.queue_overflows.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped == 1 || dropped % ERROR_LOG_EVERY == 0 {
                warn!("{}", AudioError::QueueOverflow { dropped });
            }
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        if state.phase == Phase::Running {
            debug!("QueuedPushSource: stopping");
        }
        state.phase = Phase::Stopped;
        state.clear();
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.counters.pushed.load(Ordering::Relaxed),
            provided: self.counters.provided.load(Ordering::Relaxed),
            queue_overflows: self.counters.queue_overflows.load(Ordering::Relaxed),
            buffer_errors: self.counters.buffer_errors.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}

// ─── PushHandle ──────────────────────────────────────────────────────────────

/// Producer-side handle. Cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct PushHandle {
    shared: Arc<QueueShared>,
}

impl PushHandle {
    /// Copies `bytes` into an owned frame and enqueues it.
    pub fn push(&self, bytes: &[u8]) {
        self.shared.push(Frame::copy_from_slice(bytes));
    }

    /// Enqueues a frame the caller already owns.
    pub fn push_owned(&self, frame: Frame) {
        self.shared.push(frame);
    }

    /// Drops every queued frame and any partially consumed one. The loop pool
    /// is kept.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        state.queue.clear();
        state.current = None;
    }

    pub fn queued_frame_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }

    /// Stops the source from the producer side.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn format(&self) -> AudioFormat {
        self.shared.format
    }
}

// ─── QueuedPushSource ────────────────────────────────────────────────────────

/// Consumer side of the push queue; owned by the mixing engine.
pub struct QueuedPushSource {
    shared: Arc<QueueShared>,
}

impl QueuedPushSource {
    pub fn new(options: QueueOptions) -> Self {
        let max_frames = options.max_frames.max(1);
        let loop_pool = options
            .looping
            .then(|| FrameQueue::new(options.loop_pool_frames.clamp(1, max_frames)));

        Self {
            shared: Arc::new(QueueShared {
                format: options.format,
                state: Mutex::new(QueueState {
                    phase: Phase::Idle,
                    queue: FrameQueue::new(max_frames),
                    loop_pool,
                    current: None,
                }),
                counters: Counters::default(),
            }),
        }
    }

    pub fn push_handle(&self) -> PushHandle {
        PushHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn push(&self, bytes: &[u8]) {
        self.shared.push(Frame::copy_from_slice(bytes));
    }

    pub fn push_owned(&self, frame: Frame) {
        self.shared.push(frame);
    }

    pub fn clear(&self) {
        self.push_handle().clear();
    }

    pub fn queued_frame_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().phase == Phase::Running
    }

    /// Assembles `len` bytes in the native format. Returns `None` when nothing
    /// at all was available.
    fn assemble(&self, len: usize) -> Option<FrameAssembler> {
        let mut asm = FrameAssembler::new(len);
        let mut state = self.shared.state.lock();
        if state.phase != Phase::Running {
            return None;
        }

        while !asm.is_full() {
            let Some(span) = state.next_span() else {
                break;
            };
            state.current = asm.copy_from(span).remainder;
        }
        drop(state);

        if asm.is_empty() { None } else { Some(asm) }
    }
}

impl FrameSupplier for QueuedPushSource {
    fn start(&mut self) -> Result<(), AudioError> {
        let mut state = self.shared.state.lock();
        match state.phase {
            Phase::Running => {}
            Phase::Idle => {
                info!("QueuedPushSource: started ({})", self.shared.format);
                state.phase = Phase::Running;
            }
            Phase::Stopped => {
                info!("QueuedPushSource: restarted ({})", self.shared.format);
                state.clear();
                state.phase = Phase::Running;
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.stop();
    }

    fn has_more_data(&self) -> bool {
        let state = self.shared.state.lock();
        state.phase == Phase::Running
            && (state.current.is_some()
                || !state.queue.is_empty()
                || state.loop_pool.as_ref().is_some_and(|p| !p.is_empty()))
    }

    fn provide_frame(&mut self, requested_bytes: usize, format: &AudioFormat) -> Option<Frame> {
        if requested_bytes == 0 {
            return None;
        }

        let native = self.shared.format;
        let passthrough =
            native.encoding() == format.encoding() && native.channels() == format.channels();
        let native_len = if passthrough {
            requested_bytes
        } else {
            codec::source_len_for(requested_bytes, &native, format)
        };

        let asm = self.assemble(native_len)?;
        if !asm.is_full() {
            self.shared
                .counters
                .buffer_errors
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                "{}",
                AudioError::BufferUnderrun {
                    requested: native_len,
                    available: asm.len(),
                }
            );
        }
        let native_frame = asm.finish_padded(native.encoding());

        let frame = if passthrough {
            native_frame
        } else {
            match codec::convert(&native_frame, &native, format) {
                Ok(converted) => fit_to_len(converted, requested_bytes, format),
                Err(e) => {
                    // Best effort: hand the raw bytes through at the requested length.
                    self.shared
                        .counters
                        .buffer_errors
                        .fetch_add(1, Ordering::Relaxed);
                    warn!("{}", AudioError::ConfigMismatch(e.to_string()));
                    fit_to_len(native_frame, requested_bytes, format)
                }
            }
        };

        self.shared
            .counters
            .provided
            .fetch_add(1, Ordering::Relaxed);
        Some(frame)
    }
}

impl Drop for QueuedPushSource {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

/// Truncates or silence-pads `frame` to exactly `len` bytes.
pub(crate) fn fit_to_len(frame: Frame, len: usize, format: &AudioFormat) -> Frame {
    if frame.len() == len {
        return frame;
    }
    let mut bytes = frame.into_vec();
    bytes.resize(len, format.encoding().silence_byte());
    Frame::from_vec(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use byteorder::{ByteOrder, LittleEndian};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    fn mono() -> AudioFormat {
        AudioFormat::pcm16_mono(48_000)
    }

    fn ramp(len: usize, offset: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_add(offset)).collect()
    }

    fn started(options: QueueOptions) -> QueuedPushSource {
        let mut source = QueuedPushSource::new(options);
        source.start().unwrap();
        source
    }

    #[test]
    fn stopped_source_provides_nothing() {
        let mut source = QueuedPushSource::new(QueueOptions::new(mono()));
        source.push(&[1, 2, 3, 4]);
        assert!(!source.has_more_data());
        assert!(source.provide_frame(4, &mono()).is_none());
    }

    #[test]
    fn frames_pushed_before_first_start_are_kept() {
        let mut source = QueuedPushSource::new(QueueOptions::new(mono()));
        source.push(&[1, 2, 3, 4]);
        source.start().unwrap();
        assert_eq!(source.provide_frame(4, &mono()).unwrap().as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn pushes_after_stop_are_not_replayed_on_restart() {
        let mut source = started(QueueOptions::new(mono()).looping(true));
        source.stop();

        source.push(&[1, 2, 3, 4]);
        assert_eq!(source.queued_frame_count(), 0);
        assert_eq!(source.stats().rejected, 1);
        assert_eq!(source.stats().pushed, 0);

        source.start().unwrap();
        assert!(!source.has_more_data());
        assert!(source.provide_frame(4, &mono()).is_none());

        source.push(&[5, 6]);
        assert_eq!(source.provide_frame(2, &mono()).unwrap().as_bytes(), &[5, 6]);
    }

    #[test]
    fn frames_cross_boundaries_in_fifo_order() {
        let mut source = started(QueueOptions::new(mono()));
        source.push(&[1, 2, 3]);
        source.push(&[4, 5, 6, 7, 8]);

        assert_eq!(source.provide_frame(4, &mono()).unwrap().as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(source.provide_frame(4, &mono()).unwrap().as_bytes(), &[5, 6, 7, 8]);
        assert!(source.provide_frame(4, &mono()).is_none());
        assert!(!source.has_more_data());
    }

    #[test]
    fn partial_data_is_padded_and_counted() {
        let mut source = started(QueueOptions::new(mono()));
        source.push(&[9, 9]);
        let frame = source.provide_frame(6, &mono()).unwrap();
        assert_eq!(frame.as_bytes(), &[9, 9, 0, 0, 0, 0]);
        assert_eq!(source.stats().buffer_errors, 1);
        assert_eq!(source.stats().provided, 1);
    }

    #[test]
    fn loop_replays_exact_stream() {
        let mut source = started(QueueOptions::new(mono()).looping(true));
        source.push(&ramp(100, 0));
        source.push(&ramp(200, 100));
        source.push(&ramp(150, 50));
        let k = 450;

        let mut emitted = Vec::new();
        while emitted.len() < 3 * k {
            emitted.extend_from_slice(&source.provide_frame(64, &mono()).unwrap());
        }

        assert_eq!(&emitted[k..2 * k], &emitted[..k]);
        assert_eq!(&emitted[2 * k..3 * k], &emitted[..k]);
        assert_eq!(source.stats().buffer_errors, 0);
    }

    #[test]
    fn looping_stereo_frames_repeat_without_gaps() {
        let stereo = AudioFormat::pcm16_stereo(48_000);
        let mut source = started(QueueOptions::new(stereo).looping(true));
        let frames = [ramp(400, 0), ramp(400, 7), ramp(400, 13)];
        for f in &frames {
            source.push(f);
        }
        let cycle: Vec<u8> = frames.concat();

        let mut emitted = Vec::new();
        for _ in 0..6 {
            let frame = source.provide_frame(1000, &stereo).unwrap();
            assert_eq!(frame.len(), 1000);
            emitted.extend_from_slice(&frame);
        }

        let expected: Vec<u8> = cycle.iter().cycle().take(6000).copied().collect();
        assert_eq!(emitted, expected);
    }

    #[test]
    fn queue_stays_bounded_and_counts_overflow() {
        let max = 50;
        let source = started(QueueOptions::new(mono()).max_frames(max));
        for i in 0..(max + 50) {
            source.push(&[i as u8; 32]);
            assert!(source.queued_frame_count() <= max);
        }
        let stats = source.stats();
        assert_eq!(stats.pushed, 100);
        assert_eq!(stats.queue_overflows, 50);
        assert_eq!(source.queued_frame_count(), max);
    }

    #[test]
    fn full_loop_pool_replays_only_newest_frames() {
        let pool = 3;
        let mut source = started(
            QueueOptions::new(mono())
                .max_frames(8)
                .loop_pool_frames(pool)
                .looping(true),
        );
        for i in 1..=5u8 {
            source.push(&[i, i]);
            assert!(source.queued_frame_count() <= 8);
        }

        let live = source.provide_frame(10, &mono()).unwrap();
        assert_eq!(live.as_bytes(), &[1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
        assert_eq!(source.queued_frame_count(), 0);

        for _ in 0..3 {
            let replay = source.provide_frame(2 * pool, &mono()).unwrap();
            assert_eq!(replay.as_bytes(), &[3, 3, 4, 4, 5, 5]);
            assert!(source.queued_frame_count() <= 8);
        }
        assert_eq!(source.stats().buffer_errors, 0);
    }

    #[test]
    fn loop_pool_is_capped_at_queue_size() {
        let mut source = started(
            QueueOptions::new(mono())
                .max_frames(2)
                .loop_pool_frames(100)
                .looping(true),
        );
        for i in 1..=4u8 {
            source.push(&[i, i]);
        }
        assert_eq!(source.queued_frame_count(), 2);

        assert_eq!(source.provide_frame(4, &mono()).unwrap().as_bytes(), &[3, 3, 4, 4]);
        for _ in 0..2 {
            assert_eq!(source.provide_frame(4, &mono()).unwrap().as_bytes(), &[3, 3, 4, 4]);
            assert!(source.queued_frame_count() <= 2);
        }
        assert_eq!(source.stats().queue_overflows, 2);
    }

    #[test]
    fn oldest_frames_are_evicted() {
        let mut source = started(QueueOptions::new(mono()).max_frames(2));
        source.push(&[1, 1]);
        source.push(&[2, 2]);
        source.push(&[3, 3]);
        assert_eq!(source.provide_frame(4, &mono()).unwrap().as_bytes(), &[2, 2, 3, 3]);
    }

    #[test]
    fn stop_clears_queue_and_partial_frame() {
        let mut source = started(QueueOptions::new(mono()).looping(true));
        source.push(&[1, 2, 3, 4, 5, 6]);
        source.provide_frame(2, &mono()).unwrap();

        source.stop();
        assert!(!source.has_more_data());
        assert_eq!(source.queued_frame_count(), 0);

        source.start().unwrap();
        assert!(!source.has_more_data());
        source.push(&[7, 8]);
        assert_eq!(source.provide_frame(2, &mono()).unwrap().as_bytes(), &[7, 8]);
    }

    #[test]
    fn converts_to_requested_format() {
        let stereo = AudioFormat::pcm16_stereo(48_000);
        let mut source = started(QueueOptions::new(stereo));
        let mut raw = vec![0u8; 8];
        LittleEndian::write_i16_into(&[100, 300, -100, -300], &mut raw);
        source.push(&raw);

        let frame = source.provide_frame(4, &mono()).unwrap();
        let mut out = [0i16; 2];
        LittleEndian::read_i16_into(&frame, &mut out);
        assert_eq!(out, [200, -200]);
    }

    #[test]
    fn randomized_push_and_pull_never_overruns() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut source = started(QueueOptions::new(mono()).max_frames(10_000));
        let mut expected: VecDeque<u8> = VecDeque::new();

        for round in 0..400 {
            if rng.gen_bool(0.6) {
                let len = rng.gen_range(1..=65_536);
                let bytes = ramp(len, round as u8);
                expected.extend(bytes.iter().copied());
                source.push(&bytes);
            }

            let n = rng.gen_range(64..=8192);
            match source.provide_frame(n, &mono()) {
                Some(frame) => {
                    assert_eq!(frame.len(), n);
                    let real = n.min(expected.len());
                    for (i, byte) in frame.iter().enumerate() {
                        if i < real {
                            assert_eq!(Some(*byte), expected.pop_front());
                        } else {
                            assert_eq!(*byte, 0);
                        }
                    }
                }
                None => assert!(expected.is_empty()),
            }
        }
    }

    #[test]
    fn concurrent_push_pull_and_stop() {
        let mut source = started(QueueOptions::new(mono()).max_frames(64).looping(true));
        let handle = source.push_handle();

        let producer = std::thread::spawn(move || {
            for i in 0..2_000usize {
                handle.push(&vec![(i % 251) as u8; 1 + i % 700]);
                if i == 1_500 {
                    handle.stop();
                }
            }
            handle.stats()
        });

        for _ in 0..2_000 {
            if let Some(frame) = source.provide_frame(480, &mono()) {
                assert_eq!(frame.len(), 480);
            }
        }

        let stats = producer.join().unwrap();
        assert_eq!(stats.pushed + stats.rejected, 2_000);
        assert_eq!(stats.rejected, 499);
        assert!(!source.is_running());
    }
}
