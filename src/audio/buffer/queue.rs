//! Bounded FIFO of owned frames with drop-oldest backpressure.

use std::collections::VecDeque;

use crate::audio::frame::Frame;

/// A capacity-bounded queue of [`Frame`]s.
///
/// Pushing into a full queue evicts the oldest entry instead of blocking or
/// growing; the evicted frame is handed back so the caller can count it.
#[derive(Debug)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
    max_frames: usize,
    queued_bytes: usize,
}

impl FrameQueue {
    pub fn new(max_frames: usize) -> Self {
        let max_frames = max_frames.max(1);
        Self {
            frames: VecDeque::with_capacity(max_frames),
            max_frames,
            queued_bytes: 0,
        }
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    /// Appends `frame`, returning the evicted oldest frame when full.
    pub fn push(&mut self, frame: Frame) -> Option<Frame> {
        let evicted = if self.frames.len() >= self.max_frames {
            self.pop_front()
        } else {
            None
        };
        self.queued_bytes += frame.len();
        self.frames.push_back(frame);
        evicted
    }

    pub fn pop_front(&mut self) -> Option<Frame> {
        let frame = self.frames.pop_front()?;
        self.queued_bytes -= frame.len();
        Some(frame)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.queued_bytes = 0;
    }

    /// Appends clones of every frame in `other`, oldest first. Frames share
    /// their immutable storage, so this does not copy sample data.
    /// Returns the number of evictions caused.
    pub fn refill_from(&mut self, other: &FrameQueue) -> usize {
        other
            .frames
            .iter()
            .filter_map(|frame| self.push(frame.clone()))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut queue = FrameQueue::new(2);
        assert!(queue.push(Frame::from_vec(vec![1])).is_none());
        assert!(queue.push(Frame::from_vec(vec![2, 2])).is_none());
        let evicted = queue.push(Frame::from_vec(vec![3, 3, 3]));
        assert_eq!(evicted.map(|f| f.into_vec()), Some(vec![1]));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.queued_bytes(), 5);
        assert_eq!(queue.pop_front().map(|f| f.into_vec()), Some(vec![2, 2]));
    }

    #[test]
    fn never_exceeds_bound() {
        let mut queue = FrameQueue::new(50);
        for i in 0..100u8 {
            queue.push(Frame::from_vec(vec![i; 10]));
            assert!(queue.len() <= 50);
        }
        assert_eq!(queue.queued_bytes(), 500);
        assert_eq!(queue.iter().next().map(|f| f[0]), Some(50));
    }

    #[test]
    fn refill_preserves_order() {
        let mut pool = FrameQueue::new(4);
        pool.push(Frame::from_vec(vec![1]));
        pool.push(Frame::from_vec(vec![2]));

        let mut live = FrameQueue::new(4);
        assert_eq!(live.refill_from(&pool), 0);
        assert_eq!(live.pop_front().map(|f| f[0]), Some(1));
        assert_eq!(live.pop_front().map(|f| f[0]), Some(2));
        assert_eq!(pool.len(), 2);
    }
}
