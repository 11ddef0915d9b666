//! Owned PCM frames and the read-once copy step used to assemble them.
//!
//! A [`Frame`] wraps an immutable [`Bytes`] span, so it carries no cursor of
//! its own. Partial consumption is expressed by *splitting* the span: the
//! consumed head and the remainder become two separate values and the original
//! is moved away. A span whose extent was consumed can therefore never be read
//! a second time.

use bytes::Bytes;

use crate::audio::format::SampleEncoding;

/// A fixed-length run of interleaved sample bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Copies caller-owned bytes into a new frame. The caller's memory is never
    /// retained.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(bytes),
        }
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(bytes),
        }
    }

    /// A frame of `len` bytes encoding silence.
    pub fn silence(len: usize, encoding: SampleEncoding) -> Self {
        Self::from_vec(vec![encoding.silence_byte(); len])
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        Vec::from(self.data)
    }
}

impl std::ops::Deref for Frame {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

/// Result of one copy step into a [`FrameAssembler`].
#[derive(Debug)]
pub struct CopyStep {
    /// Bytes moved into the destination. Always `min(source, dest_remaining)`.
    pub copied: usize,
    /// What is left of the source span, or `None` when it was fully consumed.
    pub remainder: Option<Bytes>,
}

/// Fixed-capacity destination for assembling an output frame from several
/// source spans.
///
/// The assembler never grows past `target` bytes: each [`copy_from`] computes
/// `min(source_remaining, dest_remaining)` once and advances both sides by
/// exactly that amount.
///
/// [`copy_from`]: FrameAssembler::copy_from
#[derive(Debug)]
pub struct FrameAssembler {
    out: Vec<u8>,
    target: usize,
}

impl FrameAssembler {
    pub fn new(target: usize) -> Self {
        Self {
            out: Vec::with_capacity(target),
            target,
        }
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.target - self.out.len()
    }

    pub fn is_full(&self) -> bool {
        self.out.len() == self.target
    }

    /// Consumes `source` and copies as much of it as fits.
    pub fn copy_from(&mut self, mut source: Bytes) -> CopyStep {
        let copied = source.len().min(self.remaining());
        let head = source.split_to(copied);
        self.out.extend_from_slice(&head);

        CopyStep {
            copied,
            remainder: if source.is_empty() { None } else { Some(source) },
        }
    }

    /// Finishes the frame, padding any unfilled tail with silence so the
    /// result is exactly `target` bytes.
    pub fn finish_padded(mut self, encoding: SampleEncoding) -> Frame {
        let missing = self.remaining();
        if missing > 0 {
            self.out
                .resize(self.out.len() + missing, encoding.silence_byte());
        }
        Frame::from_vec(self.out)
    }

    /// Returns the assembled bytes as-is, possibly shorter than `target`.
    pub fn into_vec(self) -> Vec<u8> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_step_splits_source() {
        let mut asm = FrameAssembler::new(6);
        let step = asm.copy_from(Bytes::from_static(&[1, 2, 3, 4]));
        assert_eq!(step.copied, 4);
        assert!(step.remainder.is_none());

        let step = asm.copy_from(Bytes::from_static(&[5, 6, 7, 8]));
        assert_eq!(step.copied, 2);
        assert_eq!(step.remainder.as_deref(), Some(&[7u8, 8][..]));
        assert!(asm.is_full());
        assert_eq!(asm.into_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn copy_into_full_assembler_keeps_source_whole() {
        let mut asm = FrameAssembler::new(0);
        let step = asm.copy_from(Bytes::from_static(&[9, 9]));
        assert_eq!(step.copied, 0);
        assert_eq!(step.remainder.map(|b| b.len()), Some(2));
    }

    #[test]
    fn padding_uses_encoding_silence() {
        let mut asm = FrameAssembler::new(4);
        asm.copy_from(Bytes::from_static(&[10]));
        let frame = asm.finish_padded(SampleEncoding::Pcm8);
        assert_eq!(frame.as_bytes(), &[10, 0x80, 0x80, 0x80]);

        let frame = FrameAssembler::new(3).finish_padded(SampleEncoding::Pcm16);
        assert_eq!(frame.as_bytes(), &[0, 0, 0]);
    }
}
