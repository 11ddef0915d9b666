//! Fixed-size circular byte buffer used as the file source's read-ahead store.
//!
//! The backing storage is allocated once. Writes never overwrite unread data:
//! they accept as many bytes as fit and report the count, leaving the caller
//! to hold on to the rest.

pub struct RingBuffer {
    buf: Vec<u8>,
    write_offset: usize,
    read_offset: usize,
    length: usize,
}

impl RingBuffer {
    /// Create a new `RingBuffer` of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0u8; size.max(1)],
            write_offset: 0,
            read_offset: 0,
            length: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// How many bytes are currently available to read.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// How many bytes can still be written before the buffer is full.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.length
    }

    /// Writes as much of `chunk` as fits and returns the number of bytes taken.
    pub fn write(&mut self, chunk: &[u8]) -> usize {
        let to_write = chunk.len().min(self.remaining());
        if to_write == 0 {
            return 0;
        }

        let size = self.capacity();
        let available_at_end = size - self.write_offset;
        if to_write <= available_at_end {
            self.buf[self.write_offset..self.write_offset + to_write]
                .copy_from_slice(&chunk[..to_write]);
        } else {
            self.buf[self.write_offset..].copy_from_slice(&chunk[..available_at_end]);
            self.buf[..to_write - available_at_end]
                .copy_from_slice(&chunk[available_at_end..to_write]);
        }

        self.write_offset = (self.write_offset + to_write) % size;
        self.length += to_write;
        to_write
    }

    /// Appends up to `n` bytes to `out`, returning how many were read.
    pub fn read_into(&mut self, out: &mut Vec<u8>, n: usize) -> usize {
        let to_read = n.min(self.length);
        if to_read == 0 {
            return 0;
        }

        let size = self.capacity();
        let available_at_end = size - self.read_offset;
        if to_read <= available_at_end {
            out.extend_from_slice(&self.buf[self.read_offset..self.read_offset + to_read]);
        } else {
            out.extend_from_slice(&self.buf[self.read_offset..]);
            out.extend_from_slice(&self.buf[..to_read - available_at_end]);
        }

        self.read_offset = (self.read_offset + to_read) % size;
        self.length -= to_read;
        to_read
    }

    /// Reset the buffer to empty.
    pub fn clear(&mut self) {
        self.write_offset = 0;
        self.read_offset = 0;
        self.length = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around_without_losing_order() {
        let mut ring = RingBuffer::new(8);
        assert_eq!(ring.write(&[1, 2, 3, 4, 5, 6]), 6);

        let mut out = Vec::new();
        assert_eq!(ring.read_into(&mut out, 4), 4);
        assert_eq!(out, vec![1, 2, 3, 4]);

        assert_eq!(ring.write(&[7, 8, 9, 10, 11]), 5);
        out.clear();
        assert_eq!(ring.read_into(&mut out, 100), 7);
        assert_eq!(out, vec![5, 6, 7, 8, 9, 10, 11]);
        assert!(ring.is_empty());
    }

    #[test]
    fn write_stops_at_capacity() {
        let mut ring = RingBuffer::new(4);
        assert_eq!(ring.write(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(ring.remaining(), 0);
        assert_eq!(ring.write(&[7]), 0);
        assert_eq!(ring.len(), 4);
    }
}
