//! FIFO byte accumulator sitting between socket reads and the frame decoder.
//!
//! Octets are preserved exactly as they arrived; the only byte-order
//! interpretation happens in [`StreamBuffer::peek_u32_be`]. No framing
//! knowledge lives here, that belongs to
//! [`FrameBuffer`](super::FrameBuffer).

use bytes::BytesMut;

use super::HEADER_SIZE;

/// Accumulates raw stream bytes and hands them out from the head.
///
/// `consume` and `take` require the caller to check availability first
/// (via [`len`](Self::len) or [`can_read`](Self::can_read)).
#[derive(Debug, Default)]
pub struct StreamBuffer {
    buf: BytesMut,
}

impl StreamBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Append raw bytes at the tail.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Current buffered byte count.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Peek the first four octets as a big-endian u32 without consuming.
    ///
    /// Returns `None` if fewer than four octets are buffered.
    pub fn peek_u32_be(&self) -> Option<u32> {
        if self.buf.len() < HEADER_SIZE {
            return None;
        }
        Some(u32::from_be_bytes([
            self.buf[0],
            self.buf[1],
            self.buf[2],
            self.buf[3],
        ]))
    }

    /// Check if `n` bytes are available.
    #[inline]
    pub fn can_read(&self, n: usize) -> bool {
        self.buf.len() >= n
    }

    /// Discard `n` bytes from the head. Caller must ensure availability.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.buf.len());
        let _ = self.buf.split_to(n);
    }

    /// Take `n` bytes from the head, consuming them.
    ///
    /// The split is zero-copy. Caller must ensure availability.
    pub fn take(&mut self, n: usize) -> BytesMut {
        debug_assert!(n <= self.buf.len());
        self.buf.split_to(n)
    }

    /// Clear the buffer completely.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
