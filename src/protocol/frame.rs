//! Frame value type and direction tag.

use std::fmt;

use bytes::BytesMut;

/// Which side of a flow a frame originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl Direction {
    /// The mirror direction.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::ClientToServer => Direction::ServerToClient,
            Direction::ServerToClient => Direction::ClientToServer,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToServer => write!(f, "c2s"),
            Direction::ServerToClient => write!(f, "s2c"),
        }
    }
}

/// One decoded application frame.
///
/// Produced by the decoder, handed to the transform chain (which may
/// mutate or empty the payload), then re-encoded for the opposite peer.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic capture timestamp in nanoseconds.
    pub timestamp_ns: u64,
    /// Flow this frame belongs to.
    pub flow_id: u32,
    /// Side the frame was read from.
    pub direction: Direction,
    /// Payload bytes, mutable in place.
    pub payload: BytesMut,
}

impl Frame {
    /// Create a new frame.
    pub fn new(timestamp_ns: u64, flow_id: u32, direction: Direction, payload: BytesMut) -> Self {
        Self {
            timestamp_ns,
            flow_id,
            direction,
            payload,
        }
    }

    /// Payload as a byte slice.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// True if the payload is empty (the engine drops such frames).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposite() {
        assert_eq!(
            Direction::ClientToServer.opposite(),
            Direction::ServerToClient
        );
        assert_eq!(
            Direction::ServerToClient.opposite(),
            Direction::ClientToServer
        );
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(
            42,
            7,
            Direction::ClientToServer,
            BytesMut::from(&b"hello"[..]),
        );

        assert_eq!(frame.timestamp_ns, 42);
        assert_eq!(frame.flow_id, 7);
        assert_eq!(frame.direction, Direction::ClientToServer);
        assert_eq!(frame.payload(), b"hello");
        assert_eq!(frame.payload_len(), 5);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::new(0, 1, Direction::ServerToClient, BytesMut::new());
        assert!(frame.is_empty());
        assert_eq!(frame.payload_len(), 0);
    }
}
