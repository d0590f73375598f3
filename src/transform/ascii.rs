//! ASCII upper-casing transform.

use super::Transform;
use crate::protocol::{Direction, Frame};

/// Upper-cases ASCII letters in the payload, leaving other octets alone.
///
/// Optionally restricted to a single direction; frames from the other
/// side pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseAscii {
    direction: Option<Direction>,
}

impl UppercaseAscii {
    /// Upper-case frames from both directions.
    pub fn new() -> Self {
        Self { direction: None }
    }

    /// Upper-case only frames read from `direction`.
    pub fn for_direction(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
        }
    }
}

impl Transform for UppercaseAscii {
    fn apply(&self, frame: &mut Frame) {
        if let Some(direction) = self.direction {
            if frame.direction != direction {
                return;
            }
        }
        for byte in frame.payload.iter_mut() {
            byte.make_ascii_uppercase();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn frame(direction: Direction, payload: &[u8]) -> Frame {
        Frame::new(0, 1, direction, BytesMut::from(payload))
    }

    #[test]
    fn test_uppercases_ascii_letters_only() {
        let transform = UppercaseAscii::new();
        let mut f = frame(Direction::ClientToServer, b"abc XYZ 123 \xffok");
        transform.apply(&mut f);
        assert_eq!(f.payload(), b"ABC XYZ 123 \xffOK");
    }

    #[test]
    fn test_direction_filter() {
        let transform = UppercaseAscii::for_direction(Direction::ClientToServer);

        let mut c2s = frame(Direction::ClientToServer, b"abc");
        transform.apply(&mut c2s);
        assert_eq!(c2s.payload(), b"ABC");

        let mut s2c = frame(Direction::ServerToClient, b"abc");
        transform.apply(&mut s2c);
        assert_eq!(s2c.payload(), b"abc");
    }
}
