//! Transform chain applied to every decoded frame.
//!
//! A [`Transform`] is a synchronous payload-mutating stage; a
//! [`TransformChain`] runs its stages in insertion order over the same
//! frame, so each stage observes the output of the previous one. A frame
//! whose payload is empty after the chain runs is dropped by the engine
//! rather than re-encoded.
//!
//! Transforms must be bounded-time: they run inline on the flow's task,
//! and a slow transform stalls that flow.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use framewire::protocol::{Direction, Frame};
//! use framewire::transform::{TransformChain, UppercaseAscii};
//!
//! let chain = TransformChain::new().with(UppercaseAscii::new());
//!
//! let mut frame = Frame::new(0, 1, Direction::ClientToServer, BytesMut::from(&b"abc"[..]));
//! chain.apply(&mut frame);
//! assert_eq!(frame.payload(), b"ABC");
//! ```

use crate::protocol::Frame;

mod ascii;

pub use ascii::UppercaseAscii;

/// A payload-mutating stage.
///
/// Implementations may change the payload arbitrarily, including
/// emptying it to drop the frame.
pub trait Transform: Send + Sync {
    /// Mutate the frame in place.
    fn apply(&self, frame: &mut Frame);
}

/// Plain functions and closures act as transforms.
impl<F> Transform for F
where
    F: Fn(&mut Frame) + Send + Sync,
{
    fn apply(&self, frame: &mut Frame) {
        self(frame)
    }
}

/// Ordered pipeline of transforms. The chain owns its stages.
#[derive(Default)]
pub struct TransformChain {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformChain {
    /// Create an empty chain (frames pass through untouched).
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Append a transform at the end of the chain.
    pub fn add(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, transform: impl Transform + 'static) -> Self {
        self.add(Box::new(transform));
        self
    }

    /// Run every transform in insertion order on the same frame.
    pub fn apply(&self, frame: &mut Frame) {
        for transform in &self.transforms {
            transform.apply(frame);
        }
    }

    /// Number of stages in the chain.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// True if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Direction;
    use bytes::BytesMut;

    fn frame(payload: &[u8]) -> Frame {
        Frame::new(0, 1, Direction::ClientToServer, BytesMut::from(payload))
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = TransformChain::new();
        assert!(chain.is_empty());

        let mut f = frame(b"unchanged");
        chain.apply(&mut f);
        assert_eq!(f.payload(), b"unchanged");
    }

    #[test]
    fn test_transforms_run_in_insertion_order() {
        let chain = TransformChain::new()
            .with(|f: &mut Frame| f.payload.extend_from_slice(b"-a"))
            .with(|f: &mut Frame| f.payload.extend_from_slice(b"-b"));

        assert_eq!(chain.len(), 2);

        let mut f = frame(b"x");
        chain.apply(&mut f);
        assert_eq!(f.payload(), b"x-a-b");
    }

    #[test]
    fn test_each_stage_sees_previous_output() {
        let chain = TransformChain::new()
            .with(|f: &mut Frame| {
                f.payload.clear();
                f.payload.extend_from_slice(b"base");
            })
            .with(UppercaseAscii::new());

        let mut f = frame(b"ignored");
        chain.apply(&mut f);
        assert_eq!(f.payload(), b"BASE");
    }

    #[test]
    fn test_transform_may_empty_payload() {
        let chain = TransformChain::new().with(|f: &mut Frame| f.payload.clear());

        let mut f = frame(b"doomed");
        chain.apply(&mut f);
        assert!(f.is_empty());
    }
}
