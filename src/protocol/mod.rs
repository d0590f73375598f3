//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the length-prefixed wire layer:
//! - 4-byte big-endian length header encoding/decoding
//! - Byte buffer for raw stream accumulation
//! - Frame decoder for extracting complete frames from partial reads
//! - Frame struct carrying capture metadata

mod frame;
mod frame_buffer;
mod stream_buffer;
mod wire_format;

pub use frame::{Direction, Frame};
pub use frame_buffer::FrameBuffer;
pub use stream_buffer::StreamBuffer;
pub use wire_format::{
    decode_length, encode_length, encode_length_prefixed, DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE,
};
