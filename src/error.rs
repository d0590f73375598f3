//! Error types for framewire.

use thiserror::Error;

/// Main error type for all proxy operations.
#[derive(Debug, Error)]
pub enum FramewireError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A peer declared a frame length above the configured cap.
    #[error("declared frame length {length} exceeds maximum {max}")]
    FrameTooLarge { length: u32, max: u32 },

    /// The peer's outbound queue was closed before the send completed.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using FramewireError.
pub type Result<T> = std::result::Result<T, FramewireError>;
