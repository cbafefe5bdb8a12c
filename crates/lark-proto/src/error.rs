//! Error types for parsing and framing.

use thiserror::Error;

/// Errors surfaced by the transport-facing pieces of the library.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the framing limit without a terminator.
    #[error("line too long: {actual} bytes (limit {limit})")]
    LineTooLong {
        /// Bytes buffered so far.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A received line was not valid UTF-8.
    #[error("invalid utf-8 at byte {byte_pos}")]
    InvalidUtf8 {
        /// Offset of the first invalid byte.
        byte_pos: usize,
    },
}

/// Errors from [`crate::Message::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    /// The input contained no verb (empty or whitespace-only line).
    #[error("empty message")]
    Empty,
}
