//! All the errors defined by this crate.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RconError>;

/// An error from an RCON session.
///
/// A session is considered broken after any connection or protocol error;
/// subsequent operations on it will fail as well. Closing the session
/// remains safe at any point.
#[derive(Error, Debug)]
pub enum RconError {
    /// The transport failed to connect, read or write.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),

    /// The peer closed the connection while a frame was still expected.
    #[error("connection closed while reading")]
    ConnectionClosed,

    /// A blocking read exceeded its configured deadline.
    ///
    /// Under [`FragmentStrategy::Timeout`](crate::FragmentStrategy::Timeout)
    /// this is the expected end-of-response signal and is consumed
    /// internally; anywhere else it surfaces to the caller.
    #[error("read timed out")]
    Timeout,

    /// Authentication failed. You probably entered the wrong RCON password.
    #[error("authentication failed")]
    AuthFailed,

    /// A frame's length prefix was outside the legal range of 10 to 4106.
    #[error("invalid packet length: {0}")]
    InvalidPacketLength(i32),

    /// A packet arrived with the wrong type for the current protocol phase.
    #[error("unexpected packet type: {0}")]
    UnexpectedPacketType(i32),

    /// A valid response carried a request id other than the outstanding one.
    ///
    /// Note: the server replies with a request id of `-1` on authentication
    /// failure; that case is reported as [`RconError::AuthFailed`] or
    /// [`RconError::InvalidResponse`] depending on the phase, never as a
    /// mismatch.
    #[error("unexpected response id (expected {expected}, got {actual})")]
    RequestIdMismatch {
        /// The id of the outstanding request.
        expected: i32,
        /// The id the server actually sent.
        actual: i32,
    },

    /// A command response fragment carried the `-1` failure sentinel.
    #[error("invalid command response: {0}")]
    InvalidResponse(String),

    /// Payload too long.
    ///
    /// | Direction   | Payload length limit |
    /// | ----------- | -------------------- |
    /// | Serverbound | 1446                 |
    /// | Clientbound | 4096                 |
    #[error("payload of {len} bytes exceeds the {limit} byte limit")]
    PayloadTooLong {
        /// The encoded payload length.
        len: usize,
        /// The protocol limit that was exceeded.
        limit: usize,
    },
}

impl From<io::Error> for RconError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            _ => Self::Connection(err),
        }
    }
}
